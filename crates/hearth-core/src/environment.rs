//! Seasonal environment: per-day resource draws and hazard composition.

use serde::{Deserialize, Serialize};

use crate::config::{HazardRates, ScenarioConfig, TaskCategory};
use crate::rng::{sample, SimRng};

/// Resource levels available on the current day.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ResourceLevel {
    pub plants: f64,
    pub small_game: f64,
    pub large_game: f64,
}

impl ResourceLevel {
    /// Level relevant to a task category: plants feed foraging and
    /// public-good work, game feeds hunting.
    #[must_use]
    pub fn for_category(&self, category: TaskCategory) -> f64 {
        match category {
            TaskCategory::Foraging | TaskCategory::PublicGood => self.plants,
            TaskCategory::Hunting => self.small_game + self.large_game,
        }
    }
}

/// Mutable, serializable environment state.
///
/// Invariants: `season_index < seasons.len()`, hazards in `[0, 1]`,
/// resources non-negative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentState {
    pub day: u64,
    pub season_index: usize,
    pub season_day: u64,
    pub resource_level: ResourceLevel,
    pub climate_shock: f64,
    pub risk_modifier: HazardRates,
}

impl EnvironmentState {
    /// Day-zero state: resources at base rates, hazards composed for the
    /// first season, no shock yet.
    #[must_use]
    pub fn initial(config: &ScenarioConfig) -> Self {
        let first = &config.seasons[0];
        Self {
            day: 0,
            season_index: 0,
            season_day: 0,
            resource_level: ResourceLevel {
                plants: config.resources.base_plant_rate,
                small_game: config.resources.base_small_game_rate,
                large_game: config.resources.base_large_game_rate,
            },
            climate_shock: 0.0,
            risk_modifier: config
                .hazards
                .base
                .compose(config.hazards.seasonal.get(&first.name)),
        }
    }

    /// Advance one day: roll the calendar, draw fresh resource levels, and
    /// recompose hazards for the active season.
    ///
    /// Draw order is part of the determinism contract: gamma, then the
    /// uniform climate shock, then the optional log-Gaussian multiplier.
    pub fn tick(&mut self, rng: &mut SimRng, config: &ScenarioConfig) {
        self.day += 1;
        let season_length = config.timeline.season_length_days.max(1);
        self.season_index =
            ((self.day / season_length) % config.seasons.len() as u64) as usize;
        self.season_day = self.day % season_length;
        let season = &config.seasons[self.season_index];
        let resources = &config.resources;

        let gamma_draw = sample::gamma(
            rng,
            resources.poisson_gamma.shape,
            resources.poisson_gamma.scale,
        );
        let shock = rng.range(-season.climate_noise, season.climate_noise);
        let plant_noise = match &resources.log_gaussian {
            Some(params) => sample::log_gaussian(rng, params.mean, params.variance),
            None => 1.0,
        };

        let base_multiplier = season.resource_multiplier * (gamma_draw + shock).max(0.1);
        let seasonal_bonus = resources
            .large_game_bonus
            .get(&season.name)
            .copied()
            .unwrap_or(0.0);

        self.resource_level = ResourceLevel {
            plants: resources.base_plant_rate * base_multiplier * plant_noise,
            small_game: resources.base_small_game_rate * base_multiplier * 0.8,
            large_game: resources.base_large_game_rate * base_multiplier + seasonal_bonus,
        };
        self.climate_shock = shock;
        self.risk_modifier = config
            .hazards
            .base
            .compose(config.hazards.seasonal.get(&season.name));
    }
}
