//! Typed scenario configuration.
//!
//! A [`ScenarioConfig`] is the immutable per-run input: seasons, resource
//! rates, hazards, the task roster, the agent population, cognition knobs,
//! network decay, timeline, and logging toggles. Configs are built in code
//! by the scenario registry and validated once at construction time; the
//! engine assumes a validated config thereafter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when validating a scenario configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid scenario config: {0}")]
    Invalid(&'static str),
}

/// Calendar season labels; the only names a scenario may use.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum SeasonName {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl SeasonName {
    /// Lowercase label used in prompts and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Autumn => "autumn",
            Self::Winter => "winter",
        }
    }
}

/// Mean and standard deviation for a normal-sample-then-clamp draw.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MeanStd {
    pub mean: f64,
    pub std_dev: f64,
}

impl MeanStd {
    #[must_use]
    pub const fn new(mean: f64, std_dev: f64) -> Self {
        Self { mean, std_dev }
    }
}

/// Shape/scale parameters of the daily resource gamma draw.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GammaParams {
    pub shape: f64,
    pub scale: f64,
}

/// Parameters of the optional log-Gaussian plant multiplier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LogGaussianParams {
    pub mean: f64,
    pub variance: f64,
}

/// One named season with its resource multiplier and climate noise span.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonConfig {
    pub name: SeasonName,
    /// Scales every resource draw while this season is active.
    pub resource_multiplier: f64,
    /// Half-width of the uniform climate shock added to the gamma draw.
    pub climate_noise: f64,
}

/// Base resource rates and the stochastic draws layered on top.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceConfig {
    pub base_plant_rate: f64,
    pub base_small_game_rate: f64,
    pub base_large_game_rate: f64,
    pub poisson_gamma: GammaParams,
    /// Extra multiplicative noise on plant growth when configured.
    pub log_gaussian: Option<LogGaussianParams>,
    /// Additive large-game bonus per season; absent seasons contribute 0.
    #[serde(default)]
    pub large_game_bonus: BTreeMap<SeasonName, f64>,
}

/// Per-category hazard probabilities, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct HazardRates {
    pub injury: f64,
    pub hypothermia: f64,
    pub predator: f64,
}

impl HazardRates {
    /// Component-wise sum with a seasonal override, clamped back to `[0, 1]`.
    #[must_use]
    pub fn compose(&self, seasonal: Option<&HazardRates>) -> HazardRates {
        let extra = seasonal.copied().unwrap_or_default();
        HazardRates {
            injury: (self.injury + extra.injury).clamp(0.0, 1.0),
            hypothermia: (self.hypothermia + extra.hypothermia).clamp(0.0, 1.0),
            predator: (self.predator + extra.predator).clamp(0.0, 1.0),
        }
    }

    fn in_unit_range(&self) -> bool {
        let ok = |v: f64| (0.0..=1.0).contains(&v);
        ok(self.injury) && ok(self.hypothermia) && ok(self.predator)
    }
}

/// Baseline hazards plus optional per-season overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HazardConfig {
    pub base: HazardRates,
    #[serde(default)]
    pub seasonal: BTreeMap<SeasonName, HazardRates>,
}

/// The broad kind of work a task represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Foraging,
    Hunting,
    PublicGood,
}

impl TaskCategory {
    /// Skill map key consulted for this category.
    #[must_use]
    pub const fn skill_key(self) -> &'static str {
        match self {
            Self::Foraging => "gathering",
            Self::Hunting => "hunting",
            Self::PublicGood => "crafting",
        }
    }

    /// Lowercase label used in prompts and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Foraging => "foraging",
            Self::Hunting => "hunting",
            Self::PublicGood => "public_good",
        }
    }
}

/// Fairness rule used to split a task's total reward among participants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskNorm {
    EqualShare,
    ProportionalSkill,
    KeyContributorReward,
    CollectivePenalty,
}

/// One entry in the scenario's ordered task roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskConfig {
    pub id: String,
    pub name: String,
    pub category: TaskCategory,
    /// Baseline success chance before group-size/skill/resource adjustments.
    pub success_probability: f64,
    /// Reward earned per participant on success, summed into the pool.
    pub yield_per_participant: Option<f64>,
    /// Flat pool earned once per successful task.
    pub yield_per_participant_on_success: Option<f64>,
    pub energy_cost: f64,
    pub injury_risk_multiplier: f64,
    pub min_participants: usize,
    pub recommended_participants: usize,
    pub norm: TaskNorm,
}

/// Fehr–Schmidt parameter distributions for the population.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocialPreferenceConfig {
    /// Envy coefficient (disadvantageous inequality aversion).
    pub alpha: MeanStd,
    /// Guilt coefficient (advantageous inequality aversion).
    pub beta: MeanStd,
    pub reputation_weight: MeanStd,
    pub norm_penalty: MeanStd,
}

/// Agent population size and trait distributions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopulationConfig {
    pub size: usize,
    /// Skill name to sampling profile; values clamp into `[0, 1.2]`.
    pub skill_profiles: BTreeMap<String, MeanStd>,
    pub social_preferences: SocialPreferenceConfig,
    /// Shared profile for the five preference sliders, clamped to `[0, 1]`.
    pub preference: MeanStd,
}

/// Emotion decay and baseline settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EmotionConfig {
    pub decay: f64,
    pub baseline_valence: f64,
    pub baseline_arousal: f64,
}

/// Memory horizons and reflection cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CognitionConfig {
    pub emotion: EmotionConfig,
    pub episodic_window_days: u64,
    pub social_memory_horizon_days: u64,
    pub reflection_interval_days: u64,
}

/// Social-network evolution settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// Forget factor applied to every edge weight each day.
    pub decay: f64,
}

/// Calendar shape and flavor interactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineConfig {
    pub season_length_days: u64,
    /// Ambient interaction descriptions surfaced by the configurator layer.
    pub daily_micro_interactions: Vec<String>,
}

/// Scenario-wide scalar defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WorldDefaults {
    pub daily_energy_need: f64,
}

/// Which per-day log entries the orchestrator should emit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    pub task_outcomes: bool,
    pub reflections: bool,
    pub daily_metrics: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            task_outcomes: true,
            reflections: true,
            daily_metrics: true,
        }
    }
}

/// Prompt settings for the LLM decision layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// Suffix appended to the assembled daily-plan prompt.
    pub plan_template: String,
}

/// Immutable description of one simulation scenario.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioConfig {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub seasons: Vec<SeasonConfig>,
    pub resources: ResourceConfig,
    pub hazards: HazardConfig,
    pub tasks: Vec<TaskConfig>,
    pub agent_population: PopulationConfig,
    pub cognition: CognitionConfig,
    pub network: NetworkConfig,
    pub timeline: TimelineConfig,
    pub defaults: WorldDefaults,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub llm: LlmConfig,
}

impl ScenarioConfig {
    /// Validate the configuration; fatal at construction time on failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid("scenario name must be set"));
        }
        if self.display_name.is_empty() {
            return Err(ConfigError::Invalid("display name must be set"));
        }
        if self.seasons.is_empty() {
            return Err(ConfigError::Invalid("at least one season is required"));
        }
        if self.tasks.is_empty() {
            return Err(ConfigError::Invalid("at least one task is required"));
        }
        if self.timeline.season_length_days == 0 {
            return Err(ConfigError::Invalid("season_length_days must be positive"));
        }
        if self.timeline.daily_micro_interactions.is_empty() {
            return Err(ConfigError::Invalid(
                "daily_micro_interactions must be non-empty",
            ));
        }
        if self.agent_population.size == 0 {
            return Err(ConfigError::Invalid("agent population must be non-empty"));
        }
        if !self.hazards.base.in_unit_range()
            || !self.hazards.seasonal.values().all(HazardRates::in_unit_range)
        {
            return Err(ConfigError::Invalid("hazard rates must lie in [0, 1]"));
        }
        for season in &self.seasons {
            if season.resource_multiplier < 0.0 || season.climate_noise < 0.0 {
                return Err(ConfigError::Invalid(
                    "season multipliers and noise must be non-negative",
                ));
            }
        }
        if self.resources.base_plant_rate < 0.0
            || self.resources.base_small_game_rate < 0.0
            || self.resources.base_large_game_rate < 0.0
        {
            return Err(ConfigError::Invalid("resource rates must be non-negative"));
        }
        if self.resources.poisson_gamma.shape <= 0.0 || self.resources.poisson_gamma.scale <= 0.0 {
            return Err(ConfigError::Invalid("gamma parameters must be positive"));
        }
        for task in &self.tasks {
            if task.id.is_empty() {
                return Err(ConfigError::Invalid("task id must be set"));
            }
            if !(0.0..=1.0).contains(&task.success_probability) {
                return Err(ConfigError::Invalid(
                    "task success probability must lie in [0, 1]",
                ));
            }
            if task.min_participants == 0 {
                return Err(ConfigError::Invalid("min_participants must be at least 1"));
            }
            if task.recommended_participants < task.min_participants {
                return Err(ConfigError::Invalid(
                    "recommended_participants must be at least min_participants",
                ));
            }
            if task.energy_cost < 0.0 || task.injury_risk_multiplier < 0.0 {
                return Err(ConfigError::Invalid(
                    "task costs and risk multipliers must be non-negative",
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.cognition.emotion.decay) {
            return Err(ConfigError::Invalid("emotion decay must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.network.decay) {
            return Err(ConfigError::Invalid("network decay must lie in [0, 1]"));
        }
        if self.defaults.daily_energy_need < 0.0 {
            return Err(ConfigError::Invalid(
                "daily_energy_need must be non-negative",
            ));
        }
        Ok(())
    }

    /// Season active at the given index (callers pass a validated index).
    #[must_use]
    pub fn season(&self, index: usize) -> &SeasonConfig {
        &self.seasons[index % self.seasons.len()]
    }
}
