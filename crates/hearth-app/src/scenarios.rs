//! Built-in scenario definitions.

use std::collections::BTreeMap;

use hearth_core::config::{
    CognitionConfig, EmotionConfig, GammaParams, HazardConfig, HazardRates, LlmConfig,
    LogGaussianParams, LoggingConfig, MeanStd, NetworkConfig, PopulationConfig, ResourceConfig,
    ScenarioConfig, SeasonConfig, SocialPreferenceConfig, TimelineConfig, WorldDefaults,
};
use hearth_core::{SeasonName, TaskCategory, TaskConfig, TaskNorm};

fn forager_skills() -> BTreeMap<String, MeanStd> {
    BTreeMap::from([
        ("gathering".to_string(), MeanStd::new(0.55, 0.12)),
        ("hunting".to_string(), MeanStd::new(0.5, 0.18)),
        ("crafting".to_string(), MeanStd::new(0.45, 0.12)),
    ])
}

fn default_social_preferences() -> SocialPreferenceConfig {
    SocialPreferenceConfig {
        alpha: MeanStd::new(0.7, 0.2),
        beta: MeanStd::new(0.35, 0.15),
        reputation_weight: MeanStd::new(0.5, 0.15),
        norm_penalty: MeanStd::new(0.3, 0.1),
    }
}

fn default_cognition() -> CognitionConfig {
    CognitionConfig {
        emotion: EmotionConfig {
            decay: 0.12,
            baseline_valence: 0.05,
            baseline_arousal: 0.25,
        },
        episodic_window_days: 7,
        social_memory_horizon_days: 21,
        reflection_interval_days: 5,
    }
}

/// Four-season river valley: the default mixed foraging/hunting camp.
pub fn river_camp() -> ScenarioConfig {
    ScenarioConfig {
        name: "river-camp".to_string(),
        display_name: "River Camp".to_string(),
        description: "A twelve-person camp working a river valley through \
                      four seasons of foraging, hunting, and shared upkeep."
            .to_string(),
        seasons: vec![
            SeasonConfig {
                name: SeasonName::Spring,
                resource_multiplier: 1.1,
                climate_noise: 0.2,
            },
            SeasonConfig {
                name: SeasonName::Summer,
                resource_multiplier: 1.3,
                climate_noise: 0.15,
            },
            SeasonConfig {
                name: SeasonName::Autumn,
                resource_multiplier: 0.9,
                climate_noise: 0.25,
            },
            SeasonConfig {
                name: SeasonName::Winter,
                resource_multiplier: 0.45,
                climate_noise: 0.35,
            },
        ],
        resources: ResourceConfig {
            base_plant_rate: 9.0,
            base_small_game_rate: 4.5,
            base_large_game_rate: 2.0,
            poisson_gamma: GammaParams {
                shape: 2.0,
                scale: 1.0,
            },
            log_gaussian: Some(LogGaussianParams {
                mean: 0.0,
                variance: 0.04,
            }),
            large_game_bonus: BTreeMap::from([
                (SeasonName::Autumn, 0.8),
                (SeasonName::Winter, 1.2),
            ]),
        },
        hazards: HazardConfig {
            base: HazardRates {
                injury: 0.12,
                hypothermia: 0.04,
                predator: 0.08,
            },
            seasonal: BTreeMap::from([
                (
                    SeasonName::Winter,
                    HazardRates {
                        injury: 0.08,
                        hypothermia: 0.3,
                        predator: 0.05,
                    },
                ),
                (
                    SeasonName::Autumn,
                    HazardRates {
                        injury: 0.04,
                        hypothermia: 0.08,
                        predator: 0.1,
                    },
                ),
            ]),
        },
        tasks: vec![
            TaskConfig {
                id: "gather_roots".to_string(),
                name: "Gather roots and berries".to_string(),
                category: TaskCategory::Foraging,
                success_probability: 0.75,
                yield_per_participant: Some(2.4),
                yield_per_participant_on_success: None,
                energy_cost: 0.8,
                injury_risk_multiplier: 0.25,
                min_participants: 1,
                recommended_participants: 4,
                norm: TaskNorm::EqualShare,
            },
            TaskConfig {
                id: "hunt_elk".to_string(),
                name: "Hunt elk".to_string(),
                category: TaskCategory::Hunting,
                success_probability: 0.4,
                yield_per_participant: None,
                yield_per_participant_on_success: Some(16.0),
                energy_cost: 1.5,
                injury_risk_multiplier: 0.9,
                min_participants: 2,
                recommended_participants: 4,
                norm: TaskNorm::KeyContributorReward,
            },
            TaskConfig {
                id: "snare_hares".to_string(),
                name: "Set hare snares".to_string(),
                category: TaskCategory::Hunting,
                success_probability: 0.6,
                yield_per_participant: Some(1.8),
                yield_per_participant_on_success: None,
                energy_cost: 0.9,
                injury_risk_multiplier: 0.3,
                min_participants: 1,
                recommended_participants: 2,
                norm: TaskNorm::ProportionalSkill,
            },
            TaskConfig {
                id: "camp_maintenance".to_string(),
                name: "Camp maintenance".to_string(),
                category: TaskCategory::PublicGood,
                success_probability: 0.9,
                yield_per_participant: Some(0.4),
                yield_per_participant_on_success: None,
                energy_cost: 0.4,
                injury_risk_multiplier: 0.05,
                min_participants: 1,
                recommended_participants: 3,
                norm: TaskNorm::EqualShare,
            },
        ],
        agent_population: PopulationConfig {
            size: 12,
            skill_profiles: forager_skills(),
            social_preferences: default_social_preferences(),
            preference: MeanStd::new(0.5, 0.15),
        },
        cognition: default_cognition(),
        network: NetworkConfig { decay: 0.06 },
        timeline: TimelineConfig {
            season_length_days: 30,
            daily_micro_interactions: vec![
                "traded stories by the fire".to_string(),
                "shared dried fish with a neighbor".to_string(),
                "mended nets together".to_string(),
            ],
        },
        defaults: WorldDefaults {
            daily_energy_need: 1.6,
        },
        logging: LoggingConfig::default(),
        llm: LlmConfig {
            plan_template: "Given the camp's state, order today's tasks and \
                            say how many people each deserves."
                .to_string(),
        },
    }
}

/// Harsh two-season variant: long winters, scarce plants, collective
/// penalties on the shared granary work.
pub fn frost_hollow() -> ScenarioConfig {
    ScenarioConfig {
        name: "frost-hollow".to_string(),
        display_name: "Frost Hollow".to_string(),
        description: "Eight agents wintering in a high valley where the \
                      granary work is punished collectively when it slips."
            .to_string(),
        seasons: vec![
            SeasonConfig {
                name: SeasonName::Autumn,
                resource_multiplier: 0.8,
                climate_noise: 0.3,
            },
            SeasonConfig {
                name: SeasonName::Winter,
                resource_multiplier: 0.35,
                climate_noise: 0.4,
            },
        ],
        resources: ResourceConfig {
            base_plant_rate: 5.0,
            base_small_game_rate: 3.0,
            base_large_game_rate: 2.5,
            poisson_gamma: GammaParams {
                shape: 1.6,
                scale: 1.1,
            },
            log_gaussian: None,
            large_game_bonus: BTreeMap::from([(SeasonName::Winter, 1.5)]),
        },
        hazards: HazardConfig {
            base: HazardRates {
                injury: 0.18,
                hypothermia: 0.15,
                predator: 0.12,
            },
            seasonal: BTreeMap::from([(
                SeasonName::Winter,
                HazardRates {
                    injury: 0.1,
                    hypothermia: 0.35,
                    predator: 0.08,
                },
            )]),
        },
        tasks: vec![
            TaskConfig {
                id: "dig_tubers".to_string(),
                name: "Dig frozen tubers".to_string(),
                category: TaskCategory::Foraging,
                success_probability: 0.55,
                yield_per_participant: Some(1.6),
                yield_per_participant_on_success: None,
                energy_cost: 1.0,
                injury_risk_multiplier: 0.4,
                min_participants: 1,
                recommended_participants: 3,
                norm: TaskNorm::EqualShare,
            },
            TaskConfig {
                id: "drive_boar".to_string(),
                name: "Drive boar from the thicket".to_string(),
                category: TaskCategory::Hunting,
                success_probability: 0.35,
                yield_per_participant: None,
                yield_per_participant_on_success: Some(14.0),
                energy_cost: 1.6,
                injury_risk_multiplier: 1.1,
                min_participants: 3,
                recommended_participants: 4,
                norm: TaskNorm::ProportionalSkill,
            },
            TaskConfig {
                id: "granary_watch".to_string(),
                name: "Granary watch".to_string(),
                category: TaskCategory::PublicGood,
                success_probability: 0.8,
                yield_per_participant: Some(0.6),
                yield_per_participant_on_success: None,
                energy_cost: 0.5,
                injury_risk_multiplier: 0.1,
                min_participants: 2,
                recommended_participants: 2,
                norm: TaskNorm::CollectivePenalty,
            },
            TaskConfig {
                id: "camp_maintenance".to_string(),
                name: "Camp maintenance".to_string(),
                category: TaskCategory::PublicGood,
                success_probability: 0.9,
                yield_per_participant: Some(0.3),
                yield_per_participant_on_success: None,
                energy_cost: 0.3,
                injury_risk_multiplier: 0.05,
                min_participants: 1,
                recommended_participants: 2,
                norm: TaskNorm::EqualShare,
            },
        ],
        agent_population: PopulationConfig {
            size: 8,
            skill_profiles: forager_skills(),
            social_preferences: default_social_preferences(),
            preference: MeanStd::new(0.45, 0.12),
        },
        cognition: CognitionConfig {
            emotion: EmotionConfig {
                decay: 0.15,
                baseline_valence: -0.05,
                baseline_arousal: 0.3,
            },
            episodic_window_days: 5,
            social_memory_horizon_days: 15,
            reflection_interval_days: 4,
        },
        network: NetworkConfig { decay: 0.1 },
        timeline: TimelineConfig {
            season_length_days: 25,
            daily_micro_interactions: vec![
                "huddled around the embers".to_string(),
                "rationed the last smoked meat".to_string(),
            ],
        },
        defaults: WorldDefaults {
            daily_energy_need: 1.8,
        },
        logging: LoggingConfig::default(),
        llm: LlmConfig {
            plan_template: "Winter is close. Order the camp's tasks for today."
                .to_string(),
        },
    }
}
