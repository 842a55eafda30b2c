//! Agent cognition: emotion updates, episodic and social memory, reflection.

use std::collections::BTreeMap;

use crate::agent::{AgentState, EpisodicEntry, SocialMemoryEntry};
use crate::config::CognitionConfig;
use crate::environment::ResourceLevel;

/// One appraisal applied to an agent. Alignment components are signed;
/// positive values mean the event matched the agent's goals, the group's
/// norms, or the agent's own preferences.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionStimulus {
    pub goal_alignment: f64,
    pub norm_alignment: f64,
    pub preference_alignment: f64,
    pub arousal: f64,
    pub summary: String,
}

/// Stateless engine applying cognition rules under one config.
#[derive(Debug, Clone)]
pub struct CognitionEngine {
    config: CognitionConfig,
}

impl CognitionEngine {
    #[must_use]
    pub fn new(config: CognitionConfig) -> Self {
        Self { config }
    }

    /// Apply a stimulus on `day`: decay-update the emotion dimensions and
    /// prepend an episodic entry, evicting entries outside the window.
    pub fn apply_stimulus(&self, agent: &mut AgentState, stimulus: &EmotionStimulus, day: u64) {
        let valence_delta = 0.6 * stimulus.goal_alignment
            + 0.3 * stimulus.norm_alignment
            + 0.1 * stimulus.preference_alignment;
        let arousal_delta = stimulus.arousal;
        let mood_delta = 0.5 * valence_delta + 0.2 * arousal_delta;

        let decay = self.config.emotion.decay;
        let emotion = &mut agent.emotion;
        emotion.valence = (emotion.valence * (1.0 - decay) + valence_delta).clamp(-1.0, 1.0);
        emotion.arousal = (emotion.arousal * (1.0 - decay) + arousal_delta).clamp(0.0, 1.5);
        emotion.mood = (emotion.mood * (1.0 - decay / 2.0) + mood_delta).clamp(-1.0, 1.0);

        agent.episodic_memory.insert(
            0,
            EpisodicEntry {
                day,
                summary: stimulus.summary.clone(),
                valence: valence_delta,
                arousal: arousal_delta,
            },
        );
        let window = self.config.episodic_window_days;
        agent
            .episodic_memory
            .retain(|entry| day.saturating_sub(entry.day) <= window);
    }

    /// Record an interaction with `partner_id` on `day`.
    ///
    /// Keeps at most one entry per partner: the previous entry (if any) is
    /// folded into a fresh one, and entries outside the horizon are dropped.
    pub fn register_interaction(
        &self,
        agent: &mut AgentState,
        partner_id: &str,
        day: u64,
        reciprocity_delta: f64,
        given: f64,
        received: f64,
        sentiment: f64,
    ) {
        let horizon = self.config.social_memory_horizon_days;
        let mut previous: Option<SocialMemoryEntry> = None;
        agent.social_memory.retain(|entry| {
            if entry.partner_id == partner_id {
                previous = Some(entry.clone());
                return false;
            }
            day.saturating_sub(entry.last_interaction_day) <= horizon
        });

        let (prior_reciprocity, prior_given, prior_received, prior_sentiment) = previous
            .map(|entry| {
                (
                    entry.reciprocity,
                    entry.resources_given,
                    entry.resources_received,
                    entry.sentiment,
                )
            })
            .unwrap_or((0.0, 0.0, 0.0, 0.0));

        agent.social_memory.insert(
            0,
            SocialMemoryEntry {
                partner_id: partner_id.to_string(),
                last_interaction_day: day,
                reciprocity: (prior_reciprocity * 0.6 + reciprocity_delta).clamp(-1.0, 1.0),
                resources_given: prior_given + given,
                resources_received: prior_received + received,
                sentiment: (prior_sentiment * 0.5 + sentiment).clamp(-1.0, 1.0),
            },
        );
    }

    /// Evict memories that fell outside their windows.
    ///
    /// Interaction and stimulus registration already prune as they write;
    /// this daily sweep covers agents that went a whole day without either,
    /// keeping the horizon invariant unconditional.
    pub fn prune_memories(&self, agent: &mut AgentState, day: u64) {
        let horizon = self.config.social_memory_horizon_days;
        agent
            .social_memory
            .retain(|entry| day.saturating_sub(entry.last_interaction_day) <= horizon);
        let window = self.config.episodic_window_days;
        agent
            .episodic_memory
            .retain(|entry| day.saturating_sub(entry.day) <= window);
    }

    /// Fold the day's resource levels into semantic expectations (slow EMA).
    pub fn absorb_resource_outlook(&self, agent: &mut AgentState, level: &ResourceLevel) {
        let observations: [(&str, f64); 3] = [
            ("plants", level.plants),
            ("small_game", level.small_game),
            ("large_game", level.large_game),
        ];
        let expectations: &mut BTreeMap<String, f64> =
            &mut agent.semantic_memory.resource_expectations;
        for (key, observed) in observations {
            let entry = expectations.entry(key.to_string()).or_insert(observed);
            *entry = *entry * 0.8 + observed * 0.2;
        }
    }

    /// Produce a reflection string at most every `reflection_interval_days`.
    ///
    /// The three most recent episodic entries set the tone: optimistic when
    /// positive entries are at least as common as negative ones. Returns
    /// `None` when the interval has not elapsed or there is nothing to
    /// reflect on.
    pub fn reflect(&self, agent: &mut AgentState, day: u64) -> Option<String> {
        let interval = self.config.reflection_interval_days as i64;
        if agent.last_reflection_day >= 0 && (day as i64 - agent.last_reflection_day) < interval {
            return None;
        }
        if agent.episodic_memory.is_empty() {
            return None;
        }

        let recent = &agent.episodic_memory[..agent.episodic_memory.len().min(3)];
        let positive = recent.iter().filter(|entry| entry.valence > 0.0).count();
        let negative = recent.iter().filter(|entry| entry.valence < 0.0).count();
        let tone = if positive >= negative {
            "optimistic"
        } else {
            "concerned"
        };

        agent.last_reflection_day = day as i64;
        Some(format!(
            "{} feels {} looking back on {}",
            agent.name, tone, recent[0].summary
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{EmotionState, FehrSchmidt, PreferenceSet, SemanticMemory};
    use crate::config::tests::test_config;

    fn engine() -> CognitionEngine {
        CognitionEngine::new(test_config().cognition)
    }

    fn blank_agent(id: &str) -> AgentState {
        AgentState {
            id: id.to_string(),
            name: format!("Agent {id}"),
            camp_id: "Camp-A".to_string(),
            energy: 2.0,
            hunger_debt: 0.0,
            emotion: EmotionState {
                valence: 0.0,
                arousal: 0.2,
                mood: 0.0,
            },
            fehr_schmidt: FehrSchmidt {
                alpha: 0.6,
                beta: 0.3,
                reputation_weight: 0.5,
                norm_penalty: 0.3,
            },
            reputation: 0.5,
            skillset: BTreeMap::new(),
            preferences: PreferenceSet {
                comfort: 0.5,
                safety: 0.5,
                fairness: 0.5,
                company: 0.5,
                novelty: 0.5,
            },
            semantic_memory: SemanticMemory::default(),
            social_memory: Vec::new(),
            episodic_memory: Vec::new(),
            last_reflection_day: -1,
            last_actions: Vec::new(),
        }
    }

    fn stimulus(goal: f64, arousal: f64, summary: &str) -> EmotionStimulus {
        EmotionStimulus {
            goal_alignment: goal,
            norm_alignment: 0.0,
            preference_alignment: 0.0,
            arousal,
            summary: summary.to_string(),
        }
    }

    #[test]
    fn stimulus_moves_valence_with_decay() {
        let engine = engine();
        let mut agent = blank_agent("a");
        agent.emotion.valence = 0.5;
        engine.apply_stimulus(&mut agent, &stimulus(0.5, 0.1, "found berries"), 1);
        // 0.5 * (1 - 0.1) + 0.6 * 0.5 = 0.75
        assert!((agent.emotion.valence - 0.75).abs() < 1e-12);
        assert_eq!(agent.episodic_memory.len(), 1);
        assert_eq!(agent.episodic_memory[0].day, 1);
    }

    #[test]
    fn emotion_dimensions_stay_clamped() {
        let engine = engine();
        let mut agent = blank_agent("a");
        for day in 0..50 {
            engine.apply_stimulus(&mut agent, &stimulus(1.0, 1.0, "triumph"), day);
        }
        assert!(agent.emotion.valence <= 1.0);
        assert!(agent.emotion.arousal <= 1.5);
        assert!(agent.emotion.mood <= 1.0);
        for day in 50..100 {
            engine.apply_stimulus(&mut agent, &stimulus(-1.0, 0.0, "loss"), day);
        }
        assert!(agent.emotion.valence >= -1.0);
        assert!(agent.emotion.mood >= -1.0);
        assert!(agent.emotion.arousal >= 0.0);
    }

    #[test]
    fn episodic_window_evicts_stale_entries() {
        let engine = engine();
        let mut agent = blank_agent("a");
        engine.apply_stimulus(&mut agent, &stimulus(0.2, 0.0, "old"), 0);
        engine.apply_stimulus(&mut agent, &stimulus(0.2, 0.0, "recent"), 8);
        // Window is 7 days: the day-0 entry is out.
        assert_eq!(agent.episodic_memory.len(), 1);
        assert_eq!(agent.episodic_memory[0].summary, "recent");
    }

    #[test]
    fn one_social_entry_per_partner() {
        let engine = engine();
        let mut agent = blank_agent("a");
        engine.register_interaction(&mut agent, "b", 1, 0.5, 2.0, 1.0, 0.4);
        engine.register_interaction(&mut agent, "b", 3, 0.5, 1.0, 0.5, 0.2);
        assert_eq!(agent.social_memory.len(), 1);
        let entry = agent.social_entry("b").expect("entry");
        assert_eq!(entry.last_interaction_day, 3);
        // reciprocity: clamp(0.5 * 0.6 + 0.5) = 0.8
        assert!((entry.reciprocity - 0.8).abs() < 1e-12);
        assert!((entry.resources_given - 3.0).abs() < 1e-12);
        assert!((entry.resources_received - 1.5).abs() < 1e-12);
        // sentiment: 0.4 * 0.5 + 0.2 = 0.4
        assert!((entry.sentiment - 0.4).abs() < 1e-12);
    }

    #[test]
    fn social_horizon_prunes_silent_partners() {
        let engine = engine();
        let mut agent = blank_agent("a");
        engine.register_interaction(&mut agent, "b", 0, 0.2, 0.0, 0.0, 0.1);
        engine.register_interaction(&mut agent, "c", 20, 0.2, 0.0, 0.0, 0.1);
        // Horizon is 14: the day-0 entry for "b" is dropped when "c" lands.
        assert_eq!(agent.social_memory.len(), 1);
        assert!(agent.social_entry("b").is_none());
    }

    #[test]
    fn reflection_respects_interval_and_tone() {
        let engine = engine();
        let mut agent = blank_agent("a");
        engine.apply_stimulus(&mut agent, &stimulus(0.5, 0.1, "good hunt"), 1);
        let first = engine.reflect(&mut agent, 1).expect("first reflection");
        assert!(first.contains("optimistic"));
        assert!(engine.reflect(&mut agent, 2).is_none());
        engine.apply_stimulus(&mut agent, &stimulus(-0.8, 0.2, "injury"), 3);
        engine.apply_stimulus(&mut agent, &stimulus(-0.6, 0.2, "failed hunt"), 4);
        let second = engine.reflect(&mut agent, 4).expect("second reflection");
        assert!(second.contains("concerned"));
    }

    #[test]
    fn reflection_skips_empty_memory() {
        let engine = engine();
        let mut agent = blank_agent("a");
        assert!(engine.reflect(&mut agent, 5).is_none());
    }

    #[test]
    fn resource_outlook_converges_toward_levels() {
        let engine = engine();
        let mut agent = blank_agent("a");
        let level = ResourceLevel {
            plants: 10.0,
            small_game: 4.0,
            large_game: 2.0,
        };
        for _ in 0..40 {
            engine.absorb_resource_outlook(&mut agent, &level);
        }
        let expectation = agent.semantic_memory.resource_expectations["plants"];
        assert!((expectation - 10.0).abs() < 1e-6);
    }
}
