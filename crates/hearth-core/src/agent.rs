//! Per-agent mutable state.
//!
//! Every field is owned data (strings, maps, vectors), so a derived
//! [`Clone`] is a fully detached deep copy. Snapshots handed to the planner
//! and the plan decider rely on that: nothing in a cloned agent aliases the
//! live run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Dimensional emotion state updated by stimuli each day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EmotionState {
    /// Pleasantness in `[-1, 1]`.
    pub valence: f64,
    /// Activation in `[0, 1.5]`.
    pub arousal: f64,
    /// Slow-moving aggregate in `[-1, 1]`.
    pub mood: f64,
}

/// Inequality-aversion parameters plus the social weighting knobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FehrSchmidt {
    /// Envy coefficient; non-negative.
    pub alpha: f64,
    /// Guilt coefficient; non-negative.
    pub beta: f64,
    /// How much reputation weighs in social judgements, in `[0, 1]`.
    pub reputation_weight: f64,
    /// Tolerance threshold for below-norm shares, in `[0, 1]`.
    pub norm_penalty: f64,
}

/// The five preference sliders, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PreferenceSet {
    pub comfort: f64,
    pub safety: f64,
    pub fairness: f64,
    pub company: f64,
    pub novelty: f64,
}

/// Slowly-learned expectations about the world.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SemanticMemory {
    /// Resource kind to expected daily level, EMA-updated.
    pub resource_expectations: BTreeMap<String, f64>,
    /// Expected fairness of reward shares, in `[-1, 1]`.
    pub norm_expectation: f64,
}

/// One remembered relationship; at most one entry per partner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocialMemoryEntry {
    pub partner_id: String,
    pub last_interaction_day: u64,
    /// Running reciprocity estimate in `[-1, 1]`.
    pub reciprocity: f64,
    pub resources_given: f64,
    pub resources_received: f64,
    /// Running sentiment in `[-1, 1]`.
    pub sentiment: f64,
}

/// One remembered event inside the episodic window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodicEntry {
    pub day: u64,
    pub summary: String,
    /// Valence delta the event carried; sign drives reflection tone.
    pub valence: f64,
    pub arousal: f64,
}

/// Full mutable state of one agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentState {
    pub id: String,
    pub name: String,
    pub camp_id: String,
    /// Stored energy; never negative.
    pub energy: f64,
    /// Accumulated shortfall below the half-need threshold.
    pub hunger_debt: f64,
    pub emotion: EmotionState,
    pub fehr_schmidt: FehrSchmidt,
    /// Standing in the group, in `[0, 1]`.
    pub reputation: f64,
    /// Skill name to proficiency in `[0, 1.2]`.
    pub skillset: BTreeMap<String, f64>,
    pub preferences: PreferenceSet,
    pub semantic_memory: SemanticMemory,
    /// Newest-first; at most one entry per partner, pruned to the horizon.
    pub social_memory: Vec<SocialMemoryEntry>,
    /// Newest-first; pruned to the episodic window.
    pub episodic_memory: Vec<EpisodicEntry>,
    /// Day of the last reflection, or -1 before the first one.
    pub last_reflection_day: i64,
    /// Most recent task ids, newest first.
    pub last_actions: Vec<String>,
}

impl AgentState {
    /// Proficiency for a skill key, defaulting to 0.5 when untracked.
    #[must_use]
    pub fn skill(&self, key: &str) -> f64 {
        self.skillset.get(key).copied().unwrap_or(0.5)
    }

    /// Social memory entry for a partner, if one survives the horizon.
    #[must_use]
    pub fn social_entry(&self, partner_id: &str) -> Option<&SocialMemoryEntry> {
        self.social_memory
            .iter()
            .find(|entry| entry.partner_id == partner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_agent() -> AgentState {
        AgentState {
            id: "agent-1".to_string(),
            name: "Agent 1".to_string(),
            camp_id: "Camp-A".to_string(),
            energy: 2.4,
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
            skillset: BTreeMap::from([("hunting".to_string(), 0.8)]),
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

    #[test]
    fn skill_defaults_to_half() {
        let agent = sample_agent();
        assert_eq!(agent.skill("hunting"), 0.8);
        assert_eq!(agent.skill("gathering"), 0.5);
    }

    #[test]
    fn clone_is_fully_detached() {
        let mut agent = sample_agent();
        let copy = agent.clone();
        agent.skillset.insert("hunting".to_string(), 0.1);
        agent.last_actions.push("hunt_deer".to_string());
        assert_eq!(copy.skill("hunting"), 0.8);
        assert!(copy.last_actions.is_empty());
    }
}
