//! Weighted directed social network with decay and reinforcement.
//!
//! Edges are keyed by `(source, target)` id pairs in a `BTreeMap`, so
//! iteration order is deterministic and agents are referenced by id only;
//! snapshots carry no pointers and no cycles.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Edges lighter than this are forgotten entirely.
pub const MIN_EDGE_WEIGHT: f64 = 0.01;

/// One serialized edge; weight is always `>= MIN_EDGE_WEIGHT`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkEdge {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

/// Serializable snapshot of the network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkState {
    pub edges: Vec<NetworkEdge>,
    pub forget_factor: f64,
    pub camp_membership: BTreeMap<String, String>,
}

/// Aggregate graph statistics reported with daily metrics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct NetworkStats {
    /// Fraction of edges whose reverse edge also exists.
    pub reciprocity: f64,
    /// Fraction of same-camp edges; 0.5 when no endpoint camps are known.
    pub assortativity: f64,
    /// Closed over open triads on the out-neighbor sets.
    pub clustering: f64,
}

/// Live weighted directed graph over agent ids.
#[derive(Debug, Clone, PartialEq)]
pub struct SocialNetwork {
    edges: BTreeMap<(String, String), f64>,
    forget_factor: f64,
    camp_membership: BTreeMap<String, String>,
}

impl SocialNetwork {
    /// Empty network with the given forget factor and camp roster.
    #[must_use]
    pub fn new(forget_factor: f64, camp_membership: BTreeMap<String, String>) -> Self {
        Self {
            edges: BTreeMap::new(),
            forget_factor,
            camp_membership,
        }
    }

    /// Rebuild a live network from a snapshot.
    #[must_use]
    pub fn from_state(state: &NetworkState) -> Self {
        let mut edges = BTreeMap::new();
        for edge in &state.edges {
            edges.insert((edge.source.clone(), edge.target.clone()), edge.weight);
        }
        Self {
            edges,
            forget_factor: state.forget_factor,
            camp_membership: state.camp_membership.clone(),
        }
    }

    /// Snapshot for serialization; edges in key order.
    #[must_use]
    pub fn snapshot(&self) -> NetworkState {
        NetworkState {
            edges: self
                .edges
                .iter()
                .map(|((source, target), weight)| NetworkEdge {
                    source: source.clone(),
                    target: target.clone(),
                    weight: *weight,
                })
                .collect(),
            forget_factor: self.forget_factor,
            camp_membership: self.camp_membership.clone(),
        }
    }

    /// Multiply every weight by `1 - forget_factor` and drop edges that
    /// fall under [`MIN_EDGE_WEIGHT`].
    pub fn apply_decay(&mut self) {
        let keep = 1.0 - self.forget_factor;
        for weight in self.edges.values_mut() {
            *weight *= keep;
        }
        self.edges.retain(|_, weight| *weight >= MIN_EDGE_WEIGHT);
    }

    /// Add `delta` onto the `(source, target)` edge, creating it if absent.
    pub fn reinforce(&mut self, source: &str, target: &str, delta: f64) {
        let entry = self
            .edges
            .entry((source.to_string(), target.to_string()))
            .or_insert(0.0);
        *entry += delta;
    }

    /// Current weight of an edge, if present.
    #[must_use]
    pub fn weight(&self, source: &str, target: &str) -> Option<f64> {
        self.edges
            .get(&(source.to_string(), target.to_string()))
            .copied()
    }

    /// Number of live edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Reciprocity, assortativity, and clustering over the current edges.
    #[must_use]
    pub fn stats(&self) -> NetworkStats {
        let edge_count = self.edges.len();

        let reciprocity = if edge_count == 0 {
            0.0
        } else {
            let mutual = self
                .edges
                .keys()
                .filter(|(source, target)| {
                    self.edges.contains_key(&(target.clone(), source.clone()))
                })
                .count();
            mutual as f64 / edge_count as f64
        };

        let mut known = 0usize;
        let mut same_camp = 0usize;
        for (source, target) in self.edges.keys() {
            let (Some(a), Some(b)) = (
                self.camp_membership.get(source),
                self.camp_membership.get(target),
            ) else {
                continue;
            };
            known += 1;
            if a == b {
                same_camp += 1;
            }
        }
        let assortativity = if known == 0 {
            0.5
        } else {
            same_camp as f64 / known as f64
        };

        NetworkStats {
            reciprocity,
            assortativity,
            clustering: self.clustering(),
        }
    }

    /// Closed/open triad ratio over out-neighbor sets; 0 with no open triads.
    fn clustering(&self) -> f64 {
        let mut out_neighbors: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (source, target) in self.edges.keys() {
            out_neighbors
                .entry(source.as_str())
                .or_default()
                .insert(target.as_str());
        }

        let mut open = 0usize;
        let mut closed = 0usize;
        for neighbors in out_neighbors.values() {
            let list: Vec<&str> = neighbors.iter().copied().collect();
            for i in 0..list.len() {
                for j in (i + 1)..list.len() {
                    open += 1;
                    let forward = (list[i].to_string(), list[j].to_string());
                    let backward = (list[j].to_string(), list[i].to_string());
                    if self.edges.contains_key(&forward) || self.edges.contains_key(&backward) {
                        closed += 1;
                    }
                }
            }
        }
        if open == 0 {
            0.0
        } else {
            closed as f64 / open as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camped(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(id, camp)| (id.to_string(), camp.to_string()))
            .collect()
    }

    #[test]
    fn reinforce_creates_then_accumulates() {
        let mut network = SocialNetwork::new(0.1, BTreeMap::new());
        network.reinforce("a", "b", 0.3);
        network.reinforce("a", "b", 0.2);
        assert!((network.weight("a", "b").unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(network.edge_count(), 1);
    }

    #[test]
    fn decay_scales_and_prunes() {
        let mut network = SocialNetwork::new(0.5, BTreeMap::new());
        network.reinforce("a", "b", 0.4);
        network.reinforce("b", "c", 0.015);
        network.apply_decay();
        assert!((network.weight("a", "b").unwrap() - 0.2).abs() < 1e-12);
        // 0.015 * 0.5 = 0.0075 < MIN_EDGE_WEIGHT: forgotten.
        assert!(network.weight("b", "c").is_none());
    }

    #[test]
    fn mutual_edges_give_full_reciprocity_after_decay() {
        let mut network = SocialNetwork::new(0.1, BTreeMap::new());
        network.reinforce("a", "b", 1.0);
        network.reinforce("b", "a", 1.0);
        network.apply_decay();
        let stats = network.stats();
        assert!((stats.reciprocity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn assortativity_defaults_when_camps_unknown() {
        let mut network = SocialNetwork::new(0.0, BTreeMap::new());
        network.reinforce("a", "b", 1.0);
        assert!((network.stats().assortativity - 0.5).abs() < 1e-12);
    }

    #[test]
    fn assortativity_counts_same_camp_edges() {
        let camps = camped(&[("a", "Camp-A"), ("b", "Camp-A"), ("c", "Camp-B")]);
        let mut network = SocialNetwork::new(0.0, camps);
        network.reinforce("a", "b", 1.0);
        network.reinforce("a", "c", 1.0);
        assert!((network.stats().assortativity - 0.5).abs() < 1e-12);
        network.reinforce("b", "a", 1.0);
        assert!((network.stats().assortativity - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn clustering_detects_closed_triads() {
        let mut network = SocialNetwork::new(0.0, BTreeMap::new());
        network.reinforce("a", "b", 1.0);
        network.reinforce("a", "c", 1.0);
        assert_eq!(network.stats().clustering, 0.0);
        network.reinforce("b", "c", 1.0);
        assert!((network.stats().clustering - 1.0).abs() < 1e-12);
    }

    #[test]
    fn snapshot_round_trips() {
        let camps = camped(&[("a", "Camp-A"), ("b", "Camp-B")]);
        let mut network = SocialNetwork::new(0.2, camps);
        network.reinforce("a", "b", 0.7);
        network.reinforce("b", "a", 0.4);
        let state = network.snapshot();
        let restored = SocialNetwork::from_state(&state);
        assert_eq!(network, restored);
        assert_eq!(state.edges.len(), 2);
    }
}
