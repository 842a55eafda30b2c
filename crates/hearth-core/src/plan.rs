//! Daily plan exchange between the orchestrator and a plan decider.
//!
//! The decider sees a detached snapshot of the world and answers with an
//! ordered list of intents. The ordering is advisory: the planner still
//! enforces participant minimums. Deciders must not consume simulation RNG,
//! so the heuristic path stays bit-compatible with an unavailable LLM.

use serde::{Deserialize, Serialize};

use crate::agent::AgentState;
use crate::config::{SeasonName, TaskConfig};
use crate::environment::ResourceLevel;

/// Provider label stamped on heuristic plans.
pub const HEURISTIC_PROVIDER: &str = "heuristic";

/// What a plan item speaks about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanScope {
    /// Free-form plan covering the whole group (typical LLM output).
    Group,
    /// Allocation advice for a single task.
    Task,
    /// Nothing worth doing today.
    IdleDay,
}

/// One intent inside a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanItem {
    pub scope: PlanScope,
    pub intent: String,
    pub rationale: String,
    pub provider: String,
}

/// Ordered plan returned by a decider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanResponse {
    pub provider: String,
    pub items: Vec<PlanItem>,
}

/// Snapshot handed to a decider; every field is detached owned data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanRequest {
    pub scenario: String,
    /// Day about to be simulated.
    pub day: u64,
    pub season: SeasonName,
    pub resource_level: ResourceLevel,
    pub agents: Vec<AgentState>,
    pub pending_tasks: Vec<TaskConfig>,
    pub plan_template: String,
}

/// Source of daily plans.
pub trait PlanDecider: Send {
    fn plan(&mut self, request: &PlanRequest) -> PlanResponse;
}

/// Deterministic fallback decider; also the terminal step of the LLM chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPlanner;

impl PlanDecider for HeuristicPlanner {
    fn plan(&mut self, request: &PlanRequest) -> PlanResponse {
        heuristic_plan(request)
    }
}

/// One allocation item per pending task, or a single idle-day item.
#[must_use]
pub fn heuristic_plan(request: &PlanRequest) -> PlanResponse {
    if request.pending_tasks.is_empty() {
        return PlanResponse {
            provider: HEURISTIC_PROVIDER.to_string(),
            items: vec![PlanItem {
                scope: PlanScope::IdleDay,
                intent: "idle_day".to_string(),
                rationale: "no_pending_tasks".to_string(),
                provider: HEURISTIC_PROVIDER.to_string(),
            }],
        };
    }

    let items = request
        .pending_tasks
        .iter()
        .map(|task| PlanItem {
            scope: PlanScope::Task,
            intent: format!(
                "allocate {} participants to {}",
                task.recommended_participants, task.id
            ),
            rationale: "heuristic_allocation".to_string(),
            provider: HEURISTIC_PROVIDER.to_string(),
        })
        .collect();

    PlanResponse {
        provider: HEURISTIC_PROVIDER.to_string(),
        items,
    }
}

/// Reorder tasks by the plan: each task ranks at the first item whose
/// lowercased intent mentions its id or name; unmatched tasks sort last.
/// The sort is stable, so equal ranks keep config order.
#[must_use]
pub fn order_tasks_by_plan(tasks: &[TaskConfig], response: &PlanResponse) -> Vec<TaskConfig> {
    let mut ranked: Vec<(usize, TaskConfig)> = tasks
        .iter()
        .map(|task| {
            let id = task.id.to_lowercase();
            let name = task.name.to_lowercase();
            let rank = response
                .items
                .iter()
                .position(|item| {
                    let intent = item.intent.to_lowercase();
                    intent.contains(&id) || intent.contains(&name)
                })
                .unwrap_or(response.items.len());
            (rank, task.clone())
        })
        .collect();
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().map(|(_, task)| task).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::config::{TaskCategory, TaskNorm};

    fn task(id: &str, name: &str) -> TaskConfig {
        TaskConfig {
            id: id.to_string(),
            name: name.to_string(),
            category: TaskCategory::Foraging,
            success_probability: 0.5,
            yield_per_participant: Some(1.0),
            yield_per_participant_on_success: None,
            energy_cost: 0.5,
            injury_risk_multiplier: 0.1,
            min_participants: 1,
            recommended_participants: 2,
            norm: TaskNorm::EqualShare,
        }
    }

    fn request_with_tasks(tasks: Vec<TaskConfig>) -> PlanRequest {
        let config = test_config();
        PlanRequest {
            scenario: config.name.clone(),
            day: 1,
            season: SeasonName::Spring,
            resource_level: ResourceLevel::default(),
            agents: Vec::new(),
            pending_tasks: tasks,
            plan_template: config.llm.plan_template,
        }
    }

    #[test]
    fn heuristic_emits_one_item_per_task() {
        let request =
            request_with_tasks(vec![task("gather_berries", "Gather"), task("hunt_deer", "Hunt")]);
        let response = heuristic_plan(&request);
        assert_eq!(response.provider, HEURISTIC_PROVIDER);
        assert_eq!(response.items.len(), 2);
        for item in &response.items {
            assert_eq!(item.provider, HEURISTIC_PROVIDER);
            assert_eq!(item.rationale, "heuristic_allocation");
            assert_eq!(item.scope, PlanScope::Task);
        }
        assert_eq!(
            response.items[0].intent,
            "allocate 2 participants to gather_berries"
        );
    }

    #[test]
    fn heuristic_emits_idle_day_without_tasks() {
        let response = heuristic_plan(&request_with_tasks(Vec::new()));
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].scope, PlanScope::IdleDay);
        assert_eq!(response.items[0].intent, "idle_day");
    }

    #[test]
    fn ordering_follows_plan_mentions() {
        let tasks = vec![task("gather_berries", "Gather"), task("hunt_deer", "Hunt")];
        let response = PlanResponse {
            provider: "test".to_string(),
            items: vec![
                PlanItem {
                    scope: PlanScope::Group,
                    intent: "Start with HUNT_DEER while the herd is close".to_string(),
                    rationale: "r".to_string(),
                    provider: "test".to_string(),
                },
                PlanItem {
                    scope: PlanScope::Group,
                    intent: "then gather_berries".to_string(),
                    rationale: "r".to_string(),
                    provider: "test".to_string(),
                },
            ],
        };
        let ordered = order_tasks_by_plan(&tasks, &response);
        assert_eq!(ordered[0].id, "hunt_deer");
        assert_eq!(ordered[1].id, "gather_berries");
    }

    #[test]
    fn unmatched_tasks_keep_config_order_after_matched() {
        let tasks = vec![
            task("fish_river", "Fish"),
            task("gather_berries", "Gather"),
            task("hunt_deer", "Hunt"),
        ];
        let response = PlanResponse {
            provider: "test".to_string(),
            items: vec![PlanItem {
                scope: PlanScope::Group,
                intent: "focus on gather_berries today".to_string(),
                rationale: "r".to_string(),
                provider: "test".to_string(),
            }],
        };
        let ordered = order_tasks_by_plan(&tasks, &response);
        assert_eq!(ordered[0].id, "gather_berries");
        // Unmatched tasks sort after, preserving their relative order.
        assert_eq!(ordered[1].id, "fish_river");
        assert_eq!(ordered[2].id, "hunt_deer");
    }

    #[test]
    fn task_name_matches_too() {
        let tasks = vec![task("task_a", "Berry Walk"), task("task_b", "Deer Drive")];
        let response = PlanResponse {
            provider: "test".to_string(),
            items: vec![PlanItem {
                scope: PlanScope::Group,
                intent: "the deer drive comes first".to_string(),
                rationale: "r".to_string(),
                provider: "test".to_string(),
            }],
        };
        let ordered = order_tasks_by_plan(&tasks, &response);
        assert_eq!(ordered[0].id, "task_b");
    }
}
