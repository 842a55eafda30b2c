//! Daily task assignment, reward distribution, and cooperation metrics.
//!
//! Assignment reads detached agent snapshots and returns executions; the
//! orchestrator applies them to the live population afterwards. The RNG
//! draw order per day is fixed: one Fisher–Yates shuffle up front, then per
//! executed task one success draw followed by one injury draw per
//! participant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::agent::AgentState;
use crate::config::{HazardConfig, TaskCategory, TaskConfig, TaskNorm};
use crate::environment::ResourceLevel;
use crate::rng::SimRng;

/// Hunting candidates below this proficiency are turned away.
pub const HUNTING_SKILL_FLOOR: f64 = 0.3;

/// Task id the idle fallback looks for.
pub const IDLE_TASK_ID: &str = "camp_maintenance";

/// Outcome of one executed (or idle-fallback) task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskExecution {
    pub task_id: String,
    pub category: TaskCategory,
    pub norm: TaskNorm,
    pub participants: Vec<String>,
    pub success: bool,
    pub success_probability: f64,
    /// Reward pool distributed among the participants; shares sum to it
    /// (except under `CollectivePenalty`, which zeroes the shares).
    pub total_reward: f64,
    pub shares: BTreeMap<String, f64>,
    pub energy_costs: BTreeMap<String, f64>,
    pub injuries: Vec<String>,
    /// True for the bulk idle-fallback assignment.
    pub idle: bool,
}

/// Six aggregate scalars describing one simulated day.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DailyMetrics {
    pub cooperation_rate: f64,
    pub energy_balance: f64,
    pub risk_incidents: u64,
    pub inequality_index: f64,
    pub assortativity: f64,
    pub reciprocity: f64,
}

/// Fehr–Schmidt inequality-averse utility of holding `own` next to
/// `others`. Equals `own` when every share is identical.
#[must_use]
pub fn fehr_schmidt_utility(own: f64, others: &[f64], alpha: f64, beta: f64) -> f64 {
    if others.is_empty() {
        return own;
    }
    let count = others.len() as f64;
    let envy: f64 = others.iter().map(|other| (other - own).max(0.0)).sum::<f64>() / count;
    let guilt: f64 = others.iter().map(|other| (own - other).max(0.0)).sum::<f64>() / count;
    own - alpha * envy - beta * guilt
}

/// Assign agents to tasks in the given order and sample outcomes.
///
/// Tasks that cannot reach `min_participants` (after the hunting skill
/// gate) are skipped and leave the pool untouched. Agents left over at the
/// end are bulk-assigned to the `camp_maintenance` task when the roster has
/// one.
pub fn assign_tasks(
    rng: &mut SimRng,
    agents: &[AgentState],
    resources: &ResourceLevel,
    hazards: &HazardConfig,
    tasks: &[TaskConfig],
) -> Vec<TaskExecution> {
    let mut order: Vec<usize> = (0..agents.len()).collect();
    rng.shuffle(&mut order);
    let mut available = vec![true; agents.len()];
    let mut available_count = agents.len();
    let mut executions = Vec::new();

    for task in tasks {
        let need = task.recommended_participants.min(available_count);
        if need < task.min_participants {
            continue;
        }

        let mut taken: Vec<usize> = Vec::new();
        for &index in &order {
            if taken.len() >= need {
                break;
            }
            if !available[index] {
                continue;
            }
            let agent = &agents[index];
            if task.category == TaskCategory::Hunting
                && agent.skill("hunting") < HUNTING_SKILL_FLOOR
            {
                continue;
            }
            taken.push(index);
        }
        // Releasing on shortfall is implicit: nothing was marked taken yet.
        if taken.len() < task.min_participants {
            continue;
        }

        let resource_level = resources.for_category(task.category);
        let skill_key = task.category.skill_key();
        let average_skill = taken
            .iter()
            .map(|&index| agents[index].skill(skill_key))
            .sum::<f64>()
            / taken.len() as f64;
        let surplus = taken.len().saturating_sub(task.min_participants) as f64;
        let resource_term = if resource_level > 0.0 {
            0.05 * (1.0 + resource_level).ln()
        } else {
            -0.1
        };
        let success_probability = (task.success_probability
            + 0.05 * surplus
            + 0.1 * (average_skill - 0.5)
            + resource_term)
            .clamp(0.0, 1.0);
        let success = rng.next() < success_probability;

        let total_reward = if let Some(per_participant) = task.yield_per_participant {
            if success {
                per_participant * taken.len() as f64
            } else {
                0.0
            }
        } else if let Some(flat) = task.yield_per_participant_on_success {
            if success {
                flat
            } else {
                0.0
            }
        } else {
            0.0
        };

        let shares = distribute_reward(task.norm, total_reward, &taken, agents, skill_key);

        let mut energy_costs = BTreeMap::new();
        for &index in &taken {
            let agent = &agents[index];
            let multiplier = if task.category == TaskCategory::Hunting {
                1.0 + (1.0 - agent.skill("hunting")) * 0.2
            } else {
                1.0
            };
            energy_costs.insert(agent.id.clone(), task.energy_cost * multiplier);
        }

        let injury_scale = if success { 0.7 } else { 1.1 };
        let risk = (task.injury_risk_multiplier * hazards.base.injury).clamp(0.0, 1.0);
        let mut injuries = Vec::new();
        for &index in &taken {
            if rng.next() < risk * injury_scale {
                injuries.push(agents[index].id.clone());
            }
        }

        for &index in &taken {
            available[index] = false;
        }
        available_count -= taken.len();

        executions.push(TaskExecution {
            task_id: task.id.clone(),
            category: task.category,
            norm: task.norm,
            participants: taken.iter().map(|&index| agents[index].id.clone()).collect(),
            success,
            success_probability,
            total_reward,
            shares,
            energy_costs,
            injuries,
            idle: false,
        });
    }

    if available_count > 0 {
        if let Some(idle_task) = tasks.iter().find(|task| task.id == IDLE_TASK_ID) {
            let leftover: Vec<String> = order
                .iter()
                .filter(|&&index| available[index])
                .map(|&index| agents[index].id.clone())
                .collect();
            let zeroes: BTreeMap<String, f64> =
                leftover.iter().map(|id| (id.clone(), 0.0)).collect();
            executions.push(TaskExecution {
                task_id: idle_task.id.clone(),
                category: idle_task.category,
                norm: idle_task.norm,
                participants: leftover,
                success: true,
                success_probability: 1.0,
                total_reward: 0.0,
                shares: zeroes.clone(),
                energy_costs: zeroes,
                injuries: Vec::new(),
                idle: true,
            });
        }
    }

    executions
}

/// Split the reward pool among `taken` according to the task norm.
fn distribute_reward(
    norm: TaskNorm,
    total: f64,
    taken: &[usize],
    agents: &[AgentState],
    skill_key: &str,
) -> BTreeMap<String, f64> {
    let mut shares = BTreeMap::new();
    if taken.is_empty() {
        return shares;
    }
    let count = taken.len() as f64;

    match norm {
        TaskNorm::EqualShare => {
            let each = total / count;
            for &index in taken {
                shares.insert(agents[index].id.clone(), each);
            }
        }
        TaskNorm::ProportionalSkill => {
            let weights: Vec<f64> = taken
                .iter()
                .map(|&index| agents[index].skill(skill_key))
                .collect();
            let weight_sum: f64 = weights.iter().sum();
            if weight_sum <= f64::EPSILON {
                let each = total / count;
                for &index in taken {
                    shares.insert(agents[index].id.clone(), each);
                }
            } else {
                for (&index, weight) in taken.iter().zip(&weights) {
                    shares.insert(agents[index].id.clone(), total * weight / weight_sum);
                }
            }
        }
        TaskNorm::KeyContributorReward => {
            let bonus_pool = total * 0.25;
            let base_each = total * 0.75 / count;
            let top_count = (taken.len() / 3).max(1).min(taken.len());
            let bonus_each = bonus_pool / top_count as f64;

            // Stable sort keeps assignment order among equally-skilled
            // contributors.
            let mut ranked: Vec<usize> = (0..taken.len()).collect();
            ranked.sort_by(|&a, &b| {
                let skill_a = agents[taken[a]].skill(skill_key);
                let skill_b = agents[taken[b]].skill(skill_key);
                skill_b
                    .partial_cmp(&skill_a)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            for (position, &slot) in ranked.iter().enumerate() {
                let id = agents[taken[slot]].id.clone();
                let mut share = base_each;
                if position < top_count {
                    share += bonus_each;
                }
                shares.insert(id, share);
            }
        }
        TaskNorm::CollectivePenalty => {
            for &index in taken {
                shares.insert(agents[index].id.clone(), 0.0);
            }
        }
    }

    shares
}

/// Aggregate the day's executions into cooperation metrics.
///
/// Network assortativity and reciprocity are merged in by the orchestrator
/// afterwards and start at zero here.
#[must_use]
pub fn evaluate_cooperation(executions: &[TaskExecution], agents: &[AgentState]) -> DailyMetrics {
    if executions.is_empty() {
        return DailyMetrics::default();
    }

    let cooperation_rate = executions
        .iter()
        .filter(|execution| execution.participants.len() > 1)
        .count() as f64
        / executions.len() as f64;

    let reward_sum: f64 = executions.iter().map(|execution| execution.total_reward).sum();
    let cost_sum: f64 = executions
        .iter()
        .flat_map(|execution| execution.energy_costs.values())
        .sum();
    let risk_incidents = executions
        .iter()
        .map(|execution| execution.injuries.len() as u64)
        .sum();

    let by_id: BTreeMap<&str, &AgentState> =
        agents.iter().map(|agent| (agent.id.as_str(), agent)).collect();
    let mut utility_sum = 0.0;
    let mut samples = 0usize;
    for execution in executions {
        let shares: Vec<f64> = execution
            .participants
            .iter()
            .map(|id| execution.shares.get(id).copied().unwrap_or(0.0))
            .collect();
        for (slot, id) in execution.participants.iter().enumerate() {
            let Some(agent) = by_id.get(id.as_str()) else {
                continue;
            };
            let others: Vec<f64> = shares
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != slot)
                .map(|(_, share)| *share)
                .collect();
            utility_sum += fehr_schmidt_utility(
                shares[slot],
                &others,
                agent.fehr_schmidt.alpha,
                agent.fehr_schmidt.beta,
            );
            samples += 1;
        }
    }
    let inequality_index = if samples == 0 {
        0.0
    } else {
        utility_sum / samples as f64
    };

    DailyMetrics {
        cooperation_rate,
        energy_balance: reward_sum - cost_sum,
        risk_incidents,
        inequality_index,
        assortativity: 0.0,
        reciprocity: 0.0,
    }
}
