//! LLM decision layer for Hearth.
//!
//! Assembles the daily-plan prompt and walks an ordered chain of provider
//! adapters. Any adapter failure falls through to the next enabled one;
//! when the chain is exhausted (or empty) the deterministic heuristic from
//! `hearth-core` answers instead, so transport problems never reach the
//! orchestrator.
//!
//! The simulation engine is synchronous; this crate owns a small Tokio
//! runtime and bridges with `block_on`, keeping all async plumbing on this
//! side of the [`PlanDecider`] boundary.

pub mod adapters;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use hearth_core::plan::{heuristic_plan, PlanDecider, PlanRequest, PlanResponse};

/// Failures an adapter can report; all of them are recoverable by falling
/// through to the next adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed reply: {0}")]
    Malformed(String),
}

/// One LLM backend in the fallback chain.
#[async_trait]
pub trait PlanAdapter: Send + Sync {
    /// Stable provider label stamped onto plan items.
    fn provider(&self) -> &'static str;

    /// Whether the adapter has the configuration it needs to be tried.
    fn is_enabled(&self) -> bool;

    /// Ask the backend for a plan.
    async fn generate_plan(
        &self,
        prompt: &str,
        request: &PlanRequest,
    ) -> Result<PlanResponse, AdapterError>;
}

/// Assemble the daily-plan prompt: scenario, season, a two-decimal resource
/// summary, the task roster, and the scenario's plan template.
#[must_use]
pub fn build_prompt(request: &PlanRequest) -> String {
    let resources = &request.resource_level;
    let tasks = request
        .pending_tasks
        .iter()
        .map(|task| {
            format!(
                "{} ({}, wants {}-{} workers)",
                task.id,
                task.category.label(),
                task.min_participants,
                task.recommended_participants
            )
        })
        .collect::<Vec<_>>()
        .join("; ");
    format!(
        "Scenario {}, day {}, season {}. Resources: plants {:.2}, small game {:.2}, large game {:.2}. Tasks: {}. {}",
        request.scenario,
        request.day,
        request.season.label(),
        resources.plants,
        resources.small_game,
        resources.large_game,
        tasks,
        request.plan_template
    )
}

/// Ordered adapter chain ending in the heuristic fallback.
pub struct LlmDecisionCore {
    adapters: Vec<Box<dyn PlanAdapter>>,
    runtime: tokio::runtime::Runtime,
}

impl LlmDecisionCore {
    /// Build the default chain from environment variables (the only place
    /// this crate reads the environment).
    pub fn from_env() -> std::io::Result<Self> {
        Self::with_adapters(adapters::default_chain())
    }

    /// Build a core over an explicit adapter list (used by tests and by
    /// callers that disable the LLM entirely with an empty list).
    pub fn with_adapters(adapters: Vec<Box<dyn PlanAdapter>>) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { adapters, runtime })
    }

    async fn plan_async(&self, request: &PlanRequest) -> PlanResponse {
        let prompt = build_prompt(request);
        for adapter in &self.adapters {
            if !adapter.is_enabled() {
                continue;
            }
            info!(
                event = "llm_plan_start",
                provider = adapter.provider(),
                day = request.day,
                "requesting daily plan"
            );
            match adapter.generate_plan(&prompt, request).await {
                Ok(response) => {
                    info!(
                        event = "llm_plan_success",
                        provider = adapter.provider(),
                        day = request.day,
                        items = response.items.len(),
                        "plan received"
                    );
                    return response;
                }
                Err(error) => {
                    warn!(
                        event = "llm_plan_error",
                        provider = adapter.provider(),
                        day = request.day,
                        %error,
                        "adapter failed, trying next"
                    );
                }
            }
        }
        heuristic_plan(request)
    }
}

impl PlanDecider for LlmDecisionCore {
    fn plan(&mut self, request: &PlanRequest) -> PlanResponse {
        self.runtime.block_on(self.plan_async(request))
    }
}
