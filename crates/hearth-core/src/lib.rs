//! Core simulation engine for the Hearth cooperation simulator.
//!
//! A Hearth run advances a small foraging society one day at a time. Each
//! day the orchestrator asks a plan decider for a task ordering, ticks the
//! seasonal environment, assigns agents to tasks, distributes rewards under
//! fairness norms, updates agent cognition and the social network, and
//! emits metrics plus a serializable snapshot.
//!
//! Everything in this crate is synchronous and deterministic: the only
//! source of randomness is the seeded [`rng::SimRng`] stream, and the only
//! external call per day (the plan decider) never touches that stream.
//! Persistence and HTTP live in sibling crates behind the [`store::RunStore`]
//! and [`plan::PlanDecider`] contracts.

pub mod agent;
pub mod cognition;
pub mod config;
pub mod environment;
pub mod network;
pub mod plan;
pub mod planner;
pub mod rng;
pub mod simulation;
pub mod store;

pub use agent::{AgentState, EmotionState, EpisodicEntry, FehrSchmidt, PreferenceSet, SocialMemoryEntry};
pub use config::{
    ConfigError, HazardRates, ScenarioConfig, SeasonName, TaskCategory, TaskConfig, TaskNorm,
};
pub use environment::{EnvironmentState, ResourceLevel};
pub use network::{NetworkState, NetworkStats, SocialNetwork};
pub use plan::{HeuristicPlanner, PlanDecider, PlanItem, PlanRequest, PlanResponse, PlanScope};
pub use planner::{DailyMetrics, TaskExecution};
pub use rng::SimRng;
pub use simulation::{
    CausalLink, LogKind, Simulation, SimulationError, SimulationLogEntry, SimulationState,
    StepOutcome,
};
pub use store::{RunId, RunStatus, RunStore, StoreError, StoredRun};
