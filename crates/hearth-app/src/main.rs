mod registry;
mod scenarios;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use hearth_core::{
    HeuristicPlanner, PlanDecider, RunId, RunStatus, RunStore, Simulation, SimulationState,
};
use hearth_llm::LlmDecisionCore;
use hearth_storage::RunStorage;

use crate::registry::ScenarioRegistry;

#[derive(Parser, Debug)]
#[command(name = "hearth", version, about = "Hearth cooperation simulator")]
struct AppCli {
    /// Scenario name to run.
    #[arg(long, default_value = "river-camp")]
    scenario: String,

    /// Seed for the deterministic RNG stream.
    #[arg(long, default_value_t = 42)]
    seed: u32,

    /// Number of days to simulate.
    #[arg(long, default_value_t = 30)]
    days: u32,

    /// DuckDB database path; ":memory:" keeps the run in memory.
    #[arg(long, env = "HEARTH_STORAGE_PATH", default_value = "hearth.db")]
    storage_path: String,

    /// Resume an existing run id instead of starting fresh.
    #[arg(long)]
    resume: Option<RunId>,

    /// Skip the LLM adapter chain and plan heuristically.
    #[arg(long)]
    no_llm: bool,

    /// List registered scenarios and exit.
    #[arg(long)]
    list_scenarios: bool,
}

fn main() -> Result<()> {
    let cli = AppCli::parse();
    init_tracing();

    let registry = ScenarioRegistry::builtin()?;
    if cli.list_scenarios {
        for name in registry.names() {
            let config = registry.get(name).expect("registered scenario");
            println!("{name}: {}", config.display_name);
        }
        return Ok(());
    }

    let mut storage = open_storage(&cli.storage_path)?;
    let (mut simulation, run_id) = bootstrap_run(&cli, &registry, &mut storage)?;

    for _ in 0..cli.days {
        let outcome = simulation.step_day();
        let day = outcome.state.environment.day;

        let state_json = outcome.state.to_json()?;
        storage.patch_run_state(run_id, &state_json, day)?;
        storage.append_daily_metrics(run_id, day, &outcome.metrics)?;
        storage.append_events(run_id, &outcome.logs)?;
        let edges_json = serde_json::to_string(&outcome.state.network.edges)?;
        storage.append_network_snapshot(run_id, day, &outcome.network_stats, &edges_json)?;

        info!(
            day,
            cooperation = outcome.metrics.cooperation_rate,
            energy_balance = outcome.metrics.energy_balance,
            incidents = outcome.metrics.risk_incidents,
            reciprocity = outcome.metrics.reciprocity,
            "simulated day"
        );
    }

    storage.set_run_status(run_id, RunStatus::Completed)?;
    info!(run_id, days = cli.days, "run complete");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_writer(std::io::stdout)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn open_storage(path: &str) -> Result<RunStorage> {
    if path == ":memory:" {
        return RunStorage::open_in_memory().context("opening in-memory storage");
    }
    RunStorage::open(path).with_context(|| format!("opening storage at {path}"))
}

fn build_decider(no_llm: bool) -> Result<Box<dyn PlanDecider>> {
    if no_llm {
        return Ok(Box::new(HeuristicPlanner));
    }
    Ok(Box::new(
        LlmDecisionCore::from_env().context("building LLM decision core")?,
    ))
}

/// Start a fresh run, or rebuild one from its stored snapshot.
fn bootstrap_run(
    cli: &AppCli,
    registry: &ScenarioRegistry,
    storage: &mut RunStorage,
) -> Result<(Simulation, RunId)> {
    let decider = build_decider(cli.no_llm)?;

    if let Some(run_id) = cli.resume {
        let stored = storage.load_run(run_id)?;
        let Some(config) = registry.get(&stored.scenario) else {
            bail!("run {run_id} references unknown scenario {:?}", stored.scenario);
        };
        let state = SimulationState::from_json(&stored.state_json)
            .with_context(|| format!("decoding snapshot for run {run_id}"))?;
        let simulation = Simulation::from_snapshot(config.clone(), state, decider)?;
        storage.set_run_status(run_id, RunStatus::Running)?;
        info!(
            run_id,
            scenario = stored.scenario.as_str(),
            day = stored.current_day,
            "resumed run"
        );
        return Ok((simulation, run_id));
    }

    let Some(config) = registry.get(&cli.scenario) else {
        bail!("unknown scenario {:?}; try --list-scenarios", cli.scenario);
    };
    let simulation = Simulation::new(config.clone(), cli.seed, decider)?;
    let state_json = simulation.snapshot().to_json()?;
    let run_id = storage.insert_run(&cli.scenario, cli.seed, &state_json)?;
    info!(
        run_id,
        scenario = cli.scenario.as_str(),
        seed = cli.seed,
        agents = simulation.agents().len(),
        "started run"
    );
    Ok((simulation, run_id))
}
