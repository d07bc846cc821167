use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use gwplan_cli::config::{PlannerConfig, ResolvedOutputs};
use gwplan_cli::logging::init_logging;
use gwplan_cli::request::PlanRequest;
use gwplan_cli::runner::{PlanRunner, RunnerError};
use gwplan_cli::sources::ManagerId;
use gwplan_core::PlannerInfo;
use gwplan_core::objective::ObjectiveMode;
use gwplan_solver::{ChipMode, SearchDepth};

/// Multi-gameweek transfer path planner.
#[derive(Debug, Parser)]
#[command(
    name = "gwplan",
    author,
    version,
    about = "Plan fantasy transfers across upcoming gameweeks"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config/planner.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Manager to plan for.
    #[arg(short, long, value_name = "ID")]
    manager: Option<u64>,

    /// JSON plan request; command-line flags override its fields.
    #[arg(long, value_name = "FILE")]
    request: Option<PathBuf>,

    /// Search breadth: quick, standard or deep.
    #[arg(long, value_name = "DEPTH")]
    depth: Option<SearchDepth>,

    /// Scoring objective: expected, floor or ceiling.
    #[arg(long, value_name = "MODE")]
    objective: Option<ObjectiveMode>,

    /// Override the manager's free transfer count.
    #[arg(long, value_name = "COUNT")]
    ft: Option<u8>,

    /// Forecast and recommend only; skip the path search.
    #[arg(long)]
    skip_solve: bool,

    /// Chip handling: none, locked or auto.
    #[arg(long, value_name = "MODE")]
    chip_mode: Option<ChipMode>,

    /// Also solve without chips and report the difference.
    #[arg(long)]
    chip_compare: bool,

    /// Wall-clock budget for the search in milliseconds.
    #[arg(long, value_name = "MS")]
    time_budget_ms: Option<u64>,

    /// Override the synthetic league seed.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Exit after validating the configuration (no plan is produced).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = PlannerConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(seed) = cli.seed {
        config.data.synthetic_seed = seed;
    }

    if let Some(manager) = cli.manager {
        config.data.manager = Some(manager);
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let source = outputs
        .snapshot
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| format!("synthetic league (seed {})", config.data.synthetic_seed));

    println!(
        "{} {} ({}): loaded configuration '{run_id}' ({source}, {} search, {} objective)",
        PlannerInfo::name(),
        PlannerInfo::version(),
        PlannerInfo::codename(),
        config.search.depth,
        config.search.objective
    );

    if cli.validate_only {
        println!("Validation-only mode: planning skipped.");
        return Ok(());
    }

    let _logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let runner = PlanRunner::new(config, outputs)?;

    let mut request = match cli.request.as_ref() {
        Some(path) => PlanRequest::from_path(path)
            .with_context(|| format!("loading plan request from {}", path.display()))?,
        None => runner.default_request(),
    };
    if let Some(manager) = cli.manager {
        request.manager = Some(ManagerId(manager));
    }
    if request.manager.is_none() {
        request.manager = runner.default_request().manager;
    }
    if let Some(depth) = cli.depth {
        request.depth = Some(depth);
    }
    if let Some(objective) = cli.objective {
        request.objective_mode = Some(objective);
    }
    if let Some(ft) = cli.ft {
        request.ft = Some(ft);
    }
    if let Some(chip_mode) = cli.chip_mode {
        request.chip_mode = chip_mode;
    }
    if let Some(budget) = cli.time_budget_ms {
        request.time_budget_ms = Some(budget);
    }
    request.skip_solve |= cli.skip_solve;
    request.chip_compare |= cli.chip_compare;

    let summary = match runner.run(&request) {
        Ok(summary) => summary,
        Err(RunnerError::Plan(err)) => {
            eprintln!("Plan rejected [{} {}]: {err}", err.status_code(), err.category());
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    let response = &summary.response;
    match response.best() {
        Some(best) => println!(
            "Plan complete for {}: {} paths, best {:.2} ({:+.2} vs hold, {} hit points){}",
            response.manager,
            response.paths.len(),
            best.total_score,
            best.score_vs_hold,
            best.hit_points,
            if response.truncated { " [truncated]" } else { "" }
        ),
        None => println!(
            "Forecast complete for {}: {} gameweeks, {} recommendations",
            response.manager,
            response.forecasts.len(),
            response.recommendations.len()
        ),
    }
    if let Some(comparison) = response.chip_comparison.as_ref() {
        println!(
            "Chip comparison: {:+.2} points from chips",
            comparison.delta
        );
    }
    println!("Plan JSON: {}", summary.plan_path.display());
    println!("Summary table: {}", summary.summary_path.display());

    Ok(())
}
