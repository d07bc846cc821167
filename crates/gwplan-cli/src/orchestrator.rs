use gwplan_core::economy::TransferEconomy;
use gwplan_core::lineup::Formation;
use gwplan_core::model::{Chip, ClubId, Gameweek, PlayerId, Position, Price};
use gwplan_core::objective::ObjectiveMode;
use gwplan_solver::{
    ChipMode, ChipPlan, ChipSchedule, ChipSuggestion, PathSolver, PlanningContext, PlanningInput,
    Recommendation, SearchDepth, SearchStats, SolveError, SolveOptions, SolveOutcome,
    TransferPath, recommend_transfers, suggest_chips,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::PlannerConfig;
use crate::request::{PlanRequest, RequestError};
use crate::sources::{GameweekCalendar, ManagerId, ProjectionSource, SourceError, SquadSource};

const RECOMMENDATION_LIMIT: usize = 5;

/// Search defaults the orchestrator applies when a request leaves them unset.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerSettings {
    pub economy: TransferEconomy,
    pub depth: SearchDepth,
    pub objective: ObjectiveMode,
    pub time_budget: Duration,
    pub step_cap: Option<usize>,
    pub top_paths: usize,
    pub ft_value: f32,
    pub parallel: bool,
}

impl PlannerSettings {
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            economy: config.economy(),
            depth: config.search.depth,
            objective: config.search.objective,
            time_budget: config.search.time_budget(),
            step_cap: config.search.step_cap,
            top_paths: config.search.top_paths,
            ft_value: config.search.ft_value,
            parallel: config.search.parallel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadMember {
    pub player: PlayerId,
    pub name: String,
    pub position: Position,
    pub club: ClubId,
    pub price: Price,
    pub selling_price: Price,
    pub points_per_90: f32,
    pub points_per_million: f32,
}

/// Held-squad lineup for one gameweek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameweekForecast {
    pub gameweek: Gameweek,
    pub formation: Formation,
    pub captain: PlayerId,
    pub vice_captain: PlayerId,
    pub captain_decision: bool,
    pub predicted_total: f32,
    pub bench_score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadSnapshot {
    pub members: Vec<SquadMember>,
    pub bank: Price,
    pub free_transfers: u8,
    pub value: Price,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipComparison {
    pub with_chips: f32,
    pub without_chips: f32,
    pub delta: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub manager: ManagerId,
    pub current_gameweek: Gameweek,
    pub objective: ObjectiveMode,
    pub depth: SearchDepth,
    pub chip_mode: ChipMode,
    pub squad: SquadSnapshot,
    pub forecasts: Vec<GameweekForecast>,
    pub chip_suggestions: Vec<ChipSuggestion>,
    pub chip_plan: ChipPlan,
    pub recommendations: Vec<Recommendation>,
    pub solved: bool,
    pub paths: Vec<TransferPath>,
    pub hold_total: Option<f32>,
    pub chip_comparison: Option<ChipComparison>,
    pub truncated: bool,
    pub stats: Option<SearchStats>,
}

impl PlanResponse {
    pub fn best(&self) -> Option<&TransferPath> {
        self.paths.first()
    }
}

/// Failures visible to callers, grouped by who can fix them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("invalid request: {0}")]
    Input(String),
    #[error("constraints cannot be satisfied: {0}")]
    ConstraintInfeasible(String),
    #[error("upstream data unavailable: {0}")]
    UpstreamDataUnavailable(String),
    #[error("internal planner error")]
    Internal,
}

impl PlanError {
    pub fn status_code(&self) -> u16 {
        match self {
            PlanError::Input(_) => 400,
            PlanError::ConstraintInfeasible(_) => 422,
            PlanError::UpstreamDataUnavailable(_) => 424,
            PlanError::Internal => 500,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            PlanError::Input(_) => "input",
            PlanError::ConstraintInfeasible(_) => "constraint_infeasible",
            PlanError::UpstreamDataUnavailable(_) => "upstream_data_unavailable",
            PlanError::Internal => "internal",
        }
    }
}

impl From<SolveError> for PlanError {
    fn from(err: SolveError) -> Self {
        if err.is_internal() {
            error!(target: "gwplan_cli::plan", error = %err, "internal consistency failure");
            PlanError::Internal
        } else if err.is_infeasible() {
            PlanError::ConstraintInfeasible(err.to_string())
        } else if err.is_missing_data() || err == SolveError::InvalidHorizon {
            PlanError::UpstreamDataUnavailable(err.to_string())
        } else {
            PlanError::Input(err.to_string())
        }
    }
}

impl From<RequestError> for PlanError {
    fn from(err: RequestError) -> Self {
        PlanError::Input(err.to_string())
    }
}

impl From<SourceError> for PlanError {
    fn from(err: SourceError) -> Self {
        if err.is_input() {
            PlanError::Input(err.to_string())
        } else {
            PlanError::UpstreamDataUnavailable(err.to_string())
        }
    }
}

/// Fetches manager and league state, runs the search and assembles the response.
pub struct PlanOrchestrator<'s> {
    projections: &'s dyn ProjectionSource,
    calendar: &'s dyn GameweekCalendar,
    squads: &'s dyn SquadSource,
    settings: PlannerSettings,
}

impl<'s> PlanOrchestrator<'s> {
    pub fn new(
        projections: &'s dyn ProjectionSource,
        calendar: &'s dyn GameweekCalendar,
        squads: &'s dyn SquadSource,
        settings: PlannerSettings,
    ) -> Self {
        Self {
            projections,
            calendar,
            squads,
            settings,
        }
    }

    pub fn get_optimal_plan(&self, request: &PlanRequest) -> Result<PlanResponse, PlanError> {
        let manager = request.validate(self.settings.economy.cap)?;

        let horizon = self.calendar.planning_horizon()?;
        let pool = self.squads.players()?;
        let manager_squad = self.squads.manager_squad(manager)?;
        let squad = manager_squad.squad(&pool)?;
        let projections = self.projections.projections(&horizon.upcoming, None)?;
        let calendar = self.calendar.double_blank_teams(&horizon.upcoming)?;

        let objective = request.objective_mode.unwrap_or(self.settings.objective);
        let depth = request.depth.unwrap_or(self.settings.depth);
        let input = PlanningInput {
            squad,
            bank: manager_squad.bank,
            free_transfers: request.ft.unwrap_or(manager_squad.free_transfers),
            chips_available: manager_squad.chips_available,
            horizon: &horizon,
            pool: &pool,
            projections: &projections,
            calendar: &calendar,
        };
        let ctx = PlanningContext::prepare(
            input,
            request.plan_constraints(),
            objective,
            self.settings.economy,
        )?;
        let schedule = ChipSchedule::resolve(
            request.chip_mode,
            &request.chip_plan,
            ctx.input.chips_available,
            &ctx.constraints,
            ctx.gameweeks(),
        )
        .map_err(SolveError::from)?;
        let scheduled = scheduled_chip_plan(&schedule, ctx.gameweeks());

        let forecasts = forecasts(&ctx)?;
        let snapshot = squad_snapshot(&ctx);
        let chip_suggestions = suggest_chips(&ctx, ctx.input.chips_available)?;
        let recommendations = recommend_transfers(
            &ctx,
            depth.limits().replacements_per_player,
            RECOMMENDATION_LIMIT,
        )?;

        let mut response = PlanResponse {
            manager,
            current_gameweek: horizon.current,
            objective,
            depth,
            chip_mode: request.chip_mode,
            squad: snapshot,
            forecasts,
            chip_suggestions,
            chip_plan: scheduled.clone(),
            recommendations,
            solved: false,
            paths: Vec::new(),
            hold_total: None,
            chip_comparison: None,
            truncated: false,
            stats: None,
        };

        if request.skip_solve {
            info!(target: "gwplan_cli::plan", %manager, "solve skipped by request");
            return Ok(response);
        }

        let budget = request
            .time_budget_ms
            .map(Duration::from_millis)
            .unwrap_or(self.settings.time_budget);
        let options = SolveOptions {
            depth,
            chip_mode: request.chip_mode,
            chip_plan: request.chip_plan.clone(),
            ft_value: request.ft_value.unwrap_or(self.settings.ft_value),
            top_paths: request.top_paths.unwrap_or(self.settings.top_paths),
            time_budget: Some(budget),
            step_cap: self.settings.step_cap,
            parallel: self.settings.parallel,
        };
        let started = Instant::now();
        let outcome = PathSolver::new(&ctx, options.clone())?.solve()?;

        if request.chip_compare {
            let without = if request.chip_mode == ChipMode::None {
                outcome.clone()
            } else {
                let chipless = chipless_options(options, budget, started.elapsed());
                PathSolver::new(&ctx, chipless)?.solve()?
            };
            response.truncated |= without.truncated;
            response.chip_comparison = Some(compare(&outcome, &without));
        }

        response.chip_plan = resolved_chip_plan(&outcome, scheduled);
        response.truncated |= outcome.truncated;
        if response.truncated {
            warn!(target: "gwplan_cli::plan", %manager, "search budget exhausted; returning best paths found");
        }
        info!(
            target: "gwplan_cli::plan",
            %manager,
            paths = outcome.paths.len(),
            best = outcome.best().map(|p| p.total_score),
            hold = outcome.hold.total_score,
            elapsed_ms = outcome.stats.elapsed_ms,
            "plan solved"
        );
        response.solved = true;
        response.hold_total = Some(outcome.hold.total_score);
        response.stats = Some(outcome.stats);
        response.paths = outcome.paths;
        Ok(response)
    }
}

fn forecasts(ctx: &PlanningContext<'_>) -> Result<Vec<GameweekForecast>, SolveError> {
    ctx.gameweeks()
        .iter()
        .enumerate()
        .map(|(idx, gameweek)| {
            let lineup = ctx.lineup(idx, &ctx.input.squad)?;
            Ok(GameweekForecast {
                gameweek: *gameweek,
                formation: lineup.formation,
                captain: lineup.captain,
                vice_captain: lineup.vice_captain,
                captain_decision: lineup.captain_decision(),
                predicted_total: lineup.total_score,
                bench_score: lineup.bench_score,
            })
        })
        .collect()
}

fn squad_snapshot(ctx: &PlanningContext<'_>) -> SquadSnapshot {
    let members = ctx
        .input
        .squad
        .iter()
        .filter_map(|slot| {
            let player = ctx.input.pool.get(slot.player)?;
            Some(SquadMember {
                player: slot.player,
                name: player.name.clone(),
                position: slot.position,
                club: slot.club,
                price: player.price,
                selling_price: slot.selling_price,
                points_per_90: player.points_per_90(),
                points_per_million: player.points_per_million(),
            })
        })
        .collect();
    SquadSnapshot {
        members,
        bank: ctx.input.bank,
        free_transfers: ctx.input.free_transfers,
        value: ctx.input.squad.value(),
    }
}

/// Chips the best path actually plays; falls back to the caller's plan.
/// Options for the chipless comparison run, which gets what is left of the
/// request's wall-clock budget.
fn chipless_options(options: SolveOptions, budget: Duration, spent: Duration) -> SolveOptions {
    SolveOptions {
        chip_mode: ChipMode::None,
        chip_plan: ChipPlan::new(),
        time_budget: Some(budget.saturating_sub(spent)),
        ..options
    }
}

/// The chips a request actually commits to; empty when chips are disabled.
fn scheduled_chip_plan(schedule: &ChipSchedule, gameweeks: &[Gameweek]) -> ChipPlan {
    schedule
        .planned()
        .filter_map(|(idx, chip)| gameweeks.get(idx).map(|gameweek| (chip, *gameweek)))
        .fold(ChipPlan::new(), |plan, (chip, gameweek)| plan.with(chip, gameweek))
}

fn resolved_chip_plan(outcome: &SolveOutcome, scheduled: ChipPlan) -> ChipPlan {
    match outcome.best() {
        Some(best) => best
            .chips_used()
            .into_iter()
            .fold(ChipPlan::new(), |plan, (gameweek, chip): (Gameweek, Chip)| {
                plan.with(chip, gameweek)
            }),
        None => scheduled,
    }
}

fn compare(with: &SolveOutcome, without: &SolveOutcome) -> ChipComparison {
    let best_total = |outcome: &SolveOutcome| {
        outcome
            .best()
            .map_or(outcome.hold.total_score, |p| p.total_score)
    };
    let with_chips = best_total(with);
    let without_chips = best_total(without);
    ChipComparison {
        with_chips,
        without_chips,
        delta: with_chips - without_chips,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SnapshotStore;
    use gwplan_core::synthetic::{SyntheticConfig, SyntheticLeague};

    fn store() -> SnapshotStore {
        let league = SyntheticLeague::generate(&SyntheticConfig {
            seed: 11,
            horizon: 3,
            ..SyntheticConfig::default()
        })
        .expect("league");
        SnapshotStore::from_synthetic(&league, ManagerId(1))
    }

    fn settings() -> PlannerSettings {
        PlannerSettings {
            economy: TransferEconomy::default(),
            depth: SearchDepth::Quick,
            objective: ObjectiveMode::Expected,
            time_budget: Duration::from_secs(30),
            step_cap: Some(50_000),
            top_paths: 3,
            ft_value: 1.5,
            parallel: false,
        }
    }

    fn plan(request: &PlanRequest) -> Result<PlanResponse, PlanError> {
        let store = store();
        PlanOrchestrator::new(&store, &store, &store, settings()).get_optimal_plan(request)
    }

    #[test]
    fn skip_solve_still_forecasts() {
        let mut request = PlanRequest::for_manager(ManagerId(1));
        request.skip_solve = true;
        let response = plan(&request).expect("plan");
        assert!(!response.solved);
        assert!(response.paths.is_empty());
        assert_eq!(response.forecasts.len(), 3);
        assert_eq!(response.squad.members.len(), 15);
        assert!(response.stats.is_none());
    }

    #[test]
    fn solve_returns_ranked_paths() {
        let response = plan(&PlanRequest::for_manager(ManagerId(1))).expect("plan");
        assert!(response.solved);
        assert!(!response.paths.is_empty());
        let hold = response.hold_total.expect("hold total");
        for path in &response.paths {
            assert!((path.total_score - hold - path.score_vs_hold).abs() < 1e-3);
        }
        for pair in response.paths.windows(2) {
            assert!(pair[0].total_score >= pair[1].total_score);
        }
    }

    #[test]
    fn missing_manager_is_400() {
        let err = plan(&PlanRequest::default()).expect_err("no manager");
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn unknown_manager_is_400() {
        let err = plan(&PlanRequest::for_manager(ManagerId(77))).expect_err("unknown");
        assert!(matches!(err, PlanError::Input(_)));
    }

    #[test]
    fn locking_unowned_player_is_422() {
        let store = store();
        let owned = store
            .manager_squad(ManagerId(1))
            .expect("manager")
            .picks
            .iter()
            .map(|p| p.player)
            .collect::<Vec<_>>();
        let stranger = store
            .snapshot()
            .players
            .iter()
            .map(|p| p.id)
            .find(|id| !owned.contains(id))
            .expect("unowned player");
        let mut request = PlanRequest::for_manager(ManagerId(1));
        request.constraints.locked = vec![stranger];
        let err = PlanOrchestrator::new(&store, &store, &store, settings())
            .get_optimal_plan(&request)
            .expect_err("infeasible");
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn chip_compare_reports_delta() {
        let mut request = PlanRequest::for_manager(ManagerId(1));
        request.chip_mode = ChipMode::Auto;
        request.chip_compare = true;
        let response = plan(&request).expect("plan");
        let comparison = response.chip_comparison.expect("comparison");
        assert!(
            (comparison.delta - (comparison.with_chips - comparison.without_chips)).abs() < 1e-4
        );
        assert!(!response.chip_suggestions.is_empty());
    }

    #[test]
    fn skip_solve_rejects_chip_outside_horizon() {
        let mut request = PlanRequest::for_manager(ManagerId(1));
        request.skip_solve = true;
        request.chip_mode = ChipMode::Locked;
        request.chip_plan = ChipPlan::new().with(Chip::Wildcard, Gameweek(999));
        let err = plan(&request).expect_err("outside horizon");
        assert!(matches!(err, PlanError::Input(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn skip_solve_echoes_only_scheduled_chips() {
        let mut request = PlanRequest::for_manager(ManagerId(1));
        request.skip_solve = true;
        request.chip_mode = ChipMode::None;
        request.chip_plan = ChipPlan::new().with(Chip::BenchBoost, Gameweek(10));
        let response = plan(&request).expect("plan");
        assert!(response.chip_plan.is_empty());

        request.chip_mode = ChipMode::Locked;
        let response = plan(&request).expect("plan");
        assert_eq!(
            response.chip_plan,
            ChipPlan::new().with(Chip::BenchBoost, Gameweek(10))
        );
    }

    #[test]
    fn chipless_run_gets_the_remaining_budget() {
        let options = SolveOptions {
            chip_mode: ChipMode::Auto,
            chip_plan: ChipPlan::new().with(Chip::FreeHit, Gameweek(11)),
            time_budget: Some(Duration::from_secs(30)),
            top_paths: 4,
            ..SolveOptions::default()
        };
        let budget = Duration::from_secs(30);

        let chipless = chipless_options(options.clone(), budget, Duration::from_secs(20));
        assert_eq!(chipless.chip_mode, ChipMode::None);
        assert!(chipless.chip_plan.is_empty());
        assert_eq!(chipless.time_budget, Some(Duration::from_secs(10)));
        assert_eq!(chipless.top_paths, 4);

        let overrun = chipless_options(options, budget, Duration::from_secs(45));
        assert_eq!(overrun.time_budget, Some(Duration::ZERO));
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = PlanError::from(SolveError::Lineup(
            gwplan_core::lineup::LineupError::NoFormation { found: 3 },
        ));
        assert_eq!(err, PlanError::Internal);
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_string(), "internal planner error");
    }
}
