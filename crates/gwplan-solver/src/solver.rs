//! Beam search over gameweek layers.
//!
//! Each layer expands every kept state by its chip options and transfer sets,
//! scores the resulting squads (memoized, optionally in parallel), then keeps
//! the best `beam_width` distinct states. Once the search budget runs out the
//! remaining layers only hold, so every returned path still spans the horizon.

use gwplan_core::lineup::{Lineup, LineupScoring};
use gwplan_core::model::{Chip, ChipSet, Gameweek, Price, Squad, SquadFingerprint, SquadSlot};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::budget::SearchBudget;
use crate::candidates::{TransferMove, combine_moves, replacement_moves};
use crate::chips::{ChipMode, ChipPlan, ChipSchedule};
use crate::context::{PlanningContext, PlanningInput};
use crate::depth::{SearchDepth, SearchLimits};
use crate::error::SolveError;
use crate::memo::{LineupMemo, RebuildKey};
use crate::plan::{GameweekAction, GameweekPlan, SquadCarry, Transfer, TransferPath, squad_diff};
use crate::rebuild::rebuild_squad;

/// Points credited per banked free transfer when ranking partial paths.
pub const DEFAULT_FT_VALUE: f32 = 1.5;
pub const DEFAULT_TOP_PATHS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions {
    pub depth: SearchDepth,
    pub chip_mode: ChipMode,
    pub chip_plan: ChipPlan,
    pub ft_value: f32,
    pub top_paths: usize,
    pub time_budget: Option<Duration>,
    /// Deterministic cap on generated states; overrides the clock when set.
    pub step_cap: Option<usize>,
    pub parallel: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            depth: SearchDepth::default(),
            chip_mode: ChipMode::default(),
            chip_plan: ChipPlan::default(),
            ft_value: DEFAULT_FT_VALUE,
            top_paths: DEFAULT_TOP_PATHS,
            time_budget: None,
            step_cap: None,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub depth: SearchDepth,
    pub beam_width: usize,
    pub layers: usize,
    pub states_expanded: usize,
    pub states_generated: usize,
    pub states_kept: usize,
    pub memo_hits: usize,
    pub memo_misses: usize,
    pub steps: usize,
    pub elapsed_ms: u64,
    pub budget_utilization: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveOutcome {
    /// Distinct paths, best first.
    pub paths: Vec<TransferPath>,
    /// Baseline that holds every gameweek without chips.
    pub hold: TransferPath,
    /// The budget ran out and later layers were only held.
    pub truncated: bool,
    pub stats: SearchStats,
}

impl SolveOutcome {
    pub fn best(&self) -> Option<&TransferPath> {
        self.paths.first()
    }
}

#[derive(Debug)]
struct PathNode {
    plan: GameweekPlan,
    parent: Option<Arc<PathNode>>,
}

/// A partial path. States are never mutated once built; children share their
/// parent's history through `Arc`.
#[derive(Debug, Clone)]
struct BeamState {
    squad: Squad,
    bank: Price,
    free_transfers: u8,
    chips: ChipSet,
    hits: u32,
    cumulative: f32,
    history: Option<Arc<PathNode>>,
}

type StateKey = (SquadFingerprint, Price, u8, u8);

impl BeamState {
    fn initial(input: &PlanningInput<'_>) -> Self {
        Self {
            squad: input.squad.clone(),
            bank: input.bank,
            free_transfers: input.free_transfers,
            chips: input.chips_available,
            hits: 0,
            cumulative: 0.0,
            history: None,
        }
    }

    fn key(&self) -> StateKey {
        (
            self.squad.fingerprint(),
            self.bank,
            self.free_transfers,
            self.chips.bits(),
        )
    }

    fn rank(&self, ft_value: f32) -> f32 {
        self.cumulative + ft_value * f32::from(self.free_transfers)
    }

    fn plans(&self) -> Vec<GameweekPlan> {
        let mut plans = Vec::new();
        let mut node = self.history.as_deref();
        while let Some(current) = node {
            plans.push(current.plan.clone());
            node = current.parent.as_deref();
        }
        plans.reverse();
        plans
    }
}

struct Expansion {
    parent: usize,
    chip: Option<Chip>,
    transfers: Vec<Transfer>,
    squad: Squad,
    bank: Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpandMode {
    Full,
    HoldOnly,
}

struct SearchRun {
    budget: SearchBudget,
    memo: LineupMemo,
    stats: SearchStats,
    truncated: bool,
}

pub struct PathSolver<'c, 'a> {
    ctx: &'c PlanningContext<'a>,
    options: SolveOptions,
    limits: SearchLimits,
    schedule: ChipSchedule,
}

impl<'c, 'a> PathSolver<'c, 'a> {
    pub fn new(ctx: &'c PlanningContext<'a>, options: SolveOptions) -> Result<Self, SolveError> {
        let schedule = ChipSchedule::resolve(
            options.chip_mode,
            &options.chip_plan,
            ctx.input.chips_available,
            &ctx.constraints,
            ctx.gameweeks(),
        )?;
        Ok(Self {
            ctx,
            limits: options.depth.limits(),
            options,
            schedule,
        })
    }

    pub fn limits(&self) -> SearchLimits {
        self.limits
    }

    pub fn schedule(&self) -> &ChipSchedule {
        &self.schedule
    }

    pub fn solve(&self) -> Result<SolveOutcome, SolveError> {
        let mut run = SearchRun {
            budget: SearchBudget::new(self.options.time_budget, self.options.step_cap),
            memo: LineupMemo::new(),
            stats: SearchStats {
                depth: self.options.depth,
                beam_width: self.limits.beam_width,
                ..SearchStats::default()
            },
            truncated: false,
        };

        let hold = self.hold_path(&mut run.memo)?;
        let len = self.ctx.horizon_len();
        let mut beam = vec![BeamState::initial(&self.ctx.input)];
        for idx in 0..len {
            beam = self.advance_layer(&beam, idx, idx + 1 == len, &mut run)?;
            if beam.is_empty() {
                return Err(SolveError::NoFeasiblePath(self.ctx.gameweeks()[idx]));
            }
        }
        let paths = self.select_paths(&beam, hold.total_score);

        run.stats.layers = len;
        run.stats.memo_hits = run.memo.hits();
        run.stats.memo_misses = run.memo.misses();
        run.stats.steps = run.budget.steps();
        run.stats.elapsed_ms = run.budget.elapsed().as_millis() as u64;
        run.stats.budget_utilization = run.budget.utilization_percent();
        info!(
            target: "gwplan_solver::solve",
            depth = %self.options.depth,
            paths = paths.len(),
            best = paths.first().map(|p| p.total_score).unwrap_or(hold.total_score),
            hold = hold.total_score,
            truncated = run.truncated,
            generated = run.stats.states_generated,
            memo_hits = run.stats.memo_hits,
            elapsed_ms = run.stats.elapsed_ms,
            "search complete"
        );
        Ok(SolveOutcome {
            paths,
            hold,
            truncated: run.truncated,
            stats: run.stats,
        })
    }

    fn advance_layer(
        &self,
        beam: &[BeamState],
        idx: usize,
        is_final: bool,
        run: &mut SearchRun,
    ) -> Result<Vec<BeamState>, SolveError> {
        let gameweek = self.ctx.gameweeks()[idx];
        let mut expansions = Vec::new();
        for (parent, state) in beam.iter().enumerate() {
            let mode = if run.budget.exhausted() {
                if !run.truncated {
                    warn!(
                        target: "gwplan_solver::solve",
                        %gameweek,
                        steps = run.budget.steps(),
                        "search budget exhausted, holding remaining branches"
                    );
                }
                run.truncated = true;
                ExpandMode::HoldOnly
            } else {
                ExpandMode::Full
            };
            let before = expansions.len();
            self.expand(state, parent, idx, mode, &mut run.memo, &mut expansions);
            run.budget.tick(expansions.len() - before);
        }
        run.stats.states_expanded += beam.len();
        run.stats.states_generated += expansions.len();
        let generated = expansions.len();

        run.memo.fill(
            self.ctx,
            idx,
            expansions.iter().map(|e| &e.squad),
            self.options.parallel,
        )?;

        let mut children = Vec::with_capacity(expansions.len());
        for expansion in expansions {
            let fingerprint = expansion.squad.fingerprint();
            let computed;
            let lineup = match run.memo.get(idx, fingerprint) {
                Some(lineup) => lineup,
                None => {
                    computed = self.ctx.lineup(idx, &expansion.squad)?;
                    &computed
                }
            };
            children.push(self.child(&beam[expansion.parent], expansion, lineup, gameweek));
        }

        let next = self.prune(children, is_final);
        run.stats.states_kept += next.len();
        debug!(
            target: "gwplan_solver::layer",
            %gameweek,
            expanded = beam.len(),
            generated,
            kept = next.len(),
            memo_entries = run.memo.len(),
            elapsed_ms = run.budget.elapsed().as_millis() as u64,
            "layer complete"
        );
        Ok(next)
    }

    fn expand(
        &self,
        state: &BeamState,
        parent: usize,
        idx: usize,
        mode: ExpandMode,
        memo: &mut LineupMemo,
        out: &mut Vec<Expansion>,
    ) {
        let gameweek = self.ctx.gameweeks()[idx];
        let Some((base_squad, base_bank, fixed)) = self.apply_fixed(state, gameweek) else {
            debug!(
                target: "gwplan_solver::layer",
                %gameweek,
                "fixed transfers unaffordable or illegal on this branch"
            );
            return;
        };
        let chip_options = match mode {
            ExpandMode::Full => self.schedule.options(idx, state.chips),
            ExpandMode::HoldOnly => self.schedule.forced_options(idx, state.chips),
        };

        let wants_sets = mode == ExpandMode::Full
            && chip_options
                .iter()
                .any(|chip| chip.is_none_or(|c| !c.unlimited_transfers()));
        let sets = if wants_sets {
            let moves = replacement_moves(
                self.ctx,
                &base_squad,
                base_bank,
                idx,
                self.limits.replacements_per_player,
            );
            combine_moves(
                &base_squad,
                base_bank,
                &moves,
                self.limits.max_transfers_per_gameweek,
                self.limits.combination_pool,
                self.limits.transfer_sets_per_state,
            )
        } else {
            Vec::new()
        };

        for chip in chip_options {
            match chip {
                Some(c) if c.unlimited_transfers() => {
                    let scope = if c.persists_squad() {
                        idx..self.ctx.horizon_len()
                    } else {
                        idx..idx + 1
                    };
                    let key = RebuildKey {
                        idx,
                        chip: c,
                        fingerprint: base_squad.fingerprint(),
                        bank: base_bank,
                    };
                    let rebuilt = memo.rebuild(key, || {
                        rebuild_squad(self.ctx, &base_squad, base_bank, idx, scope)
                    });
                    match rebuilt {
                        Some((squad, bank)) => {
                            let transfers = squad_diff(&base_squad, &squad);
                            self.push(out, state, parent, chip, transfers, squad, bank);
                        }
                        None => debug!(
                            target: "gwplan_solver::layer",
                            %gameweek,
                            chip = %c,
                            "no affordable rebuild"
                        ),
                    }
                }
                _ => {
                    self.push(
                        out,
                        state,
                        parent,
                        chip,
                        fixed.clone(),
                        base_squad.clone(),
                        base_bank,
                    );
                    for set in &sets {
                        let mut transfers = fixed.clone();
                        transfers.extend(set.moves.iter().map(TransferMove::transfer));
                        self.push(out, state, parent, chip, transfers, set.squad.clone(), set.bank);
                    }
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &self,
        out: &mut Vec<Expansion>,
        state: &BeamState,
        parent: usize,
        chip: Option<Chip>,
        transfers: Vec<Transfer>,
        squad: Squad,
        bank: Price,
    ) {
        let paid = self
            .ctx
            .economy
            .advance(state.free_transfers, transfers.len() as u32, chip)
            .paid_transfers;
        if !self.ctx.constraints.within_hits(state.hits + paid) {
            return;
        }
        out.push(Expansion {
            parent,
            chip,
            transfers,
            squad,
            bank,
        });
    }

    /// Apply the committed transfers for `gameweek`; `None` if they cannot be made.
    fn apply_fixed(
        &self,
        state: &BeamState,
        gameweek: Gameweek,
    ) -> Option<(Squad, Price, Vec<Transfer>)> {
        let mut squad = state.squad.clone();
        let mut bank = i64::from(state.bank);
        let mut transfers = Vec::new();
        for fixed in self.ctx.constraints.fixed_in(gameweek) {
            let out = *squad.slot(fixed.out)?;
            let player = self.ctx.input.pool.get(fixed.incoming)?;
            let incoming = SquadSlot {
                player: player.id,
                position: player.position,
                club: player.club,
                selling_price: player.price,
            };
            bank += i64::from(out.selling_price) - i64::from(player.price);
            squad = squad.apply_transfer(fixed.out, incoming).ok()?;
            transfers.push(Transfer::between(&out, &incoming));
        }
        let bank = Price::try_from(bank).ok()?;
        Some((squad, bank, transfers))
    }

    fn child(
        &self,
        parent: &BeamState,
        expansion: Expansion,
        lineup: &Lineup,
        gameweek: Gameweek,
    ) -> BeamState {
        let Expansion {
            chip,
            transfers,
            squad,
            bank,
            ..
        } = expansion;
        let carry = match chip {
            Some(c) if !c.persists_squad() => SquadCarry::Revert {
                squad: parent.squad.clone(),
                bank: parent.bank,
            },
            _ => SquadCarry::Persist,
        };
        let plan = build_plan(
            gameweek,
            transfers,
            chip,
            parent.free_transfers,
            squad,
            bank,
            lineup,
            carry,
            self.ctx,
        );
        let (next_squad, next_bank) = {
            let (squad, bank) = plan.carry_forward();
            (squad.clone(), bank)
        };
        let cumulative = parent.cumulative + plan.net_score();
        BeamState {
            squad: next_squad,
            bank: next_bank,
            free_transfers: plan.free_transfers_after,
            chips: chip.map_or(parent.chips, |c| parent.chips.without(c)),
            hits: parent.hits + plan.paid_transfers,
            cumulative,
            history: Some(Arc::new(PathNode {
                plan,
                parent: parent.history.clone(),
            })),
        }
    }

    fn prune(&self, mut children: Vec<BeamState>, is_final: bool) -> Vec<BeamState> {
        let ft_value = if is_final { 0.0 } else { self.options.ft_value };
        children.sort_by(|a, b| {
            b.rank(ft_value)
                .total_cmp(&a.rank(ft_value))
                .then_with(|| a.hits.cmp(&b.hits))
                .then_with(|| a.key().cmp(&b.key()))
        });
        if is_final {
            return children;
        }
        let mut seen = HashSet::new();
        children.retain(|state| seen.insert(state.key()));
        children.truncate(self.limits.beam_width);
        children
    }

    fn select_paths(&self, finals: &[BeamState], hold_total: f32) -> Vec<TransferPath> {
        let wanted = self.options.top_paths.max(1);
        let mut seen = HashSet::new();
        let mut paths = Vec::new();
        for state in finals {
            let path = TransferPath::from_plans(state.plans(), hold_total);
            if seen.insert(path.move_signature()) {
                paths.push(path);
                if paths.len() == wanted {
                    break;
                }
            }
        }
        paths.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
        paths
    }

    /// Keep the starting squad all horizon with no chips and no transfers.
    fn hold_path(&self, memo: &mut LineupMemo) -> Result<TransferPath, SolveError> {
        let squad = &self.ctx.input.squad;
        let bank = self.ctx.input.bank;
        let mut free_transfers = self.ctx.input.free_transfers;
        let mut plans = Vec::with_capacity(self.ctx.horizon_len());
        for (idx, gameweek) in self.ctx.gameweeks().iter().enumerate() {
            let lineup = memo.lineup(self.ctx, idx, squad)?;
            let plan = build_plan(
                *gameweek,
                Vec::new(),
                None,
                free_transfers,
                squad.clone(),
                bank,
                lineup,
                SquadCarry::Persist,
                self.ctx,
            );
            free_transfers = plan.free_transfers_after;
            plans.push(plan);
        }
        let mut hold = TransferPath::from_plans(plans, 0.0);
        hold.score_vs_hold = 0.0;
        Ok(hold)
    }
}

#[allow(clippy::too_many_arguments)]
fn build_plan(
    gameweek: Gameweek,
    transfers: Vec<Transfer>,
    chip: Option<Chip>,
    free_transfers: u8,
    squad: Squad,
    bank: Price,
    lineup: &Lineup,
    carry: SquadCarry,
    ctx: &PlanningContext<'_>,
) -> GameweekPlan {
    let step = ctx
        .economy
        .advance(free_transfers, transfers.len() as u32, chip);
    GameweekPlan {
        gameweek,
        action: if transfers.is_empty() {
            GameweekAction::Hold
        } else {
            GameweekAction::Transfer
        },
        transfers,
        chip,
        free_transfers_before: free_transfers,
        free_transfers_after: step.free_transfers,
        paid_transfers: step.paid_transfers,
        hit_cost: step.hit_cost,
        squad,
        bank,
        formation: lineup.formation,
        captain: lineup.captain,
        vice_captain: lineup.vice_captain,
        captain_decision: lineup.captain_decision(),
        score: lineup.rescored(LineupScoring::for_chip(chip)),
        carry,
    }
}
