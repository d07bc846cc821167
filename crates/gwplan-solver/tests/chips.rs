mod common;

use common::{entering_squads, ids, league};
use gwplan_core::economy::TransferEconomy;
use gwplan_core::lineup::LineupScoring;
use gwplan_core::model::{Chip, ChipSet, Gameweek};
use gwplan_core::objective::ObjectiveMode;
use gwplan_solver::{
    ChipError, ChipMode, ChipPlan, PathSolver, PlanConstraints, PlanningContext, SearchDepth,
    SolveError, SolveOptions, SquadCarry, suggest_chips,
};

fn locked(chip: Chip, gameweek: u16) -> SolveOptions {
    SolveOptions {
        depth: SearchDepth::Quick,
        chip_mode: ChipMode::Locked,
        chip_plan: ChipPlan::new().with(chip, Gameweek(gameweek)),
        ..SolveOptions::default()
    }
}

#[test]
fn triple_captain_triples_the_armband() {
    let league = league();
    let ctx = league.context(PlanConstraints::default()).unwrap();
    let outcome = PathSolver::new(&ctx, locked(Chip::TripleCaptain, 2))
        .unwrap()
        .solve()
        .unwrap();
    for path in &outcome.paths {
        let plan = &path.gameweeks[1];
        assert_eq!(plan.chip, Some(Chip::TripleCaptain));
        let lineup = ctx.lineup(1, &plan.squad).unwrap();
        let tripled = lineup.rescored(LineupScoring::for_chip(Some(Chip::TripleCaptain)));
        assert!((plan.score - tripled).abs() < 1e-4);
        assert!((plan.score - lineup.total_score - lineup.captain_score).abs() < 1e-4);
        assert!(path.gameweeks.iter().filter(|gw| gw.chip.is_some()).count() == 1);
    }
}

#[test]
fn bench_boost_counts_the_bench() {
    let league = league();
    let ctx = league.context(PlanConstraints::default()).unwrap();
    let outcome = PathSolver::new(&ctx, locked(Chip::BenchBoost, 3))
        .unwrap()
        .solve()
        .unwrap();
    let plan = &outcome.paths[0].gameweeks[2];
    let lineup = ctx.lineup(2, &plan.squad).unwrap();
    assert!((plan.score - lineup.total_score - lineup.bench_score).abs() < 1e-4);
}

#[test]
fn wildcard_squad_persists_without_hits() {
    let league = league();
    let ctx = league.context(PlanConstraints::default()).unwrap();
    let outcome = PathSolver::new(&ctx, locked(Chip::Wildcard, 2))
        .unwrap()
        .solve()
        .unwrap();
    for path in &outcome.paths {
        let wildcard = &path.gameweeks[1];
        assert_eq!(wildcard.chip, Some(Chip::Wildcard));
        assert!(wildcard.transfers.len() > 1);
        assert_eq!(wildcard.hit_cost, 0);
        assert_eq!(wildcard.free_transfers_after, wildcard.free_transfers_before);
        assert_eq!(wildcard.carry, SquadCarry::Persist);
        let entering = entering_squads(&league.squad, path);
        assert_eq!(ids(&entering[2]), ids(&wildcard.squad));
    }
}

#[test]
fn free_hit_squad_reverts_next_week() {
    let league = league();
    let ctx = league.context(PlanConstraints::default()).unwrap();
    let outcome = PathSolver::new(&ctx, locked(Chip::FreeHit, 2))
        .unwrap()
        .solve()
        .unwrap();
    for path in &outcome.paths {
        let before = &path.gameweeks[0];
        let free_hit = &path.gameweeks[1];
        assert_eq!(free_hit.chip, Some(Chip::FreeHit));
        assert!(!free_hit.transfers.is_empty());
        assert_eq!(free_hit.hit_cost, 0);
        match &free_hit.carry {
            SquadCarry::Revert { squad, bank } => {
                assert_eq!(squad, &before.squad);
                assert_eq!(*bank, before.bank);
            }
            SquadCarry::Persist => panic!("free hit must revert"),
        }
        let entering = entering_squads(&league.squad, path);
        assert_eq!(ids(&entering[2]), ids(&before.squad));
    }
}

#[test]
fn auto_mode_uses_each_chip_at_most_once() {
    let league = league();
    let ctx = league.context(PlanConstraints::default()).unwrap();
    let options = SolveOptions {
        depth: SearchDepth::Quick,
        chip_mode: ChipMode::Auto,
        ..SolveOptions::default()
    };
    let outcome = PathSolver::new(&ctx, options).unwrap().solve().unwrap();
    let best = outcome.best().unwrap();
    assert!(best.score_vs_hold > 0.0);
    for path in &outcome.paths {
        let used = path.chips_used();
        let distinct: ChipSet = used.iter().map(|(_, chip)| *chip).collect();
        assert_eq!(distinct.len(), used.len());
    }
}

#[test]
fn auto_mode_respects_available_chips() {
    let league = league();
    let available: ChipSet = [Chip::BenchBoost].into_iter().collect();
    let ctx = PlanningContext::prepare(
        league.input(1, available),
        PlanConstraints::default(),
        ObjectiveMode::Expected,
        TransferEconomy::default(),
    )
    .unwrap();
    let options = SolveOptions {
        depth: SearchDepth::Quick,
        chip_mode: ChipMode::Auto,
        ..SolveOptions::default()
    };
    let outcome = PathSolver::new(&ctx, options).unwrap().solve().unwrap();
    for path in &outcome.paths {
        assert!(
            path.chips_used()
                .iter()
                .all(|(_, chip)| *chip == Chip::BenchBoost)
        );
    }
}

#[test]
fn forbidden_planned_chip_is_infeasible() {
    let league = league();
    let constraints = PlanConstraints {
        chip_forbid: [(Chip::Wildcard, [Gameweek(2)].into_iter().collect())]
            .into_iter()
            .collect(),
        ..PlanConstraints::default()
    };
    let ctx = league.context(constraints).unwrap();
    let err = PathSolver::new(&ctx, locked(Chip::Wildcard, 2))
        .err()
        .expect("forbidden chip");
    assert_eq!(
        err,
        SolveError::Chip(ChipError::Forbidden {
            chip: Chip::Wildcard,
            gameweek: Gameweek(2)
        })
    );
    assert!(err.is_infeasible());
}

#[test]
fn suggestions_cover_each_allowed_chip_once() {
    let league = league();
    let constraints = PlanConstraints {
        chip_allow: Some([Chip::TripleCaptain, Chip::FreeHit].into_iter().collect()),
        ..PlanConstraints::default()
    };
    let ctx = league.context(constraints).unwrap();
    let suggestions = suggest_chips(&ctx, ChipSet::ALL).unwrap();
    assert_eq!(suggestions.len(), 2);
    let triple = suggestions
        .iter()
        .find(|s| s.chip == Chip::TripleCaptain)
        .expect("triple captain suggested");
    let idx = league.horizon.index_of(triple.gameweek).unwrap();
    let lineup = ctx.lineup(idx, &league.squad).unwrap();
    assert!((triple.estimated_gain - lineup.captain_score).abs() < 1e-4);
    let free_hit = suggestions.iter().find(|s| s.chip == Chip::FreeHit).unwrap();
    assert!(free_hit.estimated_gain > 0.0);
    for pair in suggestions.windows(2) {
        assert!(pair[0].estimated_gain >= pair[1].estimated_gain);
    }
}
