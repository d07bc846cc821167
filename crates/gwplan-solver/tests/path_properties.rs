mod common;

use common::{HORIZON, entering_squads, ids, league};
use gwplan_core::model::MAX_PER_CLUB;
use gwplan_solver::{
    GameweekAction, PathSolver, PlanConstraints, SearchDepth, SolveOptions, SolveOutcome,
};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

fn solve(options: SolveOptions) -> SolveOutcome {
    let league = league();
    let ctx = league.context(PlanConstraints::default()).unwrap();
    PathSolver::new(&ctx, options).unwrap().solve().unwrap()
}

fn quick() -> SolveOptions {
    SolveOptions {
        depth: SearchDepth::Quick,
        ..SolveOptions::default()
    }
}

#[test]
fn totals_match_gameweek_scores_and_hits() {
    let outcome = solve(SolveOptions::default());
    assert!(!outcome.paths.is_empty());
    for path in &outcome.paths {
        let gross: f32 = path.gameweeks.iter().map(|gw| gw.score).sum();
        let hits: u32 = path.gameweeks.iter().map(|gw| gw.hit_cost).sum();
        assert!((gross - hits as f32 - path.total_score).abs() < 1e-3);
        assert_eq!(path.hit_points, hits);
        assert_eq!(path.hit_points, path.total_hits * 4);
        assert!(
            (path.score_vs_hold - (path.total_score - outcome.hold.total_score)).abs() < 1e-3
        );
    }
}

#[test]
fn every_gameweek_fields_a_legal_squad() {
    let league = league();
    let outcome = solve(SolveOptions::default());
    for path in &outcome.paths {
        assert_eq!(path.gameweeks.len(), HORIZON);
        for plan in &path.gameweeks {
            assert_eq!(plan.squad.position_counts(), [2, 5, 5, 3]);
            let mut clubs = BTreeMap::new();
            for slot in plan.squad.iter() {
                *clubs.entry(slot.club).or_insert(0usize) += 1;
                assert!(league.pool.contains(slot.player));
            }
            assert!(clubs.values().all(|count| *count <= MAX_PER_CLUB));
        }
    }
}

#[test]
fn transfers_connect_consecutive_gameweeks() {
    let league = league();
    let outcome = solve(SolveOptions::default());
    for path in &outcome.paths {
        let entering = entering_squads(&league.squad, path);
        for (plan, before) in path.gameweeks.iter().zip(&entering) {
            let mut owned = ids(before);
            for transfer in &plan.transfers {
                assert!(owned.remove(&transfer.out), "sold {} not owned", transfer.out);
                assert!(owned.insert(transfer.incoming), "bought {} twice", transfer.incoming);
            }
            assert_eq!(owned, ids(&plan.squad));
            let expected = if plan.transfers.is_empty() {
                GameweekAction::Hold
            } else {
                GameweekAction::Transfer
            };
            assert_eq!(plan.action, expected);
        }
    }
}

#[test]
fn free_transfers_chain_between_gameweeks() {
    let outcome = solve(SolveOptions::default());
    for path in &outcome.paths {
        assert_eq!(path.gameweeks[0].free_transfers_before, 1);
        for pair in path.gameweeks.windows(2) {
            assert_eq!(pair[0].free_transfers_after, pair[1].free_transfers_before);
        }
        for plan in &path.gameweeks {
            let used = plan.transfers.len() as u32;
            let free = u32::from(plan.free_transfers_before);
            assert_eq!(plan.paid_transfers, used.saturating_sub(free));
        }
    }
}

#[test]
fn hold_baseline_never_transfers() {
    let outcome = solve(quick());
    assert_eq!(outcome.hold.transfer_count(), 0);
    assert_eq!(outcome.hold.hit_points, 0);
    assert_eq!(outcome.hold.score_vs_hold, 0.0);
    let fts: Vec<u8> = outcome
        .hold
        .gameweeks
        .iter()
        .map(|gw| gw.free_transfers_after)
        .collect();
    assert_eq!(fts, vec![2, 3, 4, 5]);
}

#[test]
fn upgrades_beat_holding() {
    let outcome = solve(SolveOptions::default());
    let best = outcome.best().expect("a path");
    assert!(best.score_vs_hold > 0.0);
    assert!(best.transfer_count() > 0);
}

#[test]
fn paths_are_distinct_and_sorted() {
    let outcome = solve(SolveOptions {
        top_paths: 4,
        ..SolveOptions::default()
    });
    assert!(outcome.paths.len() <= 4);
    let signatures: HashSet<_> = outcome.paths.iter().map(|p| p.move_signature()).collect();
    assert_eq!(signatures.len(), outcome.paths.len());
    for pair in outcome.paths.windows(2) {
        assert!(pair[0].total_score >= pair[1].total_score);
    }
}

#[test]
fn search_is_deterministic() {
    let parallel = solve(SolveOptions::default());
    let serial = solve(SolveOptions {
        parallel: false,
        ..SolveOptions::default()
    });
    assert_eq!(parallel.paths, serial.paths);
    assert_eq!(parallel.hold, serial.hold);
    assert!(!parallel.truncated);
}

#[test]
fn step_cap_truncates_but_keeps_full_paths() {
    let outcome = solve(SolveOptions {
        step_cap: Some(1),
        ..SolveOptions::default()
    });
    assert!(outcome.truncated);
    assert!(!outcome.paths.is_empty());
    for path in &outcome.paths {
        assert_eq!(path.gameweeks.len(), HORIZON);
        // Only the first layer was searched; later weeks hold.
        assert!(path.gameweeks[1..].iter().all(|gw| gw.transfers.is_empty()));
    }
    assert_eq!(outcome.stats.budget_utilization, 100);
}

#[test]
fn expired_clock_returns_the_hold_path() {
    let outcome = solve(SolveOptions {
        time_budget: Some(Duration::ZERO),
        ..SolveOptions::default()
    });
    assert!(outcome.truncated);
    let best = outcome.best().expect("a path");
    assert_eq!(best.transfer_count(), 0);
    assert!((best.total_score - outcome.hold.total_score).abs() < 1e-3);
}

#[test]
fn deeper_search_explores_more() {
    let quick = solve(quick());
    let deep = solve(SolveOptions {
        depth: SearchDepth::Deep,
        ..SolveOptions::default()
    });
    assert!(quick.best().is_some() && deep.best().is_some());
    assert!(deep.stats.states_generated > quick.stats.states_generated);
}
