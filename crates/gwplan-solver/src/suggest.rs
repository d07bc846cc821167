use gwplan_core::model::{Chip, ChipSet, Gameweek};
use serde::{Deserialize, Serialize};

use crate::context::PlanningContext;
use crate::error::SolveError;
use crate::memo::LineupMemo;
use crate::rebuild::rebuild_squad;

/// Best gameweek found for a chip, judged against the current squad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipSuggestion {
    pub chip: Chip,
    pub gameweek: Gameweek,
    /// Points the chip adds over holding in that gameweek (or span, for a wildcard).
    pub estimated_gain: f32,
}

/// Score each available chip in every gameweek it may be played and keep the
/// best week per chip, strongest chip first.
pub fn suggest_chips(
    ctx: &PlanningContext<'_>,
    available: ChipSet,
) -> Result<Vec<ChipSuggestion>, SolveError> {
    let squad = &ctx.input.squad;
    let bank = ctx.input.bank;
    let len = ctx.horizon_len();
    let mut memo = LineupMemo::new();
    let mut held = Vec::with_capacity(len);
    for idx in 0..len {
        held.push(memo.lineup(ctx, idx, squad)?.clone());
    }

    let mut suggestions = Vec::new();
    for chip in available.iter().filter(|c| ctx.constraints.chip_allowed(*c)) {
        let mut best: Option<ChipSuggestion> = None;
        for (idx, gameweek) in ctx.gameweeks().iter().enumerate() {
            if !ctx.constraints.chip_permitted(chip, *gameweek) {
                continue;
            }
            if chip.unlimited_transfers() && ctx.constraints.has_fixed(*gameweek) {
                continue;
            }
            let gain = match chip {
                Chip::BenchBoost => held[idx].bench_score,
                Chip::TripleCaptain => held[idx].captain_score,
                Chip::FreeHit => match rebuild_squad(ctx, squad, bank, idx, idx..idx + 1) {
                    Some((rebuilt, _)) => {
                        memo.lineup(ctx, idx, &rebuilt)?.total_score - held[idx].total_score
                    }
                    None => continue,
                },
                Chip::Wildcard => match rebuild_squad(ctx, squad, bank, idx, idx..len) {
                    Some((rebuilt, _)) => {
                        let mut gain = 0.0;
                        for later in idx..len {
                            gain += memo.lineup(ctx, later, &rebuilt)?.total_score
                                - held[later].total_score;
                        }
                        gain
                    }
                    None => continue,
                },
            };
            if best.as_ref().is_none_or(|b| gain > b.estimated_gain) {
                best = Some(ChipSuggestion {
                    chip,
                    gameweek: *gameweek,
                    estimated_gain: gain,
                });
            }
        }
        suggestions.extend(best);
    }
    suggestions.sort_by(|a, b| {
        b.estimated_gain
            .total_cmp(&a.estimated_gain)
            .then_with(|| a.chip.cmp(&b.chip))
    });
    Ok(suggestions)
}
