use serde::{Deserialize, Serialize};

use crate::candidates::replacement_moves;
use crate::context::PlanningContext;
use crate::error::SolveError;
use crate::plan::Transfer;

/// A single transfer worth considering before the next deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub transfer: Transfer,
    /// Lineup gain in the first gameweek.
    pub gameweek_gain: f32,
    /// Raw player score gain across the rest of the horizon.
    pub horizon_gain: f32,
    pub hit_cost: u32,
    pub net_gain: f32,
}

/// Rank single swaps for the first gameweek by lineup gain net of any hit.
pub fn recommend_transfers(
    ctx: &PlanningContext<'_>,
    per_player: usize,
    limit: usize,
) -> Result<Vec<Recommendation>, SolveError> {
    let squad = &ctx.input.squad;
    let base = ctx.lineup(0, squad)?.total_score;
    let hit_cost = ctx.economy.hit_cost_for(ctx.input.free_transfers, 1);
    let moves = replacement_moves(ctx, squad, ctx.input.bank, 0, per_player);

    let mut recommendations = Vec::with_capacity(moves.len());
    for mv in moves {
        let Ok(after) = squad.apply_transfer(mv.out.player, mv.incoming) else {
            continue;
        };
        let gameweek_gain = ctx.lineup(0, &after)?.total_score - base;
        recommendations.push(Recommendation {
            transfer: mv.transfer(),
            gameweek_gain,
            horizon_gain: mv.gain,
            hit_cost,
            net_gain: gameweek_gain - hit_cost as f32,
        });
    }
    recommendations.sort_by(|a, b| {
        b.net_gain
            .total_cmp(&a.net_gain)
            .then_with(|| b.horizon_gain.total_cmp(&a.horizon_gain))
            .then_with(|| a.transfer.incoming.cmp(&b.transfer.incoming))
    });
    recommendations.truncate(limit);
    Ok(recommendations)
}
