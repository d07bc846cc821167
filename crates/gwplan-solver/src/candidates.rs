use gwplan_core::model::{MAX_PER_CLUB, Price, Squad, SquadSlot};
use std::cmp::Ordering;

use crate::context::PlanningContext;
use crate::plan::Transfer;

/// One sell-and-buy swap with its score gain over the rest of the horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferMove {
    pub out: SquadSlot,
    pub incoming: SquadSlot,
    pub gain: f32,
}

impl TransferMove {
    pub fn transfer(&self) -> Transfer {
        Transfer::between(&self.out, &self.incoming)
    }

    /// Bank change from making this move.
    pub fn bank_delta(&self) -> i64 {
        i64::from(self.out.selling_price) - i64::from(self.incoming.selling_price)
    }
}

/// A legal set of moves applied to a squad.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSet {
    pub moves: Vec<TransferMove>,
    pub squad: Squad,
    pub bank: Price,
    pub gain: f32,
}

fn by_gain(a: &TransferMove, b: &TransferMove) -> Ordering {
    b.gain
        .total_cmp(&a.gain)
        .then_with(|| a.out.player.cmp(&b.out.player))
        .then_with(|| a.incoming.player.cmp(&b.incoming.player))
}

/// Best affordable, legal replacements for each sellable player in gameweek `idx`.
///
/// Only moves that gain over the remaining horizon are kept, at most
/// `per_player` for each outgoing player.
pub fn replacement_moves(
    ctx: &PlanningContext<'_>,
    squad: &Squad,
    bank: Price,
    idx: usize,
    per_player: usize,
) -> Vec<TransferMove> {
    let gameweek = ctx.gameweeks()[idx];
    let mut moves = Vec::new();
    for out in squad.iter() {
        if !ctx.constraints.can_sell(out.player, gameweek) {
            continue;
        }
        let Some(out_value) = ctx.book.remaining(idx, out.player) else {
            continue;
        };
        let budget = bank + out.selling_price;
        let mut options: Vec<TransferMove> = ctx
            .input
            .pool
            .in_position(out.position)
            .filter(|p| p.price <= budget && !squad.contains(p.id))
            .filter(|p| {
                squad.club_count(p.club) - usize::from(p.club == out.club) < MAX_PER_CLUB
            })
            .filter(|p| ctx.constraints.can_buy(p, gameweek))
            .filter_map(|p| {
                let gain = ctx.book.remaining(idx, p.id)? - out_value;
                (gain > 0.0).then_some(TransferMove {
                    out: *out,
                    incoming: SquadSlot {
                        player: p.id,
                        position: p.position,
                        club: p.club,
                        selling_price: p.price,
                    },
                    gain,
                })
            })
            .collect();
        options.sort_by(by_gain);
        options.truncate(per_player);
        moves.extend(options);
    }
    moves.sort_by(by_gain);
    moves
}

/// Apply `moves` in order; `None` when the bank or squad rules break.
pub fn apply_moves(squad: &Squad, bank: Price, moves: &[TransferMove]) -> Option<TransferSet> {
    let bank_after = i64::from(bank) + moves.iter().map(TransferMove::bank_delta).sum::<i64>();
    if bank_after < 0 {
        return None;
    }
    let mut current = squad.clone();
    for mv in moves {
        current = current.apply_transfer(mv.out.player, mv.incoming).ok()?;
    }
    Some(TransferSet {
        moves: moves.to_vec(),
        squad: current,
        bank: Price::try_from(bank_after).ok()?,
        gain: moves.iter().map(|mv| mv.gain).sum(),
    })
}

fn collect_combinations(
    pool: &[TransferMove],
    max: usize,
    start: usize,
    chosen: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    for i in start..pool.len() {
        let clash = chosen.iter().any(|&c| {
            pool[c].out.player == pool[i].out.player
                || pool[c].incoming.player == pool[i].incoming.player
        });
        if clash {
            continue;
        }
        chosen.push(i);
        if chosen.len() >= 2 {
            out.push(chosen.clone());
        }
        if chosen.len() < max {
            collect_combinations(pool, max, i + 1, chosen, out);
        }
        chosen.pop();
    }
}

/// Single moves plus combinations of the strongest `pool_size` moves, up to
/// `max_transfers` per set. Returns the best `limit` sets by summed gain.
pub fn combine_moves(
    squad: &Squad,
    bank: Price,
    moves: &[TransferMove],
    max_transfers: usize,
    pool_size: usize,
    limit: usize,
) -> Vec<TransferSet> {
    if max_transfers == 0 {
        return Vec::new();
    }
    let mut sets: Vec<TransferSet> = moves
        .iter()
        .filter_map(|mv| apply_moves(squad, bank, std::slice::from_ref(mv)))
        .collect();

    if max_transfers >= 2 {
        let pool = &moves[..moves.len().min(pool_size)];
        let mut combos = Vec::new();
        collect_combinations(pool, max_transfers, 0, &mut Vec::new(), &mut combos);
        for combo in combos {
            let chosen: Vec<TransferMove> = combo.iter().map(|&i| pool[i]).collect();
            if let Some(set) = apply_moves(squad, bank, &chosen) {
                sets.push(set);
            }
        }
    }

    sets.sort_by(|a, b| {
        b.gain
            .total_cmp(&a.gain)
            .then_with(|| a.moves.len().cmp(&b.moves.len()))
            .then_with(|| a.squad.fingerprint().cmp(&b.squad.fingerprint()))
    });
    sets.dedup_by(|a, b| a.squad == b.squad);
    sets.truncate(limit);
    sets
}
