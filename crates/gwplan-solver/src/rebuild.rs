//! Whole-squad rebuilds for wildcard and free hit weeks.

use gwplan_core::model::{ClubId, MAX_PER_CLUB, PlayerId, Position, Price, Squad, SquadSlot};
use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

use crate::context::PlanningContext;

const UPGRADE_ROUNDS: usize = 15;
const MIN_UPGRADE: f32 = 1e-4;

#[derive(Debug, Clone, Copy)]
struct Candidate {
    slot: SquadSlot,
    value: f32,
}

#[derive(Debug, Default)]
struct Selection {
    picked: Vec<Candidate>,
    ids: HashSet<PlayerId>,
    positions: [usize; 4],
    clubs: BTreeMap<ClubId, usize>,
    spent: Price,
}

impl Selection {
    fn add(&mut self, candidate: Candidate) {
        self.ids.insert(candidate.slot.player);
        self.positions[candidate.slot.position.index()] += 1;
        *self.clubs.entry(candidate.slot.club).or_default() += 1;
        self.spent += candidate.slot.selling_price;
        self.picked.push(candidate);
    }

    fn club_count(&self, club: ClubId) -> usize {
        self.clubs.get(&club).copied().unwrap_or(0)
    }

    fn open(&self, position: Position) -> usize {
        position.squad_quota() - self.positions[position.index()]
    }
}

/// Pick the highest value squad for gameweek indices `scope`, spending at
/// most the squad's selling value plus `bank`.
///
/// Owned players keep their selling price; everyone else costs the market
/// price. Players the constraints forbid selling stay in the squad. Returns
/// `None` when no legal squad fits the budget.
pub fn rebuild_squad(
    ctx: &PlanningContext<'_>,
    squad: &Squad,
    bank: Price,
    idx: usize,
    scope: Range<usize>,
) -> Option<(Squad, Price)> {
    let gameweek = ctx.gameweeks()[idx];
    let budget = bank + squad.value();
    let value_of = |player: PlayerId| ctx.book.window(scope.start, scope.end, player);

    let mut keep = Selection::default();
    let mut candidates = Vec::new();
    for slot in squad.iter() {
        let value = value_of(slot.player).unwrap_or(0.0);
        let candidate = Candidate { slot: *slot, value };
        if ctx.constraints.can_sell(slot.player, gameweek) {
            candidates.push(candidate);
        } else {
            keep.add(candidate);
        }
    }
    for player in ctx.input.pool.iter() {
        if squad.contains(player.id) || !ctx.constraints.can_buy(player, gameweek) {
            continue;
        }
        if let Some(value) = value_of(player.id) {
            candidates.push(Candidate {
                slot: SquadSlot {
                    player: player.id,
                    position: player.position,
                    club: player.club,
                    selling_price: player.price,
                },
                value,
            });
        }
    }

    candidates.sort_by(|a, b| {
        b.value
            .total_cmp(&a.value)
            .then_with(|| a.slot.selling_price.cmp(&b.slot.selling_price))
            .then_with(|| a.slot.player.cmp(&b.slot.player))
    });
    let mut by_price: [Vec<usize>; 4] = Default::default();
    for (i, candidate) in candidates.iter().enumerate() {
        by_price[candidate.slot.position.index()].push(i);
    }
    for list in &mut by_price {
        list.sort_by_key(|&i| (candidates[i].slot.selling_price, candidates[i].slot.player));
    }

    let mut selection = keep;
    for (i, candidate) in candidates.iter().enumerate() {
        let position = candidate.slot.position;
        if selection.open(position) == 0
            || selection.club_count(candidate.slot.club) >= MAX_PER_CLUB
        {
            continue;
        }
        let reserve = cheapest_fill(&candidates, &by_price, &selection, position, i);
        let Some(reserve) = reserve else {
            continue;
        };
        if selection.spent + candidate.slot.selling_price + reserve <= budget {
            selection.add(*candidate);
        }
    }
    if Position::ALL.iter().any(|p| selection.open(*p) > 0) {
        return None;
    }

    let locked: HashSet<PlayerId> = squad
        .iter()
        .filter(|slot| !ctx.constraints.can_sell(slot.player, gameweek))
        .map(|slot| slot.player)
        .collect();
    upgrade(&mut selection, &candidates, &locked, budget);

    let rebuilt = Squad::new(selection.picked.iter().map(|c| c.slot)).ok()?;
    Some((rebuilt, budget - selection.spent))
}

/// Cost of the cheapest players that would fill every open slot once
/// `taking` fills one slot of `position`. Club limits are ignored.
fn cheapest_fill(
    candidates: &[Candidate],
    by_price: &[Vec<usize>; 4],
    selection: &Selection,
    position: Position,
    taking: usize,
) -> Option<Price> {
    let mut total = 0;
    for p in Position::ALL {
        let mut need = selection.open(p) - usize::from(p == position);
        for &i in &by_price[p.index()] {
            if need == 0 {
                break;
            }
            if i == taking || selection.ids.contains(&candidates[i].slot.player) {
                continue;
            }
            total += candidates[i].slot.selling_price;
            need -= 1;
        }
        if need > 0 {
            return None;
        }
    }
    Some(total)
}

/// Swap in better value players while the budget allows.
fn upgrade(
    selection: &mut Selection,
    candidates: &[Candidate],
    locked: &HashSet<PlayerId>,
    budget: Price,
) {
    for _ in 0..UPGRADE_ROUNDS {
        let mut best: Option<(usize, usize, f32)> = None;
        for (slot_idx, current) in selection.picked.iter().enumerate() {
            if locked.contains(&current.slot.player) {
                continue;
            }
            let headroom = budget - selection.spent + current.slot.selling_price;
            for (cand_idx, candidate) in candidates.iter().enumerate() {
                if candidate.slot.position != current.slot.position
                    || candidate.slot.selling_price > headroom
                    || selection.ids.contains(&candidate.slot.player)
                {
                    continue;
                }
                let club_after = selection.club_count(candidate.slot.club)
                    - usize::from(candidate.slot.club == current.slot.club);
                if club_after >= MAX_PER_CLUB {
                    continue;
                }
                let gain = candidate.value - current.value;
                if gain > MIN_UPGRADE && best.is_none_or(|(_, _, g)| gain > g) {
                    best = Some((slot_idx, cand_idx, gain));
                }
            }
        }
        let Some((slot_idx, cand_idx, _)) = best else {
            break;
        };
        let old = selection.picked.swap_remove(slot_idx);
        selection.ids.remove(&old.slot.player);
        selection.positions[old.slot.position.index()] -= 1;
        if let Some(count) = selection.clubs.get_mut(&old.slot.club) {
            *count -= 1;
        }
        selection.spent -= old.slot.selling_price;
        selection.add(candidates[cand_idx]);
    }
}
