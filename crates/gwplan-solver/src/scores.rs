use gwplan_core::model::{FixtureCalendar, Gameweek, PlayerId};
use gwplan_core::objective::ObjectiveMode;
use gwplan_core::pool::PlayerPool;
use gwplan_core::projection::ProjectionTable;
use std::collections::HashMap;

/// Objective scores for every projected player in every horizon gameweek.
///
/// Players lacking a projection for any horizon gameweek are left out and can
/// therefore never be bought.
#[derive(Debug, Clone, Default)]
pub struct ScoreBook {
    gameweeks: Vec<Gameweek>,
    per_gameweek: Vec<HashMap<PlayerId, f32>>,
    /// `remaining[i][p]` is the sum of `p`'s scores from gameweek `i` to the end.
    remaining: Vec<HashMap<PlayerId, f32>>,
}

impl ScoreBook {
    pub fn build(
        pool: &PlayerPool,
        projections: &ProjectionTable,
        calendar: &FixtureCalendar,
        gameweeks: &[Gameweek],
        objective: ObjectiveMode,
    ) -> Self {
        let len = gameweeks.len();
        let mut per_gameweek = vec![HashMap::with_capacity(pool.len()); len];
        let mut remaining = vec![HashMap::with_capacity(pool.len()); len];
        for player in pool.iter() {
            let scores: Option<Vec<f32>> = gameweeks
                .iter()
                .map(|gw| {
                    projections
                        .get(player.id, *gw)
                        .map(|p| objective.score(p, calendar.outlook(player.club, *gw)))
                })
                .collect();
            let Some(scores) = scores else {
                continue;
            };
            let mut tail = 0.0f32;
            for idx in (0..len).rev() {
                tail += scores[idx];
                per_gameweek[idx].insert(player.id, scores[idx]);
                remaining[idx].insert(player.id, tail);
            }
        }
        Self {
            gameweeks: gameweeks.to_vec(),
            per_gameweek,
            remaining,
        }
    }

    pub fn gameweeks(&self) -> &[Gameweek] {
        &self.gameweeks
    }

    pub fn len(&self) -> usize {
        self.gameweeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gameweeks.is_empty()
    }

    pub fn score(&self, idx: usize, player: PlayerId) -> Option<f32> {
        self.per_gameweek.get(idx)?.get(&player).copied()
    }

    /// Score summed from gameweek `idx` to the end of the horizon.
    pub fn remaining(&self, idx: usize, player: PlayerId) -> Option<f32> {
        self.remaining.get(idx)?.get(&player).copied()
    }

    /// Score summed over gameweek indices `from..to`.
    pub fn window(&self, from: usize, to: usize, player: PlayerId) -> Option<f32> {
        let start = self.remaining(from, player)?;
        let end = if to >= self.len() {
            0.0
        } else {
            self.remaining(to, player)?
        };
        Some(start - end)
    }

    pub fn is_scored(&self, player: PlayerId) -> bool {
        self.per_gameweek
            .first()
            .is_some_and(|scores| scores.contains_key(&player))
    }
}
