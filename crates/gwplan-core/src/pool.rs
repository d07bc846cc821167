use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::player::{Player, PlayerId, Price};
use crate::model::position::Position;

/// Every player that can appear in a squad, indexed by id and position.
#[derive(Debug, Clone, Default)]
pub struct PlayerPool {
    players: BTreeMap<PlayerId, Player>,
    by_position: [Vec<PlayerId>; 4],
}

impl PlayerPool {
    pub fn new<I>(players: I) -> Self
    where
        I: IntoIterator<Item = Player>,
    {
        let players: BTreeMap<PlayerId, Player> =
            players.into_iter().map(|p| (p.id, p)).collect();
        let mut by_position: [Vec<PlayerId>; 4] = Default::default();
        for player in players.values() {
            by_position[player.position.index()].push(player.id);
        }
        Self {
            players,
            by_position,
        }
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    /// Players in `position`, ascending by id.
    pub fn in_position(&self, position: Position) -> impl Iterator<Item = &Player> {
        self.by_position[position.index()]
            .iter()
            .filter_map(|id| self.players.get(id))
    }

    pub fn position_count(&self, position: Position) -> usize {
        self.by_position[position.index()].len()
    }
}

/// Restricts which players may ever be bought.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolFilter {
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub min_minutes: Option<u32>,
    pub positions: Option<Vec<Position>>,
    /// Upper bound on ownership percent, for differential hunting.
    pub max_ownership: Option<f32>,
}

impl PoolFilter {
    pub fn accepts(&self, player: &Player) -> bool {
        if self.min_price.is_some_and(|min| player.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| player.price > max) {
            return false;
        }
        if self.min_minutes.is_some_and(|min| player.minutes < min) {
            return false;
        }
        if let Some(positions) = self.positions.as_ref() {
            if !positions.is_empty() && !positions.contains(&player.position) {
                return false;
            }
        }
        if self.max_ownership.is_some_and(|max| player.ownership > max) {
            return false;
        }
        true
    }

    pub fn is_unrestricted(&self) -> bool {
        *self == PoolFilter::default()
    }
}
