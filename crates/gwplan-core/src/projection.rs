use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::gameweek::Gameweek;
use crate::model::player::PlayerId;

/// Point projection for one player in one gameweek, consumed verbatim from the
/// projection source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub mean_points: f32,
    pub if_fit_points: f32,
    pub expected_minutes: f32,
    pub expected_minutes_if_fit: f32,
    /// Availability confidence in `[0, 1]`.
    pub confidence: f32,
}

impl Projection {
    /// Fully fit, nailed-on projection.
    pub fn certain(points: f32) -> Self {
        Self {
            mean_points: points,
            if_fit_points: points,
            expected_minutes: 90.0,
            expected_minutes_if_fit: 90.0,
            confidence: 1.0,
        }
    }

    /// Combined availability and minutes security in `[0, 1]`.
    pub fn reliability(&self) -> f32 {
        let confidence = if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let minutes_ratio = if self.expected_minutes_if_fit > 0.0 {
            (self.expected_minutes / self.expected_minutes_if_fit).clamp(0.0, 1.0)
        } else {
            0.0
        };
        confidence * minutes_ratio
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRecord {
    pub player: PlayerId,
    pub gameweek: Gameweek,
    #[serde(flatten)]
    pub projection: Projection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ProjectionRecord>", into = "Vec<ProjectionRecord>")]
pub struct ProjectionTable {
    entries: HashMap<(PlayerId, Gameweek), Projection>,
}

impl ProjectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, player: PlayerId, gameweek: Gameweek, projection: Projection) {
        self.entries.insert((player, gameweek), projection);
    }

    pub fn get(&self, player: PlayerId, gameweek: Gameweek) -> Option<&Projection> {
        self.entries.get(&(player, gameweek))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First gameweek in `gameweeks` without a projection for `player`.
    pub fn first_gap(&self, player: PlayerId, gameweeks: &[Gameweek]) -> Option<Gameweek> {
        gameweeks
            .iter()
            .copied()
            .find(|gw| !self.entries.contains_key(&(player, *gw)))
    }

    /// Subset covering only the requested gameweeks and, optionally, players.
    pub fn select(&self, gameweeks: &[Gameweek], players: Option<&[PlayerId]>) -> ProjectionTable {
        let entries = self
            .entries
            .iter()
            .filter(|((player, gw), _)| {
                gameweeks.contains(gw) && players.is_none_or(|ids| ids.contains(player))
            })
            .map(|(key, projection)| (*key, *projection))
            .collect();
        ProjectionTable { entries }
    }
}

impl From<Vec<ProjectionRecord>> for ProjectionTable {
    fn from(records: Vec<ProjectionRecord>) -> Self {
        let entries = records
            .into_iter()
            .map(|record| ((record.player, record.gameweek), record.projection))
            .collect();
        Self { entries }
    }
}

impl From<ProjectionTable> for Vec<ProjectionRecord> {
    fn from(table: ProjectionTable) -> Self {
        let mut records: Vec<ProjectionRecord> = table
            .entries
            .into_iter()
            .map(|((player, gameweek), projection)| ProjectionRecord {
                player,
                gameweek,
                projection,
            })
            .collect();
        records.sort_by_key(|record| (record.gameweek, record.player));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reliability_combines_confidence_and_minutes() {
        let projection = Projection {
            mean_points: 4.0,
            if_fit_points: 6.0,
            expected_minutes: 45.0,
            expected_minutes_if_fit: 90.0,
            confidence: 0.8,
        };
        assert!((projection.reliability() - 0.4).abs() < 1e-6);
        assert_eq!(Projection::certain(5.0).reliability(), 1.0);
    }

    #[test]
    fn reliability_is_zero_without_minutes() {
        let projection = Projection {
            expected_minutes_if_fit: 0.0,
            ..Projection::certain(0.0)
        };
        assert_eq!(projection.reliability(), 0.0);
    }

    #[test]
    fn first_gap_and_select() {
        let mut table = ProjectionTable::new();
        table.insert(PlayerId(1), Gameweek(3), Projection::certain(2.0));
        table.insert(PlayerId(1), Gameweek(4), Projection::certain(3.0));
        table.insert(PlayerId(2), Gameweek(3), Projection::certain(1.0));
        let gws = [Gameweek(3), Gameweek(4)];
        assert_eq!(table.first_gap(PlayerId(1), &gws), None);
        assert_eq!(table.first_gap(PlayerId(2), &gws), Some(Gameweek(4)));

        let only_first = table.select(&[Gameweek(3)], Some(&[PlayerId(2)]));
        assert_eq!(only_first.len(), 1);
        assert!(only_first.get(PlayerId(2), Gameweek(3)).is_some());
    }

    #[test]
    fn serializes_as_flat_records() {
        let mut table = ProjectionTable::new();
        table.insert(PlayerId(9), Gameweek(1), Projection::certain(4.5));
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json[0]["player"], 9);
        assert_eq!(json[0]["mean_points"], 4.5);
        let back: ProjectionTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, table);
    }
}
