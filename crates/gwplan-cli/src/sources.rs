//! Collaborators that supply league data to the planner, and a file-backed
//! snapshot implementing all of them.

use core::fmt;
use gwplan_core::model::{
    ChipSet, FixtureCalendar, Gameweek, Horizon, Player, PlayerId, Price, Squad, SquadError,
    SquadSlot,
};
use gwplan_core::pool::PlayerPool;
use gwplan_core::projection::ProjectionTable;
use gwplan_core::synthetic::SyntheticLeague;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManagerId(pub u64);

impl fmt::Display for ManagerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "manager {}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadPick {
    pub player: PlayerId,
    pub selling_price: Price,
}

/// A manager's live team state as held by the upstream provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerSquad {
    pub manager: ManagerId,
    pub picks: Vec<SquadPick>,
    pub bank: Price,
    pub free_transfers: u8,
    #[serde(default = "all_chips")]
    pub chips_available: ChipSet,
}

fn all_chips() -> ChipSet {
    ChipSet::ALL
}

impl ManagerSquad {
    /// Resolve picks against the pool into a validated squad.
    pub fn squad(&self, pool: &PlayerPool) -> Result<Squad, SourceError> {
        let mut slots = Vec::with_capacity(self.picks.len());
        for pick in &self.picks {
            let player = pool
                .get(pick.player)
                .ok_or(SourceError::UnknownPlayer(pick.player))?;
            slots.push(SquadSlot {
                player: pick.player,
                position: player.position,
                club: player.club,
                selling_price: pick.selling_price,
            });
        }
        Squad::new(slots).map_err(|source| SourceError::InvalidSquad {
            manager: self.manager,
            source,
        })
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{0} not found")]
    UnknownManager(ManagerId),
    #[error("player {0} is not in the player pool")]
    UnknownPlayer(PlayerId),
    #[error("squad for {manager} is invalid: {source}")]
    InvalidSquad {
        manager: ManagerId,
        #[source]
        source: SquadError,
    },
    #[error("{0} unavailable")]
    Unavailable(&'static str),
    #[error("failed to access snapshot {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse snapshot {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write snapshot {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SourceError {
    /// Unknown managers are caller mistakes; everything else is missing data.
    pub fn is_input(&self) -> bool {
        matches!(self, SourceError::UnknownManager(_))
    }
}

pub trait ProjectionSource {
    /// Per-player projections for `gameweeks`, optionally restricted to `players`.
    fn projections(
        &self,
        gameweeks: &[Gameweek],
        players: Option<&[PlayerId]>,
    ) -> Result<ProjectionTable, SourceError>;
}

pub trait GameweekCalendar {
    fn planning_horizon(&self) -> Result<Horizon, SourceError>;
    fn double_blank_teams(&self, gameweeks: &[Gameweek]) -> Result<FixtureCalendar, SourceError>;
}

pub trait SquadSource {
    fn manager_squad(&self, manager: ManagerId) -> Result<ManagerSquad, SourceError>;
    fn players(&self) -> Result<PlayerPool, SourceError>;
}

/// Serialized league state: one file holds everything the planner reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSnapshot {
    pub horizon: Horizon,
    pub players: Vec<Player>,
    pub projections: ProjectionTable,
    #[serde(default)]
    pub calendar: FixtureCalendar,
    #[serde(default)]
    pub managers: Vec<ManagerSquad>,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    snapshot: LeagueSnapshot,
}

impl SnapshotStore {
    pub fn new(snapshot: LeagueSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: LeagueSnapshot = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| SourceError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(
            target: "gwplan_cli::plan",
            path = %path.display(),
            players = snapshot.players.len(),
            managers = snapshot.managers.len(),
            "loaded league snapshot"
        );
        Ok(Self::new(snapshot))
    }

    /// Wrap a generated league, assigning its squad to `manager`.
    pub fn from_synthetic(league: &SyntheticLeague, manager: ManagerId) -> Self {
        let picks = league
            .squad
            .iter()
            .map(|slot| SquadPick {
                player: slot.player,
                selling_price: slot.selling_price,
            })
            .collect();
        Self::new(LeagueSnapshot {
            horizon: league.horizon.clone(),
            players: league.players.clone(),
            projections: league.projections.clone(),
            calendar: league.calendar.clone(),
            managers: vec![ManagerSquad {
                manager,
                picks,
                bank: league.bank,
                free_transfers: league.free_transfers,
                chips_available: ChipSet::ALL,
            }],
        })
    }

    pub fn to_path(&self, path: impl AsRef<Path>) -> Result<(), SourceError> {
        let path = path.as_ref();
        let io_err = |source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
        serde_json::to_writer_pretty(&mut writer, &self.snapshot).map_err(|source| {
            SourceError::Write {
                path: path.to_path_buf(),
                source,
            }
        })?;
        writer.flush().map_err(io_err)
    }

    pub fn snapshot(&self) -> &LeagueSnapshot {
        &self.snapshot
    }
}

impl ProjectionSource for SnapshotStore {
    fn projections(
        &self,
        gameweeks: &[Gameweek],
        players: Option<&[PlayerId]>,
    ) -> Result<ProjectionTable, SourceError> {
        if self.snapshot.projections.is_empty() {
            return Err(SourceError::Unavailable("projections"));
        }
        Ok(self.snapshot.projections.select(gameweeks, players))
    }
}

impl GameweekCalendar for SnapshotStore {
    fn planning_horizon(&self) -> Result<Horizon, SourceError> {
        if self.snapshot.horizon.is_empty() {
            return Err(SourceError::Unavailable("planning horizon"));
        }
        Ok(self.snapshot.horizon.clone())
    }

    fn double_blank_teams(&self, gameweeks: &[Gameweek]) -> Result<FixtureCalendar, SourceError> {
        Ok(self.snapshot.calendar.restricted_to(gameweeks))
    }
}

impl SquadSource for SnapshotStore {
    fn manager_squad(&self, manager: ManagerId) -> Result<ManagerSquad, SourceError> {
        self.snapshot
            .managers
            .iter()
            .find(|m| m.manager == manager)
            .cloned()
            .ok_or(SourceError::UnknownManager(manager))
    }

    fn players(&self) -> Result<PlayerPool, SourceError> {
        if self.snapshot.players.is_empty() {
            return Err(SourceError::Unavailable("player pool"));
        }
        Ok(PlayerPool::new(self.snapshot.players.iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gwplan_core::synthetic::SyntheticConfig;

    fn store() -> SnapshotStore {
        let league = SyntheticLeague::generate(&SyntheticConfig::default()).expect("league");
        SnapshotStore::from_synthetic(&league, ManagerId(1))
    }

    #[test]
    fn synthetic_manager_squad_resolves() {
        let store = store();
        let pool = store.players().expect("pool");
        let manager = store.manager_squad(ManagerId(1)).expect("manager");
        let squad = manager.squad(&pool).expect("legal squad");
        assert_eq!(squad.position_counts(), [2, 5, 5, 3]);
        assert_eq!(manager.chips_available, ChipSet::ALL);
    }

    #[test]
    fn unknown_manager_is_input_error() {
        let err = store().manager_squad(ManagerId(9)).expect_err("missing");
        assert!(err.is_input());
    }

    #[test]
    fn unknown_pick_is_missing_data() {
        let store = store();
        let pool = store.players().expect("pool");
        let mut manager = store.manager_squad(ManagerId(1)).expect("manager");
        manager.picks[0].player = PlayerId(999_999);
        let err = manager.squad(&pool).expect_err("unknown player");
        assert!(matches!(err, SourceError::UnknownPlayer(PlayerId(999_999))));
        assert!(!err.is_input());
    }

    #[test]
    fn snapshot_survives_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("league.json");
        let store = store();
        store.to_path(&path).expect("write");
        let loaded = SnapshotStore::from_path(&path).expect("read");
        assert_eq!(loaded.snapshot(), store.snapshot());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn write_failure_is_not_reported_as_parse() {
        let err = store().to_path("/dev/full").expect_err("device is full");
        // The snapshot is far larger than one buffer, so the failure surfaces
        // while serializing.
        assert!(matches!(err, SourceError::Write { .. }), "{err:?}");
        assert!(err.to_string().starts_with("failed to write snapshot"));
    }

    #[test]
    fn projections_restrict_to_requested_weeks() {
        let store = store();
        let horizon = store.planning_horizon().expect("horizon");
        let first = &horizon.upcoming[..1];
        let table = store.projections(first, None).expect("projections");
        let player = store.snapshot().players[0].id;
        assert!(table.get(player, first[0]).is_some());
        assert!(table.get(player, horizon.upcoming[1]).is_none());
    }
}
