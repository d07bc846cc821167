use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::player::{ClubId, PlayerId, Price};
use crate::model::position::{Position, SQUAD_SIZE};

pub const MAX_PER_CLUB: usize = 3;

/// One owned player together with the price the manager would receive on sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SquadSlot {
    pub player: PlayerId,
    pub position: Position,
    pub club: ClubId,
    pub selling_price: Price,
}

/// Sorted player ids; two squads with equal fingerprints hold the same players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SquadFingerprint(pub [u32; SQUAD_SIZE]);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SquadError {
    #[error("squad must hold {SQUAD_SIZE} players, found {found}")]
    WrongSize { found: usize },
    #[error("player {0} appears more than once")]
    DuplicatePlayer(PlayerId),
    #[error("{position} count must be {expected}, found {found}")]
    PositionCount {
        position: Position,
        expected: usize,
        found: usize,
    },
    #[error("{club} would have {count} players (max {MAX_PER_CLUB})")]
    ClubLimit { club: ClubId, count: usize },
    #[error("player {0} is not in the squad")]
    NotInSquad(PlayerId),
    #[error("player {0} is already in the squad")]
    AlreadyInSquad(PlayerId),
    #[error("cannot replace a {out} with a {incoming}")]
    PositionMismatch { out: Position, incoming: Position },
}

/// A legal fifteen-player squad stored in canonical order (position, then id).
///
/// Every constructor validates position quotas and the club limit, so a `Squad`
/// value is always legal and can be shared freely between search branches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<SquadSlot>", into = "Vec<SquadSlot>")]
pub struct Squad {
    slots: [SquadSlot; SQUAD_SIZE],
}

impl Squad {
    pub fn new<I>(slots: I) -> Result<Self, SquadError>
    where
        I: IntoIterator<Item = SquadSlot>,
    {
        let mut slots: Vec<SquadSlot> = slots.into_iter().collect();
        if slots.len() != SQUAD_SIZE {
            return Err(SquadError::WrongSize { found: slots.len() });
        }
        slots.sort_by_key(|slot| (slot.position, slot.player));

        let mut ids: Vec<PlayerId> = slots.iter().map(|slot| slot.player).collect();
        ids.sort();
        for pair in ids.windows(2) {
            if pair[0] == pair[1] {
                return Err(SquadError::DuplicatePlayer(pair[0]));
            }
        }

        for position in Position::ALL {
            let found = slots.iter().filter(|s| s.position == position).count();
            if found != position.squad_quota() {
                return Err(SquadError::PositionCount {
                    position,
                    expected: position.squad_quota(),
                    found,
                });
            }
        }

        for slot in &slots {
            let count = slots.iter().filter(|s| s.club == slot.club).count();
            if count > MAX_PER_CLUB {
                return Err(SquadError::ClubLimit {
                    club: slot.club,
                    count,
                });
            }
        }

        let mut array = [slots[0]; SQUAD_SIZE];
        array.copy_from_slice(&slots);
        Ok(Self { slots: array })
    }

    pub fn slots(&self) -> &[SquadSlot; SQUAD_SIZE] {
        &self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = &SquadSlot> {
        self.slots.iter()
    }

    pub fn in_position(&self, position: Position) -> &[SquadSlot] {
        let start = position.squad_offset();
        &self.slots[start..start + position.squad_quota()]
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.slots.iter().any(|slot| slot.player == player)
    }

    pub fn slot(&self, player: PlayerId) -> Option<&SquadSlot> {
        self.slots.iter().find(|slot| slot.player == player)
    }

    pub fn club_count(&self, club: ClubId) -> usize {
        self.slots.iter().filter(|slot| slot.club == club).count()
    }

    pub fn position_counts(&self) -> [usize; 4] {
        let mut counts = [0usize; 4];
        for slot in &self.slots {
            counts[slot.position.index()] += 1;
        }
        counts
    }

    /// Sum of selling prices.
    pub fn value(&self) -> Price {
        self.slots.iter().map(|slot| slot.selling_price).sum()
    }

    pub fn fingerprint(&self) -> SquadFingerprint {
        let mut ids = [0u32; SQUAD_SIZE];
        for (dst, slot) in ids.iter_mut().zip(self.slots.iter()) {
            *dst = slot.player.0;
        }
        ids.sort_unstable();
        SquadFingerprint(ids)
    }

    /// Swap `out` for `incoming`, keeping the squad legal.
    pub fn apply_transfer(&self, out: PlayerId, incoming: SquadSlot) -> Result<Squad, SquadError> {
        let outgoing = *self.slot(out).ok_or(SquadError::NotInSquad(out))?;
        if self.contains(incoming.player) {
            return Err(SquadError::AlreadyInSquad(incoming.player));
        }
        if outgoing.position != incoming.position {
            return Err(SquadError::PositionMismatch {
                out: outgoing.position,
                incoming: incoming.position,
            });
        }
        let club_after = self.club_count(incoming.club) + 1
            - usize::from(outgoing.club == incoming.club);
        if club_after > MAX_PER_CLUB {
            return Err(SquadError::ClubLimit {
                club: incoming.club,
                count: club_after,
            });
        }
        Squad::new(
            self.slots
                .iter()
                .map(|slot| if slot.player == out { incoming } else { *slot }),
        )
    }
}

impl TryFrom<Vec<SquadSlot>> for Squad {
    type Error = SquadError;

    fn try_from(slots: Vec<SquadSlot>) -> Result<Self, Self::Error> {
        Squad::new(slots)
    }
}

impl From<Squad> for Vec<SquadSlot> {
    fn from(squad: Squad) -> Self {
        squad.slots.to_vec()
    }
}
