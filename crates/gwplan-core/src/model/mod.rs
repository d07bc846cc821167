pub mod chip;
pub mod gameweek;
pub mod player;
pub mod position;
pub mod squad;

pub use chip::{Chip, ChipSet};
pub use gameweek::{DoubleBlank, FixtureCalendar, FixtureOutlook, Gameweek, Horizon};
pub use player::{ClubId, Player, PlayerId, Price};
pub use position::{Position, SQUAD_SIZE, STARTERS};
pub use squad::{MAX_PER_CLUB, Squad, SquadError, SquadFingerprint, SquadSlot};
