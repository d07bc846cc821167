use core::fmt;
use serde::{Deserialize, Serialize};

use crate::model::position::Position;

/// Prices are integer tenths of a million (75 == £7.5m).
pub type Price = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClubId(pub u16);

impl fmt::Display for ClubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "club {}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub club: ClubId,
    /// Current market price.
    pub price: Price,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub total_points: i32,
    /// Share of managers holding the player, in percent.
    #[serde(default)]
    pub ownership: f32,
}

impl Player {
    pub fn points_per_90(&self) -> f32 {
        if self.minutes == 0 {
            return 0.0;
        }
        round2(self.total_points as f32 / self.minutes as f32 * 90.0)
    }

    pub fn points_per_million(&self) -> f32 {
        if self.price == 0 {
            return 0.0;
        }
        round2(self.total_points as f32 / (self.price as f32 / 10.0))
    }
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

pub fn format_price(price: Price) -> String {
    format!("£{}.{}m", price / 10, price % 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(minutes: u32, total_points: i32, price: Price) -> Player {
        Player {
            id: PlayerId(7),
            name: "Test".to_string(),
            position: Position::Midfielder,
            club: ClubId(3),
            price,
            minutes,
            total_points,
            ownership: 12.5,
        }
    }

    #[test]
    fn per_90_is_zero_without_minutes() {
        assert_eq!(player(0, 40, 80).points_per_90(), 0.0);
    }

    #[test]
    fn per_90_scales_minutes() {
        assert_eq!(player(900, 50, 80).points_per_90(), 5.0);
    }

    #[test]
    fn per_million_uses_tenths() {
        assert_eq!(player(900, 80, 80).points_per_million(), 10.0);
    }

    #[test]
    fn price_formats_with_one_decimal() {
        assert_eq!(format_price(75), "£7.5m");
        assert_eq!(format_price(130), "£13.0m");
    }
}
