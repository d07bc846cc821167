//! Seeded fake league used for demos and tests when no snapshot is available.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

use crate::model::gameweek::{FixtureCalendar, FixtureOutlook, Gameweek, Horizon};
use crate::model::player::{ClubId, Player, PlayerId, Price};
use crate::model::position::Position;
use crate::model::squad::{MAX_PER_CLUB, Squad, SquadError, SquadSlot};
use crate::pool::PlayerPool;
use crate::projection::{Projection, ProjectionTable};

pub const SQUAD_BUDGET: Price = 1000;
const MIN_CLUBS: u16 = 5;
const INJURY_RATE: f64 = 0.08;
const DOUBLE_FACTOR: f32 = 1.85;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub first_gameweek: Gameweek,
    pub horizon: usize,
    pub clubs: u16,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 2024,
            first_gameweek: Gameweek(10),
            horizon: 5,
            clubs: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticLeague {
    pub players: Vec<Player>,
    pub horizon: Horizon,
    pub calendar: FixtureCalendar,
    pub projections: ProjectionTable,
    pub squad: Squad,
    pub bank: Price,
    pub free_transfers: u8,
}

const fn base_price(position: Position) -> (Price, Price) {
    match position {
        Position::Goalkeeper => (40, 2),
        Position::Defender => (40, 3),
        Position::Midfielder => (45, 8),
        Position::Forward => (45, 7),
    }
}

const fn base_points(position: Position) -> f32 {
    match position {
        Position::Goalkeeper => 2.8,
        Position::Defender => 2.9,
        Position::Midfielder => 3.2,
        Position::Forward => 3.4,
    }
}

/// Price the starting squad aims for in each position.
const fn target_price(position: Position) -> Price {
    match position {
        Position::Goalkeeper => 45,
        Position::Defender => 50,
        Position::Midfielder => 70,
        Position::Forward => 75,
    }
}

impl SyntheticLeague {
    pub fn generate(config: &SyntheticConfig) -> Result<Self, SquadError> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let clubs = config.clubs.max(MIN_CLUBS);
        let horizon = Horizon::consecutive(config.first_gameweek, config.horizon.max(1));

        let mut players = Vec::new();
        let mut quality: BTreeMap<PlayerId, u8> = BTreeMap::new();
        let mut next_id = 1u32;
        for club in 1..=clubs {
            for position in Position::ALL {
                for n in 0..position.squad_quota() {
                    let q: u8 = rng.gen_range(0..10);
                    let (base, step) = base_price(position);
                    let minutes: u32 = rng.gen_range(0..=1800);
                    let per_90 = base_points(position) + f32::from(q) * 0.4;
                    let id = PlayerId(next_id);
                    next_id += 1;
                    quality.insert(id, q);
                    players.push(Player {
                        id,
                        name: format!("{} {}-{}", position.code(), club, n + 1),
                        position,
                        club: ClubId(club),
                        price: base + Price::from(q) * step,
                        minutes,
                        total_points: (per_90 * minutes as f32 / 90.0).round() as i32,
                        ownership: rng.gen_range(0.1f32..40.0),
                    });
                }
            }
        }

        let calendar = build_calendar(&mut rng, &horizon, clubs);

        let mut projections = ProjectionTable::new();
        for player in &players {
            let q = quality.get(&player.id).copied().unwrap_or(0);
            let injured = rng.gen_bool(INJURY_RATE);
            let nailed_minutes = if q < 3 { 60.0 } else { 85.0 };
            for (idx, gw) in horizon.upcoming.iter().copied().enumerate() {
                let fit_mean = (base_points(player.position) + f32::from(q) * 0.45
                    + rng.gen_range(-0.8f32..0.8))
                .max(0.5);
                let (factor, minutes_if_fit) = match calendar.outlook(player.club, gw) {
                    FixtureOutlook::Blank => (0.0, 0.0),
                    FixtureOutlook::Single => (1.0, nailed_minutes),
                    FixtureOutlook::Double => (DOUBLE_FACTOR, nailed_minutes * 2.0),
                };
                let confidence = if injured && idx < 2 {
                    rng.gen_range(0.2f32..0.6)
                } else {
                    0.95
                };
                projections.insert(
                    player.id,
                    gw,
                    Projection {
                        mean_points: fit_mean * factor * confidence,
                        if_fit_points: fit_mean * factor,
                        expected_minutes: minutes_if_fit * confidence,
                        expected_minutes_if_fit: minutes_if_fit,
                        confidence,
                    },
                );
            }
        }

        let mut picks = pick_squad(&players, target_price);
        if picks.iter().map(|p| p.price).sum::<Price>() > SQUAD_BUDGET {
            picks = pick_squad(&players, |_| 0);
        }
        let slots: Vec<SquadSlot> = picks
            .iter()
            .map(|p| SquadSlot {
                player: p.id,
                position: p.position,
                club: p.club,
                selling_price: p.price.saturating_sub(rng.gen_range(0..=2)),
            })
            .collect();
        let squad = Squad::new(slots)?;
        let bank = SQUAD_BUDGET.saturating_sub(squad.value());

        Ok(Self {
            players,
            horizon,
            calendar,
            projections,
            squad,
            bank,
            free_transfers: 1,
        })
    }

    pub fn pool(&self) -> PlayerPool {
        PlayerPool::new(self.players.iter().cloned())
    }
}

/// One blank week and one double week when the horizon is long enough.
fn build_calendar(rng: &mut StdRng, horizon: &Horizon, clubs: u16) -> FixtureCalendar {
    let mut calendar = FixtureCalendar::new();
    let mut ids: Vec<u16> = (1..=clubs).collect();
    if let Some(&blank_gw) = horizon.upcoming.get(1) {
        ids.shuffle(rng);
        for club in ids.iter().take(2) {
            calendar.mark_blank(blank_gw, ClubId(*club));
        }
    }
    if let Some(&double_gw) = horizon.upcoming.get(2) {
        ids.shuffle(rng);
        for club in ids.iter().take(4) {
            calendar.mark_double(double_gw, ClubId(*club));
        }
    }
    calendar
}

fn pick_squad<F>(players: &[Player], target: F) -> Vec<&Player>
where
    F: Fn(Position) -> Price,
{
    let mut club_counts: BTreeMap<ClubId, usize> = BTreeMap::new();
    let mut picked = Vec::new();
    for position in Position::ALL {
        let mut options: Vec<&Player> = players.iter().filter(|p| p.position == position).collect();
        options.sort_by_key(|p| (p.price.abs_diff(target(position)), p.id));
        let mut taken = 0;
        for player in options {
            if taken == position.squad_quota() {
                break;
            }
            let count = club_counts.entry(player.club).or_default();
            if *count < MAX_PER_CLUB {
                *count += 1;
                taken += 1;
                picked.push(player);
            }
        }
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_seeded() {
        let config = SyntheticConfig::default();
        let a = SyntheticLeague::generate(&config).unwrap();
        let b = SyntheticLeague::generate(&config).unwrap();
        assert_eq!(a.squad, b.squad);
        assert_eq!(a.bank, b.bank);
        assert_eq!(a.projections, b.projections);
    }

    #[test]
    fn squad_fits_budget() {
        let league = SyntheticLeague::generate(&SyntheticConfig::default()).unwrap();
        assert!(league.squad.value() + league.bank <= SQUAD_BUDGET);
        assert_eq!(league.squad.position_counts(), [2, 5, 5, 3]);
    }

    #[test]
    fn blank_clubs_project_zero() {
        let league = SyntheticLeague::generate(&SyntheticConfig::default()).unwrap();
        let blank_gw = league.horizon.upcoming[1];
        let blank = league.calendar.get(blank_gw).expect("blank week");
        let club = *blank.blank_teams.iter().next().expect("a blank club");
        for player in league.players.iter().filter(|p| p.club == club) {
            let projection = league.projections.get(player.id, blank_gw).unwrap();
            assert_eq!(projection.mean_points, 0.0);
            assert_eq!(projection.expected_minutes_if_fit, 0.0);
        }
    }
}
