use core::fmt;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

use crate::model::chip::Chip;
use crate::model::player::PlayerId;
use crate::model::position::{Position, STARTERS};

/// Starters within this many points of the top scorer make the armband a judgement call.
pub const CAPTAIN_DECISION_MARGIN: f32 = 0.5;

/// Outfield shape of the starting eleven (one goalkeeper is implied).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Formation {
    pub defenders: u8,
    pub midfielders: u8,
    pub forwards: u8,
}

impl Formation {
    const fn new(defenders: u8, midfielders: u8, forwards: u8) -> Self {
        Self {
            defenders,
            midfielders,
            forwards,
        }
    }

    pub const fn count(self, position: Position) -> usize {
        match position {
            Position::Goalkeeper => 1,
            Position::Defender => self.defenders as usize,
            Position::Midfielder => self.midfielders as usize,
            Position::Forward => self.forwards as usize,
        }
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.defenders, self.midfielders, self.forwards)
    }
}

/// Every legal (DEF, MID, FWD) split of the ten outfield starters.
pub const FORMATIONS: [Formation; 8] = [
    Formation::new(3, 4, 3),
    Formation::new(3, 5, 2),
    Formation::new(4, 3, 3),
    Formation::new(4, 4, 2),
    Formation::new(4, 5, 1),
    Formation::new(5, 2, 3),
    Formation::new(5, 3, 2),
    Formation::new(5, 4, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineupEntry {
    pub player: PlayerId,
    pub position: Position,
    pub score: f32,
}

/// Chip-dependent scoring rules for one gameweek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineupScoring {
    pub captain_multiplier: u8,
    pub bench_boost: bool,
}

impl Default for LineupScoring {
    fn default() -> Self {
        Self {
            captain_multiplier: 2,
            bench_boost: false,
        }
    }
}

impl LineupScoring {
    pub fn for_chip(chip: Option<Chip>) -> Self {
        match chip {
            Some(chip) => Self {
                captain_multiplier: chip.captain_multiplier(),
                bench_boost: chip.counts_bench(),
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lineup {
    pub formation: Formation,
    pub starters: Vec<LineupEntry>,
    /// Non-selected players, best first.
    pub bench: Vec<LineupEntry>,
    pub captain: PlayerId,
    pub vice_captain: PlayerId,
    /// Starters within [`CAPTAIN_DECISION_MARGIN`] of the top scorer, captain first.
    pub captain_candidates: Vec<PlayerId>,
    pub starters_score: f32,
    pub captain_score: f32,
    pub bench_score: f32,
    pub total_score: f32,
}

impl Lineup {
    pub fn captain_decision(&self) -> bool {
        self.captain_candidates.len() > 1
    }

    /// Total under different chip rules. The chosen eleven never depends on the
    /// multiplier because the top scorer always starts.
    pub fn rescored(&self, scoring: LineupScoring) -> f32 {
        let extra_captain = f32::from(scoring.captain_multiplier.saturating_sub(1));
        let bench = if scoring.bench_boost {
            self.bench_score
        } else {
            0.0
        };
        self.starters_score + extra_captain * self.captain_score + bench
    }
}

/// A formation could not be filled. Squads are validated on construction, so
/// this signals a broken invariant rather than bad user input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineupError {
    #[error("{position}: need at least {required} players, found {found}")]
    Insufficient {
        position: Position,
        required: usize,
        found: usize,
    },
    #[error("no legal formation from {found} outfield players")]
    NoFormation { found: usize },
}

fn by_score_desc(a: &LineupEntry, b: &LineupEntry) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.player.cmp(&b.player))
}

/// Pick the highest scoring legal eleven, captain and vice-captain.
pub fn select_lineup(
    entries: &[LineupEntry],
    scoring: LineupScoring,
) -> Result<Lineup, LineupError> {
    let mut grouped: [Vec<LineupEntry>; 4] = Default::default();
    for entry in entries {
        grouped[entry.position.index()].push(*entry);
    }
    for position in Position::ALL {
        let group = &mut grouped[position.index()];
        if group.len() < position.min_starters() {
            return Err(LineupError::Insufficient {
                position,
                required: position.min_starters(),
                found: group.len(),
            });
        }
        group.sort_by(by_score_desc);
    }

    let mut best: Option<(Formation, f32)> = None;
    for formation in FORMATIONS {
        let feasible = Position::ALL
            .iter()
            .all(|p| grouped[p.index()].len() >= formation.count(*p));
        if !feasible {
            continue;
        }
        let total: f32 = Position::ALL
            .iter()
            .map(|p| {
                grouped[p.index()]
                    .iter()
                    .take(formation.count(*p))
                    .map(|e| e.score)
                    .sum::<f32>()
            })
            .sum();
        match best {
            Some((_, best_total)) if total <= best_total => {}
            _ => best = Some((formation, total)),
        }
    }

    let Some((formation, _)) = best else {
        let found = grouped[1..].iter().map(Vec::len).sum();
        return Err(LineupError::NoFormation { found });
    };

    let mut starters = Vec::with_capacity(STARTERS);
    let mut bench = Vec::new();
    for position in Position::ALL {
        let group = &grouped[position.index()];
        let take = formation.count(position);
        starters.extend_from_slice(&group[..take]);
        bench.extend_from_slice(&group[take..]);
    }
    bench.sort_by(by_score_desc);

    let mut ranked = starters.clone();
    ranked.sort_by(by_score_desc);
    let captain = ranked[0];
    let vice_captain = ranked.get(1).copied().unwrap_or(captain);
    let captain_candidates = ranked
        .iter()
        .take_while(|e| captain.score - e.score <= CAPTAIN_DECISION_MARGIN)
        .map(|e| e.player)
        .collect();

    let starters_score: f32 = starters.iter().map(|e| e.score).sum();
    let bench_score: f32 = bench.iter().map(|e| e.score).sum();
    let mut lineup = Lineup {
        formation,
        starters,
        bench,
        captain: captain.player,
        vice_captain: vice_captain.player,
        captain_candidates,
        starters_score,
        captain_score: captain.score,
        bench_score,
        total_score: 0.0,
    };
    lineup.total_score = lineup.rescored(scoring);
    Ok(lineup)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squad_entries(scores: [f32; 15]) -> Vec<LineupEntry> {
        let mut entries = Vec::new();
        let mut idx = 0usize;
        for position in Position::ALL {
            for _ in 0..position.squad_quota() {
                entries.push(LineupEntry {
                    player: PlayerId(idx as u32 + 1),
                    position,
                    score: scores[idx],
                });
                idx += 1;
            }
        }
        entries
    }

    #[test]
    fn formations_are_all_legal() {
        for formation in FORMATIONS {
            let outfield = formation.defenders + formation.midfielders + formation.forwards;
            assert_eq!(outfield, 10);
            for position in Position::ALL {
                assert!(formation.count(position) >= position.min_starters());
                assert!(formation.count(position) <= position.max_starters());
            }
        }
    }

    #[test]
    fn picks_best_formation() {
        // GK 5,1 | DEF 6,6,6,1,1 | MID 2,2,2,2,2 | FWD 9,8,7
        let entries = squad_entries([
            5.0, 1.0, 6.0, 6.0, 6.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 9.0, 8.0, 7.0,
        ]);
        let lineup = select_lineup(&entries, LineupScoring::default()).unwrap();
        assert_eq!(lineup.formation, Formation::new(3, 4, 3));
        assert_eq!(lineup.starters.len(), 11);
        assert_eq!(lineup.bench.len(), 4);
        assert_eq!(lineup.captain, PlayerId(13));
        assert_eq!(lineup.vice_captain, PlayerId(14));
        assert!(!lineup.captain_decision());
        // 5 + 18 + 8 + 24 starters, captain 9 doubled.
        assert!((lineup.starters_score - 55.0).abs() < 1e-5);
        assert!((lineup.total_score - 64.0).abs() < 1e-5);
    }

    #[test]
    fn bench_sorted_by_score() {
        let entries = squad_entries([
            5.0, 1.5, 6.0, 6.0, 6.0, 1.0, 0.5, 2.0, 2.0, 2.0, 2.0, 2.0, 9.0, 8.0, 7.0,
        ]);
        let lineup = select_lineup(&entries, LineupScoring::default()).unwrap();
        let scores: Vec<f32> = lineup.bench.iter().map(|e| e.score).collect();
        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(scores, sorted);
    }

    #[test]
    fn near_equal_top_scorers_flag_a_decision() {
        let entries = squad_entries([
            5.0, 1.0, 6.0, 6.0, 6.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 9.0, 8.7, 7.0,
        ]);
        let lineup = select_lineup(&entries, LineupScoring::default()).unwrap();
        assert_eq!(lineup.captain, PlayerId(13));
        assert!(lineup.captain_decision());
        assert_eq!(lineup.captain_candidates, vec![PlayerId(13), PlayerId(14)]);
    }

    #[test]
    fn triple_captain_adds_one_more_captain_score() {
        let entries = squad_entries([
            5.0, 1.0, 6.0, 6.0, 6.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 9.0, 8.0, 7.0,
        ]);
        let normal = select_lineup(&entries, LineupScoring::default()).unwrap();
        let triple =
            select_lineup(&entries, LineupScoring::for_chip(Some(Chip::TripleCaptain))).unwrap();
        assert_eq!(normal.captain, triple.captain);
        let normal_bonus = normal.total_score - normal.starters_score;
        let triple_bonus = triple.total_score - triple.starters_score;
        assert!((triple_bonus - 2.0 * normal_bonus).abs() < 1e-5);
    }

    #[test]
    fn bench_boost_counts_everyone() {
        let entries = squad_entries([1.0; 15]);
        let lineup =
            select_lineup(&entries, LineupScoring::for_chip(Some(Chip::BenchBoost))).unwrap();
        assert!((lineup.total_score - 16.0).abs() < 1e-5);
        assert!((lineup.rescored(LineupScoring::default()) - 12.0).abs() < 1e-5);
    }

    #[test]
    fn missing_goalkeeper_is_an_error() {
        let entries: Vec<LineupEntry> = squad_entries([1.0; 15])
            .into_iter()
            .filter(|e| e.position != Position::Goalkeeper)
            .collect();
        let err = select_lineup(&entries, LineupScoring::default()).expect_err("no keeper");
        assert!(matches!(
            err,
            LineupError::Insufficient {
                position: Position::Goalkeeper,
                ..
            }
        ));
    }
}
