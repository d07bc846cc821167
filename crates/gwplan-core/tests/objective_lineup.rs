use gwplan_core::lineup::{LineupEntry, LineupScoring, select_lineup};
use gwplan_core::model::position::Position;
use gwplan_core::objective::ObjectiveMode;
use gwplan_core::synthetic::{SyntheticConfig, SyntheticLeague};

fn league() -> SyntheticLeague {
    SyntheticLeague::generate(&SyntheticConfig {
        seed: 77,
        horizon: 4,
        ..SyntheticConfig::default()
    })
    .expect("synthetic league")
}

fn entries(league: &SyntheticLeague, mode: ObjectiveMode, idx: usize) -> Vec<LineupEntry> {
    let gw = league.horizon.upcoming[idx];
    league
        .squad
        .iter()
        .map(|slot| {
            let projection = league
                .projections
                .get(slot.player, gw)
                .expect("squad player projected");
            LineupEntry {
                player: slot.player,
                position: slot.position,
                score: mode.score(projection, league.calendar.outlook(slot.club, gw)),
            }
        })
        .collect()
}

#[test]
fn floor_never_raises_a_player_score() {
    let league = league();
    for player in &league.players {
        for gw in &league.horizon.upcoming {
            let projection = league.projections.get(player.id, *gw).unwrap();
            let outlook = league.calendar.outlook(player.club, *gw);
            let expected = ObjectiveMode::Expected.score(projection, outlook);
            let floor = ObjectiveMode::Floor.score(projection, outlook);
            let ceiling = ObjectiveMode::Ceiling.score(projection, outlook);
            assert!(floor <= expected, "{} floor above mean in {}", player.name, gw);
            assert!(ceiling >= expected, "{} ceiling below mean in {}", player.name, gw);
        }
    }
}

#[test]
fn lineup_is_legal_under_every_objective() {
    let league = league();
    for mode in [
        ObjectiveMode::Expected,
        ObjectiveMode::Floor,
        ObjectiveMode::Ceiling,
    ] {
        for idx in 0..league.horizon.len() {
            let lineup = select_lineup(&entries(&league, mode, idx), LineupScoring::default())
                .expect("lineup from legal squad");
            assert_eq!(lineup.starters.len(), 11);
            assert_eq!(lineup.bench.len(), 4);
            let keepers = lineup
                .starters
                .iter()
                .filter(|e| e.position == Position::Goalkeeper)
                .count();
            assert_eq!(keepers, 1);
            for position in Position::ALL {
                let count = lineup
                    .starters
                    .iter()
                    .filter(|e| e.position == position)
                    .count();
                assert!(count >= position.min_starters());
                assert!(count <= position.max_starters());
            }
            let top = lineup
                .starters
                .iter()
                .map(|e| e.score)
                .fold(f32::MIN, f32::max);
            assert_eq!(lineup.captain_score, top);
        }
    }
}

#[test]
fn floor_lineup_total_not_above_expected() {
    let league = league();
    for idx in 0..league.horizon.len() {
        let expected = select_lineup(
            &entries(&league, ObjectiveMode::Expected, idx),
            LineupScoring::default(),
        )
        .unwrap();
        let floor = select_lineup(
            &entries(&league, ObjectiveMode::Floor, idx),
            LineupScoring::default(),
        )
        .unwrap();
        assert!(floor.total_score <= expected.total_score + 1e-4);
    }
}
