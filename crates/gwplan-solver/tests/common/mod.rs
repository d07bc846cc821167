#![allow(dead_code)]

use gwplan_core::economy::TransferEconomy;
use gwplan_core::model::{
    ChipSet, ClubId, FixtureCalendar, Gameweek, Horizon, Player, PlayerId, Position, Price, Squad,
    SquadSlot,
};
use gwplan_core::objective::ObjectiveMode;
use gwplan_core::pool::PlayerPool;
use gwplan_core::projection::{Projection, ProjectionTable};
use gwplan_solver::{
    GameweekPlan, PlanConstraints, PlanningContext, PlanningInput, SolveError, TransferPath,
};
use std::collections::BTreeSet;

pub const HORIZON: usize = 4;
pub const SUPERSTAR: PlayerId = PlayerId(499);

/// Small hand-built league.
///
/// Owned players have ids `(position + 1) * 100 + k`, sit on clubs 1..=15,
/// cost 5.0m and project about two points. Each position also has four market
/// players (`+ 50 + k`) on clubs 16..=19 that cost more and project 4 to 7
/// points, plus one 12.0m forward projecting 12.
pub struct League {
    pub horizon: Horizon,
    pub pool: PlayerPool,
    pub projections: ProjectionTable,
    pub calendar: FixtureCalendar,
    pub squad: Squad,
    pub bank: Price,
}

fn player(id: u32, position: Position, club: u16, price: Price) -> Player {
    Player {
        id: PlayerId(id),
        name: format!("{} {id}", position.code()),
        position,
        club: ClubId(club),
        price,
        minutes: 900,
        total_points: 30,
        ownership: 10.0,
    }
}

pub fn league() -> League {
    let horizon = Horizon::consecutive(Gameweek(1), HORIZON);
    let mut players = Vec::new();
    let mut means = Vec::new();
    let mut slots = Vec::new();
    let mut club = 1u16;
    for position in Position::ALL {
        let base = (position.index() as u32 + 1) * 100;
        for k in 0..position.squad_quota() as u32 {
            let owned = player(base + k, position, club, 50);
            slots.push(SquadSlot {
                player: owned.id,
                position,
                club: owned.club,
                selling_price: 50,
            });
            means.push((owned.id, 2.0 + 0.1 * k as f32));
            players.push(owned);
            club += 1;
        }
        for k in 0..4u32 {
            let market = player(base + 50 + k, position, 16 + k as u16, 50 + 5 * k);
            means.push((market.id, 4.0 + k as f32));
            players.push(market);
        }
    }
    players.push(player(SUPERSTAR.0, Position::Forward, 20, 120));
    means.push((SUPERSTAR, 12.0));

    let mut projections = ProjectionTable::new();
    for (id, mean) in &means {
        for gw in &horizon.upcoming {
            projections.insert(*id, *gw, Projection::certain(*mean));
        }
    }

    League {
        pool: PlayerPool::new(players),
        projections,
        calendar: FixtureCalendar::new(),
        squad: Squad::new(slots).expect("legal squad"),
        bank: 30,
        horizon,
    }
}

impl League {
    pub fn input(&self, free_transfers: u8, chips: ChipSet) -> PlanningInput<'_> {
        PlanningInput {
            squad: self.squad.clone(),
            bank: self.bank,
            free_transfers,
            chips_available: chips,
            horizon: &self.horizon,
            pool: &self.pool,
            projections: &self.projections,
            calendar: &self.calendar,
        }
    }

    pub fn context(
        &self,
        constraints: PlanConstraints,
    ) -> Result<PlanningContext<'_>, SolveError> {
        PlanningContext::prepare(
            self.input(1, ChipSet::ALL),
            constraints,
            ObjectiveMode::Expected,
            TransferEconomy::default(),
        )
    }
}

pub fn ids(squad: &Squad) -> BTreeSet<PlayerId> {
    squad.iter().map(|slot| slot.player).collect()
}

/// Squad entering each gameweek of `path`.
pub fn entering_squads(start: &Squad, path: &TransferPath) -> Vec<Squad> {
    let mut current = start.clone();
    let mut entering = Vec::new();
    for plan in &path.gameweeks {
        entering.push(current.clone());
        current = plan.carry_forward().0.clone();
    }
    entering
}

pub fn incoming(plan: &GameweekPlan) -> Vec<PlayerId> {
    plan.transfers.iter().map(|t| t.incoming).collect()
}

pub fn outgoing(plan: &GameweekPlan) -> Vec<PlayerId> {
    plan.transfers.iter().map(|t| t.out).collect()
}
