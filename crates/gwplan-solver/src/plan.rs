use gwplan_core::lineup::Formation;
use gwplan_core::model::{Chip, Gameweek, PlayerId, Position, Price, Squad, SquadSlot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameweekAction {
    Hold,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transfer {
    pub out: PlayerId,
    #[serde(rename = "in")]
    pub incoming: PlayerId,
    pub position: Position,
    pub sell_price: Price,
    pub buy_price: Price,
}

impl Transfer {
    pub fn between(out: &SquadSlot, incoming: &SquadSlot) -> Self {
        Self {
            out: out.player,
            incoming: incoming.player,
            position: out.position,
            sell_price: out.selling_price,
            buy_price: incoming.selling_price,
        }
    }
}

/// Squad that enters the following gameweek.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SquadCarry {
    Persist,
    /// Free hit week: the pre-chip squad and bank come back.
    Revert { squad: Squad, bank: Price },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameweekPlan {
    pub gameweek: Gameweek,
    pub action: GameweekAction,
    pub transfers: Vec<Transfer>,
    pub chip: Option<Chip>,
    pub free_transfers_before: u8,
    pub free_transfers_after: u8,
    pub paid_transfers: u32,
    pub hit_cost: u32,
    /// Squad fielded this gameweek, after transfers.
    pub squad: Squad,
    pub bank: Price,
    pub formation: Formation,
    pub captain: PlayerId,
    pub vice_captain: PlayerId,
    pub captain_decision: bool,
    /// Lineup score including chip effects, before hits.
    pub score: f32,
    pub carry: SquadCarry,
}

impl GameweekPlan {
    pub fn carry_forward(&self) -> (&Squad, Price) {
        match &self.carry {
            SquadCarry::Persist => (&self.squad, self.bank),
            SquadCarry::Revert { squad, bank } => (squad, *bank),
        }
    }

    pub fn net_score(&self) -> f32 {
        self.score - self.hit_cost as f32
    }
}

/// One candidate plan across the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferPath {
    pub gameweeks: Vec<GameweekPlan>,
    /// Sum of gameweek scores minus hit costs.
    pub total_score: f32,
    pub score_vs_hold: f32,
    pub total_hits: u32,
    pub hit_points: u32,
}

/// Transfers grouped by gameweek; paths with equal signatures make the same moves.
pub type MoveSignature = Vec<(Gameweek, Vec<(PlayerId, PlayerId)>)>;

impl TransferPath {
    pub fn from_plans(gameweeks: Vec<GameweekPlan>, hold_total: f32) -> Self {
        let total_hits = gameweeks.iter().map(|gw| gw.paid_transfers).sum();
        let hit_points: u32 = gameweeks.iter().map(|gw| gw.hit_cost).sum();
        let gross: f32 = gameweeks.iter().map(|gw| gw.score).sum();
        let total_score = gross - hit_points as f32;
        Self {
            gameweeks,
            total_score,
            score_vs_hold: total_score - hold_total,
            total_hits,
            hit_points,
        }
    }

    pub fn move_signature(&self) -> MoveSignature {
        self.gameweeks
            .iter()
            .map(|gw| {
                let mut moves: Vec<(PlayerId, PlayerId)> =
                    gw.transfers.iter().map(|t| (t.out, t.incoming)).collect();
                moves.sort();
                (gw.gameweek, moves)
            })
            .collect()
    }

    pub fn transfer_count(&self) -> usize {
        self.gameweeks.iter().map(|gw| gw.transfers.len()).sum()
    }

    pub fn chips_used(&self) -> Vec<(Gameweek, Chip)> {
        self.gameweeks
            .iter()
            .filter_map(|gw| gw.chip.map(|chip| (gw.gameweek, chip)))
            .collect()
    }
}

/// Pair outgoing and incoming players position by position.
pub fn squad_diff(before: &Squad, after: &Squad) -> Vec<Transfer> {
    let mut transfers = Vec::new();
    for position in Position::ALL {
        let outs = before
            .in_position(position)
            .iter()
            .filter(|slot| !after.contains(slot.player));
        let ins = after
            .in_position(position)
            .iter()
            .filter(|slot| !before.contains(slot.player));
        transfers.extend(outs.zip(ins).map(|(out, incoming)| Transfer::between(out, incoming)));
    }
    transfers
}
