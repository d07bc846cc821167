use serde::{Deserialize, Serialize};

use crate::model::chip::Chip;

pub const DEFAULT_FREE_TRANSFER_CAP: u8 = 5;
pub const DEFAULT_HIT_COST: u32 = 4;

/// Free-transfer accrual and hit pricing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEconomy {
    pub cap: u8,
    /// Points deducted per transfer beyond the free allowance.
    pub hit_cost: u32,
}

/// Outcome of one gameweek of transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomyStep {
    /// Free transfers available entering the next gameweek.
    pub free_transfers: u8,
    pub paid_transfers: u32,
    pub hit_cost: u32,
}

impl Default for TransferEconomy {
    fn default() -> Self {
        Self {
            cap: DEFAULT_FREE_TRANSFER_CAP,
            hit_cost: DEFAULT_HIT_COST,
        }
    }
}

impl TransferEconomy {
    pub const fn new(cap: u8, hit_cost: u32) -> Self {
        Self { cap, hit_cost }
    }

    pub fn clamp(&self, free_transfers: u8) -> u8 {
        free_transfers.min(self.cap)
    }

    /// Apply `used` transfers against `free_transfers`.
    ///
    /// Wildcard and free hit weeks neither consume nor accrue free transfers:
    /// the count carries over unchanged and no hit is charged.
    pub fn advance(&self, free_transfers: u8, used: u32, chip: Option<Chip>) -> EconomyStep {
        if chip.is_some_and(Chip::unlimited_transfers) {
            return EconomyStep {
                free_transfers,
                paid_transfers: 0,
                hit_cost: 0,
            };
        }
        let available = u32::from(free_transfers);
        let paid_transfers = used.saturating_sub(available);
        let remaining = available.saturating_sub(used);
        let next = (remaining + 1).min(u32::from(self.cap));
        EconomyStep {
            free_transfers: next as u8,
            paid_transfers,
            hit_cost: paid_transfers * self.hit_cost,
        }
    }

    /// Points charged for `used` transfers without advancing the state.
    pub fn hit_cost_for(&self, free_transfers: u8, used: u32) -> u32 {
        used.saturating_sub(u32::from(free_transfers)) * self.hit_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holding_accrues_up_to_cap() {
        let economy = TransferEconomy::new(5, 4);
        let mut ft = 1u8;
        let mut seen = Vec::new();
        for _ in 0..3 {
            let step = economy.advance(ft, 0, None);
            assert_eq!(step.hit_cost, 0);
            ft = step.free_transfers;
            seen.push(ft);
        }
        assert_eq!(seen, vec![2, 3, 4]);
        for _ in 0..5 {
            ft = economy.advance(ft, 0, None).free_transfers;
        }
        assert_eq!(ft, 5);
    }

    #[test]
    fn extra_transfer_costs_a_hit() {
        let economy = TransferEconomy::new(5, 4);
        let step = economy.advance(1, 2, None);
        assert_eq!(step.paid_transfers, 1);
        assert_eq!(step.hit_cost, 4);
        assert_eq!(step.free_transfers, 1);
    }

    #[test]
    fn using_all_free_transfers_leaves_one() {
        let economy = TransferEconomy::default();
        let step = economy.advance(3, 3, None);
        assert_eq!(step.hit_cost, 0);
        assert_eq!(step.free_transfers, 1);
        let step = economy.advance(3, 1, None);
        assert_eq!(step.free_transfers, 3);
    }

    #[test]
    fn transfer_chips_freeze_the_count() {
        let economy = TransferEconomy::new(5, 4);
        for chip in [Chip::Wildcard, Chip::FreeHit] {
            let step = economy.advance(2, 11, Some(chip));
            assert_eq!(step.free_transfers, 2);
            assert_eq!(step.hit_cost, 0);
            assert_eq!(step.paid_transfers, 0);
        }
    }

    #[test]
    fn scoring_chips_follow_normal_rules() {
        let economy = TransferEconomy::new(5, 4);
        let step = economy.advance(1, 2, Some(Chip::BenchBoost));
        assert_eq!(step.hit_cost, 4);
        assert_eq!(economy.hit_cost_for(1, 3), 8);
    }
}
