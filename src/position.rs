// 4.0: lending position tracking. one position per borrow action, append-mostly:
// positions are never deleted, deactivation (liquidation/close) is the only
// destructive transition and it is terminal.
// 4.2 has the risk snapshot, 4.3 the LTV/health math.

use crate::types::{floor_ratio_bps, Address, Amount, Bps, ChainId, PositionId, Timestamp, TokenId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendingPosition {
    pub id: PositionId,
    pub owner: Address,
    pub collateral_amount: Amount,
    pub borrowed_amount: Amount,
    pub collateral_chain: ChainId,
    pub borrow_chain: ChainId,
    pub collateral_token: TokenId,
    pub borrow_token: TokenId,
    // LTV ceiling above which the position is liquidatable, e.g. 8000 = 80%
    pub liquidation_threshold_bps: Bps,
    pub created_at: Timestamp,
    // true -> false exactly once, never reversed
    pub active: bool,
    // informational APY fixed at creation, a function of the borrow chain
    pub yield_rate_bps: Bps,
}

impl LendingPosition {
    pub fn is_cross_chain(&self) -> bool {
        self.collateral_chain != self.borrow_chain
    }

    // 4.1: current loan-to-value. floor(borrowed * 10000 / collateral).
    pub fn current_ltv_bps(&self) -> Bps {
        ltv_bps(self.borrowed_amount, self.collateral_amount)
    }

    pub fn health_factor_bps(&self) -> Bps {
        health_factor_bps(self.collateral_amount, self.borrowed_amount)
    }

    // chains touched by this position, deduplicated. liquidation fans out
    // to every chain in this set.
    pub fn affected_chains(&self) -> Vec<ChainId> {
        if self.is_cross_chain() {
            vec![self.collateral_chain, self.borrow_chain]
        } else {
            vec![self.collateral_chain]
        }
    }
}

// 4.2: per-position risk snapshot. exactly one current snapshot per position,
// overwritten on update, never versioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSnapshot {
    // 0-100
    pub risk_score: u8,
    pub recommended_ltv_bps: Bps,
    // 0-100
    pub liquidation_probability: u8,
    // recomputed on every risk update; Bps::MAX when nothing is borrowed
    pub health_factor_bps: Bps,
    pub optimized_chain: ChainId,
    pub updated_at: Timestamp,
}

// 4.3: the two ratios everything else reads.
pub fn ltv_bps(borrowed: Amount, collateral: Amount) -> Bps {
    floor_ratio_bps(borrowed, collateral)
}

// undefined (treated as +infinity) when borrowed is zero
pub fn health_factor_bps(collateral: Amount, borrowed: Amount) -> Bps {
    floor_ratio_bps(collateral, borrowed)
}
