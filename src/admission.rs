// 3.0: admission inputs and policy. the ordered precondition checks themselves
// run inside the engine (engine/admission.rs) so the commit is atomic with the
// validation; this module owns the data the gate consumes.

use crate::types::{Address, Amount, Bps, ChainId, TokenId};
use serde::{Deserialize, Serialize};

// A prospective position, before the gate has seen it. Field for field what
// the admitted LendingPosition will carry, minus everything ledger-assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionDraft {
    pub owner: Address,
    pub collateral_amount: Amount,
    pub borrowed_amount: Amount,
    pub collateral_chain: ChainId,
    pub borrow_chain: ChainId,
    pub collateral_token: TokenId,
    pub borrow_token: TokenId,
}

// 3.1: proof that collateral has been locked with the escrow collaborator
// before admission. the gate requires the proof to name the borrower and to
// cover the full collateral amount; custody itself is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowProof {
    pub owner: Address,
    pub locked: Amount,
    // escrow-side reference, carried for audit only
    pub reference: String,
}

impl EscrowProof {
    pub fn covers(&self, draft: &PositionDraft) -> bool {
        self.owner == draft.owner && self.locked >= draft.collateral_amount
    }
}

/** 3.2: admission policy constants. defaults follow the protocol parameters:
85% max LTV, risk score ceiling 85, liquidation probability ceiling 50. */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionPolicy {
    pub max_ltv_bps: Bps,
    // 0-100; assessments above this are rejected at creation
    pub risk_score_ceiling: u8,
    // 0-100
    pub liquidation_prob_ceiling: u8,
    // LTV ceiling stamped onto each admitted position
    pub liquidation_threshold_bps: Bps,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            max_ltv_bps: Bps(8500),
            risk_score_ceiling: 85,
            liquidation_prob_ceiling: 50,
            liquidation_threshold_bps: Bps(8000),
        }
    }
}
