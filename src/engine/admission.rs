//! The admission gate: the single state-mutating entry point for new
//! positions.
//!
//! Preconditions run in a fixed order and the first failure wins, so a draft
//! failing several checks always reports the same error. On success the
//! position and its risk snapshot are written atomically with the
//! `user_positions` append; no partial write is observable.

use super::core::LendingEngine;
use super::results::LedgerError;
use crate::admission::{EscrowProof, PositionDraft};
use crate::events::{EventPayload, PositionOpenedEvent};
use crate::oracle::{RiskAssessment, RiskOracle};
use crate::position::{health_factor_bps, ltv_bps, LendingPosition, RiskSnapshot};
use crate::types::PositionId;

impl LendingEngine {
    /// Consult the oracle first, then admit. The assessment happens before
    /// the ledger is touched, so a slow or failing assessor never blocks
    /// other positions; a failure collapses to the conservative default.
    pub fn assess_and_create(
        &mut self,
        draft: PositionDraft,
        escrow: EscrowProof,
        oracle: &mut dyn RiskOracle,
    ) -> Result<PositionId, LedgerError> {
        let assessment = oracle.assess_or_default(&draft);
        self.create_position(draft, escrow, assessment)
    }

    pub fn create_position(
        &mut self,
        draft: PositionDraft,
        escrow: EscrowProof,
        assessment: RiskAssessment,
    ) -> Result<PositionId, LedgerError> {
        if self.access.is_paused() {
            return Err(LedgerError::Paused);
        }

        // ordered precondition list; first failure wins
        if draft.collateral_amount.is_zero() || draft.borrowed_amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        if !escrow.covers(&draft) {
            return Err(LedgerError::EscrowNotVerified);
        }

        let supported = draft.borrow_chain == self.config.local_chain
            || self.config.supported_chains.contains(&draft.borrow_chain)
            || self.registry.is_registered(draft.borrow_chain);
        if !supported {
            return Err(LedgerError::UnsupportedChain(draft.borrow_chain));
        }

        if draft.borrow_chain != draft.collateral_chain
            && !self.registry.is_registered(draft.borrow_chain)
        {
            return Err(LedgerError::ReceiverNotConfigured(draft.borrow_chain));
        }

        let ltv = ltv_bps(draft.borrowed_amount, draft.collateral_amount);
        if ltv > self.config.policy.max_ltv_bps {
            return Err(LedgerError::LtvCeilingExceeded {
                ltv,
                max: self.config.policy.max_ltv_bps,
            });
        }

        if assessment.risk_score > self.config.policy.risk_score_ceiling {
            return Err(LedgerError::RiskScoreTooHigh {
                score: assessment.risk_score,
                ceiling: self.config.policy.risk_score_ceiling,
            });
        }

        if assessment.liquidation_probability > self.config.policy.liquidation_prob_ceiling {
            return Err(LedgerError::LiquidationProbTooHigh {
                prob: assessment.liquidation_probability,
                ceiling: self.config.policy.liquidation_prob_ceiling,
            });
        }

        // commit: id allocation, position, snapshot and owner index together
        let id = self.allocate_position_id();
        let position = LendingPosition {
            id,
            owner: draft.owner,
            collateral_amount: draft.collateral_amount,
            borrowed_amount: draft.borrowed_amount,
            collateral_chain: draft.collateral_chain,
            borrow_chain: draft.borrow_chain,
            collateral_token: draft.collateral_token,
            borrow_token: draft.borrow_token,
            liquidation_threshold_bps: self.config.policy.liquidation_threshold_bps,
            created_at: self.current_time,
            active: true,
            yield_rate_bps: self.config.yield_rate(draft.borrow_chain),
        };

        let snapshot = RiskSnapshot {
            risk_score: assessment.risk_score,
            recommended_ltv_bps: assessment.recommended_ltv_bps,
            liquidation_probability: assessment.liquidation_probability,
            health_factor_bps: health_factor_bps(draft.collateral_amount, draft.borrowed_amount),
            optimized_chain: assessment.optimized_chain,
            updated_at: self.current_time,
        };

        self.positions.insert(id, position);
        self.snapshots.insert(id, snapshot);
        self.user_positions.entry(draft.owner).or_default().push(id);

        self.emit_event(EventPayload::PositionOpened(PositionOpenedEvent {
            position_id: id,
            owner: draft.owner,
            collateral_chain: draft.collateral_chain,
            borrow_chain: draft.borrow_chain,
            collateral_amount: draft.collateral_amount,
            borrowed_amount: draft.borrowed_amount,
            ltv_bps: ltv,
        }));

        Ok(id)
    }
}
