//! Risk updates, health evaluation and the liquidation state machine.
//!
//! Liquidation is two-phase: detection (a pure read over the position and its
//! snapshot) and execution (an explicit call that re-validates AtRisk before
//! committing). Once a position is marked inactive the fan-out to every
//! affected chain proceeds leg by leg; a failed leg is reported in the
//! outcome and never resurrects the position. Liquidation stays available
//! while the ledger is paused.

use super::core::LendingEngine;
use super::results::{ChainDispatch, LedgerError, LiquidationOutcome, RiskUpdateOutcome};
use crate::events::{
    EventPayload, LiquidationRecordedEvent, PositionLiquidatedEvent, RiskUpdatedEvent,
};
use crate::liquidation::{evaluate_health, HealthStatus};
use crate::message::MessageKind;
use crate::transport::Transport;
use crate::types::{Address, PositionId};

impl LendingEngine {
    /// Derived health state. never mutates.
    pub fn health_status(&self, position_id: PositionId) -> Result<HealthStatus, LedgerError> {
        let position = self
            .positions
            .get(&position_id)
            .ok_or(LedgerError::PositionNotFound(position_id))?;
        let snapshot = self
            .snapshots
            .get(&position_id)
            .ok_or(LedgerError::PositionNotFound(position_id))?;
        Ok(evaluate_health(position, snapshot, &self.config.triggers))
    }

    /// Overwrite a position's risk score and liquidation probability.
    /// Permitted to the owner, the admin, and authorized callers. A
    /// probability above the auto-liquidate threshold cascades into an
    /// immediate liquidation on behalf of the caller.
    pub fn update_risk_assessment(
        &mut self,
        position_id: PositionId,
        caller: Address,
        risk_score: u8,
        liquidation_probability: u8,
        transport: &mut dyn Transport,
    ) -> Result<RiskUpdateOutcome, LedgerError> {
        let position = self
            .positions
            .get(&position_id)
            .ok_or(LedgerError::PositionNotFound(position_id))?;

        if !self.access.may_update_risk(caller, position.owner) {
            return Err(LedgerError::Unauthorized);
        }
        if risk_score > 100 || liquidation_probability > 100 {
            return Err(LedgerError::InvalidRiskValue);
        }
        if !position.active {
            return Err(LedgerError::PositionNotActive(position_id));
        }

        let health_factor_bps = position.health_factor_bps();
        let now = self.current_time;

        let snapshot = self
            .snapshots
            .get_mut(&position_id)
            .ok_or(LedgerError::PositionNotFound(position_id))?;
        snapshot.risk_score = risk_score;
        snapshot.liquidation_probability = liquidation_probability;
        snapshot.health_factor_bps = health_factor_bps;
        snapshot.updated_at = now;

        self.emit_event(EventPayload::RiskUpdated(RiskUpdatedEvent {
            position_id,
            risk_score,
            liquidation_probability,
            health_factor_bps,
        }));

        // 13.2: the update itself may push the position past the point of no
        // return; the cascade runs in the same call so the window between
        // flagging and acting is zero
        let auto_liquidated =
            if liquidation_probability > self.config.triggers.auto_liquidate_prob_threshold {
                Some(self.liquidate(position_id, caller, transport)?)
            } else {
                None
            };

        Ok(RiskUpdateOutcome {
            position_id,
            health_factor_bps,
            auto_liquidated,
        })
    }

    /// Liquidate an at-risk position. the AtRisk check runs against the state
    /// at call time, not at detection time.
    pub fn liquidate(
        &mut self,
        position_id: PositionId,
        caller: Address,
        transport: &mut dyn Transport,
    ) -> Result<LiquidationOutcome, LedgerError> {
        let position = self
            .positions
            .get(&position_id)
            .ok_or(LedgerError::PositionNotFound(position_id))?;
        if !position.active {
            return Err(LedgerError::PositionNotActive(position_id));
        }

        let snapshot = self
            .snapshots
            .get(&position_id)
            .ok_or(LedgerError::PositionNotFound(position_id))?;
        if !evaluate_health(position, snapshot, &self.config.triggers).is_at_risk() {
            return Err(LedgerError::PositionHealthy(position_id));
        }

        let owner = position.owner;
        let ltv_bps = position.current_ltv_bps();
        let probability = snapshot.liquidation_probability;
        let collateral_chain = position.collateral_chain;
        let collateral_token = position.collateral_token;
        let collateral_amount = position.collateral_amount;
        let borrow_token = position.borrow_token;
        let borrowed_amount = position.borrowed_amount;
        let chains = position.affected_chains();

        // commit before fan-out: the position is dead whatever the
        // transport does next
        if let Some(position) = self.positions.get_mut(&position_id) {
            position.active = false;
        }

        let mut dispatches = Vec::with_capacity(chains.len());
        for chain in chains {
            if chain == self.config.local_chain {
                self.emit_event(EventPayload::LiquidationRecorded(
                    LiquidationRecordedEvent { position_id, chain },
                ));
                dispatches.push(ChainDispatch::RecordedLocally { chain });
                continue;
            }

            let (token, amount) = if chain == collateral_chain {
                (collateral_token, collateral_amount)
            } else {
                (borrow_token, borrowed_amount)
            };

            match self.send_message(
                position_id,
                MessageKind::Liquidate,
                chain,
                owner,
                token,
                amount,
                transport,
            ) {
                Ok((tx, message_hash)) => dispatches.push(ChainDispatch::Sent {
                    chain,
                    tx,
                    message_hash,
                }),
                Err(err) => dispatches.push(ChainDispatch::Failed {
                    chain,
                    reason: err.to_string(),
                }),
            }
        }

        self.emit_event(EventPayload::PositionLiquidated(PositionLiquidatedEvent {
            position_id,
            caller,
            ltv_bps,
            liquidation_probability: probability,
        }));

        Ok(LiquidationOutcome {
            position_id,
            caller,
            dispatches,
        })
    }

    /// Liquidate every currently at-risk position. positions that turn
    /// healthy or inactive mid-sweep are skipped, not errors.
    pub fn sweep_at_risk(
        &mut self,
        caller: Address,
        transport: &mut dyn Transport,
    ) -> Vec<LiquidationOutcome> {
        let mut candidates: Vec<PositionId> = self
            .positions
            .iter()
            .filter(|(_, p)| p.active)
            .filter_map(|(id, position)| {
                let snapshot = self.snapshots.get(id)?;
                evaluate_health(position, snapshot, &self.config.triggers)
                    .is_at_risk()
                    .then_some(*id)
            })
            .collect();
        candidates.sort();

        let mut outcomes = Vec::new();
        for id in candidates {
            if let Ok(outcome) = self.liquidate(id, caller, transport) {
                outcomes.push(outcome);
            }
        }
        outcomes
    }
}
