//! Outbound settlement dispatch.
//!
//! Dispatch is fire-and-forget from the ledger's perspective: a transport
//! failure surfaces as a typed `DispatchFailed` and the position stays active
//! with its escrow locked. Reconciliation is an explicit operator replay,
//! never an automatic retry. A successful send does NOT mark the position
//! settled; the receiver's own record is the source of truth at the
//! destination.

use super::core::LendingEngine;
use super::results::{DispatchResult, LedgerError};
use crate::events::{
    DispatchFailedEvent, EventPayload, LocalSettlementEvent, MessageSentEvent,
};
use crate::message::{MessageKind, SettlementMessage};
use crate::transport::{RevertPolicy, Transport, TxHandle};
use crate::types::{Address, Amount, ChainId, PositionId, TokenId};

// default gas hint handed to the transport for settlement messages
const SETTLEMENT_GAS_HINT: u64 = 200_000;

impl LendingEngine {
    /// Move borrowed funds toward the owner: synchronously from local
    /// reserves when the borrow chain is the ledger's own, otherwise as a
    /// Borrow message to the destination receiver.
    pub fn dispatch_borrow(
        &mut self,
        position_id: PositionId,
        transport: &mut dyn Transport,
    ) -> Result<DispatchResult, LedgerError> {
        if self.access.is_paused() {
            return Err(LedgerError::Paused);
        }

        let position = self
            .positions
            .get(&position_id)
            .ok_or(LedgerError::PositionNotFound(position_id))?;
        if !position.active {
            return Err(LedgerError::PositionNotActive(position_id));
        }

        let owner = position.owner;
        let amount = position.borrowed_amount;
        let token = position.borrow_token;
        let borrow_chain = position.borrow_chain;

        if borrow_chain == self.config.local_chain {
            return self.settle_locally(position_id, owner, token, amount);
        }

        let (tx, message_hash) = self.send_message(
            position_id,
            MessageKind::Borrow,
            borrow_chain,
            owner,
            token,
            amount,
            transport,
        )?;

        Ok(DispatchResult::Dispatched {
            chain: borrow_chain,
            tx,
            message_hash,
        })
    }

    // same-domain transfer, no message needed
    fn settle_locally(
        &mut self,
        position_id: PositionId,
        owner: Address,
        token: TokenId,
        amount: Amount,
    ) -> Result<DispatchResult, LedgerError> {
        let available = self.local_reserve(token);
        let remaining =
            available
                .checked_sub(amount)
                .ok_or(LedgerError::InsufficientLocalFunds {
                    required: amount,
                    available,
                })?;
        self.local_reserves.insert(token, remaining);

        self.emit_event(EventPayload::LocalSettlement(LocalSettlementEvent {
            position_id,
            owner,
            token,
            amount,
        }));

        Ok(DispatchResult::SettledLocally)
    }

    // 12.1: shared message path for borrow dispatch and liquidation fan-out.
    // emits MessageSent on success, DispatchFailed on transport error, and
    // never mutates position state either way.
    pub(super) fn send_message(
        &mut self,
        position_id: PositionId,
        kind: MessageKind,
        target_chain: ChainId,
        owner: Address,
        token: TokenId,
        amount: Amount,
        transport: &mut dyn Transport,
    ) -> Result<(TxHandle, String), LedgerError> {
        let endpoint = self
            .registry
            .lookup(target_chain)
            .ok_or(LedgerError::ReceiverNotConfigured(target_chain))?;

        let message = SettlementMessage {
            kind,
            position_id,
            owner,
            amount,
            token,
            source_chain: self.config.local_chain,
            target_chain,
            issued_at: self.current_time,
        };
        let message_hash = message.dedup_hash();

        match transport.send(
            target_chain,
            endpoint,
            &message,
            SETTLEMENT_GAS_HINT,
            RevertPolicy::Surface,
        ) {
            Ok(tx) => {
                self.emit_event(EventPayload::MessageSent(MessageSentEvent {
                    position_id,
                    kind,
                    target_chain,
                    message_hash: message_hash.clone(),
                    tx: tx.clone(),
                }));
                Ok((tx, message_hash))
            }
            Err(err) => {
                self.emit_event(EventPayload::DispatchFailed(DispatchFailedEvent {
                    position_id,
                    kind,
                    target_chain,
                    reason: err.to_string(),
                }));
                Err(LedgerError::DispatchFailed(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{EscrowProof, PositionDraft};
    use crate::config::LedgerConfig;
    use crate::oracle::RiskAssessment;
    use crate::transport::InMemoryTransport;
    use crate::types::Bps;
    use rust_decimal_macros::dec;

    const ADMIN: Address = Address(1);
    const BORROWER: Address = Address(42);

    fn assessment() -> RiskAssessment {
        RiskAssessment {
            risk_score: 40,
            recommended_ltv_bps: Bps(7000),
            liquidation_probability: 10,
            optimized_chain: ChainId(1),
        }
    }

    fn admit(engine: &mut LendingEngine, borrow_chain: ChainId) -> PositionId {
        let draft = PositionDraft {
            owner: BORROWER,
            collateral_amount: Amount::new_unchecked(dec!(100)),
            borrowed_amount: Amount::new_unchecked(dec!(75)),
            collateral_chain: ChainId(1),
            borrow_chain,
            collateral_token: TokenId::NATIVE,
            borrow_token: TokenId::NATIVE,
        };
        let escrow = EscrowProof {
            owner: BORROWER,
            locked: Amount::new_unchecked(dec!(100)),
            reference: "esc".to_string(),
        };
        engine.create_position(draft, escrow, assessment()).unwrap()
    }

    #[test]
    fn same_chain_borrow_settles_locally() {
        let mut engine = LendingEngine::new(LedgerConfig::default(), ADMIN);
        engine
            .fund_local_reserve(ADMIN, TokenId::NATIVE, Amount::new_unchecked(dec!(100)))
            .unwrap();
        let id = admit(&mut engine, ChainId(1));

        let mut transport = InMemoryTransport::new();
        let result = engine.dispatch_borrow(id, &mut transport).unwrap();

        assert_eq!(result, DispatchResult::SettledLocally);
        assert_eq!(
            engine.local_reserve(TokenId::NATIVE),
            Amount::new_unchecked(dec!(25))
        );
        // no message left the ledger
        assert_eq!(transport.sent_count(), 0);
    }

    #[test]
    fn local_settlement_requires_reserves() {
        let mut engine = LendingEngine::new(LedgerConfig::default(), ADMIN);
        let id = admit(&mut engine, ChainId(1));

        let mut transport = InMemoryTransport::new();
        let err = engine.dispatch_borrow(id, &mut transport).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientLocalFunds { .. }));
        // position untouched by the failed settlement
        assert!(engine.get_position(id).unwrap().active);
    }

    #[test]
    fn cross_chain_borrow_dispatches_message() {
        let mut engine = LendingEngine::new(LedgerConfig::default(), ADMIN);
        engine
            .register_receiver(ADMIN, ChainId(2), Address(100))
            .unwrap();
        let id = admit(&mut engine, ChainId(2));

        let mut transport = InMemoryTransport::new();
        let result = engine.dispatch_borrow(id, &mut transport).unwrap();

        match result {
            DispatchResult::Dispatched { chain, .. } => assert_eq!(chain, ChainId(2)),
            other => panic!("expected Dispatched, got {other:?}"),
        }

        let delivered = transport.delivered(ChainId(2));
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].kind, MessageKind::Borrow);
        assert_eq!(delivered[0].amount.value(), dec!(75));
        assert_eq!(delivered[0].owner, BORROWER);
    }

    #[test]
    fn transport_failure_surfaces_without_rollback() {
        let mut engine = LendingEngine::new(LedgerConfig::default(), ADMIN);
        engine
            .register_receiver(ADMIN, ChainId(2), Address(100))
            .unwrap();
        let id = admit(&mut engine, ChainId(2));

        let mut transport = InMemoryTransport::new();
        transport.fail_chain(ChainId(2));

        let err = engine.dispatch_borrow(id, &mut transport).unwrap_err();
        assert!(matches!(err, LedgerError::DispatchFailed(_)));
        // position remains active, escrow stays locked; recovery is manual
        assert!(engine.get_position(id).unwrap().active);

        // the channel recovers and the same dispatch can be re-issued by the
        // operator; nothing retried automatically in between
        transport.restore_chain(ChainId(2));
        assert!(engine.dispatch_borrow(id, &mut transport).is_ok());
    }

    #[test]
    fn paused_blocks_dispatch() {
        let mut engine = LendingEngine::new(LedgerConfig::default(), ADMIN);
        engine
            .fund_local_reserve(ADMIN, TokenId::NATIVE, Amount::new_unchecked(dec!(100)))
            .unwrap();
        let id = admit(&mut engine, ChainId(1));
        engine.pause(ADMIN).unwrap();

        let mut transport = InMemoryTransport::new();
        let err = engine.dispatch_borrow(id, &mut transport).unwrap_err();
        assert_eq!(err, LedgerError::Paused);
    }

    #[test]
    fn unknown_position() {
        let mut engine = LendingEngine::new(LedgerConfig::default(), ADMIN);
        let mut transport = InMemoryTransport::new();
        let err = engine
            .dispatch_borrow(PositionId(99), &mut transport)
            .unwrap_err();
        assert_eq!(err, LedgerError::PositionNotFound(PositionId(99)));
    }
}
