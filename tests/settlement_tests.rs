//! Dispatch and receiver settlement, end to end: the message leaves the
//! engine through the transport and is fed to a `Receiver` by hand, the same
//! separation the deployed protocol has.

use lending_core::*;
use rust_decimal_macros::dec;

const ADMIN: Address = Address(1);
const ALICE: Address = Address(10);

fn amt(v: i64) -> Amount {
    Amount::new_unchecked(v.into())
}

fn setup(borrow_chain: ChainId) -> (LendingEngine, PositionId) {
    let mut engine = LendingEngine::new(LedgerConfig::default(), ADMIN);
    engine
        .register_receiver(ADMIN, ChainId(2), Address(100))
        .unwrap();
    engine
        .register_receiver(ADMIN, ChainId(3), Address(101))
        .unwrap();

    let draft = PositionDraft {
        owner: ALICE,
        collateral_amount: amt(100),
        borrowed_amount: amt(75),
        collateral_chain: ChainId(1),
        borrow_chain,
        collateral_token: TokenId::NATIVE,
        borrow_token: TokenId::NATIVE,
    };
    let escrow = EscrowProof {
        owner: ALICE,
        locked: amt(100),
        reference: "esc".to_string(),
    };
    let assessment = RiskAssessment {
        risk_score: 40,
        recommended_ltv_bps: Bps(7000),
        liquidation_probability: 10,
        optimized_chain: borrow_chain,
    };
    let id = engine.create_position(draft, escrow, assessment).unwrap();
    (engine, id)
}

#[test]
fn borrow_settles_at_the_receiver() {
    let (mut engine, id) = setup(ChainId(2));
    let mut transport = InMemoryTransport::new();
    let mut receiver = Receiver::new(ChainId(2), ADMIN);
    receiver
        .deposit_reserve(ADMIN, TokenId::NATIVE, amt(500))
        .unwrap();

    let result = engine.dispatch_borrow(id, &mut transport).unwrap();
    let sent_hash = match result {
        DispatchResult::Dispatched { message_hash, .. } => message_hash,
        other => panic!("expected Dispatched, got {other:?}"),
    };

    let messages = transport.drain(ChainId(2));
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].dedup_hash(), sent_hash);

    let outcome = receiver
        .handle(&messages[0], Timestamp::from_millis(1_000))
        .unwrap();
    assert_eq!(
        outcome,
        ReceiveOutcome::Borrowed {
            position_id: id,
            owner: ALICE,
            token: TokenId::NATIVE,
            amount: amt(75),
        }
    );
    assert_eq!(receiver.reserve(TokenId::NATIVE), amt(425));
    assert!(matches!(
        receiver.records()[0],
        SettlementRecord::TokensBorrowed { .. }
    ));
}

#[test]
fn duplicate_delivery_pays_once() {
    let (mut engine, id) = setup(ChainId(2));
    let mut transport = InMemoryTransport::new();
    let mut receiver = Receiver::new(ChainId(2), ADMIN);
    receiver
        .deposit_reserve(ADMIN, TokenId::NATIVE, amt(500))
        .unwrap();

    engine.dispatch_borrow(id, &mut transport).unwrap();
    let message = transport.drain(ChainId(2)).remove(0);

    receiver
        .handle(&message, Timestamp::from_millis(1_000))
        .unwrap();
    // a flaky channel redelivers three more times
    for _ in 0..3 {
        let err = receiver
            .handle(&message, Timestamp::from_millis(2_000))
            .unwrap_err();
        assert_eq!(err, ReceiverError::AlreadyProcessed);
    }

    assert_eq!(receiver.reserve(TokenId::NATIVE), amt(425));
    assert_eq!(receiver.records().len(), 1);
}

#[test]
fn distinct_dispatches_are_not_duplicates() {
    let (mut engine, id) = setup(ChainId(2));
    let mut transport = InMemoryTransport::new();
    let mut receiver = Receiver::new(ChainId(2), ADMIN);
    receiver
        .deposit_reserve(ADMIN, TokenId::NATIVE, amt(500))
        .unwrap();

    engine.set_time(Timestamp::from_millis(1_000));
    engine.dispatch_borrow(id, &mut transport).unwrap();
    // a second dispatch of the same position at a later time is a new message
    engine.set_time(Timestamp::from_millis(2_000));
    engine.dispatch_borrow(id, &mut transport).unwrap();

    let messages = transport.drain(ChainId(2));
    assert_eq!(messages.len(), 2);
    assert_ne!(messages[0].dedup_hash(), messages[1].dedup_hash());

    receiver
        .handle(&messages[0], Timestamp::from_millis(3_000))
        .unwrap();
    receiver
        .handle(&messages[1], Timestamp::from_millis(3_000))
        .unwrap();
    assert_eq!(receiver.reserve(TokenId::NATIVE), amt(350));
}

#[test]
fn shortfall_consumes_delivery_and_replay_recovers() {
    let (mut engine, id) = setup(ChainId(2));
    let mut transport = InMemoryTransport::new();
    let mut receiver = Receiver::new(ChainId(2), ADMIN);
    receiver
        .deposit_reserve(ADMIN, TokenId::NATIVE, amt(10))
        .unwrap();

    engine.dispatch_borrow(id, &mut transport).unwrap();
    let message = transport.drain(ChainId(2)).remove(0);

    let err = receiver
        .handle(&message, Timestamp::from_millis(1_000))
        .unwrap_err();
    assert!(matches!(err, ReceiverError::InsufficientReserve { .. }));
    // the delivery is consumed regardless
    assert!(receiver.is_processed(&message));

    // operator tops up and replays explicitly
    receiver
        .deposit_reserve(ADMIN, TokenId::NATIVE, amt(100))
        .unwrap();
    let outcome = receiver
        .replay(ADMIN, &message, Timestamp::from_millis(5_000))
        .unwrap();
    assert!(matches!(outcome, ReceiveOutcome::Borrowed { .. }));
    assert_eq!(receiver.reserve(TokenId::NATIVE), amt(35));
}

#[test]
fn dispatch_failure_leaves_ledger_committed() {
    let (mut engine, id) = setup(ChainId(2));
    let mut transport = InMemoryTransport::new();
    transport.set_fail_all(true);

    let err = engine.dispatch_borrow(id, &mut transport).unwrap_err();
    assert!(matches!(err, LedgerError::DispatchFailed(_)));

    // the position is still on the books, fully admitted
    let position = engine.get_position(id).unwrap();
    assert!(position.active);
    assert_eq!(position.borrowed_amount, amt(75));

    // the failure is on the audit trail
    let failed = engine
        .events()
        .iter()
        .any(|e| matches!(e.payload, EventPayload::DispatchFailed(_)));
    assert!(failed);
}

#[test]
fn local_settlement_bypasses_transport() {
    let (mut engine, id) = setup(ChainId(1));
    let mut transport = InMemoryTransport::new();
    engine
        .fund_local_reserve(ADMIN, TokenId::NATIVE, amt(200))
        .unwrap();

    let result = engine.dispatch_borrow(id, &mut transport).unwrap();
    assert_eq!(result, DispatchResult::SettledLocally);
    assert_eq!(engine.local_reserve(TokenId::NATIVE), amt(125));
    assert_eq!(transport.sent_count(), 0);
}

#[test]
fn receiver_rejects_misrouted_messages() {
    let (mut engine, id) = setup(ChainId(2));
    let mut transport = InMemoryTransport::new();
    // a receiver serving chain 3 gets chain 2 traffic by mistake
    let mut wrong_receiver = Receiver::new(ChainId(3), ADMIN);

    engine.dispatch_borrow(id, &mut transport).unwrap();
    let message = transport.drain(ChainId(2)).remove(0);

    let err = wrong_receiver
        .handle(&message, Timestamp::from_millis(1_000))
        .unwrap_err();
    assert_eq!(
        err,
        ReceiverError::WrongChain {
            target: ChainId(2),
            serving: ChainId(3),
        }
    );
    // misrouted traffic never touches the dedup set
    assert_eq!(wrong_receiver.processed_count(), 0);
}

#[test]
fn liquidation_message_is_record_only_at_receiver() {
    let (mut engine, id) = setup(ChainId(2));
    let mut transport = InMemoryTransport::new();
    let mut receiver = Receiver::new(ChainId(2), ADMIN);
    receiver
        .deposit_reserve(ADMIN, TokenId::NATIVE, amt(500))
        .unwrap();

    // drive the position to liquidation; the borrow leg goes to chain 2
    engine
        .update_risk_assessment(id, ALICE, 95, 95, &mut transport)
        .unwrap();

    let messages = transport.drain(ChainId(2));
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::Liquidate);

    let outcome = receiver
        .handle(&messages[0], Timestamp::from_millis(1_000))
        .unwrap();
    assert_eq!(outcome, ReceiveOutcome::LiquidationRecorded { position_id: id });
    // no funds moved
    assert_eq!(receiver.reserve(TokenId::NATIVE), amt(500));
    assert!(matches!(
        receiver.records()[0],
        SettlementRecord::TokensLiquidated { .. }
    ));
}
