//! Cross-Chain Lending Ledger Simulation.
//!
//! Demonstrates the full ledger lifecycle including risk-gated admission,
//! same-chain and cross-chain settlement, duplicate message delivery, risk
//! updates and liquidation fan-out.

use lending_core::*;
use rust_decimal_macros::dec;

fn main() {
    println!("Cross-Chain Lending Ledger Simulation");
    println!("Three Chains, Risk-Gated Admission, Full Lifecycle\n");

    scenario_1_admission();
    scenario_2_local_settlement();
    scenario_3_cross_chain_borrow();
    scenario_4_duplicate_delivery();
    scenario_5_risk_update_and_liquidation();
    scenario_6_channel_outage();
    scenario_7_pause();

    println!("\nAll simulations completed successfully.");
}

fn draft(owner: Address, collateral: i64, borrowed: i64, borrow_chain: ChainId) -> PositionDraft {
    PositionDraft {
        owner,
        collateral_amount: Amount::new_unchecked(collateral.into()),
        borrowed_amount: Amount::new_unchecked(borrowed.into()),
        collateral_chain: ChainId(1),
        borrow_chain,
        collateral_token: TokenId::NATIVE,
        borrow_token: TokenId::NATIVE,
    }
}

fn escrow_for(d: &PositionDraft, reference: &str) -> EscrowProof {
    EscrowProof {
        owner: d.owner,
        locked: d.collateral_amount,
        reference: reference.to_string(),
    }
}

/// Risk-gated admission, including an assessor outage.
fn scenario_1_admission() {
    println!("Scenario 1: Risk-Gated Admission\n");

    let admin = Address(1);
    let alice = Address(10);
    let mut engine = LendingEngine::new(LedgerConfig::default(), admin);
    engine.set_time(Timestamp::from_millis(1_000));

    println!(
        "  Policy: max LTV {} ({} as a fraction)",
        engine.config().policy.max_ltv_bps,
        engine.config().max_ltv_fraction()
    );

    let payload = r#"{"riskScore": 45, "recommendedLTV": 70, "liquidationProbability": 15, "optimizedChain": 1}"#;
    let assessment = decode_assessment(payload, ChainId(1));
    println!(
        "  Assessor says: score {}, probability {}, recommends {}",
        assessment.risk_score, assessment.liquidation_probability, assessment.recommended_ltv_bps
    );

    let d = draft(alice, 100, 75, ChainId(1));
    let escrow = escrow_for(&d, "esc-1");
    let id = engine.create_position(d, escrow, assessment).unwrap();
    let position = engine.get_position(id).unwrap();

    println!(
        "  Alice admitted as position {}: LTV {}, health factor {}",
        id,
        position.current_ltv_bps(),
        position.health_factor_bps()
    );

    // over-leveraged draft rejected before any state changes
    let d = draft(alice, 100, 90, ChainId(1));
    let escrow = escrow_for(&d, "esc-2");
    let err = engine.create_position(d, escrow, assessment).unwrap_err();
    println!("  90% LTV draft rejected: {err}");

    // assessor down: admission continues on the conservative default
    let mut offline = FailingOracle;
    let d = draft(alice, 100, 50, ChainId(1));
    let escrow = escrow_for(&d, "esc-3");
    let id = engine.assess_and_create(d, escrow, &mut offline).unwrap();
    let snapshot = engine.get_snapshot(id).unwrap();
    println!(
        "  Assessor offline, position {} admitted with fallback score {}\n",
        id, snapshot.risk_score
    );
}

/// Borrow settles synchronously when the borrow chain is the local chain.
fn scenario_2_local_settlement() {
    println!("Scenario 2: Same-Chain Settlement\n");

    let admin = Address(1);
    let alice = Address(10);
    let mut engine = LendingEngine::new(LedgerConfig::default(), admin);
    let mut transport = InMemoryTransport::new();

    engine
        .fund_local_reserve(admin, TokenId::NATIVE, Amount::new_unchecked(dec!(1000)))
        .unwrap();

    let d = draft(alice, 100, 75, ChainId(1));
    let escrow = escrow_for(&d, "esc-1");
    let assessment = RiskAssessment::conservative_default(ChainId(1));
    let id = engine.create_position(d, escrow, assessment).unwrap();

    let result = engine.dispatch_borrow(id, &mut transport).unwrap();
    println!("  Dispatch result: {result:?}");
    println!(
        "  Local reserve after payout: {} (messages sent: {})\n",
        engine.local_reserve(TokenId::NATIVE),
        transport.sent_count()
    );
}

/// Borrow on a remote chain travels as a message and pays out at the receiver.
fn scenario_3_cross_chain_borrow() {
    println!("Scenario 3: Cross-Chain Borrow\n");

    let admin = Address(1);
    let alice = Address(10);
    let mut engine = LendingEngine::new(LedgerConfig::default(), admin);
    let mut transport = InMemoryTransport::new();

    let mut receiver = Receiver::new(ChainId(2), admin);
    receiver
        .deposit_reserve(admin, TokenId::NATIVE, Amount::new_unchecked(dec!(500)))
        .unwrap();
    engine.register_receiver(admin, ChainId(2), Address(100)).unwrap();

    let d = draft(alice, 100, 75, ChainId(2));
    let escrow = escrow_for(&d, "esc-1");
    let assessment = RiskAssessment::conservative_default(ChainId(2));
    let id = engine.create_position(d, escrow, assessment).unwrap();

    match engine.dispatch_borrow(id, &mut transport).unwrap() {
        DispatchResult::Dispatched { chain, tx, .. } => {
            println!("  Message dispatched to chain {} as {}", chain.0, tx.0)
        }
        other => println!("  Unexpected result: {other:?}"),
    }

    for message in transport.drain(ChainId(2)) {
        let outcome = receiver.handle(&message, Timestamp::from_millis(2_000)).unwrap();
        println!("  Receiver outcome: {outcome:?}");
    }
    println!(
        "  Receiver reserve after payout: {}\n",
        receiver.reserve(TokenId::NATIVE)
    );
}

/// An unreliable channel redelivers; the receiver absorbs the duplicate.
fn scenario_4_duplicate_delivery() {
    println!("Scenario 4: Duplicate Delivery\n");

    let admin = Address(1);
    let alice = Address(10);
    let mut engine = LendingEngine::new(LedgerConfig::default(), admin);
    let mut transport = InMemoryTransport::new();

    let mut receiver = Receiver::new(ChainId(2), admin);
    receiver
        .deposit_reserve(admin, TokenId::NATIVE, Amount::new_unchecked(dec!(500)))
        .unwrap();
    engine.register_receiver(admin, ChainId(2), Address(100)).unwrap();

    let d = draft(alice, 100, 75, ChainId(2));
    let escrow = escrow_for(&d, "esc-1");
    let assessment = RiskAssessment::conservative_default(ChainId(2));
    let id = engine.create_position(d, escrow, assessment).unwrap();
    engine.dispatch_borrow(id, &mut transport).unwrap();

    let message = transport.drain(ChainId(2)).remove(0);
    receiver.handle(&message, Timestamp::from_millis(2_000)).unwrap();
    println!(
        "  First delivery paid out, reserve now {}",
        receiver.reserve(TokenId::NATIVE)
    );

    // the channel redelivers the same message
    let err = receiver
        .handle(&message, Timestamp::from_millis(2_500))
        .unwrap_err();
    println!(
        "  Second delivery: {} (reserve unchanged at {})\n",
        err,
        receiver.reserve(TokenId::NATIVE)
    );
}

/// Risk deterioration flags a position and eventually liquidates it across
/// every affected chain.
fn scenario_5_risk_update_and_liquidation() {
    println!("Scenario 5: Risk Update and Liquidation Fan-Out\n");

    let admin = Address(1);
    let alice = Address(10);
    let keeper = Address(20);
    let mut engine = LendingEngine::new(LedgerConfig::default(), admin);
    let mut transport = InMemoryTransport::new();

    engine.register_receiver(admin, ChainId(2), Address(100)).unwrap();
    engine.register_receiver(admin, ChainId(3), Address(101)).unwrap();
    engine.add_authorized_caller(admin, keeper).unwrap();

    let mut d = draft(alice, 100, 75, ChainId(3));
    d.collateral_chain = ChainId(2);
    let escrow = escrow_for(&d, "esc-1");
    let assessment = RiskAssessment::conservative_default(ChainId(3));
    let id = engine.create_position(d, escrow, assessment).unwrap();

    let outcome = engine
        .update_risk_assessment(id, keeper, 70, 85, &mut transport)
        .unwrap();
    println!(
        "  Keeper reports probability 85: at risk = {}, auto-liquidated = {}",
        engine.health_status(id).unwrap().is_at_risk(),
        outcome.auto_liquidated.is_some()
    );

    let outcome = engine
        .update_risk_assessment(id, keeper, 95, 95, &mut transport)
        .unwrap();
    let liquidation = outcome.auto_liquidated.unwrap();
    println!("  Keeper reports probability 95: cascade fired");
    for dispatch in &liquidation.dispatches {
        println!("    chain {}: {dispatch:?}", dispatch.chain().0);
    }
    println!(
        "  Position active after liquidation: {}",
        engine.get_position(id).unwrap().active
    );

    // ledger audit summary
    let active = engine.positions_iter().filter(|(_, p)| p.active).count();
    println!(
        "  Book: {} positions, {} active",
        engine.position_count(),
        active
    );
    println!("  Last events:");
    for event in engine.recent_events(3) {
        println!("    [{}] {:?}", event.id.0, event.payload);
    }
    println!();
}

/// A downed channel fails one liquidation leg without resurrecting the
/// position.
fn scenario_6_channel_outage() {
    println!("Scenario 6: Channel Outage During Liquidation\n");

    let admin = Address(1);
    let alice = Address(10);
    let mut engine = LendingEngine::new(LedgerConfig::default(), admin);
    let mut transport = InMemoryTransport::new();

    engine.register_receiver(admin, ChainId(2), Address(100)).unwrap();
    engine.register_receiver(admin, ChainId(3), Address(101)).unwrap();

    let mut d = draft(alice, 100, 75, ChainId(3));
    d.collateral_chain = ChainId(2);
    let escrow = escrow_for(&d, "esc-1");
    let assessment = RiskAssessment::conservative_default(ChainId(3));
    let id = engine.create_position(d, escrow, assessment).unwrap();

    transport.fail_chain(ChainId(3));
    let outcome = engine
        .update_risk_assessment(id, alice, 95, 95, &mut transport)
        .unwrap();
    let liquidation = outcome.auto_liquidated.unwrap();

    for dispatch in &liquidation.dispatches {
        println!("    chain {}: {dispatch:?}", dispatch.chain().0);
    }
    println!(
        "  Position stays liquidated despite the failed leg: active = {}\n",
        engine.get_position(id).unwrap().active
    );
}

/// Pause blocks admission and borrow dispatch but never liquidation.
fn scenario_7_pause() {
    println!("Scenario 7: Pause Semantics\n");

    let admin = Address(1);
    let alice = Address(10);
    let mut engine = LendingEngine::new(LedgerConfig::default(), admin);
    let mut transport = InMemoryTransport::new();

    engine.register_receiver(admin, ChainId(2), Address(100)).unwrap();
    let d = draft(alice, 100, 75, ChainId(2));
    let escrow = escrow_for(&d, "esc-1");
    let assessment = RiskAssessment::conservative_default(ChainId(2));
    let id = engine.create_position(d, escrow, assessment).unwrap();

    engine.pause(admin).unwrap();
    println!("  Ledger paused");

    let d = draft(alice, 100, 50, ChainId(2));
    let escrow = escrow_for(&d, "esc-2");
    let err = engine.create_position(d, escrow, assessment).unwrap_err();
    println!("  Admission while paused: {err}");

    let err = engine.dispatch_borrow(id, &mut transport).unwrap_err();
    println!("  Borrow dispatch while paused: {err}");

    engine
        .update_risk_assessment(id, alice, 95, 95, &mut transport)
        .unwrap();
    println!(
        "  Liquidation ran while paused: active = {}",
        engine.get_position(id).unwrap().active
    );

    engine.unpause(admin).unwrap();
    println!("  Ledger unpaused, {} events recorded", engine.events().len());
}
