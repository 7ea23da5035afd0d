// 9.0: every state change produces an event. used for audit trails, state
// reconstruction, and notifying external systems. the EventPayload enum lists
// all event types; the engine keeps a bounded buffer and can echo events to
// stdout in verbose mode.

use crate::message::MessageKind;
use crate::transport::TxHandle;
use crate::types::{Address, Amount, Bps, ChainId, PositionId, Timestamp, TokenId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // position lifecycle
    PositionOpened(PositionOpenedEvent),
    RiskUpdated(RiskUpdatedEvent),
    PositionLiquidated(PositionLiquidatedEvent),

    // dispatch
    MessageSent(MessageSentEvent),
    DispatchFailed(DispatchFailedEvent),
    LocalSettlement(LocalSettlementEvent),
    LiquidationRecorded(LiquidationRecordedEvent),

    // admin
    ReceiverRegistered(ReceiverRegisteredEvent),
    CallerAuthorized(CallerAuthorizedEvent),
    CallerRevoked(CallerRevokedEvent),
    Paused,
    Unpaused,
    LocalReserveFunded(LocalReserveFundedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionOpenedEvent {
    pub position_id: PositionId,
    pub owner: Address,
    pub collateral_chain: ChainId,
    pub borrow_chain: ChainId,
    pub collateral_amount: Amount,
    pub borrowed_amount: Amount,
    pub ltv_bps: Bps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskUpdatedEvent {
    pub position_id: PositionId,
    pub risk_score: u8,
    pub liquidation_probability: u8,
    pub health_factor_bps: Bps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionLiquidatedEvent {
    pub position_id: PositionId,
    pub caller: Address,
    pub ltv_bps: Bps,
    pub liquidation_probability: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSentEvent {
    pub position_id: PositionId,
    pub kind: MessageKind,
    pub target_chain: ChainId,
    pub message_hash: String,
    pub tx: TxHandle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchFailedEvent {
    pub position_id: PositionId,
    pub kind: MessageKind,
    pub target_chain: ChainId,
    pub reason: String,
}

// same-chain settlement needs no message; funds move directly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSettlementEvent {
    pub position_id: PositionId,
    pub owner: Address,
    pub token: TokenId,
    pub amount: Amount,
}

// record-only liquidation leg on the ledger's own chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationRecordedEvent {
    pub position_id: PositionId,
    pub chain: ChainId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverRegisteredEvent {
    pub chain: ChainId,
    pub endpoint: Address,
    pub replaced: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerAuthorizedEvent {
    pub caller: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerRevokedEvent {
    pub caller: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalReserveFundedEvent {
    pub token: TokenId,
    pub amount: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn event_serializes_round_trip() {
        let event = Event::new(
            EventId(1),
            Timestamp::from_millis(1000),
            EventPayload::PositionOpened(PositionOpenedEvent {
                position_id: PositionId(1),
                owner: Address(42),
                collateral_chain: ChainId(1),
                borrow_chain: ChainId(2),
                collateral_amount: Amount::new_unchecked(dec!(100)),
                borrowed_amount: Amount::new_unchecked(dec!(75)),
                ltv_bps: Bps(7500),
            }),
        );

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, EventId(1));
        assert!(matches!(back.payload, EventPayload::PositionOpened(_)));
    }
}
