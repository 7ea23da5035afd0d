// 11.0.2: result types and the unified error taxonomy for ledger operations.
//
// Validation, policy and authorization errors reject synchronously with no
// side effect. Dispatch failures are reported but never roll back committed
// ledger state, and nothing is retried internally.

use crate::transport::{TransportError, TxHandle};
use crate::types::{Address, Amount, Bps, ChainId, PositionId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    // validation
    #[error("collateral and borrow amounts must be positive")]
    InvalidAmount,

    #[error("escrow proof does not cover the collateral")]
    EscrowNotVerified,

    #[error("risk values must be within 0-100")]
    InvalidRiskValue,

    // policy
    #[error("chain {0:?} is not supported")]
    UnsupportedChain(ChainId),

    #[error("no receiver registered for chain {0:?}")]
    ReceiverNotConfigured(ChainId),

    #[error("LTV {ltv} exceeds ceiling {max}")]
    LtvCeilingExceeded { ltv: Bps, max: Bps },

    #[error("risk score {score} exceeds ceiling {ceiling}")]
    RiskScoreTooHigh { score: u8, ceiling: u8 },

    #[error("liquidation probability {prob} exceeds ceiling {ceiling}")]
    LiquidationProbTooHigh { prob: u8, ceiling: u8 },

    // lookup / state
    #[error("position {0} not found")]
    PositionNotFound(PositionId),

    #[error("position {0} is not active")]
    PositionNotActive(PositionId),

    #[error("position {0} is healthy")]
    PositionHealthy(PositionId),

    // authorization
    #[error("caller lacks rights for this operation")]
    Unauthorized,

    #[error("ledger is paused")]
    Paused,

    // funds
    #[error("insufficient local funds: need {required}, have {available}")]
    InsufficientLocalFunds { required: Amount, available: Amount },

    #[error("receiver address must be non-zero")]
    InvalidReceiverAddress,

    // transport
    #[error("dispatch failed: {0}")]
    DispatchFailed(#[from] TransportError),
}

/// How a borrow reached the borrower.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    /// same-chain settlement, funds moved synchronously
    SettledLocally,
    /// message handed to the transport; settlement is confirmed only by the
    /// receiver's own record, never by this result
    Dispatched {
        chain: ChainId,
        tx: TxHandle,
        message_hash: String,
    },
}

/// Per-chain leg of a liquidation fan-out. legs succeed or fail independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainDispatch {
    RecordedLocally { chain: ChainId },
    Sent {
        chain: ChainId,
        tx: TxHandle,
        message_hash: String,
    },
    Failed { chain: ChainId, reason: String },
}

impl ChainDispatch {
    pub fn chain(&self) -> ChainId {
        match self {
            ChainDispatch::RecordedLocally { chain }
            | ChainDispatch::Sent { chain, .. }
            | ChainDispatch::Failed { chain, .. } => *chain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidationOutcome {
    pub position_id: PositionId,
    pub caller: Address,
    pub dispatches: Vec<ChainDispatch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskUpdateOutcome {
    pub position_id: PositionId,
    pub health_factor_bps: Bps,
    pub auto_liquidated: Option<LiquidationOutcome>,
}
