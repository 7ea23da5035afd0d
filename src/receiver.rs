// 6.0: per-destination-chain settlement handler. the receiver is the source
// of truth for settlement: the origin ledger never marks a position settled,
// it only learns what happened here. duplicate deliveries from an unreliable
// transport are absorbed by the processed-message set.
//
// The processed set is append-only and never pruned. That is a deliberate
// carry-over from the protocol design and an acknowledged unbounded-growth
// concern; any future compaction must not weaken the at-most-once-effect
// guarantee.

use crate::message::{MessageKind, SettlementMessage};
use crate::types::{Address, Amount, ChainId, PositionId, Timestamp, TokenId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReceiverError {
    // duplicate delivery; no side effect. callers treat this as a benign no-op.
    #[error("message already processed")]
    AlreadyProcessed,

    #[error("insufficient reserve for token {token:?}: need {required}, have {available}")]
    InsufficientReserve {
        token: TokenId,
        required: Amount,
        available: Amount,
    },

    #[error("caller is not the receiver admin")]
    Unauthorized,

    #[error("message was never processed; replay only re-executes known messages")]
    NotProcessed,

    #[error("message targets chain {target:?}, receiver serves {serving:?}")]
    WrongChain { target: ChainId, serving: ChainId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    Borrowed {
        position_id: PositionId,
        owner: Address,
        token: TokenId,
        amount: Amount,
    },
    /// bookkeeping only: the liquidate path moves no funds at the receiver
    LiquidationRecorded { position_id: PositionId },
}

// 6.1: receiver-local audit records, the remote counterpart of the engine's
// event stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SettlementRecord {
    TokensBorrowed {
        position_id: PositionId,
        owner: Address,
        token: TokenId,
        amount: Amount,
        at: Timestamp,
    },
    TokensLiquidated {
        position_id: PositionId,
        owner: Address,
        at: Timestamp,
    },
}

#[derive(Debug)]
pub struct Receiver {
    chain_id: ChainId,
    admin: Address,
    // token -> available reserve; TokenId::NATIVE keys the native balance
    reserves: HashMap<TokenId, Amount>,
    // append-only dedup set of message hashes
    processed: HashSet<String>,
    records: Vec<SettlementRecord>,
}

impl Receiver {
    pub fn new(chain_id: ChainId, admin: Address) -> Self {
        Self {
            chain_id,
            admin,
            reserves: HashMap::new(),
            processed: HashSet::new(),
            records: Vec::new(),
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn reserve(&self, token: TokenId) -> Amount {
        self.reserves.get(&token).copied().unwrap_or_else(Amount::zero)
    }

    pub fn records(&self) -> &[SettlementRecord] {
        &self.records
    }

    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    pub fn is_processed(&self, message: &SettlementMessage) -> bool {
        self.processed.contains(&message.dedup_hash())
    }

    // 6.2: first-delivery handling. the hash is recorded BEFORE the effect is
    // attempted, so a reserve shortfall still consumes the delivery: there is
    // no silent retry, the operator tops up reserves and replays explicitly.
    pub fn handle(
        &mut self,
        message: &SettlementMessage,
        now: Timestamp,
    ) -> Result<ReceiveOutcome, ReceiverError> {
        if message.target_chain != self.chain_id {
            return Err(ReceiverError::WrongChain {
                target: message.target_chain,
                serving: self.chain_id,
            });
        }

        let hash = message.dedup_hash();
        if self.processed.contains(&hash) {
            return Err(ReceiverError::AlreadyProcessed);
        }
        self.processed.insert(hash);

        self.execute(message, now)
    }

    /// Admin recovery path for a message whose effect failed after its hash
    /// was consumed (e.g. reserve shortfall on first delivery). Never runs a
    /// message the dedup set has not seen.
    pub fn replay(
        &mut self,
        caller: Address,
        message: &SettlementMessage,
        now: Timestamp,
    ) -> Result<ReceiveOutcome, ReceiverError> {
        if caller != self.admin {
            return Err(ReceiverError::Unauthorized);
        }
        if !self.processed.contains(&message.dedup_hash()) {
            return Err(ReceiverError::NotProcessed);
        }
        self.execute(message, now)
    }

    fn execute(
        &mut self,
        message: &SettlementMessage,
        now: Timestamp,
    ) -> Result<ReceiveOutcome, ReceiverError> {
        match message.kind {
            MessageKind::Borrow => {
                let available = self.reserve(message.token);
                let remaining = available.checked_sub(message.amount).ok_or(
                    ReceiverError::InsufficientReserve {
                        token: message.token,
                        required: message.amount,
                        available,
                    },
                )?;
                self.reserves.insert(message.token, remaining);

                self.records.push(SettlementRecord::TokensBorrowed {
                    position_id: message.position_id,
                    owner: message.owner,
                    token: message.token,
                    amount: message.amount,
                    at: now,
                });

                Ok(ReceiveOutcome::Borrowed {
                    position_id: message.position_id,
                    owner: message.owner,
                    token: message.token,
                    amount: message.amount,
                })
            }
            MessageKind::Liquidate => {
                self.records.push(SettlementRecord::TokensLiquidated {
                    position_id: message.position_id,
                    owner: message.owner,
                    at: now,
                });

                Ok(ReceiveOutcome::LiquidationRecorded {
                    position_id: message.position_id,
                })
            }
        }
    }

    // 6.3: reserve custody, admin-only and independent of message handling.
    pub fn deposit_reserve(
        &mut self,
        caller: Address,
        token: TokenId,
        amount: Amount,
    ) -> Result<(), ReceiverError> {
        if caller != self.admin {
            return Err(ReceiverError::Unauthorized);
        }
        let balance = self.reserve(token).add(amount);
        self.reserves.insert(token, balance);
        Ok(())
    }

    pub fn withdraw_reserve(
        &mut self,
        caller: Address,
        token: TokenId,
        amount: Amount,
    ) -> Result<(), ReceiverError> {
        if caller != self.admin {
            return Err(ReceiverError::Unauthorized);
        }
        let available = self.reserve(token);
        let remaining =
            available
                .checked_sub(amount)
                .ok_or(ReceiverError::InsufficientReserve {
                    token,
                    required: amount,
                    available,
                })?;
        self.reserves.insert(token, remaining);
        Ok(())
    }
}
