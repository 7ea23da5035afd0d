// Transport/Gateway abstraction
//
// This module abstracts how settlement messages leave the ledger chain. The
// engine is agnostic to whether the channel is a bridge, a relayer network,
// or an in-process queue. Delivery is at-most-once-attempted: success of the
// send call is the only confirmation the ledger ever gets, and message
// authenticity (sender verification) is the transport's responsibility, not
// the ledger's.

use crate::message::SettlementMessage;
use crate::types::{Address, ChainId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Opaque handle returned by a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHandle(pub String);

/// What the dispatcher wants done when the remote side reverts. The ledger
/// always uses `Surface`: failures come back as typed errors, nothing is
/// retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevertPolicy {
    Surface,
    FireAndForget,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("channel to chain {0:?} is down")]
    ChannelDown(ChainId),

    #[error("send rejected: {reason}")]
    Rejected { reason: String },
}

pub trait Transport {
    fn send(
        &mut self,
        target_chain: ChainId,
        target_receiver: Address,
        message: &SettlementMessage,
        gas_hint: u64,
        revert_policy: RevertPolicy,
    ) -> Result<TxHandle, TransportError>;
}

/// In-memory transport for tests and simulation. Delivered messages queue up
/// per chain; tests drain them and feed them to a `Receiver` by hand, which
/// keeps dispatch and settlement as separate as they are in production.
/// Failure injection per chain (or globally) exercises the DispatchFailed
/// path.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    delivered: HashMap<ChainId, Vec<SettlementMessage>>,
    fail_chains: HashSet<ChainId>,
    fail_all: bool,
    next_seq: u64,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_chain(&mut self, chain: ChainId) {
        self.fail_chains.insert(chain);
    }

    pub fn restore_chain(&mut self, chain: ChainId) {
        self.fail_chains.remove(&chain);
    }

    pub fn set_fail_all(&mut self, fail: bool) {
        self.fail_all = fail;
    }

    pub fn delivered(&self, chain: ChainId) -> &[SettlementMessage] {
        self.delivered.get(&chain).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Take everything queued for a chain, duplicating nothing.
    pub fn drain(&mut self, chain: ChainId) -> Vec<SettlementMessage> {
        self.delivered.remove(&chain).unwrap_or_default()
    }

    pub fn sent_count(&self) -> u64 {
        self.next_seq
    }
}

impl Transport for InMemoryTransport {
    fn send(
        &mut self,
        target_chain: ChainId,
        _target_receiver: Address,
        message: &SettlementMessage,
        _gas_hint: u64,
        _revert_policy: RevertPolicy,
    ) -> Result<TxHandle, TransportError> {
        if self.fail_all || self.fail_chains.contains(&target_chain) {
            return Err(TransportError::ChannelDown(target_chain));
        }

        self.next_seq += 1;
        self.delivered
            .entry(target_chain)
            .or_default()
            .push(message.clone());
        Ok(TxHandle(format!("tx-{}-{}", target_chain.0, self.next_seq)))
    }
}
