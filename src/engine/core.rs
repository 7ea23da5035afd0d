// 11.0 engine/core.rs: the ledger engine. holds all positions, snapshots,
// the receiver registry and the access controller.
//
// The engine is a single-writer logical state machine: every mutating
// operation takes &mut self and either fully commits or fully rejects, so no
// partial state is ever observable. The one shared resource a multi-threaded
// host would contend on, the position-id counter, is an atomic so id
// allocation never serializes concurrent admissions.

use super::results::LedgerError;
use crate::access::AccessController;
use crate::config::LedgerConfig;
use crate::events::{
    CallerAuthorizedEvent, CallerRevokedEvent, Event, EventId, EventPayload,
    LocalReserveFundedEvent, ReceiverRegisteredEvent,
};
use crate::position::{LendingPosition, RiskSnapshot};
use crate::registry::ReceiverRegistry;
use crate::types::{Address, Amount, ChainId, PositionId, Timestamp, TokenId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/** 11.1: all ledger state lives here */
#[derive(Debug)]
pub struct LendingEngine {
    pub(super) config: LedgerConfig,
    pub(super) access: AccessController,
    pub(super) registry: ReceiverRegistry,
    pub(super) positions: HashMap<PositionId, LendingPosition>,
    pub(super) snapshots: HashMap<PositionId, RiskSnapshot>,
    // append-only ordered list of position ids per owner
    pub(super) user_positions: HashMap<Address, Vec<PositionId>>,
    // reserves backing same-chain settlement on the local chain
    pub(super) local_reserves: HashMap<TokenId, Amount>,
    pub(super) next_position_id: AtomicU64,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) current_time: Timestamp,
}

impl LendingEngine {
    pub fn new(config: LedgerConfig, admin: Address) -> Self {
        Self {
            config,
            access: AccessController::new(admin),
            registry: ReceiverRegistry::new(),
            positions: HashMap::new(),
            snapshots: HashMap::new(),
            user_positions: HashMap::new(),
            local_reserves: HashMap::new(),
            next_position_id: AtomicU64::new(1),
            events: Vec::new(),
            next_event_id: 1,
            current_time: Timestamp::from_millis(0),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn local_chain(&self) -> ChainId {
        self.config.local_chain
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = Timestamp::from_millis(self.current_time.as_millis() + millis);
    }

    // reads

    pub fn get_position(&self, id: PositionId) -> Option<&LendingPosition> {
        self.positions.get(&id)
    }

    pub fn get_snapshot(&self, id: PositionId) -> Option<&RiskSnapshot> {
        self.snapshots.get(&id)
    }

    pub fn user_positions(&self, owner: Address) -> &[PositionId] {
        self.user_positions
            .get(&owner)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions_iter(&self) -> impl Iterator<Item = (&PositionId, &LendingPosition)> {
        self.positions.iter()
    }

    pub fn receiver_endpoint(&self, chain: ChainId) -> Option<Address> {
        self.registry.lookup(chain)
    }

    pub fn is_paused(&self) -> bool {
        self.access.is_paused()
    }

    pub fn local_reserve(&self, token: TokenId) -> Amount {
        self.local_reserves
            .get(&token)
            .copied()
            .unwrap_or_else(Amount::zero)
    }

    // admin operations. all require caller == admin; authorized-caller
    // membership grants none of these.

    pub fn pause(&mut self, caller: Address) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        self.access.pause();
        self.emit_event(EventPayload::Paused);
        Ok(())
    }

    pub fn unpause(&mut self, caller: Address) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        self.access.unpause();
        self.emit_event(EventPayload::Unpaused);
        Ok(())
    }

    /// Idempotent: re-registration overwrites the previous endpoint.
    pub fn register_receiver(
        &mut self,
        caller: Address,
        chain: ChainId,
        endpoint: Address,
    ) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        if endpoint.is_zero() {
            return Err(LedgerError::InvalidReceiverAddress);
        }

        let replaced = self.registry.register(chain, endpoint);
        self.emit_event(EventPayload::ReceiverRegistered(ReceiverRegisteredEvent {
            chain,
            endpoint,
            replaced,
        }));
        Ok(())
    }

    pub fn add_authorized_caller(
        &mut self,
        caller: Address,
        authorized: Address,
    ) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        self.access.authorize(authorized);
        self.emit_event(EventPayload::CallerAuthorized(CallerAuthorizedEvent {
            caller: authorized,
        }));
        Ok(())
    }

    pub fn remove_authorized_caller(
        &mut self,
        caller: Address,
        revoked: Address,
    ) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        self.access.revoke(revoked);
        self.emit_event(EventPayload::CallerRevoked(CallerRevokedEvent {
            caller: revoked,
        }));
        Ok(())
    }

    pub fn fund_local_reserve(
        &mut self,
        caller: Address,
        token: TokenId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        let balance = self.local_reserve(token).add(amount);
        self.local_reserves.insert(token, balance);
        self.emit_event(EventPayload::LocalReserveFunded(LocalReserveFundedEvent {
            token,
            amount,
        }));
        Ok(())
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub(super) fn require_admin(&self, caller: Address) -> Result<(), LedgerError> {
        if self.access.is_admin(caller) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized)
        }
    }

    pub(super) fn allocate_position_id(&self) -> PositionId {
        PositionId(self.next_position_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        if self.config.verbose {
            println!("[Event {}] {:?}", event.id.0, event.payload);
        }

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}
