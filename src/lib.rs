// lending-core: cross-chain collateralized lending ledger.
// risk-first architecture: admission gating and liquidation take priority.
// all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: PositionId, ChainId, Address, Amount, Bps
//   2.x  position.rs: position struct, LTV, health factor, risk snapshot
//   3.x  admission.rs: position draft, escrow proof, admission policy
//   4.x  oracle.rs: risk oracle trait, strict decode, conservative fallback
//   5.x  liquidation.rs: health evaluation, risk triggers
//   6.x  message.rs: settlement message and dedup hash
//   7.x  transport.rs: transport trait + in-memory double
//   8.x  receiver.rs: per-chain settlement receiver, idempotent delivery
//   8.5  registry.rs: chain -> receiver endpoint registry
//   8.7  access.rs: admin, authorized callers, pause switch
//   9.x  events.rs: state transition events for audit
//   10.x config.rs: admission policy, triggers, topology, presets
//   11.x engine/: the ledger engine: admission, dispatch, liquidations

// ledger modules
pub mod access;
pub mod admission;
pub mod engine;
pub mod events;
pub mod liquidation;
pub mod position;
pub mod types;

// settlement modules
pub mod message;
pub mod receiver;
pub mod registry;
pub mod transport;

// integration modules
pub mod config;
pub mod oracle;

// re exports for convenience
pub use access::*;
pub use admission::*;
pub use config::{ConfigError, LedgerConfig};
pub use engine::*;
pub use events::*;
pub use liquidation::*;
pub use message::*;
pub use oracle::*;
pub use position::*;
pub use receiver::*;
pub use registry::*;
pub use transport::*;
pub use types::*;
