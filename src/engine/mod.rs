// 11.0: the lending engine. coordinates admission, settlement dispatch,
// risk updates and liquidations over a single in-memory ledger state.
// deterministic and event-driven; all external I/O goes through the
// Transport and RiskOracle traits.

mod admission;
mod core;
mod dispatch;
mod liquidations;
mod results;

pub use core::LendingEngine;
pub use results::{
    ChainDispatch, DispatchResult, LedgerError, LiquidationOutcome, RiskUpdateOutcome,
};
