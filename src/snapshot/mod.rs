//! Snapshot bookkeeping for speculative mutations.

mod ledger;
mod policy;

pub(crate) use ledger::{Ledger, OpId, Ticket};
pub use policy::{OptimisticConfig, RollbackPolicy};
