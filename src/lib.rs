//! Optimistic mutations: show a change right away, confirm it in the
//! background, roll it back if the confirmation fails.
//!
//! [`OptimisticCell`] holds one value, [`OptimisticCollection`] an ordered
//! list of [`Keyed`] items. Both notify [`Observers`] after every transition
//! and never surface a failed confirmation as a panic or an `Err`: failures
//! come back as `None`/`false`, in `error()`, and through the `on_error` hook.

mod cell;
mod collection;
mod confirm;
mod entity;
mod error;
mod hooks;
mod observer;
mod snapshot;
pub mod task;

#[cfg(feature = "emitter")]
pub mod emitter;
#[cfg(feature = "timeout")]
pub mod timeout;

pub use cell::{CellBuilder, OptimisticCell, OptimisticState};
pub use collection::{CollectionBuilder, OptimisticCollection, OptimisticList};
pub use confirm::Confirmation;
pub use entity::{Keyed, Patch};
pub use error::{BoxError, MutationError};
pub use observer::{Observers, Subscription, SubscriptionId, Transition};
pub use snapshot::{OptimisticConfig, RollbackPolicy};
pub use task::{Task, TaskList, TaskPatch, TaskPriority, TaskStatus};

#[cfg(feature = "emitter")]
pub use emitter::EmitterBridge;

// Re-export the EventEmitter from the event_emitter_rs crate
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
