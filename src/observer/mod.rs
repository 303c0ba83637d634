//! Change notification for optimistic state.
//!
//! - [`Observers`]: registry of callbacks, invoked after every transition.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`Transition`]: what kind of change happened.

mod registry;
mod subscription;
mod transition;

pub use registry::Observers;
pub use subscription::{Subscription, SubscriptionId};
pub use transition::Transition;
