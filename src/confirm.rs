use std::future::{self, Future};
use std::pin::Pin;

/// The settling half of an optimistic mutation.
///
/// The speculative change is already visible by the time this is returned.
/// Awaiting (or spawning) it drives the confirm function; once it settles the
/// instance has either merged the authoritative value or rolled back. A
/// confirmation that is dropped unpolled never settles, and the instance keeps
/// the affected state marked optimistic until an authoritative replace.
pub type Confirmation<R> = Pin<Box<dyn Future<Output = R> + Send + 'static>>;

/// A confirmation that has already settled with `value`.
pub(crate) fn settled<R>(value: R) -> Confirmation<R>
where
    R: Send + 'static,
{
    Box::pin(future::ready(value))
}
