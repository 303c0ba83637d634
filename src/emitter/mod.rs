//! Bridges optimistic state changes onto `event_emitter_rs`.

mod bridge;

pub use bridge::EmitterBridge;
