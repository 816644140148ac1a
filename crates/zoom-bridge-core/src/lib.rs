//! Zoom bridge core logic.
//!
//! Pure Rust crate with no platform dependencies. Adapts the vendor SDK,
//! reached through the traits in [`sdk`], to promise-style results and
//! meeting events. Consumed by native shells via UniFFI bindings.

pub mod bridge;
mod callbacks;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod pending;
pub mod sdk;

#[cfg(test)]
mod fake;

pub use bridge::{MODULE_NAME, ZoomBridge};
pub use callbacks::InitState;
pub use errors::BridgeError;
pub use events::{EventEmitter, MEETING_EVENT_CHANNEL, MeetingEvent, MeetingEventListener};
pub use lifecycle::HostLifecycle;
pub use pending::{BridgeResult, PendingResult};
