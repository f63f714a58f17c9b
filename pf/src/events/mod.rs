//! Run and task lifecycle events
//!
//! Fire-and-forget broadcast: emitters never block on (or fail because of)
//! slow or absent subscribers.

mod bus;
mod types;

pub use bus::{EventBus, create_event_bus};
pub use types::PfEvent;
