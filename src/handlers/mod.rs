//! Cache tiers as seen by the orchestrator.
//!
//! A tier is anything implementing [`Handler`]. The orchestrator holds two of
//! them (L1 and L2) and tells them apart only by the order it calls them in.

mod get_events;
mod handler;
mod memory_handler;

pub use get_events::{GetEvent, GetEventSender, GetEvents, get_event_channel};
pub use handler::Handler;
pub use memory_handler::{MemoryHandler, MemoryHandlerConfig};
