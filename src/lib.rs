//! tiercache-rs - A two-tier (L1/L2) cache request orchestrator.
//!
//! Requests are served by an [`Orca`], which drives a small fast L1 tier and
//! a larger L2 tier through the [`Handler`] trait and reports outcomes to a
//! [`Responder`].

pub mod cli;
pub mod common;
pub mod config;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod orca;
pub mod responder;

pub use common::{Error, GetResponse, Opaque, Request, RequestType, Result};
pub use handlers::{
    GetEvent, GetEventSender, GetEvents, Handler, MemoryHandler, MemoryHandlerConfig,
    get_event_channel,
};
pub use crate::metrics::{CounterRegistry, FacadeMetrics, FanOutMetrics, MetricsSink, NoopMetrics};
pub use orca::{L1L2Orca, Orca, handle_request};
pub use responder::{RecordingResponder, Responder, Response};
