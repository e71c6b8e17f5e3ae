//! Request, response and error types shared by tiers, responders and the orchestrator.

mod error;
mod request;
mod response;

pub use error::{Error, Result};
pub use request::{
    DeleteRequest, GatRequest, GetRequest, NoopRequest, Opaque, QuitRequest, Request, RequestType,
    SetRequest, TouchRequest, VersionRequest,
};
pub use response::GetResponse;
