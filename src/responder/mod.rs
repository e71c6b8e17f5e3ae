//! Emission of request outcomes back to the client.

mod recording_responder;
mod responder;

pub use recording_responder::{RecordingResponder, Response};
pub use responder::Responder;
