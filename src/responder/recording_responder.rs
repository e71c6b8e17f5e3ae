use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::Serialize;

use super::Responder;
use crate::common::{Error, GetResponse, Opaque, RequestType, Result};

// =============================================================================
// Response
// =============================================================================

/// One call made on a [`RecordingResponder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum Response {
    Set { opaque: Opaque, quiet: bool },
    Add { opaque: Opaque, quiet: bool },
    Replace { opaque: Opaque, quiet: bool },
    Delete { opaque: Opaque },
    Touch { opaque: Opaque },
    Get(GetResponse),
    GetEnd { opaque: Opaque, noop_end: bool },
    Gat(GetResponse),
    Noop { opaque: Opaque },
    Quit { opaque: Opaque, quiet: bool },
    Version { opaque: Opaque },
    Error {
        opaque: Opaque,
        request: RequestType,
        /// The reply word a memcached client would see.
        reply: String,
        message: String,
    },
}

impl Response {
    /// Whether a client would see nothing for this call.
    ///
    /// Quiet writes suppress their positive acknowledgement, and quiet reads
    /// suppress misses.
    pub fn is_suppressed(&self) -> bool {
        match self {
            Response::Set { quiet, .. }
            | Response::Add { quiet, .. }
            | Response::Replace { quiet, .. }
            | Response::Quit { quiet, .. } => *quiet,
            Response::Get(res) | Response::Gat(res) => res.quiet && res.miss,
            _ => false,
        }
    }

    pub fn opaque(&self) -> Opaque {
        match self {
            Response::Set { opaque, .. }
            | Response::Add { opaque, .. }
            | Response::Replace { opaque, .. }
            | Response::Delete { opaque }
            | Response::Touch { opaque }
            | Response::GetEnd { opaque, .. }
            | Response::Noop { opaque }
            | Response::Quit { opaque, .. }
            | Response::Version { opaque }
            | Response::Error { opaque, .. } => *opaque,
            Response::Get(res) | Response::Gat(res) => res.opaque,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ", self.opaque())?;
        match self {
            Response::Set { .. } | Response::Add { .. } | Response::Replace { .. } => {
                write!(f, "STORED")
            }
            Response::Delete { .. } => write!(f, "DELETED"),
            Response::Touch { .. } => write!(f, "TOUCHED"),
            Response::Get(res) | Response::Gat(res) if res.miss => {
                write!(f, "MISS {}", String::from_utf8_lossy(&res.key))
            }
            Response::Get(res) | Response::Gat(res) => write!(
                f,
                "VALUE {} {} {} {}",
                String::from_utf8_lossy(&res.key),
                res.flags,
                res.data.len(),
                String::from_utf8_lossy(&res.data)
            ),
            Response::GetEnd { .. } => write!(f, "END"),
            Response::Noop { .. } => write!(f, "NOOP"),
            Response::Quit { .. } => write!(f, "QUIT"),
            Response::Version { .. } => write!(f, "VERSION {}", env!("CARGO_PKG_VERSION")),
            Response::Error { reply, message, .. } => write!(f, "{} ({})", reply, message),
        }
    }
}

/// The memcached reply word for an error on a request of the given kind.
fn error_reply(req_type: RequestType, err: &Error) -> &'static str {
    match (req_type, err) {
        (RequestType::Add, Error::KeyExists) | (RequestType::Replace, Error::KeyNotFound) => {
            "NOT_STORED"
        }
        (_, Error::KeyExists) => "EXISTS",
        (_, Error::KeyNotFound) => "NOT_FOUND",
        (_, Error::ValueTooBig) => "SERVER_ERROR object too large for cache",
        (_, Error::UnknownCommand) => "ERROR",
        (_, Error::Backend(_) | Error::Io(_)) => "SERVER_ERROR",
    }
}

// =============================================================================
// RecordingResponder
// =============================================================================

/// A [`Responder`] that records every call instead of writing to a connection.
#[derive(Debug, Default)]
pub struct RecordingResponder {
    responses: Mutex<Vec<Response>>,
}

impl RecordingResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every response recorded so far.
    pub fn responses(&self) -> Vec<Response> {
        self.lock().clone()
    }

    /// Remove and return every response recorded so far.
    pub fn take(&self) -> Vec<Response> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Response>> {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, response: Response) -> Result<()> {
        self.lock().push(response);
        Ok(())
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn set(&self, opaque: Opaque, quiet: bool) -> Result<()> {
        self.record(Response::Set { opaque, quiet })
    }

    async fn add(&self, opaque: Opaque, quiet: bool) -> Result<()> {
        self.record(Response::Add { opaque, quiet })
    }

    async fn replace(&self, opaque: Opaque, quiet: bool) -> Result<()> {
        self.record(Response::Replace { opaque, quiet })
    }

    async fn delete(&self, opaque: Opaque) -> Result<()> {
        self.record(Response::Delete { opaque })
    }

    async fn touch(&self, opaque: Opaque) -> Result<()> {
        self.record(Response::Touch { opaque })
    }

    async fn get(&self, res: GetResponse) -> Result<()> {
        self.record(Response::Get(res))
    }

    async fn get_end(&self, noop_opaque: Opaque, noop_end: bool) -> Result<()> {
        self.record(Response::GetEnd {
            opaque: noop_opaque,
            noop_end,
        })
    }

    async fn gat(&self, res: GetResponse) -> Result<()> {
        self.record(Response::Gat(res))
    }

    async fn noop(&self, opaque: Opaque) -> Result<()> {
        self.record(Response::Noop { opaque })
    }

    async fn quit(&self, opaque: Opaque, quiet: bool) -> Result<()> {
        self.record(Response::Quit { opaque, quiet })
    }

    async fn version(&self, opaque: Opaque) -> Result<()> {
        self.record(Response::Version { opaque })
    }

    async fn error(&self, opaque: Opaque, req_type: RequestType, err: &Error) -> Result<()> {
        self.record(Response::Error {
            opaque,
            request: req_type,
            reply: error_reply(req_type, err).to_string(),
            message: err.to_string(),
        })
    }
}
