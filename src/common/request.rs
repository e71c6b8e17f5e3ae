use std::fmt;

use bytes::Bytes;
use serde::Serialize;

/// Correlation token echoed back to the client with every reply.
pub type Opaque = u32;

// =============================================================================
// Command Requests
// =============================================================================

/// A set, add or replace request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetRequest {
    pub key: Bytes,
    pub data: Bytes,
    pub flags: u32,
    /// Expiration in memcached form: 0 for none, otherwise seconds or a unix time.
    pub exptime: u32,
    pub opaque: Opaque,
    /// Suppress the positive acknowledgement on success.
    pub quiet: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteRequest {
    pub key: Bytes,
    pub opaque: Opaque,
    pub quiet: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouchRequest {
    pub key: Bytes,
    pub exptime: u32,
    pub opaque: Opaque,
    pub quiet: bool,
}

/// A batched read.
///
/// `opaques` and `quiet` run parallel to `keys`. The `noop_*` fields describe
/// the terminal marker sent once every key has been answered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetRequest {
    pub keys: Vec<Bytes>,
    pub opaques: Vec<Opaque>,
    pub quiet: Vec<bool>,
    pub noop_opaque: Opaque,
    pub noop_end: bool,
}

impl GetRequest {
    /// Build a request for `keys` with zero opaques and no quiet flags.
    pub fn for_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        let keys: Vec<Bytes> = keys.into_iter().map(Into::into).collect();
        let len = keys.len();
        Self {
            keys,
            opaques: vec![0; len],
            quiet: vec![false; len],
            noop_opaque: 0,
            noop_end: false,
        }
    }

    /// The opaque for the key at `ix`, or 0 if none was supplied.
    pub fn opaque_at(&self, ix: usize) -> Opaque {
        self.opaques.get(ix).copied().unwrap_or(0)
    }

    /// The quiet flag for the key at `ix`, or false if none was supplied.
    pub fn quiet_at(&self, ix: usize) -> bool {
        self.quiet.get(ix).copied().unwrap_or(false)
    }
}

/// A get-and-touch of a single key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatRequest {
    pub key: Bytes,
    pub exptime: u32,
    pub opaque: Opaque,
    pub quiet: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoopRequest {
    pub opaque: Opaque,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuitRequest {
    pub opaque: Opaque,
    pub quiet: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionRequest {
    pub opaque: Opaque,
}

// =============================================================================
// Request Envelope
// =============================================================================

/// The kind of a request, used when reporting errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Set,
    Add,
    Replace,
    Delete,
    Touch,
    Get,
    Gat,
    Noop,
    Quit,
    Version,
    Unknown,
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestType::Set => "set",
            RequestType::Add => "add",
            RequestType::Replace => "replace",
            RequestType::Delete => "delete",
            RequestType::Touch => "touch",
            RequestType::Get => "get",
            RequestType::Gat => "gat",
            RequestType::Noop => "noop",
            RequestType::Quit => "quit",
            RequestType::Version => "version",
            RequestType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Any inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Set(SetRequest),
    Add(SetRequest),
    Replace(SetRequest),
    Delete(DeleteRequest),
    Touch(TouchRequest),
    Get(GetRequest),
    Gat(GatRequest),
    Noop(NoopRequest),
    Quit(QuitRequest),
    Version(VersionRequest),
    Unknown { opaque: Opaque },
}

impl Request {
    /// The correlation token used when replying to this request as a whole.
    ///
    /// For a batched get this is the opaque of the terminal marker.
    pub fn opaque(&self) -> Opaque {
        match self {
            Request::Set(r) | Request::Add(r) | Request::Replace(r) => r.opaque,
            Request::Delete(r) => r.opaque,
            Request::Touch(r) => r.opaque,
            Request::Get(r) => r.noop_opaque,
            Request::Gat(r) => r.opaque,
            Request::Noop(r) => r.opaque,
            Request::Quit(r) => r.opaque,
            Request::Version(r) => r.opaque,
            Request::Unknown { opaque } => *opaque,
        }
    }

    pub fn request_type(&self) -> RequestType {
        match self {
            Request::Set(_) => RequestType::Set,
            Request::Add(_) => RequestType::Add,
            Request::Replace(_) => RequestType::Replace,
            Request::Delete(_) => RequestType::Delete,
            Request::Touch(_) => RequestType::Touch,
            Request::Get(_) => RequestType::Get,
            Request::Gat(_) => RequestType::Gat,
            Request::Noop(_) => RequestType::Noop,
            Request::Quit(_) => RequestType::Quit,
            Request::Version(_) => RequestType::Version,
            Request::Unknown { .. } => RequestType::Unknown,
        }
    }
}
