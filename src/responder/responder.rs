use async_trait::async_trait;

use crate::common::{Error, GetResponse, Opaque, RequestType, Result};

/// Turns classified outcomes into client-visible replies.
///
/// The orchestrator calls exactly one positive method per successful request
/// (or one `get` per key plus `get_end` for a batched read). Positive write
/// acknowledgements carry the request's `quiet` flag; honoring it is up to the
/// responder.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn set(&self, opaque: Opaque, quiet: bool) -> Result<()>;

    async fn add(&self, opaque: Opaque, quiet: bool) -> Result<()>;

    async fn replace(&self, opaque: Opaque, quiet: bool) -> Result<()>;

    async fn delete(&self, opaque: Opaque) -> Result<()>;

    async fn touch(&self, opaque: Opaque) -> Result<()>;

    /// Emit the answer for one key of a batched read.
    async fn get(&self, res: GetResponse) -> Result<()>;

    /// Emit the terminal marker of a batched read.
    async fn get_end(&self, noop_opaque: Opaque, noop_end: bool) -> Result<()>;

    async fn gat(&self, res: GetResponse) -> Result<()>;

    async fn noop(&self, opaque: Opaque) -> Result<()>;

    async fn quit(&self, opaque: Opaque, quiet: bool) -> Result<()>;

    async fn version(&self, opaque: Opaque) -> Result<()>;

    /// Emit a protocol-appropriate error reply for a failed request.
    async fn error(&self, opaque: Opaque, req_type: RequestType, err: &Error) -> Result<()>;
}
