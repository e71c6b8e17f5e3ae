use async_trait::async_trait;

use crate::common::{
    DeleteRequest, Error, GatRequest, GetRequest, NoopRequest, Opaque, QuitRequest, RequestType,
    Result, SetRequest, TouchRequest, VersionRequest,
};

/// Per-command request orchestration.
///
/// Each method serves one request to completion. An `Err` return means no
/// positive reply was emitted; the caller decides how to report it, usually
/// through [`Orca::error`] for application errors.
#[async_trait]
pub trait Orca: Send + Sync {
    async fn set(&self, req: &SetRequest) -> Result<()>;

    async fn add(&self, req: &SetRequest) -> Result<()>;

    async fn replace(&self, req: &SetRequest) -> Result<()>;

    async fn delete(&self, req: &DeleteRequest) -> Result<()>;

    async fn touch(&self, req: &TouchRequest) -> Result<()>;

    async fn get(&self, req: &GetRequest) -> Result<()>;

    async fn gat(&self, req: &GatRequest) -> Result<()>;

    async fn noop(&self, req: &NoopRequest) -> Result<()>;

    async fn quit(&self, req: &QuitRequest) -> Result<()>;

    async fn version(&self, req: &VersionRequest) -> Result<()>;

    /// Account for a request that could not be recognized.
    async fn unknown(&self, opaque: Opaque) -> Result<()>;

    /// Report an error for a request back to the client.
    async fn error(&self, opaque: Opaque, req_type: RequestType, err: &Error) -> Result<()>;
}
