use async_trait::async_trait;

use super::GetEvents;
use crate::common::{
    DeleteRequest, GatRequest, GetRequest, GetResponse, Result, SetRequest, TouchRequest,
};

/// The operation set every cache tier exposes.
///
/// Expected outcomes are reported through the closed [`crate::common::Error`]
/// enum: `KeyExists` when `add` finds the key, `KeyNotFound` when `replace`,
/// `delete` or `touch` do not. Any other error is a failure of the tier.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Store a value unconditionally.
    async fn set(&self, req: &SetRequest) -> Result<()>;

    /// Store a value only if the key is absent.
    async fn add(&self, req: &SetRequest) -> Result<()>;

    /// Store a value only if the key is present.
    async fn replace(&self, req: &SetRequest) -> Result<()>;

    async fn delete(&self, req: &DeleteRequest) -> Result<()>;

    /// Update the expiration of a key without reading it.
    async fn touch(&self, req: &TouchRequest) -> Result<()>;

    /// Start a batched read.
    ///
    /// The returned stream yields one [`super::GetEvent::Item`] per key, in an
    /// order chosen by the tier, and ends when the tier has nothing more to
    /// say. Once a [`super::GetEvent::Failure`] has been yielded no further
    /// items follow.
    fn get(&self, req: &GetRequest) -> GetEvents;

    /// Read a single key and update its expiration.
    ///
    /// An absent key is not an error: it yields a response with `miss` set.
    async fn gat(&self, req: &GatRequest) -> Result<GetResponse>;
}
