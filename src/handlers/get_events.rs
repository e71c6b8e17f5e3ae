//! The merged result stream of a batched read.

use std::pin::Pin;

use futures::stream::{self, Stream};
use tokio::sync::mpsc;

use crate::common::{Error, GetResponse};

/// One event of a batched read.
#[derive(Debug)]
pub enum GetEvent {
    /// A hit or miss for one key.
    Item(GetResponse),
    /// An out-of-band failure. No items follow it.
    Failure(Error),
}

/// Async stream of get events. The end of the stream is the end of the read.
pub type GetEvents = Pin<Box<dyn Stream<Item = GetEvent> + Send>>;

/// Producer half of [`get_event_channel`].
///
/// Dropping the sender ends the stream. [`GetEventSender::fail`] consumes the
/// sender, so nothing can be sent after a failure.
#[derive(Debug)]
pub struct GetEventSender {
    tx: mpsc::Sender<GetEvent>,
}

impl GetEventSender {
    /// Send the response for one key.
    ///
    /// Returns `false` if the consumer has gone away.
    pub async fn send(&self, res: GetResponse) -> bool {
        self.tx.send(GetEvent::Item(res)).await.is_ok()
    }

    /// Report a failure and end the stream.
    pub async fn fail(self, err: Error) {
        // A vanished consumer has nothing left to be told.
        let _ = self.tx.send(GetEvent::Failure(err)).await;
    }
}

/// Create a bounded channel whose receiving side is a [`GetEvents`] stream.
///
/// Tiers that answer a batch from another task hand the sender to that task
/// and return the stream to the caller.
pub fn get_event_channel(buffer: usize) -> (GetEventSender, GetEvents) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let events = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (event, rx))
    });
    (GetEventSender { tx }, Box::pin(events))
}
