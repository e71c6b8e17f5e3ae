use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, warn};

use super::Orca;
use crate::common::{
    DeleteRequest, Error, GatRequest, GetRequest, NoopRequest, Opaque, QuitRequest, RequestType,
    Result, SetRequest, TouchRequest, VersionRequest,
};
use crate::handlers::{GetEvent, Handler};
use crate::metrics::MetricsSink;
use crate::metrics::names::*;
use crate::responder::Responder;

// =============================================================================
// Conditional Stores
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    L1,
    L2,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::L1 => f.write_str("L1"),
            Tier::L2 => f.write_str("L2"),
        }
    }
}

/// Counters for one tier of a conditional store.
struct TierStoreCounters {
    calls: &'static str,
    stored: &'static str,
    not_stored: &'static str,
    errors: &'static str,
}

/// Counters for a conditional store command.
struct StoreCounters {
    total: &'static str,
    stored: &'static str,
    not_stored: &'static str,
    errors: &'static str,
    l1: TierStoreCounters,
    l2: TierStoreCounters,
}

impl StoreCounters {
    fn tier(&self, tier: Tier) -> &TierStoreCounters {
        match tier {
            Tier::L1 => &self.l1,
            Tier::L2 => &self.l2,
        }
    }
}

const ADD_COUNTERS: StoreCounters = StoreCounters {
    total: CMD_ADD,
    stored: CMD_ADD_STORED,
    not_stored: CMD_ADD_NOT_STORED,
    errors: CMD_ADD_ERRORS,
    l1: TierStoreCounters {
        calls: CMD_ADD_L1,
        stored: CMD_ADD_STORED_L1,
        not_stored: CMD_ADD_NOT_STORED_L1,
        errors: CMD_ADD_ERRORS_L1,
    },
    l2: TierStoreCounters {
        calls: CMD_ADD_L2,
        stored: CMD_ADD_STORED_L2,
        not_stored: CMD_ADD_NOT_STORED_L2,
        errors: CMD_ADD_ERRORS_L2,
    },
};

const REPLACE_COUNTERS: StoreCounters = StoreCounters {
    total: CMD_REPLACE,
    stored: CMD_REPLACE_STORED,
    not_stored: CMD_REPLACE_NOT_STORED,
    errors: CMD_REPLACE_ERRORS,
    l1: TierStoreCounters {
        calls: CMD_REPLACE_L1,
        stored: CMD_REPLACE_STORED_L1,
        not_stored: CMD_REPLACE_NOT_STORED_L1,
        errors: CMD_REPLACE_ERRORS_L1,
    },
    l2: TierStoreCounters {
        calls: CMD_REPLACE_L2,
        stored: CMD_REPLACE_STORED_L2,
        not_stored: CMD_REPLACE_NOT_STORED_L2,
        errors: CMD_REPLACE_ERRORS_L2,
    },
};

/// A store that only happens under a condition on the key.
#[derive(Debug, Clone, Copy)]
enum StoreCommand {
    Add,
    Replace,
}

impl StoreCommand {
    /// Whether `err` is this command's "not stored" answer rather than a failure.
    fn is_not_stored(self, err: &Error) -> bool {
        match self {
            StoreCommand::Add => matches!(err, Error::KeyExists),
            StoreCommand::Replace => matches!(err, Error::KeyNotFound),
        }
    }

    fn counters(self) -> &'static StoreCounters {
        match self {
            StoreCommand::Add => &ADD_COUNTERS,
            StoreCommand::Replace => &REPLACE_COUNTERS,
        }
    }

    async fn run(self, handler: &dyn Handler, req: &SetRequest) -> Result<()> {
        match self {
            StoreCommand::Add => handler.add(req).await,
            StoreCommand::Replace => handler.replace(req).await,
        }
    }
}

impl fmt::Display for StoreCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreCommand::Add => f.write_str("add"),
            StoreCommand::Replace => f.write_str("replace"),
        }
    }
}

// =============================================================================
// L1L2Orca
// =============================================================================

/// Orchestrates a small, fast L1 tier in front of a larger L2 tier.
///
/// Writes and deletes go to L2 first and reach L1 only once L2 has accepted
/// them, so L1 never holds a write L2 refused. Reads, touches and
/// get-and-touch are served by L1 alone.
pub struct L1L2Orca {
    l1: Arc<dyn Handler>,
    l2: Arc<dyn Handler>,
    res: Arc<dyn Responder>,
    metrics: Arc<dyn MetricsSink>,
}

impl L1L2Orca {
    pub fn new(
        l1: Arc<dyn Handler>,
        l2: Arc<dyn Handler>,
        res: Arc<dyn Responder>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            l1,
            l2,
            res,
            metrics,
        }
    }

    fn inc(&self, name: &'static str) {
        self.metrics.inc_counter(name);
    }

    fn handler(&self, tier: Tier) -> &dyn Handler {
        match tier {
            Tier::L1 => self.l1.as_ref(),
            Tier::L2 => self.l2.as_ref(),
        }
    }

    /// Run a conditional store on both tiers, L2 first.
    ///
    /// Stops at the first tier that does not store.
    async fn conditional_store(&self, cmd: StoreCommand, req: &SetRequest) -> Result<()> {
        let counters = cmd.counters();
        self.inc(counters.total);
        debug!(command = %cmd, key = %String::from_utf8_lossy(&req.key), "conditional store");

        self.store_at(cmd, Tier::L2, req).await?;
        self.store_at(cmd, Tier::L1, req).await?;

        self.inc(counters.stored);
        Ok(())
    }

    async fn store_at(&self, cmd: StoreCommand, tier: Tier, req: &SetRequest) -> Result<()> {
        let counters = cmd.counters();
        let at = counters.tier(tier);

        self.inc(at.calls);
        match cmd.run(self.handler(tier), req).await {
            Ok(()) => {
                self.inc(at.stored);
                Ok(())
            }
            Err(err) if cmd.is_not_stored(&err) => {
                self.inc(at.not_stored);
                self.inc(counters.not_stored);
                debug!(command = %cmd, %tier, "not stored");
                Err(err)
            }
            Err(err) => {
                self.inc(at.errors);
                self.inc(counters.errors);
                if tier == Tier::L1 {
                    warn!(command = %cmd, error = %err, "L1 failed after L2 stored");
                }
                Err(err)
            }
        }
    }
}

#[async_trait]
impl Orca for L1L2Orca {
    async fn set(&self, req: &SetRequest) -> Result<()> {
        self.inc(CMD_SET);
        debug!(key = %String::from_utf8_lossy(&req.key), "set");

        self.inc(CMD_SET_L2);
        if let Err(err) = self.l2.set(req).await {
            self.inc(CMD_SET_ERRORS_L2);
            self.inc(CMD_SET_ERRORS);
            return Err(err);
        }
        self.inc(CMD_SET_SUCCESS_L2);

        // L2 keeps the write even if L1 fails; the request still fails.
        self.inc(CMD_SET_L1);
        if let Err(err) = self.l1.set(req).await {
            self.inc(CMD_SET_ERRORS_L1);
            self.inc(CMD_SET_ERRORS);
            warn!(error = %err, "L1 set failed after L2 set succeeded");
            return Err(err);
        }

        self.inc(CMD_SET_SUCCESS_L1);
        self.inc(CMD_SET_SUCCESS);
        self.res.set(req.opaque, req.quiet).await
    }

    async fn add(&self, req: &SetRequest) -> Result<()> {
        self.conditional_store(StoreCommand::Add, req).await?;
        self.res.add(req.opaque, req.quiet).await
    }

    async fn replace(&self, req: &SetRequest) -> Result<()> {
        self.conditional_store(StoreCommand::Replace, req).await?;
        self.res.replace(req.opaque, req.quiet).await
    }

    async fn delete(&self, req: &DeleteRequest) -> Result<()> {
        self.inc(CMD_DELETE);
        debug!(key = %String::from_utf8_lossy(&req.key), "delete");

        self.inc(CMD_DELETE_L2);
        match self.l2.delete(req).await {
            Ok(()) => self.inc(CMD_DELETE_HITS_L2),
            // Absent from L2, or another delete got there first. L1 is left alone.
            Err(Error::KeyNotFound) => {
                self.inc(CMD_DELETE_MISSES_L2);
                self.inc(CMD_DELETE_MISSES);
                return Err(Error::KeyNotFound);
            }
            Err(err) => {
                self.inc(CMD_DELETE_ERRORS_L2);
                self.inc(CMD_DELETE_ERRORS);
                return Err(err);
            }
        }

        // Once L2 is gone, a concurrent read can no longer refill L1 with the
        // deleted value.
        self.inc(CMD_DELETE_L1);
        match self.l1.delete(req).await {
            Ok(()) => {}
            // The data is gone either way.
            Err(Error::KeyNotFound) => debug!("delete missed L1 after hitting L2"),
            Err(err) => {
                self.inc(CMD_DELETE_ERRORS_L1);
                self.inc(CMD_DELETE_ERRORS);
                warn!(error = %err, "L1 delete failed after L2 delete succeeded");
                return Err(err);
            }
        }

        self.inc(CMD_DELETE_HITS_L1);
        self.inc(CMD_DELETE_HITS);
        self.res.delete(req.opaque).await
    }

    async fn touch(&self, req: &TouchRequest) -> Result<()> {
        self.inc(CMD_TOUCH);
        debug!(key = %String::from_utf8_lossy(&req.key), "touch");

        self.inc(CMD_TOUCH_L1);
        match self.l1.touch(req).await {
            Ok(()) => {
                self.inc(CMD_TOUCH_HITS_L1);
                self.inc(CMD_TOUCH_HITS);
                self.res.touch(req.opaque).await
            }
            Err(err) => {
                self.inc(CMD_TOUCH_MISSES_L1);
                self.inc(CMD_TOUCH_MISSES);
                Err(err)
            }
        }
    }

    async fn get(&self, req: &GetRequest) -> Result<()> {
        let keys = req.keys.len() as u64;
        self.inc(CMD_GET);
        self.metrics.inc_counter_by(CMD_GET_KEYS, keys);
        debug!(keys, "get");

        self.inc(CMD_GET_L1);
        self.metrics.inc_counter_by(CMD_GET_KEYS_L1, keys);
        let mut events = self.l1.get(req);

        let mut failure: Option<Error> = None;
        let mut reply_failure: Option<Error> = None;

        // Drain to the end of the stream even after a failure.
        while let Some(event) = events.next().await {
            match event {
                GetEvent::Item(res) => {
                    if res.miss {
                        self.inc(CMD_GET_MISSES_L1);
                        self.inc(CMD_GET_MISSES);
                    } else {
                        self.inc(CMD_GET_HITS);
                        self.inc(CMD_GET_HITS_L1);
                    }
                    // A client that stopped listening gets nothing more, but
                    // the stream is still drained.
                    if reply_failure.is_none() {
                        if let Err(err) = self.res.get(res).await {
                            reply_failure = Some(err);
                        }
                    }
                }
                GetEvent::Failure(err) => {
                    self.inc(CMD_GET_ERRORS);
                    self.inc(CMD_GET_ERRORS_L1);
                    warn!(error = %err, "L1 get failed");
                    if failure.is_none() {
                        failure = Some(err);
                    }
                }
            }
        }

        if let Some(err) = failure.or(reply_failure) {
            return Err(err);
        }
        self.res.get_end(req.noop_opaque, req.noop_end).await
    }

    async fn gat(&self, req: &GatRequest) -> Result<()> {
        self.inc(CMD_GAT);
        debug!(key = %String::from_utf8_lossy(&req.key), "gat");

        self.inc(CMD_GAT_L1);
        match self.l1.gat(req).await {
            Ok(res) => {
                if res.miss {
                    self.inc(CMD_GAT_MISSES_L1);
                    self.inc(CMD_GAT_MISSES);
                } else {
                    self.inc(CMD_GAT_HITS);
                    self.inc(CMD_GAT_HITS_L1);
                }
                self.res.gat(res).await
            }
            Err(err) => {
                self.inc(CMD_GAT_ERRORS);
                self.inc(CMD_GAT_ERRORS_L1);
                Err(err)
            }
        }
    }

    async fn noop(&self, req: &NoopRequest) -> Result<()> {
        self.inc(CMD_NOOP);
        self.res.noop(req.opaque).await
    }

    async fn quit(&self, req: &QuitRequest) -> Result<()> {
        self.inc(CMD_QUIT);
        self.res.quit(req.opaque, req.quiet).await
    }

    async fn version(&self, req: &VersionRequest) -> Result<()> {
        self.inc(CMD_VERSION);
        self.res.version(req.opaque).await
    }

    async fn unknown(&self, _opaque: Opaque) -> Result<()> {
        self.inc(CMD_UNKNOWN);
        Err(Error::UnknownCommand)
    }

    async fn error(&self, opaque: Opaque, req_type: RequestType, err: &Error) -> Result<()> {
        self.res.error(opaque, req_type, err).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use bytes::Bytes;
    use tokio::sync::mpsc;

    use super::*;
    use crate::common::GetResponse;
    use crate::handlers::MemoryHandler;
    use crate::metrics::CounterRegistry;
    use crate::orca::test_support::{
        CallLog, Fixture, HungUpResponder, Reply, ScriptedHandler, hit, miss, set_req,
    };
    use crate::responder::{RecordingResponder, Response};

    fn delete_req(key: &'static str, opaque: Opaque) -> DeleteRequest {
        DeleteRequest {
            key: Bytes::from(key),
            opaque,
            ..Default::default()
        }
    }

    // =========================================================================
    // Set
    // =========================================================================

    #[tokio::test]
    async fn test_set_success_on_both_tiers() {
        let fx = Fixture::new(Reply::Ok, Reply::Ok);

        fx.orca.set(&set_req("a", "v1", 1)).await.unwrap();

        assert_eq!(fx.calls(), vec!["L2.set", "L1.set"]);
        assert_eq!(
            fx.responder.responses(),
            vec![Response::Set {
                opaque: 1,
                quiet: false
            }]
        );
        for name in [
            CMD_SET,
            CMD_SET_L1,
            CMD_SET_L2,
            CMD_SET_SUCCESS,
            CMD_SET_SUCCESS_L1,
            CMD_SET_SUCCESS_L2,
        ] {
            assert_eq!(fx.count(name), 1, "{}", name);
        }
        assert_eq!(fx.count(CMD_SET_ERRORS), 0);
    }

    #[tokio::test]
    async fn test_set_l2_failure_never_reaches_l1() {
        let fx = Fixture::new(Reply::Ok, Reply::Fail);

        let result = fx.orca.set(&set_req("a", "v1", 1)).await;

        assert!(matches!(result, Err(Error::Backend(_))));
        assert_eq!(fx.calls(), vec!["L2.set"]);
        assert!(fx.responder.responses().is_empty());
        assert_eq!(fx.count(CMD_SET_ERRORS_L2), 1);
        assert_eq!(fx.count(CMD_SET_ERRORS), 1);
        assert_eq!(fx.count(CMD_SET_L1), 0);
    }

    #[tokio::test]
    async fn test_set_l1_failure_after_l2_success() {
        let fx = Fixture::new(Reply::Fail, Reply::Ok);

        let result = fx.orca.set(&set_req("a", "v1", 1)).await;

        assert!(matches!(result, Err(Error::Backend(_))));
        assert_eq!(fx.calls(), vec!["L2.set", "L1.set"]);
        assert!(fx.responder.responses().is_empty());
        assert_eq!(fx.count(CMD_SET_SUCCESS_L2), 1);
        assert_eq!(fx.count(CMD_SET_ERRORS_L1), 1);
        assert_eq!(fx.count(CMD_SET_ERRORS), 1);
        assert_eq!(fx.count(CMD_SET_SUCCESS), 0);
    }

    #[tokio::test]
    async fn test_set_passes_quiet_flag() {
        let fx = Fixture::new(Reply::Ok, Reply::Ok);
        let mut req = set_req("a", "v1", 9);
        req.quiet = true;

        fx.orca.set(&req).await.unwrap();

        let responses = fx.responder.responses();
        assert_eq!(
            responses,
            vec![Response::Set {
                opaque: 9,
                quiet: true
            }]
        );
        assert!(responses[0].is_suppressed());
    }

    // =========================================================================
    // Add / Replace
    // =========================================================================

    #[tokio::test]
    async fn test_add_key_exists_in_l2() {
        let fx = Fixture::new(Reply::Ok, Reply::Exists);

        let result = fx.orca.add(&set_req("a", "v1", 1)).await;

        assert!(matches!(result, Err(Error::KeyExists)));
        assert_eq!(fx.calls(), vec!["L2.add"]);
        assert!(fx.responder.responses().is_empty());
        assert_eq!(fx.count(CMD_ADD), 1);
        assert_eq!(fx.count(CMD_ADD_NOT_STORED_L2), 1);
        assert_eq!(fx.count(CMD_ADD_NOT_STORED), 1);
        assert_eq!(fx.count(CMD_ADD_L1), 0);
        assert_eq!(fx.count(CMD_ADD_ERRORS), 0);
    }

    #[tokio::test]
    async fn test_add_key_exists_in_l1_only() {
        let fx = Fixture::new(Reply::Exists, Reply::Ok);

        let result = fx.orca.add(&set_req("a", "v1", 1)).await;

        assert!(matches!(result, Err(Error::KeyExists)));
        assert_eq!(fx.calls(), vec!["L2.add", "L1.add"]);
        assert_eq!(fx.count(CMD_ADD_STORED_L2), 1);
        assert_eq!(fx.count(CMD_ADD_NOT_STORED_L1), 1);
        assert_eq!(fx.count(CMD_ADD_NOT_STORED), 1);
        assert_eq!(fx.count(CMD_ADD_STORED), 0);
    }

    #[tokio::test]
    async fn test_add_l2_failure() {
        let fx = Fixture::new(Reply::Ok, Reply::Fail);

        let result = fx.orca.add(&set_req("a", "v1", 1)).await;

        assert!(matches!(result, Err(Error::Backend(_))));
        assert_eq!(fx.calls(), vec!["L2.add"]);
        assert_eq!(fx.count(CMD_ADD_ERRORS_L2), 1);
        assert_eq!(fx.count(CMD_ADD_ERRORS), 1);
        assert_eq!(fx.count(CMD_ADD_NOT_STORED), 0);
    }

    #[tokio::test]
    async fn test_add_stored_on_both_tiers() {
        let fx = Fixture::new(Reply::Ok, Reply::Ok);

        fx.orca.add(&set_req("a", "v1", 3)).await.unwrap();

        assert_eq!(fx.calls(), vec!["L2.add", "L1.add"]);
        assert_eq!(
            fx.responder.responses(),
            vec![Response::Add {
                opaque: 3,
                quiet: false
            }]
        );
        assert_eq!(fx.count(CMD_ADD_STORED_L2), 1);
        assert_eq!(fx.count(CMD_ADD_STORED_L1), 1);
        assert_eq!(fx.count(CMD_ADD_STORED), 1);
    }

    #[tokio::test]
    async fn test_replace_key_missing_in_l2() {
        let fx = Fixture::new(Reply::Ok, Reply::NotFound);

        let result = fx.orca.replace(&set_req("a", "v1", 1)).await;

        assert!(matches!(result, Err(Error::KeyNotFound)));
        assert_eq!(fx.calls(), vec!["L2.replace"]);
        assert!(fx.responder.responses().is_empty());
        assert_eq!(fx.count(CMD_REPLACE_NOT_STORED_L2), 1);
        assert_eq!(fx.count(CMD_REPLACE_NOT_STORED), 1);
        assert_eq!(fx.count(CMD_REPLACE_L1), 0);
    }

    #[tokio::test]
    async fn test_replace_key_missing_in_l1() {
        let fx = Fixture::new(Reply::NotFound, Reply::Ok);

        let result = fx.orca.replace(&set_req("a", "v1", 1)).await;

        assert!(matches!(result, Err(Error::KeyNotFound)));
        assert_eq!(fx.calls(), vec!["L2.replace", "L1.replace"]);
        assert_eq!(fx.count(CMD_REPLACE_STORED_L2), 1);
        assert_eq!(fx.count(CMD_REPLACE_NOT_STORED_L1), 1);
        assert_eq!(fx.count(CMD_REPLACE_NOT_STORED), 1);
    }

    #[tokio::test]
    async fn test_replace_treats_key_exists_as_failure() {
        let fx = Fixture::new(Reply::Ok, Reply::Exists);

        let result = fx.orca.replace(&set_req("a", "v1", 1)).await;

        assert!(matches!(result, Err(Error::KeyExists)));
        assert_eq!(fx.calls(), vec!["L2.replace"]);
        assert_eq!(fx.count(CMD_REPLACE_ERRORS_L2), 1);
        assert_eq!(fx.count(CMD_REPLACE_ERRORS), 1);
        assert_eq!(fx.count(CMD_REPLACE_NOT_STORED), 0);
    }

    #[tokio::test]
    async fn test_replace_stored_on_both_tiers() {
        let fx = Fixture::new(Reply::Ok, Reply::Ok);

        fx.orca.replace(&set_req("a", "v2", 4)).await.unwrap();

        assert_eq!(
            fx.responder.responses(),
            vec![Response::Replace {
                opaque: 4,
                quiet: false
            }]
        );
        assert_eq!(fx.count(CMD_REPLACE_STORED), 1);
    }

    // =========================================================================
    // Delete
    // =========================================================================

    #[tokio::test]
    async fn test_delete_miss_in_l2_skips_l1() {
        let fx = Fixture::new(Reply::Ok, Reply::NotFound);

        let result = fx.orca.delete(&delete_req("a", 1)).await;

        assert!(matches!(result, Err(Error::KeyNotFound)));
        assert_eq!(fx.calls(), vec!["L2.delete"]);
        assert!(fx.responder.responses().is_empty());
        assert_eq!(fx.count(CMD_DELETE_MISSES_L2), 1);
        assert_eq!(fx.count(CMD_DELETE_MISSES), 1);
        assert_eq!(fx.count(CMD_DELETE_L1), 0);
    }

    #[tokio::test]
    async fn test_delete_miss_in_l1_after_l2_hit_is_a_hit() {
        let fx = Fixture::new(Reply::NotFound, Reply::Ok);

        fx.orca.delete(&delete_req("a", 2)).await.unwrap();

        assert_eq!(fx.calls(), vec!["L2.delete", "L1.delete"]);
        assert_eq!(fx.responder.responses(), vec![Response::Delete { opaque: 2 }]);
        assert_eq!(fx.count(CMD_DELETE_HITS_L2), 1);
        assert_eq!(fx.count(CMD_DELETE_HITS_L1), 1);
        assert_eq!(fx.count(CMD_DELETE_HITS), 1);
        assert_eq!(fx.count(CMD_DELETE_MISSES_L1), 0);
        assert_eq!(fx.count(CMD_DELETE_MISSES), 0);
    }

    #[tokio::test]
    async fn test_delete_l2_failure_skips_l1() {
        let fx = Fixture::new(Reply::Ok, Reply::Fail);

        let result = fx.orca.delete(&delete_req("a", 1)).await;

        assert!(matches!(result, Err(Error::Backend(_))));
        assert_eq!(fx.calls(), vec!["L2.delete"]);
        assert_eq!(fx.count(CMD_DELETE_ERRORS_L2), 1);
        assert_eq!(fx.count(CMD_DELETE_ERRORS), 1);
    }

    #[tokio::test]
    async fn test_delete_l1_failure_after_l2_hit() {
        let fx = Fixture::new(Reply::Fail, Reply::Ok);

        let result = fx.orca.delete(&delete_req("a", 1)).await;

        assert!(matches!(result, Err(Error::Backend(_))));
        assert_eq!(fx.calls(), vec!["L2.delete", "L1.delete"]);
        assert!(fx.responder.responses().is_empty());
        assert_eq!(fx.count(CMD_DELETE_HITS_L2), 1);
        assert_eq!(fx.count(CMD_DELETE_ERRORS_L1), 1);
        assert_eq!(fx.count(CMD_DELETE_HITS), 0);
    }

    #[tokio::test]
    async fn test_delete_hit_on_both_tiers() {
        let fx = Fixture::new(Reply::Ok, Reply::Ok);

        fx.orca.delete(&delete_req("a", 5)).await.unwrap();

        assert_eq!(fx.responder.responses(), vec![Response::Delete { opaque: 5 }]);
        assert_eq!(fx.count(CMD_DELETE), 1);
        assert_eq!(fx.count(CMD_DELETE_L1), 1);
        assert_eq!(fx.count(CMD_DELETE_L2), 1);
        assert_eq!(fx.count(CMD_DELETE_HITS), 1);
    }

    // =========================================================================
    // Touch
    // =========================================================================

    #[tokio::test]
    async fn test_touch_hit_uses_l1_only() {
        let fx = Fixture::new(Reply::Ok, Reply::Ok);
        let req = TouchRequest {
            key: Bytes::from_static(b"a"),
            exptime: 60,
            opaque: 6,
            ..Default::default()
        };

        fx.orca.touch(&req).await.unwrap();

        assert_eq!(fx.calls(), vec!["L1.touch"]);
        assert_eq!(fx.responder.responses(), vec![Response::Touch { opaque: 6 }]);
        assert_eq!(fx.count(CMD_TOUCH_L1), 1);
        assert_eq!(fx.count(CMD_TOUCH_HITS_L1), 1);
        assert_eq!(fx.count(CMD_TOUCH_HITS), 1);
    }

    #[tokio::test]
    async fn test_touch_miss_and_failure_count_as_misses() {
        for (reply, expect_not_found) in [(Reply::NotFound, true), (Reply::Fail, false)] {
            let fx = Fixture::new(reply, Reply::Ok);

            let result = fx.orca.touch(&TouchRequest::default()).await;

            assert_eq!(matches!(result, Err(Error::KeyNotFound)), expect_not_found);
            assert!(result.is_err());
            assert!(fx.responder.responses().is_empty());
            assert_eq!(fx.count(CMD_TOUCH_MISSES_L1), 1);
            assert_eq!(fx.count(CMD_TOUCH_MISSES), 1);
            assert_eq!(fx.count(CMD_TOUCH_HITS), 0);
        }
    }

    // =========================================================================
    // Get
    // =========================================================================

    #[tokio::test]
    async fn test_get_forwards_every_result_then_end() {
        let log = CallLog::default();
        let l1 = ScriptedHandler::new("L1", &log, Reply::Ok).with_get_events(vec![
            hit("b", "v2", 2),
            miss("c", 3),
            hit("a", "v1", 1),
        ]);
        let l2 = ScriptedHandler::new("L2", &log, Reply::Ok);
        let fx = Fixture::with_handlers(log, l1, l2);

        let req = GetRequest {
            opaques: vec![1, 2, 3],
            noop_opaque: 10,
            noop_end: true,
            ..GetRequest::for_keys(["a", "b", "c"])
        };
        fx.orca.get(&req).await.unwrap();

        assert_eq!(fx.calls(), vec!["L1.get"]);
        let responses = fx.responder.responses();
        assert_eq!(responses.len(), 4);
        assert_eq!(
            responses.iter().map(Response::opaque).collect::<Vec<_>>(),
            vec![2, 3, 1, 10]
        );
        assert_eq!(
            responses[3],
            Response::GetEnd {
                opaque: 10,
                noop_end: true
            }
        );
        assert_eq!(
            responses
                .iter()
                .filter(|r| matches!(r, Response::GetEnd { .. }))
                .count(),
            1
        );

        assert_eq!(fx.count(CMD_GET), 1);
        assert_eq!(fx.count(CMD_GET_KEYS), 3);
        assert_eq!(fx.count(CMD_GET_L1), 1);
        assert_eq!(fx.count(CMD_GET_KEYS_L1), 3);
        assert_eq!(fx.count(CMD_GET_HITS), 2);
        assert_eq!(fx.count(CMD_GET_HITS_L1), 2);
        assert_eq!(fx.count(CMD_GET_MISSES), 1);
        assert_eq!(fx.count(CMD_GET_MISSES_L1), 1);
        assert_eq!(fx.count(CMD_GET_ERRORS), 0);
    }

    #[tokio::test]
    async fn test_get_failure_suppresses_end() {
        let log = CallLog::default();
        let l1 = ScriptedHandler::new("L1", &log, Reply::Ok).with_get_events(vec![
            hit("a", "v1", 1),
            GetEvent::Failure(Error::Backend("out of memory".to_string())),
        ]);
        let l2 = ScriptedHandler::new("L2", &log, Reply::Ok);
        let fx = Fixture::with_handlers(log, l1, l2);

        let result = fx.orca.get(&GetRequest::for_keys(["a", "b"])).await;

        match result {
            Err(Error::Backend(message)) => assert_eq!(message, "out of memory"),
            other => panic!("unexpected result: {:?}", other),
        }
        let responses = fx.responder.responses();
        assert_eq!(responses.len(), 1);
        assert!(matches!(responses[0], Response::Get(_)));
        assert_eq!(fx.count(CMD_GET_ERRORS), 1);
        assert_eq!(fx.count(CMD_GET_ERRORS_L1), 1);
        assert_eq!(fx.count(CMD_GET_HITS), 1);
    }

    /// A get stream fed by hand. The sender decides when the stream ends.
    fn manual_get_stream() -> (mpsc::Sender<GetEvent>, crate::handlers::GetEvents) {
        let (tx, rx) = mpsc::channel(8);
        let events = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });
        (tx, Box::pin(events))
    }

    #[tokio::test]
    async fn test_get_drains_until_stream_closes_after_failure() {
        let (tx, events) = manual_get_stream();
        tx.send(GetEvent::Failure(Error::Backend("first".to_string())))
            .await
            .unwrap();
        tx.send(GetEvent::Failure(Error::Backend("second".to_string())))
            .await
            .unwrap();

        let log = CallLog::default();
        let l1 = ScriptedHandler::new("L1", &log, Reply::Ok).with_get_stream(events);
        let l2 = ScriptedHandler::new("L2", &log, Reply::Ok);
        let fx = Fixture::with_handlers(log, l1, l2);

        let closed = AtomicBool::new(false);
        let (closed, orca) = (&closed, &fx.orca);
        let producer = async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            closed.store(true, Ordering::SeqCst);
            drop(tx);
        };
        let consumer = async move {
            let result = orca.get(&GetRequest::for_keys(["a"])).await;
            (result, closed.load(Ordering::SeqCst))
        };
        let ((), (result, closed_before_return)) = tokio::join!(producer, consumer);

        assert!(closed_before_return, "get returned before the stream closed");
        match result {
            Err(Error::Backend(message)) => assert_eq!(message, "first"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(fx.count(CMD_GET_ERRORS), 2);
        assert_eq!(fx.count(CMD_GET_ERRORS_L1), 2);
        assert!(fx.responder.responses().is_empty());
    }

    #[tokio::test]
    async fn test_get_tier_failure_wins_over_reply_failure() {
        let log = CallLog::default();
        let l1 = Arc::new(ScriptedHandler::new("L1", &log, Reply::Ok).with_get_events(vec![
            hit("a", "v1", 1),
            GetEvent::Failure(Error::Backend("out of memory".to_string())),
        ]));
        let l2 = Arc::new(ScriptedHandler::new("L2", &log, Reply::Ok));
        let responder = Arc::new(HungUpResponder {
            inner: RecordingResponder::new(),
        });
        let metrics = Arc::new(CounterRegistry::new());
        let orca = L1L2Orca::new(
            l1,
            l2,
            Arc::clone(&responder) as Arc<dyn Responder>,
            Arc::clone(&metrics) as Arc<dyn MetricsSink>,
        );

        let result = orca.get(&GetRequest::for_keys(["a", "b"])).await;

        match result {
            Err(Error::Backend(message)) => assert_eq!(message, "out of memory"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(responder.inner.responses().is_empty());
        assert_eq!(metrics.get(CMD_GET_HITS_L1), 1);
        assert_eq!(metrics.get(CMD_GET_ERRORS), 1);
    }

    #[tokio::test]
    async fn test_get_of_no_keys_still_ends() {
        let fx = Fixture::new(Reply::Ok, Reply::Ok);

        let req = GetRequest {
            noop_opaque: 8,
            ..Default::default()
        };
        fx.orca.get(&req).await.unwrap();

        assert_eq!(
            fx.responder.responses(),
            vec![Response::GetEnd {
                opaque: 8,
                noop_end: false
            }]
        );
        assert_eq!(fx.count(CMD_GET_KEYS), 0);
    }

    #[tokio::test]
    async fn test_get_drains_stream_after_client_hangs_up() {
        let log = CallLog::default();
        let l1 = Arc::new(ScriptedHandler::new("L1", &log, Reply::Ok).with_get_events(vec![
            hit("a", "v1", 1),
            hit("b", "v2", 2),
            miss("c", 3),
        ]));
        let l2 = Arc::new(ScriptedHandler::new("L2", &log, Reply::Ok));
        let responder = Arc::new(HungUpResponder {
            inner: RecordingResponder::new(),
        });
        let metrics = Arc::new(CounterRegistry::new());
        let orca = L1L2Orca::new(
            l1,
            l2,
            Arc::clone(&responder) as Arc<dyn Responder>,
            Arc::clone(&metrics) as Arc<dyn MetricsSink>,
        );

        let result = orca.get(&GetRequest::for_keys(["a", "b", "c"])).await;

        assert!(matches!(result, Err(Error::Io(_))));
        assert!(responder.inner.responses().is_empty());
        // Every item was still pulled off the stream and counted.
        assert_eq!(metrics.get(CMD_GET_HITS_L1), 2);
        assert_eq!(metrics.get(CMD_GET_MISSES_L1), 1);
    }

    // =========================================================================
    // Get-and-touch
    // =========================================================================

    #[tokio::test]
    async fn test_gat_hit_and_miss() {
        let log = CallLog::default();
        let res = GetResponse::hit(
            Bytes::from_static(b"a"),
            Bytes::from_static(b"v1"),
            0,
            1,
            false,
        );
        let l1 = ScriptedHandler::new("L1", &log, Reply::Ok).with_gat(Ok(res.clone()));
        let l2 = ScriptedHandler::new("L2", &log, Reply::Ok);
        let fx = Fixture::with_handlers(log, l1, l2);

        let req = GatRequest {
            key: Bytes::from_static(b"a"),
            opaque: 1,
            ..Default::default()
        };
        fx.orca.gat(&req).await.unwrap();
        // The scripted answer is used up; the next call misses.
        fx.orca.gat(&req).await.unwrap();

        assert_eq!(fx.calls(), vec!["L1.gat", "L1.gat"]);
        let responses = fx.responder.responses();
        assert_eq!(responses[0], Response::Gat(res));
        assert!(matches!(&responses[1], Response::Gat(r) if r.miss));
        assert!(!responses.iter().any(|r| matches!(r, Response::GetEnd { .. })));
        assert_eq!(fx.count(CMD_GAT), 2);
        assert_eq!(fx.count(CMD_GAT_L1), 2);
        assert_eq!(fx.count(CMD_GAT_HITS), 1);
        assert_eq!(fx.count(CMD_GAT_MISSES), 1);
    }

    #[tokio::test]
    async fn test_gat_failure() {
        let log = CallLog::default();
        let l1 = ScriptedHandler::new("L1", &log, Reply::Ok)
            .with_gat(Err(Error::Backend("tier down".to_string())));
        let l2 = ScriptedHandler::new("L2", &log, Reply::Ok);
        let fx = Fixture::with_handlers(log, l1, l2);

        let result = fx.orca.gat(&GatRequest::default()).await;

        assert!(matches!(result, Err(Error::Backend(_))));
        assert!(fx.responder.responses().is_empty());
        assert_eq!(fx.count(CMD_GAT_ERRORS), 1);
        assert_eq!(fx.count(CMD_GAT_ERRORS_L1), 1);
    }

    // =========================================================================
    // Housekeeping
    // =========================================================================

    #[tokio::test]
    async fn test_housekeeping_pass_through() {
        let fx = Fixture::new(Reply::Fail, Reply::Fail);

        fx.orca.noop(&NoopRequest { opaque: 1 }).await.unwrap();
        fx.orca.version(&VersionRequest { opaque: 2 }).await.unwrap();
        fx.orca
            .quit(&QuitRequest {
                opaque: 3,
                quiet: true,
            })
            .await
            .unwrap();

        assert!(fx.calls().is_empty());
        assert_eq!(
            fx.responder.responses(),
            vec![
                Response::Noop { opaque: 1 },
                Response::Version { opaque: 2 },
                Response::Quit {
                    opaque: 3,
                    quiet: true
                },
            ]
        );
        assert_eq!(fx.count(CMD_NOOP), 1);
        assert_eq!(fx.count(CMD_VERSION), 1);
        assert_eq!(fx.count(CMD_QUIT), 1);
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let fx = Fixture::new(Reply::Ok, Reply::Ok);

        let result = fx.orca.unknown(4).await;

        assert!(matches!(result, Err(Error::UnknownCommand)));
        assert!(fx.responder.responses().is_empty());
        assert_eq!(fx.count(CMD_UNKNOWN), 1);
    }

    #[tokio::test]
    async fn test_error_is_forwarded_without_tier_calls() {
        let fx = Fixture::new(Reply::Ok, Reply::Ok);

        fx.orca
            .error(7, RequestType::Delete, &Error::KeyNotFound)
            .await
            .unwrap();

        assert!(fx.calls().is_empty());
        assert!(matches!(
            &fx.responder.responses()[..],
            [Response::Error {
                opaque: 7,
                request: RequestType::Delete,
                ..
            }]
        ));
    }

    // =========================================================================
    // In-memory tiers
    // =========================================================================

    fn memory_orca() -> (
        Arc<L1L2Orca>,
        Arc<MemoryHandler>,
        Arc<MemoryHandler>,
        Arc<RecordingResponder>,
        Arc<CounterRegistry>,
    ) {
        let l1 = Arc::new(MemoryHandler::new());
        let l2 = Arc::new(MemoryHandler::new());
        let responder = Arc::new(RecordingResponder::new());
        let metrics = Arc::new(CounterRegistry::new());
        let orca = Arc::new(L1L2Orca::new(
            Arc::clone(&l1) as Arc<dyn Handler>,
            Arc::clone(&l2) as Arc<dyn Handler>,
            Arc::clone(&responder) as Arc<dyn Responder>,
            Arc::clone(&metrics) as Arc<dyn MetricsSink>,
        ));
        (orca, l1, l2, responder, metrics)
    }

    #[tokio::test]
    async fn test_add_with_stale_l1_entry() {
        let (orca, l1, l2, responder, metrics) = memory_orca();
        l1.set(&set_req("a", "stale", 0)).await.unwrap();

        let result = orca.add(&set_req("a", "v1", 1)).await;

        assert!(matches!(result, Err(Error::KeyExists)));
        assert!(l2.contains(b"a").await);
        assert!(responder.responses().is_empty());
        assert_eq!(metrics.get(CMD_ADD_STORED_L2), 1);
        assert_eq!(metrics.get(CMD_ADD_NOT_STORED_L1), 1);
    }

    #[tokio::test]
    async fn test_write_then_read_then_delete() {
        let (orca, l1, l2, responder, _metrics) = memory_orca();

        orca.set(&set_req("a", "v1", 1)).await.unwrap();
        orca.get(&GetRequest::for_keys(["a"])).await.unwrap();
        orca.delete(&delete_req("a", 2)).await.unwrap();

        assert!(!l1.contains(b"a").await);
        assert!(!l2.contains(b"a").await);
        let responses = responder.take();
        assert_eq!(responses.len(), 4);
        assert!(matches!(&responses[1], Response::Get(r) if r.data == "v1"));
        assert_eq!(responses[3], Response::Delete { opaque: 2 });
    }

    #[tokio::test]
    async fn test_concurrent_requests() {
        let (orca, l1, l2, responder, metrics) = memory_orca();

        let tasks: Vec<_> = (0..32u32)
            .map(|i| {
                let orca = Arc::clone(&orca);
                tokio::spawn(async move {
                    let req = SetRequest {
                        key: Bytes::from(format!("key-{}", i)),
                        data: Bytes::from_static(b"v"),
                        opaque: i,
                        ..Default::default()
                    };
                    orca.set(&req).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(l1.len().await, 32);
        assert_eq!(l2.len().await, 32);
        assert_eq!(responder.responses().len(), 32);
        assert_eq!(metrics.get(CMD_SET_SUCCESS), 32);
    }
}
