//! Test doubles for orchestrator tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use super::L1L2Orca;
use crate::common::{
    DeleteRequest, Error, GatRequest, GetRequest, GetResponse, Opaque, RequestType, Result,
    SetRequest, TouchRequest,
};
use crate::handlers::{GetEvent, GetEvents, Handler, get_event_channel};
use crate::metrics::{CounterRegistry, MetricsSink};
use crate::responder::{RecordingResponder, Responder};

/// Calls made on every scripted tier, as "<tier>.<op>", in call order.
pub(crate) type CallLog = Arc<Mutex<Vec<String>>>;

/// How a scripted tier answers set, add, replace, delete and touch.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Reply {
    Ok,
    NotFound,
    Exists,
    Fail,
}

impl Reply {
    fn to_result(self) -> Result<()> {
        match self {
            Reply::Ok => Ok(()),
            Reply::NotFound => Err(Error::KeyNotFound),
            Reply::Exists => Err(Error::KeyExists),
            Reply::Fail => Err(Error::Backend("tier down".to_string())),
        }
    }
}

/// A tier that answers from a script and logs every call.
pub(crate) struct ScriptedHandler {
    name: &'static str,
    log: CallLog,
    reply: Reply,
    get_events: Mutex<Vec<GetEvent>>,
    get_stream: Mutex<Option<GetEvents>>,
    gat: Mutex<Option<Result<GetResponse>>>,
}

impl ScriptedHandler {
    pub(crate) fn new(name: &'static str, log: &CallLog, reply: Reply) -> Self {
        Self {
            name,
            log: Arc::clone(log),
            reply,
            get_events: Mutex::new(Vec::new()),
            get_stream: Mutex::new(None),
            gat: Mutex::new(None),
        }
    }

    /// Events fed, from a separate task, to the next get.
    pub(crate) fn with_get_events(self, events: Vec<GetEvent>) -> Self {
        *self.get_events.lock().unwrap() = events;
        self
    }

    /// A stream returned as-is by the next get, ahead of any scripted events.
    pub(crate) fn with_get_stream(self, stream: GetEvents) -> Self {
        *self.get_stream.lock().unwrap() = Some(stream);
        self
    }

    pub(crate) fn with_gat(self, result: Result<GetResponse>) -> Self {
        *self.gat.lock().unwrap() = Some(result);
        self
    }

    fn record(&self, op: &str) -> Result<()> {
        self.log.lock().unwrap().push(format!("{}.{}", self.name, op));
        self.reply.to_result()
    }
}

#[async_trait]
impl Handler for ScriptedHandler {
    async fn set(&self, _req: &SetRequest) -> Result<()> {
        self.record("set")
    }

    async fn add(&self, _req: &SetRequest) -> Result<()> {
        self.record("add")
    }

    async fn replace(&self, _req: &SetRequest) -> Result<()> {
        self.record("replace")
    }

    async fn delete(&self, _req: &DeleteRequest) -> Result<()> {
        self.record("delete")
    }

    async fn touch(&self, _req: &TouchRequest) -> Result<()> {
        self.record("touch")
    }

    fn get(&self, _req: &GetRequest) -> GetEvents {
        self.log.lock().unwrap().push(format!("{}.get", self.name));
        if let Some(stream) = self.get_stream.lock().unwrap().take() {
            return stream;
        }
        let events = std::mem::take(&mut *self.get_events.lock().unwrap());

        let (sender, stream) = get_event_channel(1);
        tokio::spawn(async move {
            for event in events {
                match event {
                    GetEvent::Item(res) => {
                        sender.send(res).await;
                    }
                    GetEvent::Failure(err) => {
                        sender.fail(err).await;
                        return;
                    }
                }
            }
        });
        stream
    }

    async fn gat(&self, req: &GatRequest) -> Result<GetResponse> {
        self.log.lock().unwrap().push(format!("{}.gat", self.name));
        self.gat
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(GetResponse::miss(req.key.clone(), req.opaque, req.quiet)))
    }
}

/// A responder whose per-key get replies fail as if the client hung up.
pub(crate) struct HungUpResponder {
    pub(crate) inner: RecordingResponder,
}

#[async_trait]
impl Responder for HungUpResponder {
    async fn set(&self, opaque: Opaque, quiet: bool) -> Result<()> {
        self.inner.set(opaque, quiet).await
    }

    async fn add(&self, opaque: Opaque, quiet: bool) -> Result<()> {
        self.inner.add(opaque, quiet).await
    }

    async fn replace(&self, opaque: Opaque, quiet: bool) -> Result<()> {
        self.inner.replace(opaque, quiet).await
    }

    async fn delete(&self, opaque: Opaque) -> Result<()> {
        self.inner.delete(opaque).await
    }

    async fn touch(&self, opaque: Opaque) -> Result<()> {
        self.inner.touch(opaque).await
    }

    async fn get(&self, _res: GetResponse) -> Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "client hung up").into())
    }

    async fn get_end(&self, noop_opaque: Opaque, noop_end: bool) -> Result<()> {
        self.inner.get_end(noop_opaque, noop_end).await
    }

    async fn gat(&self, res: GetResponse) -> Result<()> {
        self.inner.gat(res).await
    }

    async fn noop(&self, opaque: Opaque) -> Result<()> {
        self.inner.noop(opaque).await
    }

    async fn quit(&self, opaque: Opaque, quiet: bool) -> Result<()> {
        self.inner.quit(opaque, quiet).await
    }

    async fn version(&self, opaque: Opaque) -> Result<()> {
        self.inner.version(opaque).await
    }

    async fn error(&self, opaque: Opaque, req_type: RequestType, err: &Error) -> Result<()> {
        self.inner.error(opaque, req_type, err).await
    }
}

/// An orchestrator wired to scripted tiers, a recording responder and a registry.
pub(crate) struct Fixture {
    pub(crate) orca: L1L2Orca,
    pub(crate) log: CallLog,
    pub(crate) responder: Arc<RecordingResponder>,
    pub(crate) metrics: Arc<CounterRegistry>,
}

impl Fixture {
    /// Tiers answering every write with fixed replies.
    pub(crate) fn new(l1: Reply, l2: Reply) -> Self {
        let log = CallLog::default();
        let l1 = ScriptedHandler::new("L1", &log, l1);
        let l2 = ScriptedHandler::new("L2", &log, l2);
        Self::with_handlers(log, l1, l2)
    }

    pub(crate) fn with_handlers(log: CallLog, l1: ScriptedHandler, l2: ScriptedHandler) -> Self {
        let responder = Arc::new(RecordingResponder::new());
        let metrics = Arc::new(CounterRegistry::new());
        let orca = L1L2Orca::new(
            Arc::new(l1),
            Arc::new(l2),
            Arc::clone(&responder) as Arc<dyn Responder>,
            Arc::clone(&metrics) as Arc<dyn MetricsSink>,
        );
        Self {
            orca,
            log,
            responder,
            metrics,
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, name: &str) -> u64 {
        self.metrics.get(name)
    }
}

pub(crate) fn set_req(key: &'static str, data: &'static str, opaque: Opaque) -> SetRequest {
    SetRequest {
        key: Bytes::from(key),
        data: Bytes::from(data),
        opaque,
        ..Default::default()
    }
}

pub(crate) fn hit(key: &'static str, data: &'static str, opaque: Opaque) -> GetEvent {
    GetEvent::Item(GetResponse::hit(
        Bytes::from(key),
        Bytes::from(data),
        0,
        opaque,
        false,
    ))
}

pub(crate) fn miss(key: &'static str, opaque: Opaque) -> GetEvent {
    GetEvent::Item(GetResponse::miss(Bytes::from(key), opaque, false))
}
