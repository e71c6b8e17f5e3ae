use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream;
use tokio::sync::Mutex;

use super::{GetEvent, GetEvents, Handler};
use crate::common::{
    DeleteRequest, Error, GatRequest, GetRequest, GetResponse, Result, SetRequest, TouchRequest,
};

/// Expirations up to this many seconds are relative; larger ones are unix times.
const MAX_RELATIVE_EXPTIME: u32 = 60 * 60 * 24 * 30;

/// Configuration for a [`MemoryHandler`].
#[derive(Debug, Clone, Default)]
pub struct MemoryHandlerConfig {
    /// Largest value accepted by set, add and replace. `None` means unlimited.
    pub max_value_size: Option<u64>,
}

#[derive(Debug, Clone)]
struct Entry {
    data: Bytes,
    flags: u32,
    expires: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires.is_some_and(|at| at <= now)
    }
}

type Items = HashMap<Bytes, Entry>;

/// An in-memory cache tier, intended primarily for testing.
///
/// Entries honor memcached expiration semantics but are never evicted.
pub struct MemoryHandler {
    items: Arc<Mutex<Items>>,
    config: MemoryHandlerConfig,
}

impl MemoryHandler {
    /// Create a new empty tier with no value size limit.
    pub fn new() -> Self {
        Self::with_config(MemoryHandlerConfig::default())
    }

    pub fn with_config(config: MemoryHandlerConfig) -> Self {
        Self {
            items: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Whether a live entry exists for `key`.
    pub async fn contains(&self, key: &[u8]) -> bool {
        let mut items = self.items.lock().await;
        live_entry(&mut items, key, Instant::now()).is_some()
    }

    fn check_size(&self, req: &SetRequest) -> Result<()> {
        match self.config.max_value_size {
            Some(max) if req.data.len() as u64 > max => Err(Error::ValueTooBig),
            _ => Ok(()),
        }
    }

    fn store(items: &mut Items, req: &SetRequest) {
        items.insert(
            req.key.clone(),
            Entry {
                data: req.data.clone(),
                flags: req.flags,
                expires: expires_at(req.exptime),
            },
        );
    }
}

impl Default for MemoryHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Look up a key, dropping it first if it has expired.
fn live_entry<'a>(items: &'a mut Items, key: &[u8], now: Instant) -> Option<&'a mut Entry> {
    if items.get(key).is_some_and(|e| e.is_expired(now)) {
        items.remove(key);
    }
    items.get_mut(key)
}

/// Convert a memcached expiration into a deadline.
fn expires_at(exptime: u32) -> Option<Instant> {
    match exptime {
        0 => None,
        secs if secs <= MAX_RELATIVE_EXPTIME => {
            Some(Instant::now() + Duration::from_secs(u64::from(secs)))
        }
        unix => {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs();
            let remaining = u64::from(unix).saturating_sub(now);
            Some(Instant::now() + Duration::from_secs(remaining))
        }
    }
}

#[async_trait]
impl Handler for MemoryHandler {
    async fn set(&self, req: &SetRequest) -> Result<()> {
        self.check_size(req)?;
        let mut items = self.items.lock().await;
        Self::store(&mut items, req);
        Ok(())
    }

    async fn add(&self, req: &SetRequest) -> Result<()> {
        self.check_size(req)?;
        let mut items = self.items.lock().await;
        if live_entry(&mut items, &req.key, Instant::now()).is_some() {
            return Err(Error::KeyExists);
        }
        Self::store(&mut items, req);
        Ok(())
    }

    async fn replace(&self, req: &SetRequest) -> Result<()> {
        self.check_size(req)?;
        let mut items = self.items.lock().await;
        if live_entry(&mut items, &req.key, Instant::now()).is_none() {
            return Err(Error::KeyNotFound);
        }
        Self::store(&mut items, req);
        Ok(())
    }

    async fn delete(&self, req: &DeleteRequest) -> Result<()> {
        let mut items = self.items.lock().await;
        if live_entry(&mut items, &req.key, Instant::now()).is_none() {
            return Err(Error::KeyNotFound);
        }
        items.remove(&req.key);
        Ok(())
    }

    async fn touch(&self, req: &TouchRequest) -> Result<()> {
        let mut items = self.items.lock().await;
        let entry =
            live_entry(&mut items, &req.key, Instant::now()).ok_or(Error::KeyNotFound)?;
        entry.expires = expires_at(req.exptime);
        Ok(())
    }

    fn get(&self, req: &GetRequest) -> GetEvents {
        let items = Arc::clone(&self.items);
        let req = req.clone();

        let read = async move {
            let mut items = items.lock().await;
            let now = Instant::now();
            let events: Vec<GetEvent> = req
                .keys
                .iter()
                .enumerate()
                .map(|(ix, key)| {
                    let (opaque, quiet) = (req.opaque_at(ix), req.quiet_at(ix));
                    let res = match live_entry(&mut items, key, now) {
                        Some(entry) => GetResponse::hit(
                            key.clone(),
                            entry.data.clone(),
                            entry.flags,
                            opaque,
                            quiet,
                        ),
                        None => GetResponse::miss(key.clone(), opaque, quiet),
                    };
                    GetEvent::Item(res)
                })
                .collect();
            stream::iter(events)
        };

        Box::pin(stream::once(read).flatten())
    }

    async fn gat(&self, req: &GatRequest) -> Result<GetResponse> {
        let mut items = self.items.lock().await;
        match live_entry(&mut items, &req.key, Instant::now()) {
            Some(entry) => {
                entry.expires = expires_at(req.exptime);
                Ok(GetResponse::hit(
                    req.key.clone(),
                    entry.data.clone(),
                    entry.flags,
                    req.opaque,
                    req.quiet,
                ))
            }
            None => Ok(GetResponse::miss(req.key.clone(), req.opaque, req.quiet)),
        }
    }
}
