use bytes::Bytes;
use serde::{Serialize, Serializer};

use super::Opaque;

/// The answer for one key of a get or get-and-touch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GetResponse {
    #[serde(serialize_with = "serialize_lossy")]
    pub key: Bytes,
    #[serde(serialize_with = "serialize_lossy")]
    pub data: Bytes,
    pub flags: u32,
    pub opaque: Opaque,
    pub quiet: bool,
    /// The key was not present; `data` and `flags` are empty.
    pub miss: bool,
}

impl GetResponse {
    pub fn hit(key: Bytes, data: Bytes, flags: u32, opaque: Opaque, quiet: bool) -> Self {
        Self {
            key,
            data,
            flags,
            opaque,
            quiet,
            miss: false,
        }
    }

    pub fn miss(key: Bytes, opaque: Opaque, quiet: bool) -> Self {
        Self {
            key,
            data: Bytes::new(),
            flags: 0,
            opaque,
            quiet,
            miss: true,
        }
    }
}

fn serialize_lossy<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}
