//! Revision-keyed object property cache and the outbound request queue.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use shardwire_frame::{ClientVersion, CV_5090};

use crate::serial::Serial;

/// Most serials carried by one batched property request.
pub const MAX_BATCH: usize = 50;

/// Cached property text for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyEntry {
    pub serial: Serial,
    pub revision: u32,
    pub name: String,
    pub data: String,
}

/// Outcome of [`PropertyCache::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Observation {
    /// First entry for the serial.
    Inserted,
    /// Replaced an older revision.
    Updated,
    /// Same revision and text as the cached entry.
    Duplicate,
    /// Older than what is cached, or same revision with different text.
    Ignored,
}

impl Observation {
    pub fn changed(self) -> bool {
        matches!(self, Observation::Inserted | Observation::Updated)
    }
}

/// Property entries keyed by serial. A cached entry is only replaced by a
/// strictly newer revision.
#[derive(Debug, Default)]
pub struct PropertyCache {
    entries: HashMap<Serial, PropertyEntry>,
}

impl PropertyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, serial: Serial) -> Option<&PropertyEntry> {
        self.entries.get(&serial)
    }

    pub fn revision(&self, serial: Serial) -> Option<u32> {
        self.entries.get(&serial).map(|e| e.revision)
    }

    /// Whether `revision` is newer than anything cached for `serial`.
    pub fn is_stale(&self, serial: Serial, revision: u32) -> bool {
        self.entries
            .get(&serial)
            .map_or(true, |e| e.revision < revision)
    }

    pub fn observe(
        &mut self,
        serial: Serial,
        revision: u32,
        name: String,
        data: String,
    ) -> Observation {
        match self.entries.get_mut(&serial) {
            None => {
                self.entries.insert(
                    serial,
                    PropertyEntry {
                        serial,
                        revision,
                        name,
                        data,
                    },
                );
                Observation::Inserted
            }
            Some(entry) if revision > entry.revision => {
                entry.revision = revision;
                entry.name = name;
                entry.data = data;
                Observation::Updated
            }
            Some(entry) if revision == entry.revision && entry.name == name && entry.data == data => {
                Observation::Duplicate
            }
            Some(entry) => {
                tracing::debug!(
                    serial = %serial,
                    cached = entry.revision,
                    received = revision,
                    "ignoring property revision"
                );
                Observation::Ignored
            }
        }
    }

    pub fn forget(&mut self, serial: Serial) -> bool {
        self.entries.remove(&serial).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyEntry> {
        self.entries.values()
    }
}

/// One outbound property request, shaped by protocol version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "serials", rename_all = "snake_case")]
pub enum PropertyRequest {
    Batch(Vec<Serial>),
    Single(Serial),
}

impl PropertyRequest {
    pub fn serials(&self) -> &[Serial] {
        match self {
            PropertyRequest::Batch(serials) => serials,
            PropertyRequest::Single(serial) => std::slice::from_ref(serial),
        }
    }
}

/// Deduplicating queue of serials whose properties should be fetched.
///
/// A serial is not queued again while a request for it is in flight.
#[derive(Debug, Default)]
pub struct RequestQueue {
    pending: Vec<Serial>,
    queued: HashSet<Serial>,
    in_flight: HashSet<Serial>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `serial`. Returns `false` if it was already pending or in flight.
    pub fn request(&mut self, serial: Serial) -> bool {
        if self.in_flight.contains(&serial) || !self.queued.insert(serial) {
            return false;
        }
        self.pending.push(serial);
        true
    }

    /// Mark a response as received, allowing future requests for `serial`.
    pub fn complete(&mut self, serial: Serial) -> bool {
        self.in_flight.remove(&serial)
    }

    /// Drop any pending or in-flight state for `serial`.
    pub fn cancel(&mut self, serial: Serial) {
        if self.queued.remove(&serial) {
            self.pending.retain(|s| *s != serial);
        }
        self.in_flight.remove(&serial);
    }

    /// Drain pending serials into requests. Clients from 5.0.9 on take
    /// batches of up to [`MAX_BATCH`]; older ones one serial per request.
    pub fn flush(&mut self, version: ClientVersion) -> Vec<PropertyRequest> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let pending = std::mem::take(&mut self.pending);
        self.queued.clear();
        self.in_flight.extend(pending.iter().copied());

        if version >= CV_5090 {
            pending
                .chunks(MAX_BATCH)
                .map(|chunk| PropertyRequest::Batch(chunk.to_vec()))
                .collect()
        } else {
            pending.into_iter().map(PropertyRequest::Single).collect()
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_in_flight(&self, serial: Serial) -> bool {
        self.in_flight.contains(&serial)
    }

    /// Forget everything, e.g. after a reconnect.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.queued.clear();
        self.in_flight.clear();
    }
}
