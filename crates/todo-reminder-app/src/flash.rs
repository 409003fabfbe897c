//! One-shot status messages carried in client-held state.

use std::collections::BTreeMap;

use time::{Duration, OffsetDateTime};

/// Name of the value that carries the flash text.
pub const FLASH_KEY: &str = "message";

/// How long an unread flash message survives by default.
pub const DEFAULT_FLASH_TTL: Duration = Duration::minutes(1);

/// A key/value/expiration triple written to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EphemeralEntry {
    /// Key.
    pub name: String,
    /// Value; empty means "cleared".
    pub value: String,
    /// Point after which the client discards the value.
    pub expires: OffsetDateTime,
}

impl EphemeralEntry {
    /// Entry that removes `name` from the client.
    #[must_use]
    pub fn cleared(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            expires: OffsetDateTime::UNIX_EPOCH,
        }
    }
}

/// Per-request view of client-held state (e.g. cookies).
///
/// Reads observe writes made earlier in the same request.
pub trait EphemeralState {
    /// Current non-empty value for `name`.
    fn get(&self, name: &str) -> Option<String>;

    /// Queue a write to the client.
    fn put(&mut self, entry: EphemeralEntry);
}

impl<T> EphemeralState for &mut T
where
    T: EphemeralState + ?Sized,
{
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }

    fn put(&mut self, entry: EphemeralEntry) {
        (**self).put(entry);
    }
}

/// Reads and writes the single flash message.
#[derive(Debug)]
pub struct FlashMessenger<C> {
    state: C,
}

impl<C: EphemeralState> FlashMessenger<C> {
    /// Wrap the request's client state.
    pub const fn new(state: C) -> Self {
        Self { state }
    }

    /// Store `text`, replacing any unread message. It expires after `ttl`.
    pub fn set(&mut self, text: impl Into<String>, ttl: Duration) {
        self.state.put(EphemeralEntry {
            name: FLASH_KEY.to_owned(),
            value: text.into(),
            expires: OffsetDateTime::now_utc() + ttl,
        });
    }

    /// Return the pending message (or `""`) and invalidate it.
    pub fn read_and_clear(&mut self) -> String {
        let Some(text) = self.state.get(FLASH_KEY) else {
            return String::new();
        };
        self.state.put(EphemeralEntry::cleared(FLASH_KEY));
        text
    }

    /// Give back the wrapped state, e.g. to emit queued writes.
    pub fn into_inner(self) -> C {
        self.state
    }
}

/// Client state kept in memory; stands in for a browser cookie jar.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    entries: BTreeMap<String, EphemeralEntry>,
}

impl MemoryState {
    /// Drop entries that expired before `now`, as a client does between requests.
    pub fn advance_to(&mut self, now: OffsetDateTime) {
        self.entries.retain(|_, entry| entry.expires > now);
    }

    /// Raw entry, including cleared ones.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&EphemeralEntry> {
        self.entries.get(name)
    }
}

impl EphemeralState for MemoryState {
    fn get(&self, name: &str) -> Option<String> {
        self.entries
            .get(name)
            .map(|entry| entry.value.clone())
            .filter(|value| !value.is_empty())
    }

    fn put(&mut self, entry: EphemeralEntry) {
        self.entries.insert(entry.name.clone(), entry);
    }
}
