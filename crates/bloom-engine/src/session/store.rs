use std::collections::HashMap;

use super::{SessionError, SessionGateway, SessionSummary};

/// Key under which unsent summaries are kept, as a JSON array.
pub const STASH_KEY: &str = "bloom.pending_sessions";

/// Minimal string key-value store (browser localStorage or in-memory).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), SessionError>;
    fn remove(&mut self, key: &str) -> Result<(), SessionError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SessionError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SessionError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Staging area for summaries the gateway did not take.
pub struct SessionStash<'a> {
    store: &'a mut dyn KeyValueStore,
}

impl<'a> SessionStash<'a> {
    pub fn new(store: &'a mut dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Staged summaries. A missing key or unparseable JSON reads as empty;
    /// a store that cannot be read is an error, never an empty stash.
    fn load(&self) -> Result<Vec<SessionSummary>, SessionError> {
        match self.store.get(STASH_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json).unwrap_or_else(|err| {
                log::warn!("discarding unreadable session stash: {}", err);
                Vec::new()
            })),
            None => Ok(Vec::new()),
        }
    }

    fn write(&mut self, pending: &[SessionSummary]) -> Result<(), SessionError> {
        if pending.is_empty() {
            return self.store.remove(STASH_KEY);
        }
        let json = serde_json::to_string(pending)?;
        self.store.set(STASH_KEY, &json)
    }

    /// Append a summary to the stash.
    pub fn stage(&mut self, summary: &SessionSummary) -> Result<(), SessionError> {
        let mut pending = self.load()?;
        pending.push(summary.clone());
        self.write(&pending)
    }

    /// Number of staged summaries; zero when the store cannot be read.
    pub fn len(&self) -> usize {
        match self.load() {
            Ok(pending) => pending.len(),
            Err(err) => {
                log::warn!("session stash unavailable: {}", err);
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-send staged summaries oldest first. Stops at the first refusal and
    /// keeps it (and everything after it) staged. Returns how many were sent.
    pub fn flush(&mut self, gateway: &mut dyn SessionGateway) -> Result<usize, SessionError> {
        let pending = self.load()?;
        let mut sent = 0;
        for summary in &pending {
            if let Err(err) = gateway.save(summary) {
                log::info!("session flush paused after {} records: {}", sent, err);
                break;
            }
            sent += 1;
        }
        if sent > 0 {
            self.write(&pending[sent..])?;
        }
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::RecordingGateway;

    fn summary(score: u32) -> SessionSummary {
        SessionSummary::new("emotion-maze", score, 12.5, true)
    }

    #[test]
    fn stage_then_flush_sends_in_order() {
        let mut store = MemoryStore::new();
        let mut stash = SessionStash::new(&mut store);
        stash.stage(&summary(1)).unwrap();
        stash.stage(&summary(2)).unwrap();

        let mut gateway = RecordingGateway::default();
        assert_eq!(stash.flush(&mut gateway).unwrap(), 2);
        let scores: Vec<u32> = gateway.saved.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![1, 2]);
        assert!(stash.is_empty());
        assert_eq!(store.get(STASH_KEY).unwrap(), None);
    }

    #[test]
    fn partial_flush_keeps_the_rest() {
        let mut store = MemoryStore::new();
        let mut stash = SessionStash::new(&mut store);
        for score in 1..=3 {
            stash.stage(&summary(score)).unwrap();
        }
        let mut gateway = RecordingGateway { fail_after: Some(1), ..Default::default() };
        assert_eq!(stash.flush(&mut gateway).unwrap(), 1);
        assert_eq!(stash.len(), 2);

        let mut gateway = RecordingGateway::default();
        stash.flush(&mut gateway).unwrap();
        let scores: Vec<u32> = gateway.saved.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![2, 3]);
    }

    #[test]
    fn corrupt_stash_is_treated_as_empty() {
        let mut store = MemoryStore::new();
        store.set(STASH_KEY, "not json").unwrap();
        let mut stash = SessionStash::new(&mut store);
        assert!(stash.is_empty());
        stash.stage(&summary(4)).unwrap();
        assert_eq!(stash.len(), 1);
    }

    /// Store whose reads can be switched off.
    struct FlakyStore {
        inner: MemoryStore,
        reads_fail: bool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
            if self.reads_fail {
                return Err(SessionError::Storage("read refused".into()));
            }
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), SessionError> {
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), SessionError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn unreadable_store_never_overwrites_staged_sessions() {
        let mut store = FlakyStore { inner: MemoryStore::new(), reads_fail: false };
        {
            let mut stash = SessionStash::new(&mut store);
            for score in 1..=3 {
                stash.stage(&summary(score)).unwrap();
            }
        }

        store.reads_fail = true;
        {
            let mut stash = SessionStash::new(&mut store);
            assert!(matches!(stash.stage(&summary(4)), Err(SessionError::Storage(_))));
            let mut gateway = RecordingGateway::default();
            assert!(stash.flush(&mut gateway).is_err());
            assert!(gateway.saved.is_empty());
        }

        store.reads_fail = false;
        let stash = SessionStash::new(&mut store);
        assert_eq!(stash.len(), 3);
    }

    #[test]
    fn flush_with_nothing_staged_is_zero() {
        let mut store = MemoryStore::new();
        let mut stash = SessionStash::new(&mut store);
        let mut gateway = RecordingGateway::default();
        assert_eq!(stash.flush(&mut gateway).unwrap(), 0);
        assert!(gateway.saved.is_empty());
    }
}
