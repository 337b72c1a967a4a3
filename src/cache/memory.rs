use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::transcript::Transcript;

struct MemoryEntry {
    transcript: Transcript,
    stored_at: Instant,
}

/// In-process transcript tier.
///
/// Entries expire after the same TTL as the durable tier, counted from their
/// own write, and the oldest write is evicted once `capacity` is exceeded.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    capacity: usize,
    ttl: Duration,
}

impl MemoryStore {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<Transcript> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                    return Some(entry.transcript.clone());
                }
                Some(_) => {}
            }
        }

        // expired; drop it unless a newer write replaced it meanwhile
        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .map_or(false, |entry| entry.stored_at.elapsed() >= self.ttl)
        {
            entries.remove(key);
            debug!("Expired in-process entry {}", key);
        }
        None
    }

    /// Insert or replace an entry
    pub async fn insert(&self, key: &str, transcript: Transcript) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                transcript,
                stored_at: Instant::now(),
            },
        );

        while entries.len() > self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(oldest) => {
                    entries.remove(&oldest);
                    debug!("Evicted in-process entry {}", oldest);
                }
                None => break,
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
