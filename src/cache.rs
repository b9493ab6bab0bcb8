// src/cache.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::process::RawTable;

/// Read-through memoization of fetched tables, keyed by spreadsheet id
/// and sheet name. Entries expire after the configured TTL; a zero TTL
/// disables the cache entirely and every request fetches.
///
/// This is purely a fetch memo — normalization and filtering downstream
/// see the same table an uncached fetch at the same instant would return.
pub struct TableCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub spreadsheet_id: String,
    pub sheet: Option<String>,
}

impl CacheKey {
    pub fn new(spreadsheet_id: &str, sheet: Option<&str>) -> Self {
        CacheKey {
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet: sheet.map(str::to_string),
        }
    }
}

struct CacheEntry {
    table: Arc<RawTable>,
    expires_at: Instant,
}

impl TableCache {
    pub fn new(ttl: Duration) -> Self {
        TableCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<RawTable>> {
        if self.ttl.is_zero() {
            return None;
        }
        let entries = self.entries.lock().expect("cache lock poisoned");
        let entry = entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        debug!(id = %key.spreadsheet_id, sheet = ?key.sheet, "cache hit");
        Some(entry.table.clone())
    }

    pub fn put(&self, key: CacheKey, table: Arc<RawTable>) {
        if self.ttl.is_zero() {
            return;
        }
        let entry = CacheEntry {
            table,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .insert(key, entry);
    }
}
