//! Two-tier result cache for external API calls
//!
//! Fast tier: in-process concurrent map. Slow tier: optional redb file that
//! survives restarts. Entries are keyed by a deterministic fingerprint of
//! (namespace, params) so the same logical request hits the same slot across
//! processes. The slow tier is best-effort: any failure there is counted and
//! treated as a miss/no-op, never surfaced to the caller.

pub mod paths;

use dashmap::DashMap;
use redb::ReadableTableMetadata;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Hex length of the truncated key. Truncation trades a small collision
/// probability for compact keys; collisions stay namespace-scoped because
/// the namespace is part of the hashed input.
const KEY_PREFIX_LEN: usize = 24;

const ENTRIES_TABLE: redb::TableDefinition<&str, &[u8]> =
    redb::TableDefinition::new("entries");

/// A single cached value with its absolute expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub expires_unix: u64,
    pub namespace: String,
}

impl CacheEntry {
    fn is_expired(&self, now: u64) -> bool {
        self.expires_unix <= now
    }
}

/// Counters accumulated for the life of the process.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub fast_entries: usize,
    pub slow_entries: usize,
    /// Slow-tier operations that failed and degraded to a miss/no-op.
    pub slow_errors: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Two-tier keyed cache with TTL and slow-to-fast promotion.
pub struct TieredCache {
    fast: DashMap<String, CacheEntry>,
    slow: Option<redb::Database>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    slow_errors: AtomicU64,
}

impl TieredCache {
    /// Memory-only cache. Same external contract as the two-tier variant.
    pub fn in_memory(default_ttl: Duration) -> Self {
        Self {
            fast: DashMap::new(),
            slow: None,
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            slow_errors: AtomicU64::new(0),
        }
    }

    /// Cache backed by a redb file. If the file cannot be opened the cache
    /// degrades to memory-only rather than failing construction.
    pub fn with_slow_tier(db_file: &Path, default_ttl: Duration) -> Self {
        if let Some(parent) = db_file.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let slow = match redb::Database::create(db_file) {
            Ok(db) => Some(db),
            Err(e) => {
                warn!("persistent cache tier unavailable ({e}); running memory-only");
                None
            }
        };
        Self {
            slow,
            ..Self::in_memory(default_ttl)
        }
    }

    pub fn has_slow_tier(&self) -> bool {
        self.slow.is_some()
    }

    /// Deterministic fingerprint of (namespace, params).
    ///
    /// serde_json maps are BTreeMap-backed, so object keys serialize in
    /// sorted order and the fingerprint is independent of the order the
    /// caller inserted them.
    pub fn make_key(namespace: &str, params: &serde_json::Value) -> String {
        let canonical = serde_json::to_string(params).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(namespace.as_bytes());
        hasher.update(b":");
        hasher.update(canonical.as_bytes());
        let digest = hasher.finalize();
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        hex[..KEY_PREFIX_LEN].to_string()
    }

    /// Look up a value: fast tier first, then slow tier with promotion.
    /// Expired fast-tier entries are evicted lazily as part of the read.
    pub fn get(&self, namespace: &str, params: &serde_json::Value) -> Option<serde_json::Value> {
        let key = Self::make_key(namespace, params);
        let now = now_unix();

        if let Some(entry) = self.fast.get(&key) {
            if !entry.is_expired(now) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            drop(entry);
            self.fast.remove(&key);
        }

        if let Some(entry) = self.slow_get(&key) {
            if !entry.is_expired(now) {
                let value = entry.value.clone();
                self.fast.insert(key, entry);
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(value);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Typed convenience wrapper over [`TieredCache::get`].
    pub fn get_as<T: serde::de::DeserializeOwned>(
        &self,
        namespace: &str,
        params: &serde_json::Value,
    ) -> Option<T> {
        let value = self.get(namespace, params)?;
        serde_json::from_value(value).ok()
    }

    /// Write to both tiers. Slow-tier failures are swallowed (counted).
    pub fn set(
        &self,
        namespace: &str,
        params: &serde_json::Value,
        value: serde_json::Value,
        ttl: Option<Duration>,
    ) {
        let key = Self::make_key(namespace, params);
        let ttl = ttl.unwrap_or(self.default_ttl);
        let entry = CacheEntry {
            value,
            expires_unix: now_unix() + ttl.as_secs(),
            namespace: namespace.to_string(),
        };

        self.slow_put(&key, &entry);
        self.fast.insert(key, entry);
    }

    /// Remove one entry from both tiers.
    pub fn invalidate(&self, namespace: &str, params: &serde_json::Value) {
        let key = Self::make_key(namespace, params);
        self.fast.remove(&key);
        self.slow_delete(&key);
    }

    /// Empty both tiers.
    pub fn clear_all(&self) {
        self.fast.clear();
        self.slow_clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fast_entries: self.fast.len(),
            slow_entries: self.slow_len(),
            slow_errors: self.slow_errors.load(Ordering::Relaxed),
        }
    }

    // ==================== slow tier (best-effort) ====================

    fn degraded(&self, op: &str, e: impl std::fmt::Display) {
        self.slow_errors.fetch_add(1, Ordering::Relaxed);
        debug!("slow cache tier {op} failed (treated as miss): {e}");
    }

    fn slow_get(&self, key: &str) -> Option<CacheEntry> {
        let db = self.slow.as_ref()?;
        let read_txn = match db.begin_read() {
            Ok(t) => t,
            Err(e) => {
                self.degraded("read", e);
                return None;
            }
        };
        let table = match read_txn.open_table(ENTRIES_TABLE) {
            Ok(t) => t,
            // Fresh database: table doesn't exist until the first write.
            Err(redb::TableError::TableDoesNotExist(_)) => return None,
            Err(e) => {
                self.degraded("read", e);
                return None;
            }
        };
        match table.get(key) {
            Ok(Some(bytes)) => match serde_json::from_slice(bytes.value()) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    self.degraded("decode", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                self.degraded("read", e);
                None
            }
        }
    }

    fn slow_put(&self, key: &str, entry: &CacheEntry) {
        let Some(db) = self.slow.as_ref() else {
            return;
        };
        let bytes = match serde_json::to_vec(entry) {
            Ok(b) => b,
            Err(e) => {
                self.degraded("encode", e);
                return;
            }
        };
        let result = (|| -> Result<(), redb::Error> {
            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(ENTRIES_TABLE)?;
                table.insert(key, bytes.as_slice())?;
            }
            write_txn.commit()?;
            Ok(())
        })();
        if let Err(e) = result {
            self.degraded("write", e);
        }
    }

    fn slow_delete(&self, key: &str) {
        let Some(db) = self.slow.as_ref() else {
            return;
        };
        let result = (|| -> Result<(), redb::Error> {
            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(ENTRIES_TABLE)?;
                table.remove(key)?;
            }
            write_txn.commit()?;
            Ok(())
        })();
        if let Err(e) = result {
            self.degraded("delete", e);
        }
    }

    fn slow_clear(&self) {
        let Some(db) = self.slow.as_ref() else {
            return;
        };
        let result = (|| -> Result<(), redb::Error> {
            let write_txn = db.begin_write()?;
            write_txn.delete_table(ENTRIES_TABLE)?;
            write_txn.commit()?;
            Ok(())
        })();
        if let Err(e) = result {
            self.degraded("clear", e);
        }
    }

    fn slow_len(&self) -> usize {
        let Some(db) = self.slow.as_ref() else {
            return 0;
        };
        let Ok(read_txn) = db.begin_read() else {
            return 0;
        };
        match read_txn.open_table(ENTRIES_TABLE) {
            Ok(table) => table.len().map(|n| n as usize).unwrap_or(0),
            Err(_) => 0,
        }
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_is_stable_under_param_order() {
        let a = json!({"agent": "recon", "company": "grupo x"});
        let b = json!({"company": "grupo x", "agent": "recon"});
        assert_eq!(
            TieredCache::make_key("agent_recon", &a),
            TieredCache::make_key("agent_recon", &b)
        );
    }

    #[test]
    fn test_key_is_namespace_scoped() {
        let params = json!({"company": "grupo x"});
        assert_ne!(
            TieredCache::make_key("agent_recon", &params),
            TieredCache::make_key("agent_finance", &params)
        );
    }

    #[test]
    fn test_key_length() {
        let key = TieredCache::make_key("ns", &json!({"a": 1}));
        assert_eq!(key.len(), KEY_PREFIX_LEN);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_set_get_roundtrip_memory_only() {
        let cache = TieredCache::in_memory(Duration::from_secs(60));
        let params = json!({"cnpj": "12345678000100"});
        cache.set("registry", &params, json!({"name": "Acme"}), None);

        let hit = cache.get("registry", &params).expect("expected a hit");
        assert_eq!(hit["name"], "Acme");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.fast_entries, 1);
    }

    #[test]
    fn test_expired_entry_is_evicted_on_read() {
        let cache = TieredCache::in_memory(Duration::from_secs(60));
        let params = json!({"k": "v"});
        cache.set("ns", &params, json!(1), Some(Duration::from_secs(0)));

        assert!(cache.get("ns", &params).is_none());
        assert_eq!(cache.stats().fast_entries, 0);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = TieredCache::in_memory(Duration::from_secs(60));
        let params = json!({"k": "v"});
        cache.set("ns", &params, json!(1), None);
        cache.invalidate("ns", &params);
        assert!(cache.get("ns", &params).is_none());

        cache.set("ns", &params, json!(1), None);
        cache.clear_all();
        assert_eq!(cache.stats().fast_entries, 0);
    }

    #[test]
    fn test_slow_tier_survives_and_promotes() {
        let dir = tempfile::tempdir().unwrap();
        let db_file = dir.path().join("cache.redb");
        let params = json!({"cnpj": "12345678000100"});

        {
            let cache = TieredCache::with_slow_tier(&db_file, Duration::from_secs(3600));
            assert!(cache.has_slow_tier());
            cache.set("registry", &params, json!({"name": "Acme"}), None);
        }

        // New process, cold fast tier: slot must come back from the slow tier
        // and get promoted into the fast tier.
        let cache = TieredCache::with_slow_tier(&db_file, Duration::from_secs(3600));
        assert_eq!(cache.stats().fast_entries, 0);
        let hit = cache.get("registry", &params).expect("slow-tier hit");
        assert_eq!(hit["name"], "Acme");
        assert_eq!(cache.stats().fast_entries, 1);
    }
}
