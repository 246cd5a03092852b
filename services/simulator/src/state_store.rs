//! Pool State Persistence
//!
//! JSON file holding the simulator's pool and journal position between
//! invocations. Writes go to a sibling temp file first and are renamed into
//! place, so a crash never leaves a half-written state behind.

use anyhow::{Context, Result};
use duoswap_amm::{JournalEntry, PoolState};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Contents of the state file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPool {
    /// Sequence number of the last operation applied to `pool`
    pub last_sequence: u64,
    pub pool: PoolState,
}

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load and validate the stored pool; `None` if no state file exists yet
    pub fn load(&self) -> Result<Option<StoredPool>> {
        if !self.exists() {
            debug!("No state file at {:?}", self.path);
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file {:?}", self.path))?;
        let stored: StoredPool = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse state file {:?}", self.path))?;
        stored
            .pool
            .validate()
            .with_context(|| format!("State file {:?} holds an invalid pool", self.path))?;
        Ok(Some(stored))
    }

    /// Persist the pool atomically
    pub fn save(&self, stored: &StoredPool) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create state directory {:?}", parent))?;
            }
        }
        let json =
            serde_json::to_string_pretty(stored).context("Failed to serialize pool state")?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json).with_context(|| format!("Failed to write {:?}", tmp))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move state into {:?}", self.path))?;

        info!(
            reserves = ?stored.pool.reserves(),
            last_sequence = stored.last_sequence,
            "Pool state saved to {:?}",
            self.path
        );
        Ok(())
    }
}

/// Read a JSON array of journal entries
pub fn read_journal(path: &Path) -> Result<Vec<JournalEntry>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read journal {:?}", path))?;
    let entries: Vec<JournalEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse journal {:?}", path))?;
    debug!(entries = entries.len(), "Journal loaded from {:?}", path);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use duoswap_amm::PoolConfig;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("pool.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("pool.json"));

        let mut pool = PoolState::new(PoolConfig::default());
        pool.add_liquidity(500 * 10u128.pow(18), 500 * 10u128.pow(18))
            .unwrap();
        let stored = StoredPool {
            last_sequence: 3,
            pool,
        };
        store.save(&stored).unwrap();

        assert_eq!(store.load().unwrap(), Some(stored));
        assert!(!dir.path().join("nested").join("pool.json.tmp").exists());
    }

    #[test]
    fn test_reserves_beyond_u64_survive_json() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("pool.json"));

        let mut pool = PoolState::default();
        pool.add_liquidity(10u128.pow(29), 10u128.pow(29)).unwrap();
        let stored = StoredPool {
            last_sequence: 1,
            pool,
        };
        store.save(&stored).unwrap();
        assert_eq!(store.load().unwrap(), Some(stored));
    }

    #[test]
    fn test_read_journal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal.json");
        let json = r#"[
            {
                "sequence": 1,
                "operation": { "AddLiquidity": { "amount_a": 1000, "amount_b": 1000 } }
            },
            { "sequence": 2, "operation": { "RemoveLiquidity": { "shares": 5 } } }
        ]"#;
        fs::write(&path, json).unwrap();

        let entries = read_journal(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].sequence, 2);
        assert!(read_journal(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_corrupt_state_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pool.json");
        let json = r#"{
            "last_sequence": 0,
            "pool": {
                "reserve_a": 10,
                "reserve_b": 0,
                "total_shares": 0,
                "config": { "fee_bps": 30, "ratio_tolerance_bps": 100 }
            }
        }"#;
        fs::write(&path, json).unwrap();

        let err = StateStore::new(&path).load().unwrap_err();
        assert!(format!("{:#}", err).contains("invalid pool"));
    }
}
