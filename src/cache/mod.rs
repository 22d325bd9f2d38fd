use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::detector::DetectedRequirement;

const CACHE_FILE: &str = "requirements.json";

/// A cached requirement for one tab, with the time it was last updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedRequirement {
    pub requirement: DetectedRequirement,
    pub updated_at: String,
}

/// Latest detected requirement per browser tab.
///
/// Mirrors the extension's bookkeeping: the content script reports a
/// detection ("updateRequirements"), the popup asks for it back
/// ("getRequirements"), and the entry is evicted when the tab closes.
/// Persisted to the state directory so a gateway restart does not lose
/// open-tab state.
pub struct RequirementCache {
    path: PathBuf,
    entries: DashMap<String, CachedRequirement>,
}

impl RequirementCache {
    /// Open the cache backed by `<state_dir>/requirements.json`, loading
    /// any persisted entries.
    pub fn open(state_dir: &Path) -> Self {
        let path = state_dir.join(CACHE_FILE);
        let entries = DashMap::new();
        if path.exists() {
            match load_entries(&path) {
                Ok(stored) => {
                    debug!("Loaded {} cached requirement(s)", stored.len());
                    for (tab, entry) in stored {
                        entries.insert(tab, entry);
                    }
                }
                Err(e) => warn!("Failed to load requirement cache: {e:#}"),
            }
        }
        Self { path, entries }
    }

    /// Store the latest detection for a tab.
    pub fn update(&self, tab_id: &str, requirement: DetectedRequirement) {
        self.entries.insert(
            tab_id.to_string(),
            CachedRequirement {
                requirement,
                updated_at: Utc::now().to_rfc3339(),
            },
        );
        self.persist();
    }

    pub fn get(&self, tab_id: &str) -> Option<CachedRequirement> {
        self.entries.get(tab_id).map(|e| e.value().clone())
    }

    /// Drop a tab's entry (the tab was closed). Returns whether it existed.
    pub fn evict(&self, tab_id: &str) -> bool {
        let existed = self.entries.remove(tab_id).is_some();
        if existed {
            self.persist();
        }
        existed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) {
        let snapshot: HashMap<String, CachedRequirement> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        if let Err(e) = write_entries(&self.path, &snapshot) {
            warn!("Failed to persist requirement cache: {e:#}");
        }
    }
}

fn load_entries(path: &Path) -> Result<HashMap<String, CachedRequirement>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&content)?)
}

fn write_entries(path: &Path, entries: &HashMap<String, CachedRequirement>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(entries)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn requirement() -> DetectedRequirement {
        DetectedRequirement {
            width: Some(160),
            height: Some(212),
            max_size_kb: Some(50),
        }
    }

    #[test]
    fn update_then_get() {
        let dir = TempDir::new().unwrap();
        let cache = RequirementCache::open(dir.path());
        cache.update("42", requirement());

        let entry = cache.get("42").unwrap();
        assert_eq!(entry.requirement, requirement());
        assert!(cache.get("7").is_none());
    }

    #[test]
    fn evict_removes_entry() {
        let dir = TempDir::new().unwrap();
        let cache = RequirementCache::open(dir.path());
        cache.update("42", requirement());

        assert!(cache.evict("42"));
        assert!(!cache.evict("42"));
        assert!(cache.is_empty());
    }

    #[test]
    fn survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let cache = RequirementCache::open(dir.path());
            cache.update("42", requirement());
        }
        let reopened = RequirementCache::open(dir.path());
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get("42").unwrap().requirement, requirement());
    }

    #[test]
    fn latest_update_wins() {
        let dir = TempDir::new().unwrap();
        let cache = RequirementCache::open(dir.path());
        cache.update("42", requirement());
        cache.update(
            "42",
            DetectedRequirement {
                width: Some(640),
                height: Some(480),
                max_size_kb: None,
            },
        );
        assert_eq!(cache.get("42").unwrap().requirement.width, Some(640));
        assert_eq!(cache.len(), 1);
    }
}
