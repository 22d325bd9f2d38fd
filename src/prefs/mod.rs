use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

const PREFS_FILE: &str = "preferences.json";

/// User toggles controlling the extension surface.
///
/// JSON keys match the extension's existing `chrome.storage.local` entries
/// (`floatingButtonsEnabled`, `floatingButtonsBySite`, `autoProcessEnabled`)
/// so the popup can mirror state without translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Global floating-button toggle.
    #[serde(default = "default_true")]
    pub floating_buttons_enabled: bool,
    /// Per-site overrides; an entry here wins over the global toggle.
    #[serde(default)]
    pub floating_buttons_by_site: HashMap<String, bool>,
    /// Process a picked file automatically once requirements are known.
    #[serde(default = "default_true")]
    pub auto_process_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            floating_buttons_enabled: true,
            floating_buttons_by_site: HashMap::new(),
            auto_process_enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Preferences {
    /// Effective floating-button state for a site: the per-site override
    /// wins when present, otherwise the global toggle.
    pub fn floating_enabled_for(&self, site: &str) -> bool {
        self.floating_buttons_by_site
            .get(site)
            .copied()
            .unwrap_or(self.floating_buttons_enabled)
    }
}

/// Persistent store for [`Preferences`], backed by a JSON file in the state
/// directory.
pub struct PrefStore {
    path: PathBuf,
    inner: RwLock<Preferences>,
}

impl PrefStore {
    /// Open the store backed by `<state_dir>/preferences.json`, loading
    /// persisted values or falling back to defaults.
    pub fn open(state_dir: &Path) -> Self {
        let path = state_dir.join(PREFS_FILE);
        let prefs = if path.exists() {
            match load_prefs(&path) {
                Ok(prefs) => prefs,
                Err(e) => {
                    warn!("Failed to load preferences, using defaults: {e:#}");
                    Preferences::default()
                }
            }
        } else {
            Preferences::default()
        };
        Self {
            path,
            inner: RwLock::new(prefs),
        }
    }

    pub fn snapshot(&self) -> Preferences {
        self.inner.read().clone()
    }

    /// Replace the whole preference set (the popup sends a full document).
    pub fn replace(&self, prefs: Preferences) -> Result<()> {
        *self.inner.write() = prefs.clone();
        self.save(&prefs)
    }

    /// Set or clear (`None`) a per-site floating-button override.
    pub fn set_site_override(&self, site: &str, enabled: Option<bool>) -> Result<Preferences> {
        let snapshot = {
            let mut guard = self.inner.write();
            match enabled {
                Some(value) => {
                    guard.floating_buttons_by_site.insert(site.to_string(), value);
                }
                None => {
                    guard.floating_buttons_by_site.remove(site);
                }
            }
            guard.clone()
        };
        debug!("Site override for '{site}' set to {enabled:?}");
        self.save(&snapshot)?;
        Ok(snapshot)
    }

    fn save(&self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(prefs)?)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

fn load_prefs(path: &Path) -> Result<Preferences> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&content)?)
}

/// Normalize a site argument (a bare host or a full page URL) to the host
/// key used by the per-site override map.
pub fn site_key(site: &str) -> String {
    if let Ok(url) = Url::parse(site) {
        if let Some(host) = url.host_str() {
            return host.to_string();
        }
    }
    site.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn override_wins_over_global() {
        let mut prefs = Preferences::default();
        prefs.floating_buttons_enabled = true;
        prefs
            .floating_buttons_by_site
            .insert("example.com".to_string(), false);

        assert!(!prefs.floating_enabled_for("example.com"));
        assert!(prefs.floating_enabled_for("other.com"));
    }

    #[test]
    fn global_flag_is_the_fallback() {
        let prefs = Preferences {
            floating_buttons_enabled: false,
            ..Preferences::default()
        };
        assert!(!prefs.floating_enabled_for("example.com"));
    }

    #[test]
    fn set_and_clear_site_override() {
        let dir = TempDir::new().unwrap();
        let store = PrefStore::open(dir.path());

        let updated = store.set_site_override("example.com", Some(false)).unwrap();
        assert!(!updated.floating_enabled_for("example.com"));

        let cleared = store.set_site_override("example.com", None).unwrap();
        assert!(cleared.floating_enabled_for("example.com"));
        assert!(cleared.floating_buttons_by_site.is_empty());
    }

    #[test]
    fn survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = PrefStore::open(dir.path());
            store
                .replace(Preferences {
                    floating_buttons_enabled: false,
                    ..Preferences::default()
                })
                .unwrap();
        }
        let reopened = PrefStore::open(dir.path());
        assert!(!reopened.snapshot().floating_buttons_enabled);
    }

    #[test]
    fn site_key_accepts_hosts_and_urls() {
        assert_eq!(site_key("example.com"), "example.com");
        assert_eq!(site_key("Example.COM"), "example.com");
        assert_eq!(
            site_key("https://careers.example.com/apply?step=2"),
            "careers.example.com"
        );
    }

    #[test]
    fn wire_keys_match_extension_storage() {
        let prefs = Preferences::default();
        let json = serde_json::to_value(&prefs).unwrap();
        assert!(json.get("floatingButtonsEnabled").is_some());
        assert!(json.get("floatingButtonsBySite").is_some());
        assert!(json.get("autoProcessEnabled").is_some());
    }
}
