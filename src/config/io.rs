use anyhow::{bail, Context, Result};
use std::path::Path;

/// Maximum size for a config file (1 MB; the FormFit config is flat and
/// small, so anything bigger is not a config file).
pub const MAX_CONFIG_FILE_BYTES: u64 = 1024 * 1024;

/// Read a configuration file with security hardening.
///
/// Security checks:
/// - File size guardrail (`MAX_CONFIG_FILE_BYTES`)
/// - Hardlink detection (rejects files with nlink > 1)
/// - Symlink rejection on the final component (O_NOFOLLOW semantics on Unix)
pub fn read_config_file_snapshot(path: &Path) -> Result<serde_json::Value> {
    let metadata = std::fs::symlink_metadata(path)
        .with_context(|| format!("Cannot stat config file '{}'", path.display()))?;

    #[cfg(unix)]
    if metadata.file_type().is_symlink() {
        bail!(
            "Config file '{}' is a symlink — refusing to follow for security",
            path.display()
        );
    }

    let canonical = path
        .canonicalize()
        .with_context(|| format!("Cannot canonicalize config path '{}'", path.display()))?;
    let real_metadata = std::fs::metadata(&canonical)
        .with_context(|| format!("Cannot stat canonical config path '{}'", canonical.display()))?;

    if real_metadata.len() > MAX_CONFIG_FILE_BYTES {
        bail!(
            "Config file '{}' is {} bytes, exceeds limit of {} bytes",
            path.display(),
            real_metadata.len(),
            MAX_CONFIG_FILE_BYTES,
        );
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        if real_metadata.is_file() && real_metadata.nlink() > 1 {
            bail!(
                "Config file '{}' has {} hard links — refusing to read \
                 (hardlinks can alias files outside workspace)",
                path.display(),
                real_metadata.nlink(),
            );
        }
    }

    let content = std::fs::read_to_string(&canonical)
        .with_context(|| format!("Failed to read config file '{}'", canonical.display()))?;

    let ext = canonical
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("json");

    match ext {
        "yaml" | "yml" => {
            let value: serde_json::Value = serde_yaml::from_str(&content)?;
            Ok(value)
        }
        "toml" => {
            let value: serde_json::Value = toml::from_str(&content)?;
            Ok(value)
        }
        _ => parse_config_json5(&content),
    }
}

/// Parse a JSON5 configuration string (plain JSON is a subset).
pub fn parse_config_json5(content: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value = json5::from_str(content)?;
    Ok(value)
}

/// Compute a hash of a configuration snapshot for change detection.
pub fn resolve_config_snapshot_hash(value: &serde_json::Value) -> String {
    use sha2::{Digest, Sha256};
    let canonical = serde_json::to_string(value).unwrap_or_default();
    let hash = Sha256::digest(canonical.as_bytes());
    hex::encode(hash)
}

// ============================================================================
// Tests
// ============================================================================
