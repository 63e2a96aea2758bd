//! File cache for object profiles, the schema hash, and generated tools.
//!
//! Layout, relative to the cache directory:
//!
//! ```text
//! <dir>/<object>_schema.json        one ObjectProfile per object (':' → '_')
//! <dir>/schema_hash.txt             SHA-256 of the last seen schema index
//! <dir>/../tools/discovered_tools.json
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use wn_protocol::{ObjectProfile, OperationDescriptor, object_slug};

use crate::error::{McpError, McpResult};

/// Profiles younger than this are served from disk.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

const HASH_FILE: &str = "schema_hash.txt";
const SCHEMA_SUFFIX: &str = "_schema.json";
const TOOLS_FILE: &str = "discovered_tools.json";

/// Contents of `discovered_tools.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolsFile {
    pub timestamp: DateTime<Utc>,
    pub total: usize,
    pub tools: Vec<OperationDescriptor>,
}

/// Directory-backed schema cache.
#[derive(Debug, Clone)]
pub struct SchemaCache {
    dir: PathBuf,
    tools_dir: PathBuf,
    ttl: Duration,
}

impl SchemaCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let tools_dir = dir
            .parent()
            .map(|p| p.join("tools"))
            .unwrap_or_else(|| dir.join("tools"));
        Self {
            dir,
            tools_dir,
            ttl: DEFAULT_TTL,
        }
    }

    /// `WN_CACHE_DIR`, else `~/.infoblox_mcp/cache`.
    pub fn default_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("WN_CACHE_DIR") {
            if !dir.is_empty() {
                return PathBuf::from(dir);
            }
        }
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        home.join(".infoblox_mcp").join("cache")
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn schema_path(&self, object: &str) -> PathBuf {
        self.dir.join(format!("{}{SCHEMA_SUFFIX}", object_slug(object)))
    }

    fn ensure_dir(path: &Path) -> McpResult<()> {
        std::fs::create_dir_all(path).map_err(|e| McpError::io(path, e))
    }

    // ── Profiles ────────────────────────────────────────────────

    /// Cached profile for `object`, if present and younger than the TTL.
    pub fn load(&self, object: &str) -> Option<ObjectProfile> {
        let path = self.schema_path(object);
        let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age >= self.ttl {
            return None;
        }
        read_json(&path)
    }

    pub fn store(&self, profile: &ObjectProfile) -> McpResult<()> {
        Self::ensure_dir(&self.dir)?;
        let path = self.schema_path(&profile.object_name);
        let json = serde_json::to_string_pretty(profile)?;
        std::fs::write(&path, json).map_err(|e| McpError::io(&path, e))
    }

    /// Every cached profile regardless of age, sorted by object name.
    pub fn load_all(&self) -> Vec<ObjectProfile> {
        let mut profiles: Vec<ObjectProfile> = self
            .schema_files()
            .iter()
            .filter_map(|path| read_json(path))
            .collect();
        profiles.sort_by(|a, b| a.object_name.cmp(&b.object_name));
        profiles
    }

    pub fn schema_count(&self) -> usize {
        self.schema_files().len()
    }

    fn schema_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(SCHEMA_SUFFIX))
            })
            .collect()
    }

    /// Remove cached profiles and the stored hash. Returns the number of
    /// profile files removed.
    pub fn clear(&self) -> McpResult<usize> {
        let files = self.schema_files();
        for path in &files {
            std::fs::remove_file(path).map_err(|e| McpError::io(path, e))?;
        }
        let hash = self.dir.join(HASH_FILE);
        if hash.exists() {
            std::fs::remove_file(&hash).map_err(|e| McpError::io(&hash, e))?;
        }
        tracing::info!(removed = files.len(), dir = %self.dir.display(), "schema cache cleared");
        Ok(files.len())
    }

    // ── Schema hash ─────────────────────────────────────────────

    pub fn stored_hash(&self) -> Option<String> {
        std::fs::read_to_string(self.dir.join(HASH_FILE))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn store_hash(&self, hash: &str) -> McpResult<()> {
        Self::ensure_dir(&self.dir)?;
        let path = self.dir.join(HASH_FILE);
        std::fs::write(&path, hash).map_err(|e| McpError::io(&path, e))
    }

    // ── Generated tools ─────────────────────────────────────────

    pub fn save_tools(&self, tools: &[OperationDescriptor]) -> McpResult<()> {
        Self::ensure_dir(&self.tools_dir)?;
        let path = self.tools_dir.join(TOOLS_FILE);
        let file = ToolsFile {
            timestamp: Utc::now(),
            total: tools.len(),
            tools: tools.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(&path, json).map_err(|e| McpError::io(&path, e))
    }

    pub fn load_tools(&self) -> Option<Vec<OperationDescriptor>> {
        let file: ToolsFile = read_json(&self.tools_dir.join(TOOLS_FILE))?;
        Some(file.tools)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let text = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable cache file");
            None
        }
    }
}

/// SHA-256 (hex) of a JSON document in canonical form (sorted keys).
pub fn schema_hash(document: &serde_json::Value) -> String {
    // serde_json::Value objects are BTreeMaps, so serialization is key-sorted.
    let canonical = document.to_string();
    let digest = Sha256::digest(canonical.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wn_protocol::{CrudSupport, FieldInfo};

    fn profile(name: &str) -> ObjectProfile {
        ObjectProfile {
            object_name: name.into(),
            fields: vec![FieldInfo {
                name: "name".into(),
                field_type: "string".into(),
                is_array: false,
                searchable: true,
                required: true,
                readonly: false,
                comment: String::new(),
            }],
            searchable_fields: vec!["name".into()],
            required_fields: vec!["name".into()],
            functions: vec![],
            restrictions: vec!["create".into(), "read".into()],
            supports_crud: CrudSupport {
                create: true,
                read: true,
                update: false,
                delete: false,
            },
        }
    }

    fn cache_in(tmp: &tempfile::TempDir) -> SchemaCache {
        SchemaCache::new(tmp.path().join("cache"))
    }

    #[test]
    fn store_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = cache_in(&tmp);
        cache.store(&profile("record:host")).unwrap();

        assert!(tmp.path().join("cache/record_host_schema.json").exists());
        assert_eq!(cache.load("record:host"), Some(profile("record:host")));
        assert_eq!(cache.schema_count(), 1);
    }

    #[test]
    fn expired_profile_is_not_served() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = cache_in(&tmp).with_ttl(Duration::ZERO);
        cache.store(&profile("network")).unwrap();
        assert!(cache.load("network").is_none());
        // Still visible to the fallback path.
        assert_eq!(cache.load_all().len(), 1);
    }

    #[test]
    fn missing_dir_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = cache_in(&tmp);
        assert!(cache.load("network").is_none());
        assert_eq!(cache.schema_count(), 0);
        assert!(cache.stored_hash().is_none());
        assert!(cache.load_tools().is_none());
    }

    #[test]
    fn corrupt_file_is_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = cache_in(&tmp);
        std::fs::create_dir_all(cache.dir()).unwrap();
        std::fs::write(cache.dir().join("network_schema.json"), "{not json").unwrap();
        assert!(cache.load("network").is_none());
        assert!(cache.load_all().is_empty());
    }

    #[test]
    fn clear_removes_profiles_and_hash() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = cache_in(&tmp);
        cache.store(&profile("network")).unwrap();
        cache.store(&profile("record:a")).unwrap();
        cache.store_hash("abc").unwrap();

        assert_eq!(cache.clear().unwrap(), 2);
        assert_eq!(cache.schema_count(), 0);
        assert!(cache.stored_hash().is_none());
    }

    #[test]
    fn tools_file_lives_next_to_cache_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = cache_in(&tmp);
        let tools = crate::ToolRegistry::with_defaults().list().to_vec();
        cache.save_tools(&tools).unwrap();

        let path = tmp.path().join("tools/discovered_tools.json");
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(raw["total"], tools.len());
        assert_eq!(cache.load_tools().unwrap(), tools);
    }

    #[test]
    fn hash_ignores_key_order() {
        let a = json!({"supported_objects": ["network"], "requested_version": "2.13"});
        let b: serde_json::Value =
            serde_json::from_str(r#"{"requested_version":"2.13","supported_objects":["network"]}"#)
                .unwrap();
        assert_eq!(schema_hash(&a), schema_hash(&b));
        assert_eq!(schema_hash(&a).len(), 64);
        assert_ne!(schema_hash(&a), schema_hash(&json!({})));
    }
}
