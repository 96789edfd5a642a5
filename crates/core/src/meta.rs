//! Key-value metadata storage for posts.
//!
//! Every post owns a flat string-to-string metadata map, persisted as `meta.json` inside the
//! post's sharded directory. Keys starting with an underscore are *protected*: the generic
//! write path ([`MetaStore::apply_public`]) skips them, so they can only change through the
//! registered field accessors in [`crate::adapter`].

use crate::constants::{MAX_META_KEY_LEN, META_JSON_FILENAME, PROTECTED_KEY_PREFIX};
use crate::error::{PostError, PostResult};
use crate::post_id::PostId;
use crate::registry::FieldRegistry;
use crate::CoreConfig;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// A validated metadata key.
///
/// Keys are 1 to 255 bytes of lowercase ASCII letters, digits and underscores. A leading
/// underscore marks the key as protected.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetaKey(String);

impl MetaKey {
    /// Validates and wraps a metadata key.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::InvalidMetaKey`] when `input` is empty, too long, or holds
    /// characters outside `[a-z0-9_]`.
    pub fn parse(input: &str) -> PostResult<Self> {
        if Self::is_valid(input) {
            return Ok(Self(input.to_owned()));
        }
        Err(PostError::InvalidMetaKey(format!(
            "metadata keys are 1-{MAX_META_KEY_LEN} characters of [a-z0-9_], got: '{input}'"
        )))
    }

    /// Purely syntactic validity check, usable before [`MetaKey::parse`].
    pub fn is_valid(input: &str) -> bool {
        !input.is_empty()
            && input.len() <= MAX_META_KEY_LEN
            && input
                .bytes()
                .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_'))
    }

    /// Wraps a registry-declared key. Validity is the registry author's responsibility.
    pub(crate) fn registered(key: &'static str) -> Self {
        debug_assert!(Self::is_valid(key), "registered key must be valid: {key}");
        Self(key.to_owned())
    }

    /// True when this key is hidden from the generic write path.
    pub fn is_protected(&self) -> bool {
        self.0.starts_with(PROTECTED_KEY_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// File-backed metadata map of a single post.
#[derive(Clone)]
pub struct MetaStore {
    cfg: Arc<CoreConfig>,
    post_id: PostId,
}

impl MetaStore {
    pub fn for_post(cfg: Arc<CoreConfig>, post_id: PostId) -> Self {
        Self { cfg, post_id }
    }

    /// Reads a single value. `Ok(None)` when the key has never been written.
    pub fn get(&self, key: &MetaKey) -> PostResult<Option<String>> {
        Ok(self.load()?.remove(key.as_str()))
    }

    /// Writes a single value.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::PostNotFound`] when the post directory does not exist; metadata
    /// never outlives (or predates) its post.
    pub fn set(&self, key: &MetaKey, value: &str) -> PostResult<()> {
        if !self.post_dir().is_dir() {
            return Err(PostError::PostNotFound(self.post_id.to_string()));
        }
        let mut entries = self.load()?;
        entries.insert(key.as_str().to_owned(), value.to_owned());
        self.save(&entries)
    }

    /// Returns the full metadata map, protected keys included.
    pub fn all(&self) -> PostResult<BTreeMap<String, String>> {
        self.load()
    }

    /// Applies a client-supplied metadata map through the generic write path.
    ///
    /// Three groups of names never reach storage here:
    /// - registered field names (canonical keys and aliases) belong to the field
    ///   accessors and are skipped silently,
    /// - names failing [`MetaKey::parse`] are skipped with a debug log line,
    /// - protected keys are skipped with a debug log line.
    ///
    /// Values are stored verbatim. Returns the number of entries written.
    pub fn apply_public(
        &self,
        entries: &BTreeMap<String, String>,
        registry: &FieldRegistry,
    ) -> PostResult<usize> {
        let mut written = 0;
        for (name, value) in entries {
            if registry.resolve(name).is_some() {
                continue;
            }
            let key = match MetaKey::parse(name) {
                Ok(key) => key,
                Err(e) => {
                    tracing::debug!("Skipping metadata entry: {e}");
                    continue;
                }
            };
            if key.is_protected() {
                tracing::debug!("Skipping protected metadata key '{key}'");
                continue;
            }
            self.set(&key, value)?;
            written += 1;
        }
        Ok(written)
    }

    fn post_dir(&self) -> PathBuf {
        self.post_id.sharded_dir(&self.cfg.posts_dir())
    }

    fn meta_path(&self) -> PathBuf {
        self.post_dir().join(META_JSON_FILENAME)
    }

    fn load(&self) -> PostResult<BTreeMap<String, String>> {
        let path = self.meta_path();
        if !path.is_file() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&path).map_err(PostError::FileRead)?;
        serde_json::from_str(&raw).map_err(PostError::Deserialization)
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> PostResult<()> {
        let json = serde_json::to_string_pretty(entries).map_err(PostError::Serialization)?;
        fs::write(self.meta_path(), json).map_err(PostError::FileWrite)
    }
}
