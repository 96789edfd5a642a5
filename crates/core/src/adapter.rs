//! The metadata field adapter: registered-field reads and writes.
//!
//! This is the bridge between client-facing payloads and protected metadata keys. The
//! registry names the fields; the adapter enforces their semantics:
//!
//! - reads never fail: unknown names, unset fields and storage errors all read as `""`,
//! - writes sanitise first and refuse to store empty values, so a blank or absent field
//!   in a payload can never clear a stored value,
//! - every write lands on the canonical protected key, whichever alias named the field.

use crate::constants::LONG_TEXT_LOG_PREVIEW_CHARS;
use crate::error::PostResult;
use crate::meta::MetaStore;
use crate::post_id::PostId;
use crate::registry::{FieldRegistry, FieldSpec};
use crate::sanitize::ValueKind;
use crate::CoreConfig;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Result of a single field write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The sanitised value was stored.
    Written,
    /// The input was empty, or sanitised to empty, and nothing was stored.
    SkippedEmpty,
}

/// Read/write access to registered metadata fields.
#[derive(Clone)]
pub struct MetaFieldAdapter {
    cfg: Arc<CoreConfig>,
    registry: Arc<FieldRegistry>,
}

impl MetaFieldAdapter {
    pub fn new(cfg: Arc<CoreConfig>, registry: Arc<FieldRegistry>) -> Self {
        Self { cfg, registry }
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Reads a field by canonical key or alias.
    ///
    /// Returns `""` for unknown names, unset fields and unreadable metadata: a field read
    /// may degrade, but it never fails the surrounding request.
    pub fn read(&self, post_id: &PostId, name: &str) -> String {
        let Some(field) = self.registry.resolve(name) else {
            return String::new();
        };
        let store = MetaStore::for_post(Arc::clone(&self.cfg), post_id.clone());
        match store.get(field.key()) {
            Ok(Some(value)) => value,
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!(
                    "Reading field '{}' for post {post_id} failed: {e}",
                    field.key()
                );
                String::new()
            }
        }
    }

    /// Sanitises and stores one field value.
    ///
    /// Blank input and values that sanitise to nothing are skipped rather than stored.
    ///
    /// # Errors
    ///
    /// Returns storage errors from the metadata store, including
    /// [`crate::PostError::PostNotFound`] when the post does not exist.
    pub fn write(
        &self,
        post_id: &PostId,
        field: &FieldSpec,
        raw: &str,
    ) -> PostResult<WriteOutcome> {
        if raw.trim().is_empty() {
            return Ok(WriteOutcome::SkippedEmpty);
        }
        let sanitized = field.kind().sanitize(raw);
        if sanitized.is_empty() {
            tracing::debug!(
                "Field '{}' for post {post_id} sanitised to empty; not stored",
                field.key()
            );
            return Ok(WriteOutcome::SkippedEmpty);
        }
        let store = MetaStore::for_post(Arc::clone(&self.cfg), post_id.clone());
        store.set(field.key(), &sanitized)?;
        tracing::debug!(
            "Stored field '{}' for post {post_id}: {}",
            field.key(),
            log_preview(field.kind(), &sanitized)
        );
        Ok(WriteOutcome::Written)
    }

    /// Applies every registered field found in `params`, ignoring all other names.
    ///
    /// Individual write failures are logged and skipped so one bad field cannot abort the
    /// rest of a payload. Returns the number of fields written.
    pub fn apply(&self, post_id: &PostId, params: &BTreeMap<String, String>) -> usize {
        let mut written = 0;
        for (name, raw) in params {
            let Some(field) = self.registry.resolve(name) else {
                continue;
            };
            match self.write(post_id, field, raw) {
                Ok(WriteOutcome::Written) => written += 1,
                Ok(WriteOutcome::SkippedEmpty) => {}
                Err(e) => {
                    tracing::warn!(
                        "Writing field '{}' for post {post_id} failed: {e}",
                        field.key()
                    );
                }
            }
        }
        written
    }
}

/// Long values are logged as a prefix only; short values are small enough to log whole.
fn log_preview(kind: ValueKind, value: &str) -> String {
    match kind {
        ValueKind::ShortText => value.to_owned(),
        ValueKind::LongText => value.chars().take(LONG_TEXT_LOG_PREVIEW_CHARS).collect(),
    }
}
