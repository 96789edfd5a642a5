//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::constants::{DEFAULT_POST_DATA_DIR, POSTS_DIR_NAME};
use crate::{PostError, PostResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    post_data_dir: PathBuf,
    editor_api_key: Option<String>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `editor_api_key` is the shared secret that grants the edit capability over REST.
    /// `None` means no key is configured and every request is treated as anonymous.
    pub fn new(post_data_dir: PathBuf, editor_api_key: Option<String>) -> PostResult<Self> {
        if let Some(key) = &editor_api_key {
            if key.trim().is_empty() {
                return Err(PostError::InvalidInput(
                    "editor_api_key cannot be blank; omit it to disable editor access".into(),
                ));
            }
        }

        Ok(Self {
            post_data_dir,
            editor_api_key,
        })
    }

    pub fn post_data_dir(&self) -> &Path {
        &self.post_data_dir
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.post_data_dir.join(POSTS_DIR_NAME)
    }

    pub fn editor_api_key(&self) -> Option<&str> {
        self.editor_api_key.as_deref()
    }
}

/// Resolve the post data directory without reading environment variables.
///
/// Call sites pass the raw value of `POST_DATA_DIR` (or `None` when unset); empty and
/// whitespace-only values fall back to [`DEFAULT_POST_DATA_DIR`].
pub fn post_data_dir_from_env_value(value: Option<String>) -> PathBuf {
    match value {
        Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(DEFAULT_POST_DATA_DIR),
    }
}

/// Resolve the editor API key without reading environment variables.
///
/// Call sites pass the raw value of `POSTMETA_EDITOR_KEY` (or `None` when unset); empty and
/// whitespace-only values disable editor access entirely.
pub fn editor_api_key_from_env_value(value: Option<String>) -> Option<String> {
    match value {
        Some(key) if !key.trim().is_empty() => Some(key),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_missing_editor_key() {
        let cfg = CoreConfig::new(PathBuf::from("/tmp/posts"), None)
            .expect("config without editor key should succeed");
        assert!(cfg.editor_api_key().is_none());
    }

    #[test]
    fn test_new_rejects_blank_editor_key() {
        let result = CoreConfig::new(PathBuf::from("/tmp/posts"), Some("   ".into()));
        assert!(matches!(result, Err(PostError::InvalidInput(_))));
    }

    #[test]
    fn test_posts_dir_is_under_data_dir() {
        let cfg = CoreConfig::new(PathBuf::from("/data"), Some("secret".into()))
            .expect("config should succeed");
        assert_eq!(cfg.posts_dir(), PathBuf::from("/data/posts"));
    }

    #[test]
    fn test_post_data_dir_from_env_value_falls_back_to_default() {
        assert_eq!(
            post_data_dir_from_env_value(None),
            PathBuf::from(DEFAULT_POST_DATA_DIR)
        );
        assert_eq!(
            post_data_dir_from_env_value(Some("  ".into())),
            PathBuf::from(DEFAULT_POST_DATA_DIR)
        );
        assert_eq!(
            post_data_dir_from_env_value(Some("/srv/data".into())),
            PathBuf::from("/srv/data")
        );
    }

    #[test]
    fn test_editor_api_key_from_env_value_ignores_blank() {
        assert_eq!(editor_api_key_from_env_value(None), None);
        assert_eq!(editor_api_key_from_env_value(Some(String::new())), None);
        assert_eq!(
            editor_api_key_from_env_value(Some("k".into())),
            Some("k".into())
        );
    }
}
