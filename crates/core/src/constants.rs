//! Constants used throughout the postmeta core crate.
//!
//! This module contains all path and filename constants to ensure
//! consistency across the codebase and make maintenance easier.

/// Default directory for post data storage when no explicit directory is configured.
pub const DEFAULT_POST_DATA_DIR: &str = "post_data";

/// Directory name for post records storage.
pub const POSTS_DIR_NAME: &str = "posts";

/// Filename for post JSON files.
pub const POST_JSON_FILENAME: &str = "post.json";

/// Filename for post metadata JSON files.
pub const META_JSON_FILENAME: &str = "meta.json";

/// Prefix that marks a metadata key as protected.
///
/// Protected keys are invisible to the generic metadata write path; only a
/// registered field accessor may touch them.
pub const PROTECTED_KEY_PREFIX: char = '_';

/// Maximum accepted length for a metadata key, in bytes.
pub const MAX_META_KEY_LEN: usize = 255;

/// Number of characters of a long-text value included in debug logs.
pub const LONG_TEXT_LOG_PREVIEW_CHARS: usize = 50;
