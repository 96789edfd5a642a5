//! Post identifiers and sharded-path utilities.
//!
//! Posts are stored under sharded directories derived from a UUID.
//!
//! To keep path derivation deterministic and consistent across the codebase, identifiers use a
//! *canonical* UUID representation: **32 lowercase hexadecimal characters** (no hyphens).
//!
//! This module provides:
//! - A wrapper type ([`PostId`]) that *guarantees* the canonical format once constructed.
//! - Shared sharding logic to derive post directory locations from an identifier.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Notes:
//! - This is the same value you would get from `Uuid::new_v4().simple().to_string()`.
//! - Canonical form is *required* for externally supplied identifiers (for example, from CLI/API
//!   inputs). Use [`PostId::parse`] to validate an input string.
//! - Non-canonical values (uppercase, hyphenated, wrong length, non-hex) are rejected.
//!
//! ## Sharded directory layout
//! For a canonical identifier `u`, post data lives under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `post_data/posts/55/0e/550e8400e29b41d4a716446655440000/`
//!
//! This scheme prevents very large fan-out in a single directory.

use crate::error::{PostError, PostResult};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};

pub(crate) use ::uuid::Uuid;

/// Canonical post identifier (32 lowercase hex characters, no hyphens).
///
/// This wrapper type guarantees that once constructed, the contained UUID is in canonical
/// format. It provides type safety for identifier operations and ensures consistent path
/// derivation across the system.
///
/// # When to use this type
/// Use this wrapper whenever you are:
/// - Accepting an identifier string from *outside* the core (CLI input, API request, etc), or
/// - Deriving a sharded storage path for a post, or
/// - Generating new post identifiers.
///
/// # Construction
/// - [`PostId::new`] generates a new canonical identifier (for new posts).
/// - [`PostId::parse`] validates an externally supplied identifier.
///
/// # Errors
/// [`PostId::parse`] returns [`PostError::InvalidPostId`] if the input is not already canonical.
///
/// # Display format
/// When displayed or converted to string, `PostId` always produces the canonical
/// 32-character lowercase hex format without hyphens. The same form is used when a post
/// record is serialized to JSON.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PostId(Uuid);

impl PostId {
    /// Generates a new identifier in canonical form.
    ///
    /// Suitable for allocating a fresh identifier during post creation. The generated UUID
    /// follows RFC 4122 version 4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier string that must already be in canonical form.
    ///
    /// This does **not** normalise other common UUID forms (for example, hyphenated or
    /// uppercase). Callers must provide the canonical representation.
    ///
    /// # Arguments
    ///
    /// * `input` - Identifier string to validate and wrap. Must be exactly 32 lowercase hex
    ///   characters.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::InvalidPostId`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> PostResult<Self> {
        if Self::is_canonical(input) {
            // SAFETY: is_canonical guarantees valid hex, so parse_str will succeed
            let uuid = Uuid::parse_str(input).expect("is_canonical guarantees valid UUID");
            return Ok(Self(uuid));
        }
        Err(PostError::InvalidPostId(format!(
            "post id must be 32 lowercase hex characters without hyphens, got: '{}'",
            input
        )))
    }

    /// Returns true if `input` is in canonical identifier form.
    ///
    /// This is a purely syntactic check that validates:
    /// - Exactly 32 bytes long
    /// - Contains only lowercase hex characters (`0-9` and `a-f`)
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent_dir/<s1>/<s2>/<id>/` where `s1`/`s2` are derived from this identifier.
    ///
    /// Sharding scheme:
    /// - `s1` is the first two hex characters of the identifier
    /// - `s2` is the next two hex characters
    /// - The full identifier forms the leaf directory
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent_dir.join(s1).join(s2).join(&canonical)
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PostId {
    /// Formats the identifier in canonical form (32 lowercase hex characters, no hyphens).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for PostId {
    type Err = PostError;

    /// Parses a string into a `PostId`, requiring canonical form.
    ///
    /// This is equivalent to calling [`PostId::parse`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PostId::parse(s)
    }
}

impl serde::Serialize for PostId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.0.simple())
    }
}

impl<'de> serde::Deserialize<'de> for PostId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PostId::parse(&s).map_err(serde::de::Error::custom)
    }
}
