//! Post storage: sharded JSON records on the local filesystem.
//!
//! ## Storage layout
//!
//! ```text
//! <POST_DATA_DIR>/posts/<s1>/<s2>/<id>/post.json   - the post record
//! <POST_DATA_DIR>/posts/<s1>/<s2>/<id>/meta.json   - its metadata map
//! ```
//!
//! where `<s1>`/`<s2>` are the first two hex-pairs of the canonical identifier (see
//! [`crate::post_id`]).
//!
//! ## Type-state service
//!
//! [`PostService`] uses a type-state marker to separate operations that need no identifier
//! (create, list) from operations bound to an existing post (read, update). A successful
//! [`PostService::create`] hands back the bound service, so the only way to obtain
//! `PostService<Initialised>` is through creation or an explicit identifier.

use crate::constants::{META_JSON_FILENAME, POST_JSON_FILENAME};
use crate::error::{PostError, PostResult};
use crate::post_id::PostId;
use crate::CoreConfig;
use chrono::{DateTime, Utc};
use postmeta_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Content type of a stored entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    Post,
    Attachment,
}

impl PostType {
    pub fn as_str(self) -> &'static str {
        match self {
            PostType::Post => "post",
            PostType::Attachment => "attachment",
        }
    }
}

/// Publication status of a post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    /// Parses a client-supplied status string.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::InvalidInput`] for anything other than `draft` or `published`.
    pub fn parse(input: &str) -> PostResult<Self> {
        match input {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(PostError::InvalidInput(format!(
                "unknown post status: '{other}' (expected 'draft' or 'published')"
            ))),
        }
    }
}

/// A stored post record, exactly as persisted in `post.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredPost {
    pub id: PostId,
    pub post_type: PostType,
    pub status: PostStatus,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub featured_media: Option<PostId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a post.
#[derive(Clone, Debug)]
pub struct NewPost {
    pub title: NonEmptyText,
    pub post_type: PostType,
    pub status: PostStatus,
    /// Explicit slug; `None` (or blank) derives one from the title.
    pub slug: Option<String>,
    pub content: String,
    pub excerpt: String,
    pub featured_media: Option<PostId>,
}

impl NewPost {
    /// An ordinary draft post with the given title and no other content.
    pub fn draft(title: NonEmptyText) -> Self {
        Self {
            title,
            post_type: PostType::Post,
            status: PostStatus::Draft,
            slug: None,
            content: String::new(),
            excerpt: String::new(),
            featured_media: None,
        }
    }
}

/// Partial update of a stored post; `None` fields are left unchanged.
#[derive(Clone, Debug, Default)]
pub struct PostUpdate {
    pub title: Option<NonEmptyText>,
    pub status: Option<PostStatus>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub featured_media: Option<PostId>,
}

/// Derives a URL slug from a post title.
///
/// Lowercases the title, turns spaces and slashes into hyphens, and drops every other
/// character outside `[a-z0-9-]`. A title that reduces to nothing yields an empty string;
/// the storage layer then falls back to the post identifier.
pub fn derive_slug(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '/' => '-',
            other => other,
        })
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | '-'))
        .collect()
}

/// Marker for a service without a post identifier.
#[derive(Clone, Copy, Debug)]
pub struct Uninitialised;

/// Marker for a service bound to a post identifier.
#[derive(Clone, Debug)]
pub struct Initialised {
    post_id: PostId,
}

/// File-backed post operations.
#[derive(Clone, Debug)]
pub struct PostService<State> {
    cfg: Arc<CoreConfig>,
    state: State,
}

impl PostService<Uninitialised> {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            state: Uninitialised,
        }
    }

    /// Creates a post and returns a service bound to the new identifier.
    ///
    /// Allocates a fresh sharded directory, then writes `post.json` and an empty
    /// `meta.json`. If either write fails the directory is rolled back, so a failed
    /// create leaves no trace on disk.
    ///
    /// # Errors
    ///
    /// Returns storage errors from directory allocation or file writes, and
    /// [`PostError::CleanupAfterCreateFailed`] when the rollback itself fails.
    pub fn create(self, new_post: NewPost) -> PostResult<PostService<Initialised>> {
        let (post_id, post_dir) = allocate_post_dir(&self.cfg.posts_dir())?;

        let now = Utc::now();
        let slug = match &new_post.slug {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_owned(),
            _ => {
                let derived = derive_slug(new_post.title.as_str());
                if derived.is_empty() {
                    post_id.to_string()
                } else {
                    derived
                }
            }
        };
        let record = StoredPost {
            id: post_id.clone(),
            post_type: new_post.post_type,
            status: new_post.status,
            title: new_post.title.into_string(),
            slug,
            content: new_post.content,
            excerpt: new_post.excerpt,
            featured_media: new_post.featured_media,
            created_at: now,
            updated_at: now,
        };

        if let Err(create_error) = write_initial_files(&post_dir, &record) {
            if let Err(cleanup_error) = fs::remove_dir_all(&post_dir) {
                return Err(PostError::CleanupAfterCreateFailed {
                    path: post_dir,
                    create_error: Box::new(create_error),
                    cleanup_error,
                });
            }
            return Err(create_error);
        }

        tracing::info!("Created {} {}", record.post_type.as_str(), post_id);
        Ok(PostService {
            cfg: self.cfg,
            state: Initialised { post_id },
        })
    }
}

impl PostService<Initialised> {
    /// Binds to an existing identifier string.
    ///
    /// Only validates canonical form; use [`PostService::read`] or
    /// [`PostService::exists`] to find out whether the post is actually stored.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::InvalidPostId`] when `post_id` is not canonical.
    pub fn with_id(cfg: Arc<CoreConfig>, post_id: &str) -> PostResult<Self> {
        let post_id = PostId::parse(post_id)?;
        Ok(Self::with_post_id(cfg, post_id))
    }

    /// Binds to an already-validated identifier.
    pub fn with_post_id(cfg: Arc<CoreConfig>, post_id: PostId) -> Self {
        Self {
            cfg,
            state: Initialised { post_id },
        }
    }

    pub fn post_id(&self) -> &PostId {
        &self.state.post_id
    }

    /// The post's sharded directory (which may not exist yet).
    pub fn post_dir(&self) -> PathBuf {
        self.state.post_id.sharded_dir(&self.cfg.posts_dir())
    }

    pub fn exists(&self) -> bool {
        self.post_dir().join(POST_JSON_FILENAME).is_file()
    }

    /// Reads the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::PostNotFound`] when no record exists for this identifier.
    pub fn read(&self) -> PostResult<StoredPost> {
        let path = self.post_dir().join(POST_JSON_FILENAME);
        if !path.is_file() {
            return Err(PostError::PostNotFound(self.state.post_id.to_string()));
        }
        let raw = fs::read_to_string(&path).map_err(PostError::FileRead)?;
        serde_json::from_str(&raw).map_err(PostError::Deserialization)
    }

    /// Applies a partial update and returns the updated record.
    ///
    /// Blank slugs in `changes` are ignored rather than stored; everything else in a
    /// `Some` field overwrites the stored value. `updated_at` is always refreshed.
    pub fn update(&self, changes: PostUpdate) -> PostResult<StoredPost> {
        let mut record = self.read()?;
        if let Some(title) = changes.title {
            record.title = title.into_string();
        }
        if let Some(status) = changes.status {
            record.status = status;
        }
        if let Some(slug) = changes.slug {
            let trimmed = slug.trim();
            if !trimmed.is_empty() {
                record.slug = trimmed.to_owned();
            }
        }
        if let Some(content) = changes.content {
            record.content = content;
        }
        if let Some(excerpt) = changes.excerpt {
            record.excerpt = excerpt;
        }
        if let Some(featured_media) = changes.featured_media {
            record.featured_media = Some(featured_media);
        }
        record.updated_at = Utc::now();
        write_record(&self.post_dir().join(POST_JSON_FILENAME), &record)?;
        Ok(record)
    }
}

impl<State> PostService<State> {
    /// Lists every stored post, oldest first.
    ///
    /// Walks the sharded layout and reads each `post.json`. Records that cannot be read
    /// or parsed are logged as warnings and skipped rather than failing the whole listing.
    pub fn list_posts(&self) -> Vec<StoredPost> {
        let posts_dir = self.cfg.posts_dir();
        let mut posts = Vec::new();
        if !posts_dir.is_dir() {
            return posts;
        }
        for s1 in subdirectories(&posts_dir) {
            for s2 in subdirectories(&s1) {
                for leaf in subdirectories(&s2) {
                    let path = leaf.join(POST_JSON_FILENAME);
                    if !path.is_file() {
                        continue;
                    }
                    match read_record(&path) {
                        Ok(post) => posts.push(post),
                        Err(e) => {
                            tracing::warn!(
                                "Skipping unreadable post record at {}: {e}",
                                path.display()
                            );
                        }
                    }
                }
            }
        }
        posts.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        posts
    }
}

/// Allocates a fresh sharded directory for a new post.
///
/// Retries with a new identifier on collision. More than a handful of collisions in a row
/// means the identifier source is broken, so the loop gives up instead of spinning.
fn allocate_post_dir(posts_dir: &Path) -> PostResult<(PostId, PathBuf)> {
    const MAX_ATTEMPTS: usize = 5;

    fs::create_dir_all(posts_dir).map_err(PostError::StorageDirCreation)?;
    for _ in 0..MAX_ATTEMPTS {
        let post_id = PostId::new();
        let dir = post_id.sharded_dir(posts_dir);
        if dir.exists() {
            continue;
        }
        match fs::create_dir_all(&dir) {
            Ok(()) => return Ok((post_id, dir)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(PostError::PostDirCreation(e)),
        }
    }
    Err(PostError::PostDirCreation(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        "could not allocate a unique post directory",
    )))
}

fn write_initial_files(post_dir: &Path, record: &StoredPost) -> PostResult<()> {
    write_record(&post_dir.join(POST_JSON_FILENAME), record)?;
    let empty: BTreeMap<String, String> = BTreeMap::new();
    let json = serde_json::to_string_pretty(&empty).map_err(PostError::Serialization)?;
    fs::write(post_dir.join(META_JSON_FILENAME), json).map_err(PostError::FileWrite)
}

fn write_record(path: &Path, record: &StoredPost) -> PostResult<()> {
    let json = serde_json::to_string_pretty(record).map_err(PostError::Serialization)?;
    fs::write(path, json).map_err(PostError::FileWrite)
}

fn read_record(path: &Path) -> PostResult<StoredPost> {
    let raw = fs::read_to_string(path).map_err(PostError::FileRead)?;
    serde_json::from_str(&raw).map_err(PostError::Deserialization)
}

/// Subdirectories of `dir`; unreadable entries are logged and skipped.
fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to read directory {}: {e}", dir.display());
            return Vec::new();
        }
    };
    entries
        .filter_map(|entry| match entry {
            Ok(entry) => {
                let path = entry.path();
                path.is_dir().then_some(path)
            }
            Err(e) => {
                tracing::warn!("Failed to read directory entry in {}: {e}", dir.display());
                None
            }
        })
        .collect()
}
