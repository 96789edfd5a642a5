//! # Postmeta Core
//!
//! Core business logic for the postmeta field service.
//!
//! This crate contains pure data operations and file/folder management:
//! - Post creation, update and listing with sharded JSON storage
//! - The per-post metadata map and its protected-key rule
//! - The immutable registry of exposed metadata fields and their sanitising accessors
//! - Capability checks deciding who may read which post
//!
//! **No API concerns**: authentication headers, HTTP servers and wire formats belong in
//! `api-rest` and `api-shared`.

pub mod adapter;
pub mod capability;
pub mod config;
pub mod constants;
pub mod error;
pub mod meta;
pub mod post_id;
pub mod registry;
pub mod sanitize;
pub mod store;

pub use adapter::{MetaFieldAdapter, WriteOutcome};
pub use capability::{can_read_post, Capability, Principal};
pub use config::CoreConfig;
pub use constants::DEFAULT_POST_DATA_DIR;
pub use error::{PostError, PostResult};
pub use meta::{MetaKey, MetaStore};
pub use post_id::PostId;
pub use registry::{FieldRegistry, FieldSpec};
pub use sanitize::{sanitize_long_text, sanitize_short_text, ValueKind};
pub use store::{
    derive_slug, Initialised, NewPost, PostService, PostStatus, PostType, PostUpdate, StoredPost,
    Uninitialised,
};

pub use postmeta_types::{NonEmptyText, TextError};
