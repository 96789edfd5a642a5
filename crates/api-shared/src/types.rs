//! Wire types for the postmeta REST API.
//!
//! These are plain data carriers: serde for the wire, utoipa for the generated OpenAPI
//! document. All conversion from domain types happens in `api-rest`; nothing here knows
//! about storage.
//!
//! Identifiers and timestamps travel as strings (canonical 32-hex form and RFC 3339
//! respectively), matching what the storage layer persists.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Health check response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Full post representation returned by single-post endpoints.
///
/// `meta` holds the post's public metadata entries plus every registered field under its
/// canonical key; registered fields are always present, defaulting to `""` when unset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PostRepr {
    pub id: String,
    pub post_type: String,
    pub status: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_media: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[schema(value_type = Object)]
    pub meta: BTreeMap<String, String>,
}

/// Listing entry: enough for an index page, without content or metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PostSummary {
    pub id: String,
    pub post_type: String,
    pub status: String,
    pub title: String,
    pub slug: String,
    pub created_at: String,
}

/// Response for the post listing endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListPostsRes {
    pub posts: Vec<PostSummary>,
}

/// Create-post request (JSON shape).
///
/// The same fields are accepted form-encoded, with metadata entries flattened to
/// `meta[<field>]` parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreatePostReq {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    /// `draft` (default) or `published`.
    #[serde(default)]
    pub status: Option<String>,
    /// Explicit slug; omitted means one is derived from the title.
    #[serde(default)]
    pub slug: Option<String>,
    /// Identifier of an attachment post to use as featured media.
    #[serde(default)]
    pub featured_media: Option<String>,
    /// Metadata map. Non-string values are coerced to strings; `null` entries are ignored.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub meta: BTreeMap<String, serde_json::Value>,
}

/// Update-post request (JSON shape). Every field is optional; absent fields stay untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdatePostReq {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub featured_media: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub meta: BTreeMap<String, serde_json::Value>,
}

/// Create-attachment request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateAttachmentReq {
    pub title: String,
}

/// One registered metadata field, as served by the field schema endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldSchema {
    /// Canonical (protected) storage key.
    pub key: String,
    /// Value kind: `short_text` or `long_text`.
    pub kind: String,
    pub description: String,
    /// Request names accepted in addition to the canonical key.
    pub aliases: Vec<String>,
    /// Capability required to write the field.
    pub capability: String,
}

/// Response for the field schema endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldsRes {
    pub fields: Vec<FieldSchema>,
}
