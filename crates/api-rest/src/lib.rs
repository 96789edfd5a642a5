//! # API REST
//!
//! REST surface for the postmeta service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (body/query parsing, CORS, status mapping)
//!
//! ## Write pipeline
//!
//! Create and update requests run three metadata passes in a fixed order:
//! 1. the registered-field accessors over the body's `meta` mapping (sanitised
//!    writes under the canonical protected keys),
//! 2. the generic path for everything else, which writes public keys verbatim and
//!    skips unregistered protected (`_`-prefixed) keys,
//! 3. the post-write pass over body metadata overlaid with bracket-flattened
//!    `meta[...]` query parameters. It runs last, so when body and query disagree
//!    the query value is the stored one.
//!
//! Uses `api-shared` for wire types and `postmeta-core` for everything stateful.

#![warn(rust_2018_idioms)]

use axum::{
    body::Bytes,
    extract::{Path as AxumPath, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
    routing::{get, post, put},
    Router,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::auth::api_key_grants_edit;
use api_shared::{
    CreateAttachmentReq, CreatePostReq, FieldSchema, FieldsRes, HealthRes, HealthService,
    ListPostsRes, PostRepr, PostSummary, UpdatePostReq,
};
use postmeta_core::constants::PROTECTED_KEY_PREFIX;
use postmeta_core::{
    can_read_post, Capability, CoreConfig, FieldRegistry, MetaFieldAdapter, MetaStore, NewPost,
    NonEmptyText, PostError, PostId, PostService, PostStatus, PostType, PostUpdate, Principal,
    StoredPost,
};

pub mod params;

/// Application state shared across REST API handlers
///
/// Configuration and the field registry are resolved once at startup and injected here;
/// handlers never read the environment.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub registry: Arc<FieldRegistry>,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, registry: Arc<FieldRegistry>) -> Self {
        Self { cfg, registry }
    }

    fn adapter(&self) -> MetaFieldAdapter {
        MetaFieldAdapter::new(Arc::clone(&self.cfg), Arc::clone(&self.registry))
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_posts,
        create_post,
        read_post,
        update_post,
        create_attachment,
        read_attachment,
        list_fields,
    ),
    components(schemas(
        HealthRes,
        ListPostsRes,
        PostSummary,
        PostRepr,
        CreatePostReq,
        UpdatePostReq,
        CreateAttachmentReq,
        FieldSchema,
        FieldsRes,
    ))
)]
struct ApiDoc;

/// Builds the REST router with every endpoint, the Swagger UI and CORS.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/posts", get(list_posts))
        .route("/posts", post(create_post))
        .route("/posts/:post_id", get(read_post))
        .route("/posts/:post_id", put(update_post))
        .route("/attachments", post(create_attachment))
        .route("/attachments/:post_id", get(read_attachment))
        .route("/fields", get(list_fields))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolves the request's principal from the `x-api-key` header.
fn authenticate(state: &AppState, headers: &HeaderMap) -> Principal {
    let provided = headers.get("x-api-key").and_then(|value| value.to_str().ok());
    if api_key_grants_edit(provided, state.cfg.editor_api_key()) {
        Principal::editor()
    } else {
        Principal::anonymous()
    }
}

/// Authenticates and rejects principals without the edit capability.
fn require_edit(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Principal, (StatusCode, &'static str)> {
    let principal = authenticate(state, headers);
    if !principal.can(Capability::EditPosts) {
        return Err((StatusCode::FORBIDDEN, "Edit capability required"));
    }
    Ok(principal)
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}

/// Loads a stored post from a path parameter, mapping failures to responses.
fn fetch_post(state: &AppState, post_id: &str) -> Result<StoredPost, (StatusCode, &'static str)> {
    let service = match PostService::with_id(Arc::clone(&state.cfg), post_id) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Invalid post id: {:?}", e);
            return Err((StatusCode::BAD_REQUEST, "Invalid post id"));
        }
    };
    match service.read() {
        Ok(post) => Ok(post),
        Err(PostError::PostNotFound(_)) => Err((StatusCode::NOT_FOUND, "Post not found")),
        Err(e) => {
            tracing::error!("Read post error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}

/// Builds the full representation: record fields plus the `meta` object.
///
/// `meta` carries the post's public (non-protected) stored entries and every registered
/// field under its canonical key, `""` when never written.
fn post_repr(state: &AppState, post: &StoredPost) -> PostRepr {
    let store = MetaStore::for_post(Arc::clone(&state.cfg), post.id.clone());
    let mut meta: BTreeMap<String, String> = match store.all() {
        Ok(entries) => entries
            .into_iter()
            .filter(|(key, _)| !key.starts_with(PROTECTED_KEY_PREFIX))
            .collect(),
        Err(e) => {
            tracing::warn!("Reading metadata for post {} failed: {e}", post.id);
            BTreeMap::new()
        }
    };
    let adapter = state.adapter();
    for field in state.registry.fields() {
        let key = field.key().as_str();
        meta.insert(key.to_owned(), adapter.read(&post.id, key));
    }
    PostRepr {
        id: post.id.to_string(),
        post_type: post.post_type.as_str().to_owned(),
        status: post.status.as_str().to_owned(),
        title: post.title.clone(),
        slug: post.slug.clone(),
        content: post.content.clone(),
        excerpt: post.excerpt.clone(),
        featured_media: post.featured_media.as_ref().map(PostId::to_string),
        created_at: post.created_at.to_rfc3339(),
        updated_at: post.updated_at.to_rfc3339(),
        meta,
    }
}

fn summary(post: &StoredPost) -> PostSummary {
    PostSummary {
        id: post.id.to_string(),
        post_type: post.post_type.as_str().to_owned(),
        status: post.status.as_str().to_owned(),
        title: post.title.clone(),
        slug: post.slug.clone(),
        created_at: post.created_at.to_rfc3339(),
    }
}

/// Parses an optional status input; blank means "not provided".
fn parse_status(input: Option<&str>) -> Result<Option<PostStatus>, (StatusCode, &'static str)> {
    match input.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => match PostStatus::parse(value) {
            Ok(status) => Ok(Some(status)),
            Err(e) => {
                tracing::debug!("Rejected post status: {e}");
                Err((StatusCode::BAD_REQUEST, "Invalid post status"))
            }
        },
    }
}

/// Parses an optional featured-media identifier; blank means "not provided".
fn parse_featured_media(
    input: Option<&str>,
) -> Result<Option<PostId>, (StatusCode, &'static str)> {
    match input.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => match PostId::parse(value) {
            Ok(id) => Ok(Some(id)),
            Err(e) => {
                tracing::debug!("Rejected featured media id: {e}");
                Err((StatusCode::BAD_REQUEST, "Invalid featured media id"))
            }
        },
    }
}

/// Runs the three metadata passes of a write request (see the crate docs).
///
/// All passes are best-effort: failures are logged and never fail the request that
/// triggered them.
fn apply_meta_passes(
    state: &AppState,
    post_id: &PostId,
    body_meta: &BTreeMap<String, String>,
    query_meta: &BTreeMap<String, String>,
) {
    let adapter = state.adapter();
    adapter.apply(post_id, body_meta);

    let store = MetaStore::for_post(Arc::clone(&state.cfg), post_id.clone());
    if let Err(e) = store.apply_public(body_meta, &state.registry) {
        tracing::warn!("Generic metadata write for post {post_id} failed: {e}");
    }

    // runs last so a conflicting query value is the one that sticks
    let merged = params::merged_meta(body_meta, query_meta);
    adapter.apply(post_id, &merged);
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Returns the current health status of the postmeta service.
/// This endpoint is used for monitoring and load balancer health checks.
///
/// # Returns
/// * `Json<HealthRes>` - Health status response containing service status
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/posts",
    responses(
        (status = 200, description = "List of posts visible to the caller", body = ListPostsRes)
    )
)]
/// List stored posts
///
/// Returns summaries of every post the caller may read: published posts for everyone,
/// drafts and attachments only for callers holding the edit capability.
///
/// # Returns
/// * `Ok(Json<ListPostsRes>)` - Summaries, oldest first
#[axum::debug_handler]
async fn list_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListPostsRes>, (StatusCode, &'static str)> {
    let principal = authenticate(&state, &headers);
    let posts = PostService::new(Arc::clone(&state.cfg))
        .list_posts()
        .into_iter()
        .filter(|post| can_read_post(&principal, post))
        .map(|post| summary(&post))
        .collect();
    Ok(Json(ListPostsRes { posts }))
}

#[utoipa::path(
    post,
    path = "/posts",
    request_body = CreatePostReq,
    responses(
        (status = 200, description = "Post created", body = PostRepr),
        (status = 400, description = "Bad request"),
        (status = 403, description = "Edit capability required"),
        (status = 415, description = "Unsupported content type"),
        (status = 500, description = "Internal server error")
    )
)]
/// Create a new post
///
/// Accepts the JSON shape or its form-encoded equivalent (metadata flattened to
/// `meta[<field>]` keys). Metadata naming a registered field is sanitised and stored
/// under the field's canonical protected key; other public entries are stored verbatim;
/// unregistered protected keys are skipped. Bracket-flattened `meta[...]` pairs in the
/// query string are applied by the post-write pass and win over body values.
///
/// # Returns
/// * `Ok(Json<PostRepr>)` - The created post, metadata included
/// * `Err((StatusCode, &str))` - Rejection or storage failure
///
/// # Errors
/// Returns `400` for a missing/blank title or invalid status, `403` without the edit
/// capability, `415` for other content types and `500` when storage fails.
#[axum::debug_handler]
async fn create_post(
    State(state): State<AppState>,
    Query(query_pairs): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PostRepr>, (StatusCode, &'static str)> {
    require_edit(&state, &headers)?;
    let parsed = params::parse_write_body(content_type(&headers), &body)
        .map_err(params::BodyError::rejection)?;
    let params::WriteBody {
        title,
        content,
        excerpt,
        status,
        slug,
        featured_media,
        meta: body_meta,
    } = parsed;

    let Some(raw_title) = title else {
        return Err((StatusCode::BAD_REQUEST, "Title is required"));
    };
    let title = match NonEmptyText::new(&raw_title) {
        Ok(title) => title,
        Err(e) => {
            tracing::debug!("Rejected post title: {e}");
            return Err((StatusCode::BAD_REQUEST, "Title must not be empty"));
        }
    };
    let status = parse_status(status.as_deref())?.unwrap_or(PostStatus::Draft);
    let featured_media = parse_featured_media(featured_media.as_deref())?;

    let new_post = NewPost {
        title,
        post_type: PostType::Post,
        status,
        slug,
        content: content.unwrap_or_default(),
        excerpt: excerpt.unwrap_or_default(),
        featured_media,
    };
    let service = match PostService::new(Arc::clone(&state.cfg)).create(new_post) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Create post error: {:?}", e);
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"));
        }
    };

    let query_meta = params::meta_from_pairs(&query_pairs);
    apply_meta_passes(&state, service.post_id(), &body_meta, &query_meta);

    match service.read() {
        Ok(record) => Ok(Json(post_repr(&state, &record))),
        Err(e) => {
            tracing::error!("Read post after create error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}

#[utoipa::path(
    get,
    path = "/posts/{post_id}",
    responses(
        (status = 200, description = "Full post representation", body = PostRepr),
        (status = 400, description = "Invalid post id"),
        (status = 403, description = "Read not permitted"),
        (status = 404, description = "Post not found")
    )
)]
/// Read one post
///
/// The `meta` object carries the post's public metadata plus every registered field
/// under its canonical key (empty string when unset). Drafts are only visible to
/// callers holding the edit capability; attachments live under `/attachments`.
#[axum::debug_handler]
async fn read_post(
    State(state): State<AppState>,
    AxumPath(post_id): AxumPath<String>,
    headers: HeaderMap,
) -> Result<Json<PostRepr>, (StatusCode, &'static str)> {
    let principal = authenticate(&state, &headers);
    let post = fetch_post(&state, &post_id)?;
    if post.post_type != PostType::Post {
        return Err((StatusCode::NOT_FOUND, "Post not found"));
    }
    if !can_read_post(&principal, &post) {
        return Err((StatusCode::FORBIDDEN, "Read not permitted"));
    }
    Ok(Json(post_repr(&state, &post)))
}

#[utoipa::path(
    put,
    path = "/posts/{post_id}",
    request_body = UpdatePostReq,
    responses(
        (status = 200, description = "Post updated", body = PostRepr),
        (status = 400, description = "Bad request"),
        (status = 403, description = "Edit capability required"),
        (status = 404, description = "Post not found"),
        (status = 415, description = "Unsupported content type"),
        (status = 500, description = "Internal server error")
    )
)]
/// Update a post
///
/// Accepts the same two body shapes as create; absent fields stay untouched. Metadata
/// runs through the same three passes, so an empty or blank field value never clears a
/// stored one.
#[axum::debug_handler]
async fn update_post(
    State(state): State<AppState>,
    AxumPath(post_id): AxumPath<String>,
    Query(query_pairs): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PostRepr>, (StatusCode, &'static str)> {
    require_edit(&state, &headers)?;
    let existing = fetch_post(&state, &post_id)?;
    if existing.post_type != PostType::Post {
        return Err((StatusCode::NOT_FOUND, "Post not found"));
    }

    let parsed = params::parse_write_body(content_type(&headers), &body)
        .map_err(params::BodyError::rejection)?;
    let params::WriteBody {
        title,
        content,
        excerpt,
        status,
        slug,
        featured_media,
        meta: body_meta,
    } = parsed;

    let title = match title.as_deref() {
        None => None,
        Some(value) => match NonEmptyText::new(value) {
            Ok(title) => Some(title),
            // form clients submit every input; a blank title means "leave it alone"
            Err(_) => None,
        },
    };
    let changes = PostUpdate {
        title,
        status: parse_status(status.as_deref())?,
        slug,
        content,
        excerpt,
        featured_media: parse_featured_media(featured_media.as_deref())?,
    };

    let service = PostService::with_post_id(Arc::clone(&state.cfg), existing.id.clone());
    if let Err(e) = service.update(changes) {
        tracing::error!("Update post error: {:?}", e);
        return Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"));
    }

    let query_meta = params::meta_from_pairs(&query_pairs);
    apply_meta_passes(&state, service.post_id(), &body_meta, &query_meta);

    match service.read() {
        Ok(record) => Ok(Json(post_repr(&state, &record))),
        Err(e) => {
            tracing::error!("Read post after update error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}

#[utoipa::path(
    post,
    path = "/attachments",
    request_body = CreateAttachmentReq,
    responses(
        (status = 200, description = "Attachment created", body = PostRepr),
        (status = 400, description = "Bad request"),
        (status = 403, description = "Edit capability required"),
        (status = 500, description = "Internal server error")
    )
)]
/// Register an attachment entity
///
/// Attachments are stored like posts but follow the attachment read rule: even when
/// published they are only visible to callers holding the edit capability.
#[axum::debug_handler]
async fn create_attachment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateAttachmentReq>,
) -> Result<Json<PostRepr>, (StatusCode, &'static str)> {
    require_edit(&state, &headers)?;
    let title = match NonEmptyText::new(&req.title) {
        Ok(title) => title,
        Err(e) => {
            tracing::debug!("Rejected attachment title: {e}");
            return Err((StatusCode::BAD_REQUEST, "Title must not be empty"));
        }
    };
    let new_post = NewPost {
        title,
        post_type: PostType::Attachment,
        status: PostStatus::Published,
        slug: None,
        content: String::new(),
        excerpt: String::new(),
        featured_media: None,
    };
    let service = match PostService::new(Arc::clone(&state.cfg)).create(new_post) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Create attachment error: {:?}", e);
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"));
        }
    };
    match service.read() {
        Ok(record) => Ok(Json(post_repr(&state, &record))),
        Err(e) => {
            tracing::error!("Read attachment after create error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}

#[utoipa::path(
    get,
    path = "/attachments/{post_id}",
    responses(
        (status = 200, description = "Attachment representation", body = PostRepr),
        (status = 400, description = "Invalid post id"),
        (status = 403, description = "Read not permitted"),
        (status = 404, description = "Attachment not found")
    )
)]
/// Read one attachment
///
/// The base visibility rule never exposes attachments; callers holding the edit
/// capability are granted read access here.
#[axum::debug_handler]
async fn read_attachment(
    State(state): State<AppState>,
    AxumPath(post_id): AxumPath<String>,
    headers: HeaderMap,
) -> Result<Json<PostRepr>, (StatusCode, &'static str)> {
    let principal = authenticate(&state, &headers);
    let post = fetch_post(&state, &post_id).map_err(|(status, message)| {
        if status == StatusCode::NOT_FOUND {
            (status, "Attachment not found")
        } else {
            (status, message)
        }
    })?;
    if post.post_type != PostType::Attachment {
        return Err((StatusCode::NOT_FOUND, "Attachment not found"));
    }
    if !can_read_post(&principal, &post) {
        return Err((StatusCode::FORBIDDEN, "Read not permitted"));
    }
    Ok(Json(post_repr(&state, &post)))
}

#[utoipa::path(
    get,
    path = "/fields",
    responses(
        (status = 200, description = "Registered metadata fields", body = FieldsRes)
    )
)]
/// Describe the registered metadata fields
#[axum::debug_handler]
async fn list_fields(State(state): State<AppState>) -> Json<FieldsRes> {
    let fields = state
        .registry
        .fields()
        .iter()
        .map(|field| FieldSchema {
            key: field.key().as_str().to_owned(),
            kind: field.kind().as_str().to_owned(),
            description: field.description().to_owned(),
            aliases: field.aliases().iter().map(|alias| (*alias).to_owned()).collect(),
            capability: field.capability().as_str().to_owned(),
        })
        .collect();
    Json(FieldsRes { fields })
}
