//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging when only the REST server is wanted. The
//! workspace's main `postmeta-run` binary is the deployable entry point and serves the
//! same router.

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, build_router};
use postmeta_core::{config, CoreConfig, FieldRegistry};

/// Main entry point for the postmeta REST API server
///
/// Starts the REST API server on the configured address (default: 0.0.0.0:3000).
/// Provides HTTP endpoints for post and metadata operations with OpenAPI/Swagger
/// documentation.
///
/// # Environment Variables
/// - `POSTMETA_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `POST_DATA_DIR`: Directory for post data storage
/// - `POSTMETA_EDITOR_KEY`: API key granting the edit capability
///
/// # Returns
/// * `Ok(())` - If server starts and runs successfully
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the post data directory cannot be created,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("postmeta_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("POSTMETA_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting postmeta REST API on {}", addr);

    let post_data_dir = config::post_data_dir_from_env_value(std::env::var("POST_DATA_DIR").ok());
    std::fs::create_dir_all(&post_data_dir)
        .with_context(|| format!("creating post data directory {}", post_data_dir.display()))?;

    let editor_api_key =
        config::editor_api_key_from_env_value(std::env::var("POSTMETA_EDITOR_KEY").ok());
    if editor_api_key.is_none() {
        tracing::warn!("POSTMETA_EDITOR_KEY is not set; write endpoints will reject every request");
    }

    let cfg = Arc::new(CoreConfig::new(post_data_dir, editor_api_key)?);
    let registry = Arc::new(FieldRegistry::seo_fields());
    tracing::info!("Registered {} metadata fields", registry.fields().len());

    let app = build_router(AppState::new(cfg, registry));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
