use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, build_router};
use postmeta_core::{CoreConfig, FieldRegistry, config};

/// Main entry point for the postmeta application
///
/// Starts the REST server and serves the metadata field API over it. The server exposes
/// post storage, the registered SEO metadata fields and their discovery endpoint, with
/// OpenAPI documentation under /swagger-ui.
///
/// # Environment Variables
/// - `POSTMETA_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `POST_DATA_DIR`: Directory for post data storage (default: "post_data")
/// - `POSTMETA_EDITOR_KEY`: API key granting the edit capability
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("postmeta_run=info".parse()?)
                .add_directive("postmeta_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("POSTMETA_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting postmeta REST on {}", rest_addr);

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

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
