//! services/gateway/src/bin/gateway.rs

use gateway_lib::{
    adapters::{load_taxonomy, HttpGalleryApi},
    config::Config,
    error::ApiError,
    web::{
        rest::{write_openapi, ApiDoc},
        router,
        state::AppState,
    },
};
use gallery_core::{normalize::UrlScheme, ports::GalleryApi, recommend::RecommendConfig};
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // `gateway --openapi [path]` dumps the REST spec and exits.
    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("--openapi") {
        let path = PathBuf::from(args.next().unwrap_or_else(|| "openapi.json".to_string()));
        write_openapi(&path)?;
        println!("OpenAPI specification generated at {}", path.display());
        return Ok(());
    }

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting gateway...");

    // --- 2. Load the Static Taxonomy ---
    let taxonomy = Arc::new(load_taxonomy(&config.taxonomy_path));

    // --- 3. Initialize the Upstream Adapter ---
    info!(base_url = %config.upstream_base_url, "Using upstream content API");
    let api: Arc<dyn GalleryApi> = Arc::new(HttpGalleryApi::new(
        &config.upstream_base_url,
        config.upstream_timeout,
        &config.user_agent,
    )?);

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(
        api,
        taxonomy,
        UrlScheme::with_domain(config.image_domain.clone()),
        RecommendConfig::default(),
    ));

    // --- 5. Create the Web Router ---
    let mut app = Router::new()
        .merge(router(app_state))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );

    if let Some(origin) = &config.cors_origin {
        let origin = origin
            .parse::<HeaderValue>()
            .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", origin, e)))?;
        let cors = CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE]);
        app = app.layer(cors);
    }

    // --- 6. Start the Server ---
    info!("Starting gateway on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
