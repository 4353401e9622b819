mod api;
mod assets;
mod engine;
mod ingest;
mod openapi;
mod package;
mod records;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use assets::AssetStore;
use engine::compose::CardComposer;
use records::Processor;

#[derive(Clone)]
pub struct AppState {
    pub assets: Arc<AssetStore>,
    pub processor: Arc<Processor>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("BACKEND_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let debounce_ms: u64 = std::env::var("DEBOUNCE_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(100);

    // Font availability is a startup precondition, not a per-record error.
    let composer = CardComposer::new().expect("failed to load card font");

    let assets = Arc::new(AssetStore::new());
    let processor = Arc::new(Processor::new(
        Arc::clone(&assets),
        Arc::new(composer),
        Duration::from_millis(debounce_ms),
    ));
    let state = AppState { assets, processor };

    let openapi = openapi::ApiDoc::openapi();

    let app = Router::new()
        // Swagger UI + OpenAPI schema
        .merge(SwaggerUi::new("/docs").url("/openapi.json", openapi))
        .route("/health", get(api::health))
        .route("/template", post(api::upload_template))
        .route("/photos", post(api::upload_photos).get(api::list_photos))
        .route("/records", post(api::load_records).get(api::list_records))
        .route("/compose", post(api::compose_all))
        .route("/records/:index/compose", post(api::compose_one))
        .route("/records/:index/settings", patch(api::update_settings))
        .route("/records/:index/photo", patch(api::swap_photo))
        .route("/records/:index/approve", patch(api::set_approved))
        .route("/records/:index/image", get(api::record_image))
        .route("/bundle", get(api::download_bundle))
        .layer(DefaultBodyLimit::max(32 * 1024 * 1024))
        .with_state(state);

    let addr: SocketAddr = format!("{host}:{port}").parse().expect("bind addr");
    info!("Starting cardgen-backend on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await.expect("bind listener");
    axum::serve(listener, app).await.expect("server error");
}
