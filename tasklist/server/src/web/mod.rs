use axum::Router;
use axum::http::{Method, header};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::task::api::v1::create_api_router;
use crate::task::{FileTaskStorage, TaskStore};

/// Builds the application router around a task store.
pub fn create_app(store: Arc<TaskStore>) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .merge(create_api_router(store))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer()),
        )
}

/// Opens the API to any origin. `OPTIONS` requests are answered here as
/// pre-flight checks and never reach the handlers.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = config.server_address();
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let storage = FileTaskStorage::new(&config.tasks_file);
    tracing::info!("Storing tasks in {}", storage.path().display());
    let store = Arc::new(TaskStore::new(storage));

    axum::serve(listener, create_app(store)).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}
