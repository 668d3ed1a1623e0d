use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    extract::State,
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderName, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use shared::{api::Object, SERVICE_WORKER_BINDINGS_URL, SERVICE_WORKER_URL};
use tower::ServiceBuilder;
use tower_http::{
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use crate::errors::AppError;

async fn ping() -> (StatusCode, Json<()>) {
    (StatusCode::OK, Json(()))
}

/// The generated worker bindings. They embed the worker's wasm, so a stale
/// copy would keep an old worker alive and they are never cached.
async fn bindings(State(path): State<Arc<PathBuf>>) -> Result<impl IntoResponse, AppError> {
    let js = match tokio::fs::read(path.as_ref()).await {
        Ok(js) => js,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("{SERVICE_WORKER_BINDINGS_URL} requested but {path:?} doesn't exist");
            return Err(AppError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "The worker bindings haven't been built. Build the server with the \
                 wasm32-unknown-unknown target installed.",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static("text/javascript")),
            (CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        ],
        js,
    ))
}

fn no_cache() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(CACHE_CONTROL, HeaderValue::from_static("no-cache"))
}

/// Routes for the app shell.
///
/// The loader and the worker bindings are always revalidated so a deployment
/// that bumps the cache name inside them is picked up by the browser's update
/// check. Everything else is plain static files.
pub fn router(assets_dir: &Path) -> Router {
    let bindings_path = assets_dir.join(SERVICE_WORKER_BINDINGS_URL.trim_start_matches('/'));

    Router::new()
        .route(Object::Ping.path(), get(ping))
        .route(SERVICE_WORKER_BINDINGS_URL, get(bindings))
        .route_service(
            SERVICE_WORKER_URL,
            ServiceBuilder::new()
                // Add the header to allow a worker served from a sub path to claim the root scope
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("service-worker-allowed"),
                    HeaderValue::from_static("/"),
                ))
                .layer(no_cache())
                .service(ServeFile::new(
                    assets_dir.join(SERVICE_WORKER_URL.trim_start_matches('/')),
                )),
        )
        .fallback_service(ServeDir::new(assets_dir))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(Arc::new(bindings_path))
}
