mod cli;
mod initializers;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::routing::post;
use axum::Router;
use bytes::Bytes;
use clap::Parser;
use quarry_host::{QueryError, QueryHost};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::cli::CLI;
use crate::initializers::{init_query_host, init_store, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let CLI { opts } = CLI::parse();
    init_tracing(&opts);

    let store = init_store(&opts)?;
    let host = init_query_host(&opts, store);

    let app = Router::new()
        .route("/wasmql/v1/query", post(handle_query))
        .fallback(handle_legacy)
        .layer(CorsLayer::permissive())
        .with_state(host);

    let addr = format!("{}:{}", opts.http_addr, opts.http_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, wasm_dir = %opts.wasm_dir.display(), "quarry listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn error_response(err: QueryError) -> (StatusCode, String) {
    let status = match err {
        QueryError::UnknownNamespace(_) | QueryError::Decode(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

async fn handle_query(
    State(host): State<Arc<QueryHost>>,
    body: Bytes,
) -> Result<Vec<u8>, (StatusCode, String)> {
    tokio::task::spawn_blocking(move || host.query(&body))
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .map_err(error_response)
}

/// Any other POST path is a legacy request; the path itself is the target.
async fn handle_legacy(
    State(host): State<Arc<QueryHost>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Result<Vec<u8>, (StatusCode, String)> {
    if method != Method::POST {
        return Err((StatusCode::METHOD_NOT_ALLOWED, "POST only".to_string()));
    }
    let target = uri.path().to_string();
    tokio::task::spawn_blocking(move || host.legacy_query(&target, &body))
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .map_err(error_response)
}
