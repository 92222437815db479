//! HTTP surface (axum).
//!
//! | Route | Operation | 200 body |
//! |-------|-----------|----------|
//! | `GET /` | health | `{status, message}` |
//! | `GET /content/{page_id}` | read | `{page_id, content}` |
//! | `POST /process/{page_id}` | process | `{page_id, result}` |
//! | `POST /combine-diagrams` | combine | `{title, combined_diagram}` |
//!
//! Any result rendering as `Error …` becomes `400 {"detail": …}`. Warnings
//! such as an empty page are ordinary 200 responses.
//!
//! CORS is open to every origin, method and header, with credentials
//! allowed; the request's origin is echoed back.

use crate::merge::CombineRequest;
use crate::service::{is_error_message, render, ResearchBuddy};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

type AppState = Arc<ResearchBuddy>;

/// Build the router over `buddy`.
pub fn router(buddy: Arc<ResearchBuddy>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/content/{page_id}", get(get_content))
        .route("/process/{page_id}", post(process_page))
        .route("/combine-diagrams", post(combine_diagrams))
        .layer(CorsLayer::very_permissive())
        .with_state(buddy)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(buddy: Arc<ResearchBuddy>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(
        "Starting HTTP API server on http://{}",
        listener.local_addr()?
    );
    axum::serve(listener, router(buddy)).await
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Notion Research Buddy API is running!"
    }))
}

async fn get_content(State(buddy): State<AppState>, Path(page_id): Path<String>) -> Response {
    let rendered = render(buddy.read(&page_id).await);
    respond(rendered, |content| json!({ "page_id": page_id, "content": content }))
}

async fn process_page(State(buddy): State<AppState>, Path(page_id): Path<String>) -> Response {
    let rendered = render(buddy.process(&page_id).await);
    respond(rendered, |result| json!({ "page_id": page_id, "result": result }))
}

async fn combine_diagrams(
    State(buddy): State<AppState>,
    Json(request): Json<CombineRequest>,
) -> Response {
    let rendered = render(buddy.combine(&request.diagrams, &request.title).await);
    respond(rendered, |combined| {
        json!({ "title": request.title, "combined_diagram": combined })
    })
}

/// 400 with `{"detail"}` for `Error …`, otherwise 200 with `body(rendered)`.
fn respond(rendered: String, body: impl FnOnce(String) -> Value) -> Response {
    if is_error_message(&rendered) {
        (StatusCode::BAD_REQUEST, Json(json!({ "detail": rendered }))).into_response()
    } else {
        (StatusCode::OK, Json(body(rendered))).into_response()
    }
}
