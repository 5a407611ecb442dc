use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, Request, State};
use axum::http::{header, Method, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::engine::{EngineError, SlotStore};
use crate::observability::HTTP_REQUESTS_TOTAL;

const NOT_FOUND: &str = "Not found";
const INTERNAL: &str = "Internal server error";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SlotStore>,
    pub public_dir: Arc<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match self {
            EngineError::InvalidRange(_) => StatusCode::BAD_REQUEST,
            EngineError::Conflict(_) => StatusCode::CONFLICT,
        };
        error_response(status, self.message())
    }
}

/// Query parameters of `POST /api/slots`.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitParams {
    #[serde(rename = "providerName")]
    pub provider_name: Option<String>,
    #[serde(rename = "startTime")]
    pub start_time: Option<String>,
    #[serde(rename = "endTime")]
    pub end_time: Option<String>,
}

pub fn router(store: Arc<SlotStore>, public_dir: PathBuf) -> Router {
    let state = AppState {
        store,
        public_dir: Arc::new(public_dir),
    };
    Router::new()
        .route(
            "/api/slots",
            get(list_slots).post(submit_slot).fallback(not_found),
        )
        .fallback(serve_static)
        .layer(middleware::from_fn(track_request))
        .with_state(state)
}

async fn track_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    debug!("incoming request: {} {}", method, req.uri());
    let response = next.run(req).await;
    metrics::counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    response
}

async fn list_slots(State(state): State<AppState>) -> Response {
    Json(state.store.list().await).into_response()
}

async fn submit_slot(
    State(state): State<AppState>,
    params: Result<Query<SubmitParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            debug!("unreadable query string: {rejection}");
            return error_response(StatusCode::BAD_REQUEST, "Query string is invalid");
        }
    };
    let owner = params.provider_name.as_deref().unwrap_or("");
    debug!(
        "submit: provider='{owner}' startTime={:?} endTime={:?}",
        params.start_time, params.end_time
    );

    match state
        .store
        .submit(owner, params.start_time.as_deref(), params.end_time.as_deref())
        .await
    {
        Ok(slot) => (StatusCode::CREATED, Json(slot)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, NOT_FOUND)
}

async fn serve_static(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET {
        return not_found().await;
    }
    let Some(path) = resolve_asset(&state.public_dir, uri.path()) else {
        debug!("refusing asset path {}", uri.path());
        return not_found().await;
    };

    match tokio::fs::read(&path).await {
        Ok(body) => ([(header::CONTENT_TYPE, content_type(&path))], body).into_response(),
        Err(e) if e.kind() == ErrorKind::NotFound => not_found().await,
        Err(e) => {
            error!("failed to read {}: {e}", path.display());
            error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL)
        }
    }
}

/// Map a request path onto a file below `public_dir`. `/` is `index.html`.
/// Returns `None` for anything that could escape the directory.
fn resolve_asset(public_dir: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = request_path.trim_start_matches('/');
    if relative.is_empty() {
        return Some(public_dir.join("index.html"));
    }
    let relative = Path::new(relative);
    if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(public_dir.join(relative))
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("js") => "text/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "text/html",
    }
}
