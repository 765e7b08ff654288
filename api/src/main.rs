// ./api/src/main.rs
use axum::{
    Json,
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json as JsonResponse, Response},
    routing::{get, post},
};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use application::{ApplicationError, DocumentService, SearchRequest, StatsService};
use domain::{DocumentDraft, DocumentId};
use infrastructure::InMemoryDocumentRepository;

/// Shared handler state.
#[derive(Clone)]
struct AppState {
    document_service: Arc<DocumentService>,
    stats_service: Arc<StatsService>,
}

const DEFAULT_PORT: u16 = 3000;

// Application entry point
#[tokio::main]
async fn main() {
    // --- Logger Initialization ---
    let filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
    info!("Logger initialized successfully.");

    let port = parse_port(env::var("PORT").ok().as_deref());

    // --- Dependency Injection ---
    let app = build_router(build_state());
    info!("API routes configured.");

    // --- Server Startup ---
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server starting on {}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Resolves the listening port from the raw `PORT` value, falling back to the default.
fn parse_port(raw: Option<&str>) -> u16 {
    match raw {
        Some(port_str) => match u16::from_str(port_str) {
            Ok(port_num) => {
                info!("Using port {} from environment variable PORT.", port_num);
                port_num
            }
            Err(_) => {
                warn!(
                    "Invalid PORT value '{}' in environment variable. Using default port {}.",
                    port_str, DEFAULT_PORT
                );
                DEFAULT_PORT
            }
        },
        None => {
            info!(
                "PORT environment variable not set. Using default port {}.",
                DEFAULT_PORT
            );
            DEFAULT_PORT
        }
    }
}

fn build_state() -> AppState {
    // 1. Create the store
    let document_repository = Arc::new(InMemoryDocumentRepository::new());
    info!("In-memory document store initialized.");

    // 2. Create application services, injecting the store
    let document_service = Arc::new(DocumentService::new(document_repository.clone()));
    let stats_service = Arc::new(StatsService::new(document_repository));
    info!("Application services initialized.");

    AppState {
        document_service,
        stats_service,
    }
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(get_stats_handler))
        .route("/documents", post(save_document_handler))
        .route("/documents/search", post(search_documents_handler))
        .route("/documents/:doc_id", get(get_document_handler))
        .with_state(state)
}

// --- API Handlers ---

async fn health_check() -> impl IntoResponse {
    info!("Health check endpoint called");
    (StatusCode::OK, "OK")
}

/// Handler for upserting a document (POST /documents).
async fn save_document_handler(
    State(state): State<AppState>,
    Json(payload): Json<DocumentDraft>,
) -> Response {
    info!(requested_id = ?payload.id, "Received request to save document");
    match state.document_service.save(payload).await {
        Ok(document) => {
            info!(doc_id = %document.id(), "Document saved successfully via handler");
            (StatusCode::OK, JsonResponse(document)).into_response()
        }
        Err(e) => {
            error!("Failed to save document via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Handler for fetching a document (GET /documents/:doc_id).
async fn get_document_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Response {
    info!(doc_id = %doc_id, "Received request to get document");
    match state
        .document_service
        .get_document(&DocumentId::new(doc_id))
        .await
    {
        Ok(document) => (StatusCode::OK, JsonResponse(document)).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// Handler for searching documents (POST /documents/search). A `null` body matches everything.
async fn search_documents_handler(
    State(state): State<AppState>,
    Json(request): Json<Option<SearchRequest>>,
) -> Response {
    info!(has_request = request.is_some(), "Received search request via POST");
    match state.document_service.search_documents(request).await {
        Ok(response) => {
            info!("Search completed successfully via handler, {} total hits", response.nb_hits);
            (StatusCode::OK, JsonResponse(response)).into_response()
        }
        Err(e) => {
            error!("Failed to search documents via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

async fn get_stats_handler(State(state): State<AppState>) -> Response {
    info!("Received request to get statistics");
    match state.stats_service.get_stats().await {
        Ok(stats_response) => (StatusCode::OK, JsonResponse(stats_response)).into_response(),
        Err(e) => {
            error!("Failed to get statistics via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Maps ApplicationError to an HTTP status code and response body.
fn map_application_error_to_response(err: ApplicationError) -> Response {
    let (status, body) = match err {
        ApplicationError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            format!("Document '{}' not found", id),
        ),
        ApplicationError::InfrastructureError(msg) => {
            error!("Underlying infrastructure error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred".to_string(),
            )
        }
    };
    (status, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use serde_json::{Value, json};
    use tower::ServiceExt; // for `oneshot`

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn first_document() -> Value {
        json!({
            "title": "First Document",
            "content": "This is a test document.",
            "author": { "id": "1", "name": "John Doe" }
        })
    }

    #[test]
    fn port_falls_back_to_default() {
        assert_eq!(parse_port(None), DEFAULT_PORT);
        assert_eq!(parse_port(Some("not-a-port")), DEFAULT_PORT);
        assert_eq!(parse_port(Some("70000")), DEFAULT_PORT);
        assert_eq!(parse_port(Some("8080")), 8080);
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = build_router(build_state());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn save_then_get_by_id() {
        let app = build_router(build_state());

        let (status, saved) = send(&app, json_request("POST", "/documents", first_document())).await;
        assert_eq!(status, StatusCode::OK);
        let id = saved["id"].as_str().expect("saved document has an id").to_string();
        assert!(saved["created"].is_string());

        let (status, fetched) = send(
            &app,
            Request::get(format!("/documents/{id}")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, saved);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let app = build_router(build_state());
        let response = app
            .oneshot(Request::get("/documents/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn search_filters_and_null_matches_all() {
        let app = build_router(build_state());
        send(&app, json_request("POST", "/documents", first_document())).await;
        send(
            &app,
            json_request(
                "POST",
                "/documents",
                json!({
                    "title": "Second Document",
                    "content": "Another one.",
                    "author": { "id": "2", "name": "Jane Roe" }
                }),
            ),
        )
        .await;

        let (status, all) = send(&app, json_request("POST", "/documents/search", Value::Null)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all["nb_hits"], 2);

        let (status, filtered) = send(
            &app,
            json_request(
                "POST",
                "/documents/search",
                json!({ "title_prefixes": ["First"] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(filtered["nb_hits"], 1);
        assert_eq!(filtered["hits"][0]["title"], "First Document");
    }

    #[tokio::test]
    async fn stats_count_documents() {
        let app = build_router(build_state());
        send(&app, json_request("POST", "/documents", first_document())).await;

        let (status, stats) = send(&app, Request::get("/stats").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["engine"]["total_documents"], 1);
    }
}
