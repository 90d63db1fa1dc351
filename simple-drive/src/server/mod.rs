use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use simple_drive_core::{services::BlobService, Error};

mod blobs;

/// State shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    service: BlobService,
    api_token: String,
}

pub fn router(service: BlobService, api_token: &str) -> Router {
    let state = AppState {
        service,
        api_token: api_token.to_string(),
    };

    let api = Router::new()
        .route("/blobs", post(blobs::create_blob))
        .route("/blobs/:blob_id", get(blobs::get_blob))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer_token,
        ));

    Router::new()
        .route("/", get(root))
        .nest("/v1", api)
        .with_state(state)
}

pub async fn serve(service: BlobService, api_token: &str, host: &str, port: u16) -> Result<()> {
    let app = router(service, api_token);

    let addr = format!("{host}:{port}")
        .parse::<std::net::SocketAddr>()
        .context("invalid listen address")?;

    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Simple Drive API" }))
}

async fn require_bearer_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        Some(token) if token == state.api_token => next.run(request).await,
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "detail": "Invalid authentication token" })),
        )
            .into_response(),
    }
}

/// Maps the core error taxonomy onto HTTP statuses.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> ApiError {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            Error::AlreadyExists(_) => (StatusCode::CONFLICT, self.0.to_string()),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            Error::InvalidPayload(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            Error::Unsupported(_) => (StatusCode::NOT_IMPLEMENTED, self.0.to_string()),
            Error::Backend(_) | Error::Config(_) => {
                tracing::error!("error: {:?}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal storage error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::backends::memory_database;

    async fn test_app() -> Router {
        let database = memory_database().await;
        let service = BlobService::new(database.blob_storage(), database.metadata_store());
        router(service, "test-token")
    }

    fn post_blob(body: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/v1/blobs")
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_blob(blob_id: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("GET")
            .uri(format!("/v1/blobs/{blob_id}"));

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        builder.body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_root_is_open() {
        let app = test_app().await;

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Simple Drive API");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = test_app().await;

        let response = app
            .oneshot(post_blob(r#"{"id": "a", "data": "aGk="}"#, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_token_is_unauthorized() {
        let app = test_app().await;

        let response = app
            .oneshot(post_blob(r#"{"id": "a", "data": "aGk="}"#, Some("wrong")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let app = test_app().await;

        let payload = base64::encode(b"Hello World");
        let body = format!(r#"{{"id": "a1", "data": "{payload}"}}"#);

        let response = app
            .clone()
            .oneshot(post_blob(&body, Some("test-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let created = json_body(response).await;
        assert_eq!(created["id"], "a1");
        assert_eq!(created["size"], 11);
        assert_eq!(created["storage_backend"], "database");

        let response = app
            .oneshot(get_blob("a1", Some("test-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let found = json_body(response).await;
        assert_eq!(found["id"], "a1");
        assert_eq!(found["data"], base64::encode(b"Hello World"));
        assert_eq!(found["size"], 11);
    }

    #[tokio::test]
    async fn test_invalid_base64_is_rejected() {
        let app = test_app().await;

        let response = app
            .oneshot(post_blob(
                r#"{"id": "a1", "data": "not base64!!"}"#,
                Some("test-token"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_id_is_rejected() {
        let app = test_app().await;

        let response = app
            .oneshot(post_blob(r#"{"id": "", "data": "aGk="}"#, Some("test-token")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let app = test_app().await;

        let body = r#"{"id": "x", "data": "YWJj"}"#;

        let response = app
            .clone()
            .oneshot(post_blob(body, Some("test-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(post_blob(body, Some("test-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let app = test_app().await;

        let response = app
            .oneshot(get_blob("missing", Some("test-token")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
