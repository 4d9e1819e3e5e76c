#![allow(clippy::needless_for_each)]

use crate::credentials::UserRepository;
use anyhow::Result;
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Method, Request, header::CONTENT_TYPE},
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use utoipa::OpenApi;

pub mod handlers;

use self::handlers::{
    health, health::__path_health, signin, signin::__path_signin, signup,
    signup::__path_signup,
};

#[derive(OpenApi)]
#[openapi(
    paths(health, signup, signin),
    components(schemas(
        health::Health,
        handlers::CredentialsRequest,
        signin::SignInResponse
    )),
    tags(
        (name = "auth", description = "User sign-up and credential validation"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Build the HTTP router around a shared repository.
pub fn router(repository: Arc<UserRepository>) -> Router {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any);

    Router::new()
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/signin", post(handlers::signin))
        .route("/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(repository)),
        )
}

/// Serve the API on `[::]:port` until `shutdown` resolves.
///
/// # Errors
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve<F>(port: u16, repository: Arc<UserRepository>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, router(repository).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::credentials::{Argon2Hasher, MemoryUserStore, WorkFactor};
    use axum::{body::to_bytes, http::StatusCode, response::Response};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> (Router, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        let hasher = Argon2Hasher::new(WorkFactor {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        let repository = Arc::new(UserRepository::new(store.clone(), Arc::new(hasher)));
        (router(repository), store)
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn signup_then_signin() {
        let (app, store) = app();
        let credentials = json!({"username": "TestUser", "password": "TestPassword1"});

        let response = app
            .clone()
            .oneshot(post_json("/auth/signup", &credentials))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(store.len().await, 1);

        let response = app
            .oneshot(post_json("/auth/signin", &credentials))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body, json!({"username": "TestUser"}));
    }

    #[tokio::test]
    async fn signup_duplicate_is_conflict() {
        let (app, _store) = app();
        let credentials = json!({"username": "TestUser", "password": "TestPassword1"});

        let first = app
            .clone()
            .oneshot(post_json("/auth/signup", &credentials))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app
            .oneshot(post_json("/auth/signup", &credentials))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn signup_rejects_weak_password() {
        let (app, store) = app();

        let response = app
            .oneshot(post_json(
                "/auth/signup",
                &json!({"username": "TestUser", "password": "password"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Invalid password");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn signup_rejects_missing_payload() {
        let (app, _store) = app();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/signup")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signin_unknown_and_wrong_password_look_the_same() {
        let (app, _store) = app();
        let credentials = json!({"username": "TestUser", "password": "TestPassword1"});
        app.clone()
            .oneshot(post_json("/auth/signup", &credentials))
            .await
            .unwrap();

        let wrong = app
            .clone()
            .oneshot(post_json(
                "/auth/signin",
                &json!({"username": "TestUser", "password": "WrongPassword1"}),
            ))
            .await
            .unwrap();
        let unknown = app
            .oneshot(post_json(
                "/auth/signin",
                &json!({"username": "ghost-user", "password": "TestPassword1"}),
            ))
            .await
            .unwrap();

        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_text(wrong).await, body_text(unknown).await);
    }

    #[tokio::test]
    async fn health_reports_store() {
        let (app, _store) = app();

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-app"));
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["store"], "ok");
        assert_eq!(body["name"], env!("CARGO_PKG_NAME"));
    }

    #[test]
    fn openapi_lists_routes() {
        let doc = openapi();
        assert!(doc.paths.paths.contains_key("/auth/signup"));
        assert!(doc.paths.paths.contains_key("/auth/signin"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
