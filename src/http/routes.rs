//! Route table and application state.

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use axum::middleware::from_fn_with_state;
use std::time::Duration;

use crate::config::ServiceConfig;
use crate::http::handlers::{self, health, users};
use crate::http::middleware::{self, CorrelationSettings};
use crate::users::UserService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub service: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(users: UserService, service: ServiceConfig) -> Self {
        Self {
            users,
            service: Arc::new(service),
        }
    }
}

/// Routes without the request pipeline.
pub fn routes(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::get_user));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", v1)
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .with_state(state)
}

/// Full application: routes wrapped in the request pipeline.
///
/// `request_timeout` bounds each handler; a request that runs past it is
/// answered with a JSON 503 and still logged by the pipeline.
pub fn build_router(
    state: AppState,
    settings: CorrelationSettings,
    request_timeout: Duration,
) -> Router {
    let routes = routes(state).layer(from_fn_with_state(
        request_timeout,
        middleware::deadline::enforce_deadline,
    ));
    middleware::apply(routes, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::memory::{sample_user, InMemoryUserStore};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(store: Arc<InMemoryUserStore>) -> Router {
        let state = AppState::new(UserService::new(store), ServiceConfig::default());
        build_router(state, CorrelationSettings::default(), Duration::from_secs(5))
    }

    async fn get_json(router: Router, uri: &str) -> (Response<()>, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (Response::from_parts(parts, ()), json)
    }

    #[tokio::test]
    async fn health_reports_service_identity() {
        let (response, body) = get_json(app(Arc::default()), "/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "users-api");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn malformed_id_is_400_without_store_call() {
        let store = Arc::new(InMemoryUserStore::seeded());
        let (response, body) = get_json(app(store.clone()), "/api/v1/users/not-a-uuid").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "invalid user ID format" }));
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn absent_id_is_404() {
        let store = Arc::new(InMemoryUserStore::seeded());
        let uri = format!("/api/v1/users/{}", uuid::Uuid::new_v4());
        let (response, body) = get_json(app(store.clone()), &uri).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "user not found" }));
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn existing_id_returns_user_without_deleted_at() {
        let store = Arc::new(InMemoryUserStore::new());
        let user = sample_user("ada", chrono::Utc::now());
        store.insert(user.clone());

        let uri = format!("/api/v1/users/{}", user.id);
        let (response, body) = get_json(app(store), &uri).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body["id"], user.id.to_string());
        assert_eq!(body["email"], "ada@example.com");
        assert_eq!(body["name"], "ada");
        assert!(body.get("created_at").is_some());
        assert!(body.get("deleted_at").is_none());
    }

    #[tokio::test]
    async fn store_failure_is_generic_500() {
        let store = Arc::new(InMemoryUserStore::seeded());
        store.set_failing(true);

        let uri = format!("/api/v1/users/{}", uuid::Uuid::new_v4());
        let (response, body) = get_json(app(store), &uri).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "internal server error" }));
    }

    #[tokio::test]
    async fn list_clamps_out_of_range_pagination() {
        let (response, body) =
            get_json(app(Arc::new(InMemoryUserStore::seeded())), "/api/v1/users?limit=500&offset=-5").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body["limit"], 100);
        assert_eq!(body["offset"], 0);
        assert_eq!(body["users"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn list_defaults_and_empty_page() {
        let (response, body) = get_json(app(Arc::default()), "/api/v1/users").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body, json!({ "users": [], "limit": 20, "offset": 0 }));
    }

    #[tokio::test]
    async fn list_rejects_non_integer_parameters() {
        let store = Arc::new(InMemoryUserStore::seeded());

        let (response, body) = get_json(app(store.clone()), "/api/v1/users?limit=ten").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "invalid limit parameter" }));

        let (response, body) = get_json(app(store.clone()), "/api/v1/users?offset=1.5").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "invalid offset parameter" }));

        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn repeated_query_keys_use_first_value() {
        let (response, body) =
            get_json(app(Arc::new(InMemoryUserStore::seeded())), "/api/v1/users?limit=1&limit=2").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body["limit"], 1);
        assert_eq!(body["users"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn undecodable_path_id_is_json_400() {
        let store = Arc::new(InMemoryUserStore::seeded());
        let (response, body) = get_json(app(store.clone()), "/api/v1/users/%FF").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(body, json!({ "error": "invalid user ID format" }));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_path_and_wrong_method_are_json() {
        let (response, body) = get_json(app(Arc::default()), "/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "not found" }));

        let response = app(Arc::default())
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
