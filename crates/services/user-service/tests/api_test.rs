//! Integration tests for the HTTP surface.
//!
//! The router runs against an in-memory user repository and the in-process
//! cache backend, so no database or Redis is required.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{AppError, AppResult};
use domain::{generate_user_id, CreateUser, User};
use user_service_lib::api::{create_router, AppState};
use user_service_lib::cache::{CacheStore, InMemoryBackend};
use user_service_lib::config::UserServiceConfig;
use user_service_lib::repository::entities::user;
use user_service_lib::repository::{Filters, UserRepository};

// =============================================================================
// In-memory repository
// =============================================================================

#[derive(Default)]
struct InMemoryUsers {
    users: Mutex<Vec<User>>,
}

impl InMemoryUsers {
    fn matches(user: &User, field: user::Column, value: &str) -> bool {
        match field {
            user::Column::PhoneNumber => user.phone_number == value,
            user::Column::Email => user.email.as_deref() == Some(value),
            user::Column::Id => user.id == value,
            _ => false,
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn check_exists(&self, _filters: Filters<user::Column>) -> AppResult<()> {
        Ok(())
    }

    async fn get_by_key(&self, field: user::Column, value: String) -> AppResult<User> {
        let users = self.users.lock().unwrap();
        users
            .iter()
            .find(|u| Self::matches(u, field, &value))
            .cloned()
            .map(|mut u| {
                u.country_code = Some(643);
                u
            })
            .ok_or_else(|| AppError::not_found("User with this phone_number not found"))
    }

    async fn delete_by_key(&self, field: user::Column, value: String) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| !Self::matches(u, field, &value));
        if users.len() == before {
            return Err(AppError::not_found("User with this phone_number not found"));
        }
        Ok(())
    }

    async fn create_user(&self, request: CreateUser) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.phone_number == request.phone_number) {
            return Err(AppError::conflict(
                "User with this phone_number already exists",
            ));
        }
        let user = User {
            id: generate_user_id(),
            name: request.name,
            surname: request.surname,
            patronymic: request.patronymic,
            phone_number: request.phone_number,
            email: request.email,
            country: request.country,
            country_code: Some(643),
            data_created: None,
            date_modified: None,
        };
        users.push(user.clone());
        Ok(user)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn app_with(cache: CacheStore, api_route: &str) -> Router {
    let mut config = UserServiceConfig::default();
    config.service.api_route = api_route.to_string();
    let state = AppState::new(Arc::new(InMemoryUsers::default()), Arc::new(cache), config);
    create_router(state)
}

fn app() -> Router {
    app_with(CacheStore::with_backend(Arc::new(InMemoryBackend::new())), "")
}

fn ivan() -> Value {
    json!({
        "name": "Иван",
        "surname": "Иванов",
        "patronymic": "Иванович",
        "phone_number": "79161234567",
        "email": "ivan@example.com",
        "country": "Россия"
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_user_lifecycle() {
    let app = app();

    let (status, body) = send(&app, Method::POST, "/v1/users", Some(ivan())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"].as_str().map(str::len), Some(12));
    assert_eq!(body["country_code"], 643);
    assert!(body.get("data_created").is_none());

    let (status, body) = send(&app, Method::GET, "/v1/users/79161234567", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["surname"], "Иванов");

    let (status, _) = send(&app, Method::DELETE, "/v1/users/79161234567", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, "/v1/users/79161234567", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_create_duplicate_phone_conflicts() {
    let app = app();

    let (status, _) = send(&app, Method::POST, "/v1/users", Some(ivan())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::POST, "/v1/users", Some(ivan())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert_eq!(
        body["error"]["message"],
        "User with this phone_number already exists"
    );
}

#[tokio::test]
async fn test_create_rejects_invalid_phone() {
    let app = app();
    let mut body = ivan();
    body["phone_number"] = json!("81234567890");

    let (status, body) = send(&app, Method::POST, "/v1/users", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("phone_number"));
}

#[tokio::test]
async fn test_create_rejects_latin_name() {
    let app = app();
    let mut body = ivan();
    body["name"] = json!("Not Cyrillic");

    let (status, _) = send(&app, Method::POST, "/v1/users", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_rejects_malformed_json() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/v1/users", Some(json!({"name": 1}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_delete_unknown_user_is_not_found() {
    let app = app();
    let (status, _) = send(&app, Method::DELETE, "/v1/users/70000000000", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_routes_honor_api_prefix() {
    let app = app_with(
        CacheStore::with_backend(Arc::new(InMemoryBackend::new())),
        "/api/",
    );

    let (status, _) = send(&app, Method::POST, "/api/v1/users", Some(ivan())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, Method::GET, "/v1/users/79161234567", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Tech
// =============================================================================

#[tokio::test]
async fn test_healthcheck_reports_live_cache() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/v1/tech/healthcheck", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"component": "redis", "liveness": true}]));
}

#[tokio::test]
async fn test_healthcheck_without_cache_backend() {
    let app = app_with(CacheStore::new(), "");
    let (_, body) = send(&app, Method::GET, "/v1/tech/healthcheck", None).await;
    assert_eq!(body[0]["liveness"], false);
}

#[tokio::test]
async fn test_cache_keys_listing_and_purge() {
    let app = app();
    send(&app, Method::GET, "/v1/tech/healthcheck", None).await;

    let (status, body) = send(&app, Method::GET, "/v1/tech/users/redis/keys", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["test"]));

    let (status, _) = send(&app, Method::DELETE, "/v1/tech/users/redis/keys", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, Method::GET, "/v1/tech/users/redis/keys", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "user-service");
    assert!(body["paths"].get("/v1/users/{phone_number}").is_some());
}
