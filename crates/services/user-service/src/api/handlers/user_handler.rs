//! User handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use common::AppResult;
use domain::{CreateUser, UserResponse, MAX_PHONE_NUMBER_LENGTH, PHONE_NUMBER_PREFIX};

use crate::api::extractors::ValidatedJson;
use crate::api::state::AppState;
use crate::repository::entities::user;

static CYRILLIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\x{0400}-\x{04FF}\s\-]+$").expect("valid regex"));

/// User creation request with validation
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(
        length(min = 1, max = 50, message = "Must be between 1 and 50 characters"),
        custom(function = "validate_cyrillic")
    )]
    #[schema(example = "Иван")]
    pub name: String,
    #[validate(
        length(min = 1, max = 50, message = "Must be between 1 and 50 characters"),
        custom(function = "validate_cyrillic")
    )]
    #[schema(example = "Иванов")]
    pub surname: String,
    #[validate(
        length(max = 50, message = "Must be at most 50 characters"),
        custom(function = "validate_cyrillic")
    )]
    #[schema(example = "Иванович")]
    #[serde(default)]
    pub patronymic: Option<String>,
    /// Digits only, starting with 7
    #[validate(custom(function = "validate_phone_number"))]
    #[schema(example = "79161234567")]
    pub phone_number: String,
    /// An empty string is treated as no email
    #[validate(email(message = "Invalid email address"))]
    #[schema(example = "ivan@example.com")]
    #[serde(default, deserialize_with = "empty_as_none")]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Must be between 1 and 50 characters"))]
    #[schema(example = "Россия")]
    pub country: String,
}

impl From<CreateUserRequest> for CreateUser {
    fn from(request: CreateUserRequest) -> Self {
        Self {
            name: request.name,
            surname: request.surname,
            patronymic: request.patronymic,
            phone_number: request.phone_number,
            email: request.email,
            country: request.country,
        }
    }
}

fn validate_cyrillic(value: &str) -> Result<(), ValidationError> {
    if !CYRILLIC.is_match(value) {
        return Err(ValidationError::new("not_cyrillic")
            .with_message("Only Cyrillic letters, spaces and hyphens are allowed".into()));
    }
    Ok(())
}

fn validate_phone_number(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("not_digits")
            .with_message("Phone number must contain digits only".into()));
    }
    if !value.starts_with(PHONE_NUMBER_PREFIX) {
        return Err(ValidationError::new("bad_prefix")
            .with_message(format!("Phone number must start with {}", PHONE_NUMBER_PREFIX).into()));
    }
    if value.len() > MAX_PHONE_NUMBER_LENGTH {
        return Err(ValidationError::new("too_long").with_message(
            format!("Phone number must be at most {} digits", MAX_PHONE_NUMBER_LENGTH).into(),
        ));
    }
    Ok(())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|email| !email.trim().is_empty()))
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:phone_number", get(get_user).delete(delete_user))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/v1/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Email or phone number already taken"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state.users.create_user(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Get a user by phone number
#[utoipa::path(
    get,
    path = "/v1/users/{phone_number}",
    tag = "Users",
    params(
        ("phone_number" = String, Path, description = "User phone number")
    ),
    responses(
        (status = 200, description = "User with country code", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(phone_number): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .users
        .get_by_key(user::Column::PhoneNumber, phone_number)
        .await?;
    Ok(Json(UserResponse::from(user)))
}

/// Delete a user by phone number
#[utoipa::path(
    delete,
    path = "/v1/users/{phone_number}",
    tag = "Users",
    params(
        ("phone_number" = String, Path, description = "User phone number")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(phone_number): Path<String>,
) -> AppResult<StatusCode> {
    state
        .users
        .delete_by_key(user::Column::PhoneNumber, phone_number)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
