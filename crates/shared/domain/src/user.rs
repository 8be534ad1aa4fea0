//! User domain entity and related types.

use chrono::NaiveDateTime;
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::constants::USER_ID_LENGTH;

/// Generate a user identifier: a random alphanumeric string drawn from the OS
/// CSPRNG.
pub fn generate_user_id() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(USER_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// User domain entity
///
/// Built from a full `users` row; `country_code` is never stored and is only
/// filled in by a country lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub phone_number: String,
    pub email: Option<String>,
    pub country: String,
    pub country_code: Option<i64>,
    pub data_created: Option<NaiveDateTime>,
    pub date_modified: Option<NaiveDateTime>,
}

impl User {
    /// Whether a country name is present to look up a code for
    pub fn has_country(&self) -> bool {
        !self.country.trim().is_empty()
    }
}

/// User creation data transfer object
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub phone_number: String,
    pub email: Option<String>,
    pub country: String,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UserResponse {
    /// Generated user identifier
    #[cfg_attr(feature = "openapi", schema(example = "aZ3kQ9xP0bLm"))]
    pub id: String,
    #[cfg_attr(feature = "openapi", schema(example = "Иван"))]
    pub name: String,
    #[cfg_attr(feature = "openapi", schema(example = "Иванов"))]
    pub surname: String,
    #[cfg_attr(feature = "openapi", schema(example = "Иванович"))]
    pub patronymic: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "79161234567"))]
    pub phone_number: String,
    #[cfg_attr(feature = "openapi", schema(example = "ivan@example.com"))]
    pub email: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "Россия"))]
    pub country: String,
    /// Numeric country code, present when the country lookup succeeded
    #[cfg_attr(feature = "openapi", schema(example = 643))]
    pub country_code: Option<i64>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            surname: user.surname,
            patronymic: user.patronymic,
            phone_number: user.phone_number,
            email: user.email,
            country: user.country,
            country_code: user.country_code,
        }
    }
}
