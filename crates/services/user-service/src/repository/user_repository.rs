//! User repository: uniqueness checks, keyed lookups and country enrichment.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::IdenStatic;
use tracing::{debug, warn};

use super::base::Repository;
use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use super::filters::Filters;
use crate::clients::CountryLookup;
use crate::infra::SessionManager;
use common::{AppError, AppResult};
use domain::{CreateUser, User};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fail with `Conflict` when any user matches `filters`
    async fn check_exists(&self, filters: Filters<user::Column>) -> AppResult<()>;

    /// Find the user whose unique `field` equals `value`, with country code
    async fn get_by_key(&self, field: user::Column, value: String) -> AppResult<User>;

    /// Delete the user whose unique `field` equals `value`
    async fn delete_by_key(&self, field: user::Column, value: String) -> AppResult<()>;

    /// Create a user after checking email and phone uniqueness
    async fn create_user(&self, request: CreateUser) -> AppResult<User>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: Repository<UserEntity, User>,
    countries: Arc<dyn CountryLookup>,
}

impl UserStore {
    pub fn new(sessions: SessionManager, countries: Arc<dyn CountryLookup>) -> Self {
        Self {
            db: Repository::new(sessions),
            countries,
        }
    }

    /// Generic data access for the users table.
    pub fn repository(&self) -> &Repository<UserEntity, User> {
        &self.db
    }

    /// Best-effort country code lookup; any failure leaves the code unset.
    async fn enrich(&self, mut user: User) -> User {
        if !user.has_country() {
            return user;
        }
        match self.countries.get_country_info(&user.country).await {
            Ok(info) => match info.first_code() {
                Some(code) => user.country_code = Some(code),
                None => debug!(country = %user.country, "No country suggestions"),
            },
            Err(e) => warn!(country = %user.country, error = %e, "Country lookup failed"),
        }
        user
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn check_exists(&self, filters: Filters<user::Column>) -> AppResult<()> {
        let fields = filters.field_names().join(", ");
        let existing = self.db.read_many(filters, None).await?;
        if !existing.is_empty() {
            return Err(AppError::conflict(format!(
                "User with this {} already exists",
                fields
            )));
        }
        Ok(())
    }

    async fn get_by_key(&self, field: user::Column, value: String) -> AppResult<User> {
        let user = self.db.read(field, value, None).await.map_err(|e| {
            if e.is_not_found() {
                AppError::not_found(format!("User with this {} not found", field.as_str()))
            } else {
                e
            }
        })?;
        Ok(self.enrich(user).await)
    }

    async fn delete_by_key(&self, field: user::Column, value: String) -> AppResult<()> {
        let deleted = self.db.delete(field, value).await?;
        if deleted == 0 {
            return Err(AppError::not_found(format!(
                "User with this {} not found",
                field.as_str()
            )));
        }
        Ok(())
    }

    async fn create_user(&self, request: CreateUser) -> AppResult<User> {
        if let Some(email) = request.email.as_deref().filter(|e| !e.is_empty()) {
            self.check_exists(Filters::new().eq(user::Column::Email, email))
                .await?;
        }
        let phone = Filters::new().eq(user::Column::PhoneNumber, request.phone_number.as_str());
        self.check_exists(phone).await?;

        let user = self.db.create(ActiveModel::from(request), None).await?;
        Ok(self.enrich(user).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{CountryData, CountryResponse, CountrySuggestion, MockCountryLookup};
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult};

    fn model() -> user::Model {
        user::Model {
            id: "aZ3kQ9xP0bLm".into(),
            name: "Иван".into(),
            surname: "Иванов".into(),
            patronymic: Some("Иванович".into()),
            phone_number: "79161234567".into(),
            email: Some("ivan@example.com".into()),
            country: "Россия".into(),
            data_created: None,
            date_modified: None,
        }
    }

    fn request() -> CreateUser {
        CreateUser {
            name: "Иван".into(),
            surname: "Иванов".into(),
            patronymic: Some("Иванович".into()),
            phone_number: "79161234567".into(),
            email: Some("ivan@example.com".into()),
            country: "Россия".into(),
        }
    }

    fn russia() -> CountryResponse {
        CountryResponse {
            suggestions: vec![CountrySuggestion {
                value: "Россия".into(),
                unrestricted_value: "Российская Федерация".into(),
                data: CountryData {
                    code: 643,
                    alfa2: "RU".into(),
                    alfa3: "RUS".into(),
                    name_short: "Россия".into(),
                    name: "Российская Федерация".into(),
                },
            }],
        }
    }

    fn store(db: &Arc<DatabaseConnection>, countries: MockCountryLookup) -> UserStore {
        UserStore::new(SessionManager::new(Arc::clone(db)), Arc::new(countries))
    }

    fn transaction_log(db: Arc<DatabaseConnection>) -> Vec<sea_orm::Transaction> {
        match Arc::try_unwrap(db) {
            Ok(db) => db.into_transaction_log(),
            Err(_) => panic!("connection still shared"),
        }
    }

    fn no_lookups() -> MockCountryLookup {
        let mut countries = MockCountryLookup::new();
        countries.expect_get_country_info().never();
        countries
    }

    #[tokio::test]
    async fn test_check_exists_conflict_names_fields() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![model()]])
                .into_connection(),
        );
        let store = store(&db, no_lookups());

        let err = store
            .check_exists(Filters::new().eq(user::Column::PhoneNumber, "79161234567"))
            .await
            .unwrap_err();
        assert!(matches!(&err, AppError::Conflict(msg) if msg.contains("phone_number")));
    }

    #[tokio::test]
    async fn test_check_exists_passes_without_matches() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let store = store(&db, no_lookups());

        store
            .check_exists(Filters::new().eq(user::Column::Email, "free@example.com"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_by_key_enriches_country_code() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![model()]])
                .into_connection(),
        );
        let mut countries = MockCountryLookup::new();
        countries
            .expect_get_country_info()
            .withf(|country| country == "Россия")
            .times(1)
            .returning(|_| Ok(russia()));
        let store = store(&db, countries);

        let user = store
            .get_by_key(user::Column::PhoneNumber, "79161234567".into())
            .await
            .unwrap();
        assert_eq!(user.country_code, Some(643));
    }

    #[tokio::test]
    async fn test_enrichment_failure_is_swallowed() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![model()]])
                .into_connection(),
        );
        let mut countries = MockCountryLookup::new();
        countries.expect_get_country_info().returning(|_| {
            Err(AppError::ExternalServer {
                status: 500,
                body: "down".into(),
            })
        });
        let store = store(&db, countries);

        let user = store
            .get_by_key(user::Column::PhoneNumber, "79161234567".into())
            .await
            .unwrap();
        assert_eq!(user.country_code, None);
    }

    #[tokio::test]
    async fn test_empty_suggestions_leave_code_unset() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![model()]])
                .into_connection(),
        );
        let mut countries = MockCountryLookup::new();
        countries
            .expect_get_country_info()
            .returning(|_| Ok(CountryResponse::default()));
        let store = store(&db, countries);

        let user = store
            .get_by_key(user::Column::PhoneNumber, "79161234567".into())
            .await
            .unwrap();
        assert_eq!(user.country_code, None);
    }

    #[tokio::test]
    async fn test_get_by_key_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let store = store(&db, no_lookups());

        let err = store
            .get_by_key(user::Column::PhoneNumber, "79990000000".into())
            .await
            .unwrap_err();
        assert!(matches!(&err, AppError::NotFound(msg) if msg.contains("phone_number")));
    }

    #[tokio::test]
    async fn test_delete_by_key() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );
        let store = store(&db, no_lookups());

        store
            .delete_by_key(user::Column::PhoneNumber, "79161234567".into())
            .await
            .unwrap();
        let err = store
            .delete_by_key(user::Column::PhoneNumber, "79161234567".into())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_user_checks_email_then_phone() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    // email check
                    Vec::<user::Model>::new(),
                    // phone check
                    Vec::new(),
                    // INSERT ... RETURNING
                    vec![model()],
                ])
                .into_connection(),
        );
        let mut countries = MockCountryLookup::new();
        countries
            .expect_get_country_info()
            .returning(|_| Ok(russia()));
        let store = store(&db, countries);

        let user = store.create_user(request()).await.unwrap();
        assert_eq!(user.id, "aZ3kQ9xP0bLm");
        assert_eq!(user.country_code, Some(643));

        drop(store);
        let log = transaction_log(db);
        assert_eq!(log.len(), 3);
        assert!(log[0].statements()[1].sql.contains(r#""users"."email" = $1"#));
        assert!(log[1].statements()[1].sql.contains(r#""users"."phone_number" = $1"#));
        assert!(log[2].statements()[1].sql.starts_with(r#"INSERT INTO "users""#));
    }

    #[tokio::test]
    async fn test_create_user_skips_email_check_without_email() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new(), vec![model()]])
                .into_connection(),
        );
        let mut countries = MockCountryLookup::new();
        countries
            .expect_get_country_info()
            .returning(|_| Ok(russia()));
        let store = store(&db, countries);

        let mut request = request();
        request.email = None;
        store.create_user(request).await.unwrap();

        drop(store);
        assert_eq!(transaction_log(db).len(), 2);
    }

    #[tokio::test]
    async fn test_create_user_rejects_taken_phone() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new(), vec![model()]])
                .into_connection(),
        );
        let store = store(&db, no_lookups());

        let err = store.create_user(request()).await.unwrap_err();
        assert!(matches!(&err, AppError::Conflict(msg) if msg.contains("phone_number")));
    }

    #[tokio::test]
    async fn test_create_user_rolls_back_failed_insert() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new(), Vec::new()])
                .append_query_errors([DbErr::Custom("duplicate key value".into())])
                .into_connection(),
        );
        let store = store(&db, no_lookups());

        let err = store.create_user(request()).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        drop(store);
        let log = transaction_log(db);
        assert_eq!(log.len(), 3);
        let insert: Vec<_> = log[2].statements().iter().map(|s| s.sql.as_str()).collect();
        assert_eq!(insert.len(), 3);
        assert_eq!(insert[0], "BEGIN");
        assert!(insert[1].starts_with(r#"INSERT INTO "users""#));
        assert_eq!(insert[2], "ROLLBACK");
    }
}
