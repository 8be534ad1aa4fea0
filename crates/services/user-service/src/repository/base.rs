//! Entity-agnostic data access.
//!
//! Every operation takes an optional caller transaction. With `Some`, the
//! operation runs inside it and leaves commit/rollback to the caller; with
//! `None`, it runs in a transaction of its own. `delete` is the exception: it
//! always commits its own transaction before returning.

use std::marker::PhantomData;

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction,
    DbBackend, EntityName, EntityTrait, IdenStatic, IntoActiveModel, Iterable,
    PrimaryKeyToColumn, QueryFilter, QuerySelect, QueryTrait, Statement, Value,
};
use tracing::error;

use common::{AppError, AppResult};

use super::filters::Filters;
use crate::infra::SessionManager;

/// Generic repository mapping rows of `E` to the domain projection `D`.
pub struct Repository<E, D> {
    sessions: SessionManager,
    _marker: PhantomData<fn() -> (E, D)>,
}

impl<E, D> Clone for Repository<E, D> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E, D> Repository<E, D>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync,
    E::ActiveModel: ActiveModelBehavior + Send,
    D: From<E::Model>,
{
    pub fn new(sessions: SessionManager) -> Self {
        Self {
            sessions,
            _marker: PhantomData,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    fn table_name() -> String {
        E::default().table_name().to_string()
    }

    /// Insert a new row and return its projection.
    pub async fn create(
        &self,
        fields: E::ActiveModel,
        session: Option<&DatabaseTransaction>,
    ) -> AppResult<D> {
        let session = self.sessions.acquire(session).await?;
        let result = fields.insert(session.txn()).await.map_err(AppError::from);
        session.finish(result).await.map(D::from)
    }

    /// Fetch the row whose unique `column` equals `value`.
    pub async fn read(
        &self,
        column: E::Column,
        value: impl Into<Value> + Send,
        session: Option<&DatabaseTransaction>,
    ) -> AppResult<D> {
        self.read_one(Filters::new().eq(column, value), session).await
    }

    /// Fetch the single row matching `filters`.
    pub async fn read_one(
        &self,
        filters: Filters<E::Column>,
        session: Option<&DatabaseTransaction>,
    ) -> AppResult<D> {
        let session = self.sessions.acquire(session).await?;
        let result = Self::select_one(session.txn(), &filters).await;
        session.finish(result).await.map(D::from)
    }

    /// Fetch every row matching `filters`.
    pub async fn read_many(
        &self,
        filters: Filters<E::Column>,
        session: Option<&DatabaseTransaction>,
    ) -> AppResult<Vec<D>> {
        let session = self.sessions.acquire(session).await?;
        let result = E::find()
            .filter(filters.condition())
            .all(session.txn())
            .await
            .map_err(AppError::from);
        let models = session.finish(result).await?;
        Ok(models.into_iter().map(D::from).collect())
    }

    /// Update the row identified by the value of `pk` in `fields`. Exactly
    /// one row must change; anything else rolls the work back.
    pub async fn update(
        &self,
        pk: E::Column,
        fields: E::ActiveModel,
        session: Option<&DatabaseTransaction>,
    ) -> AppResult<()> {
        let session = self.sessions.acquire(session).await?;
        let result = async {
            let rows = Self::update_row(session.txn(), pk, fields).await?;
            if rows != 1 {
                error!(
                    table = %Self::table_name(),
                    column = pk.as_str(),
                    rows,
                    "Update affected an unexpected number of rows"
                );
                return Err(AppError::invariant(format!(
                    "update of {} by {} affected {} rows",
                    Self::table_name(),
                    pk.as_str(),
                    rows
                )));
            }
            Ok(())
        }
        .await;
        session.finish(result).await
    }

    /// Delete rows where `column` equals `value` and commit immediately.
    /// Returns the number of deleted rows.
    pub async fn delete(
        &self,
        column: E::Column,
        value: impl Into<Value> + Send,
    ) -> AppResult<u64> {
        let session = self.sessions.acquire(None).await?;
        let result = E::delete_many()
            .filter(column.eq(value))
            .exec(session.txn())
            .await
            .map(|res| res.rows_affected)
            .map_err(AppError::from);
        session.finish(result).await
    }

    /// Insert `fields`, or update the conflicting row when the unique
    /// `constraint` (default `uq_{table}_{pk}`) is violated. Returns the
    /// resulting row read back by `pk`.
    pub async fn upsert(
        &self,
        fields: E::ActiveModel,
        pk: E::Column,
        constraint: Option<&str>,
        session: Option<&DatabaseTransaction>,
    ) -> AppResult<D> {
        let key = fields.get(pk).into_value().ok_or_else(|| {
            AppError::invariant(format!("upsert without a value for {}", pk.as_str()))
        })?;
        let constraint = constraint
            .map(str::to_string)
            .unwrap_or_else(|| format!("uq_{}_{}", Self::table_name(), pk.as_str()));

        let session = self.sessions.acquire(session).await?;
        let result = async {
            let txn = session.txn();
            let fields = fields.before_save(txn, true).await?;
            let stmt = upsert_statement::<E>(txn.get_database_backend(), fields, pk, &constraint);
            txn.execute(stmt).await?;
            Self::select_one(txn, &Filters::new().eq(pk, key)).await
        }
        .await;
        session.finish(result).await.map(D::from)
    }

    /// Apply several updates keyed by `pk` in one unit of work. Returns the
    /// total number of affected rows.
    pub async fn multiple_update(
        &self,
        pk: E::Column,
        rows: Vec<E::ActiveModel>,
        session: Option<&DatabaseTransaction>,
    ) -> AppResult<u64> {
        let session = self.sessions.acquire(session).await?;
        let result = async {
            let mut total = 0;
            for fields in rows {
                total += Self::update_row(session.txn(), pk, fields).await?;
            }
            Ok(total)
        }
        .await;
        session.finish(result).await
    }

    async fn select_one(
        txn: &DatabaseTransaction,
        filters: &Filters<E::Column>,
    ) -> AppResult<E::Model> {
        let mut models = E::find()
            .filter(filters.condition())
            .limit(2u64)
            .all(txn)
            .await?;
        match models.len() {
            0 => Err(AppError::not_found(format!(
                "no {} row matches {}",
                Self::table_name(),
                filters.field_names().join(", ")
            ))),
            1 => Ok(models.remove(0)),
            _ => Err(AppError::invariant(format!(
                "more than one {} row matches {}",
                Self::table_name(),
                filters.field_names().join(", ")
            ))),
        }
    }

    async fn update_row(
        txn: &DatabaseTransaction,
        pk: E::Column,
        fields: E::ActiveModel,
    ) -> AppResult<u64> {
        let key = fields.get(pk).into_value().ok_or_else(|| {
            AppError::invariant(format!("update without a value for {}", pk.as_str()))
        })?;
        let mut fields = fields.before_save(txn, false).await?;
        fields.not_set(pk);

        let result = E::update_many()
            .set(fields)
            .filter(pk.eq(key))
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }
}

/// `INSERT ... ON CONFLICT ON CONSTRAINT ... DO UPDATE` for the set columns
/// of `fields`, leaving primary key and conflict columns untouched.
fn upsert_statement<E>(
    backend: DbBackend,
    fields: E::ActiveModel,
    conflict_column: E::Column,
    constraint: &str,
) -> Statement
where
    E: EntityTrait,
{
    let primary_keys: Vec<String> = E::PrimaryKey::iter()
        .map(|key| key.into_column().as_str().to_string())
        .collect();
    let updated: Vec<String> = E::Column::iter()
        .filter(|column| fields.get(*column).is_set())
        .map(|column| column.as_str().to_string())
        .filter(|name| name != conflict_column.as_str() && !primary_keys.contains(name))
        .collect();

    let mut stmt = E::insert(fields).build(backend);
    let constraint = constraint.replace('"', "\"\"");
    if updated.is_empty() {
        stmt.sql
            .push_str(&format!(r#" ON CONFLICT ON CONSTRAINT "{}" DO NOTHING"#, constraint));
    } else {
        let assignments = updated
            .iter()
            .map(|name| format!(r#""{0}" = EXCLUDED."{0}""#, name))
            .collect::<Vec<_>>()
            .join(", ");
        stmt.sql.push_str(&format!(
            r#" ON CONFLICT ON CONSTRAINT "{}" DO UPDATE SET {}"#,
            constraint, assignments
        ));
    }
    stmt
}
