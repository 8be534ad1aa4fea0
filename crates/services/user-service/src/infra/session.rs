//! Unit-of-work management on top of SeaORM transactions.
//!
//! A transaction is committed when the work returns `Ok`, rolled back when it
//! returns `Err`, and released on every path (an uncommitted
//! `DatabaseTransaction` rolls back when dropped).
//!
//! Callers that already hold a transaction pass it down and the work joins it
//! untouched; callers that pass `None` get a fresh transaction scoped to that
//! single call.

use std::sync::Arc;

use futures::future::BoxFuture;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{debug, error};

use common::AppResult;

/// Boxed future borrowing the transaction it runs in.
pub type TxFuture<'a, T> = BoxFuture<'a, AppResult<T>>;

/// Hands out units of work over one connection pool.
#[derive(Clone)]
pub struct SessionManager {
    db: Arc<DatabaseConnection>,
}

impl SessionManager {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Begin a new transaction.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        let txn = self.db.begin().await?;
        debug!("Transaction started");
        Ok(txn)
    }

    /// Join `session` when given, otherwise begin a transaction owned by the
    /// returned [`Session`].
    pub async fn acquire<'a>(
        &self,
        session: Option<&'a DatabaseTransaction>,
    ) -> AppResult<Session<'a>> {
        match session {
            Some(txn) => Ok(Session::Joined(txn)),
            None => Ok(Session::Owned(self.begin().await?)),
        }
    }

    /// Run `f` in a fresh transaction: commit on `Ok`, roll back on `Err`.
    pub async fn run_in_transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(&'a DatabaseTransaction) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        let txn = self.begin().await?;
        let result = f(&txn).await;
        complete(txn, result).await
    }

    /// Run `f` inside `session` when given (no commit or rollback here), or
    /// in a fresh transaction scoped to this call.
    pub async fn with_session<F, T>(
        &self,
        session: Option<&DatabaseTransaction>,
        f: F,
    ) -> AppResult<T>
    where
        F: for<'a> FnOnce(&'a DatabaseTransaction) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        match session {
            Some(txn) => f(txn).await,
            None => self.run_in_transaction(f).await,
        }
    }
}

/// A transaction either borrowed from the caller or owned by this call.
pub enum Session<'a> {
    Joined(&'a DatabaseTransaction),
    Owned(DatabaseTransaction),
}

impl Session<'_> {
    pub fn txn(&self) -> &DatabaseTransaction {
        match self {
            Session::Joined(txn) => txn,
            Session::Owned(txn) => txn,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Session::Owned(_))
    }

    /// Settle an owned transaction according to `result`; a joined one is
    /// left to its owner.
    pub async fn finish<T>(self, result: AppResult<T>) -> AppResult<T> {
        match self {
            Session::Joined(_) => result,
            Session::Owned(txn) => complete(txn, result).await,
        }
    }
}

async fn complete<T>(txn: DatabaseTransaction, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            debug!("Transaction committed");
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                error!("Transaction rollback failed: {}", rollback_err);
            } else {
                debug!("Transaction rolled back");
            }
            Err(e)
        }
    }
}
