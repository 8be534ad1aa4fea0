//! Infrastructure layer - database connection, migrations and transactions.

mod db;
pub mod migrations;
mod session;

pub use db::Database;
pub use migrations::Migrator;
pub use session::{Session, SessionManager, TxFuture};
