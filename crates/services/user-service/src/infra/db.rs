//! Database connection and migrations.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use common::DatabaseConfig;
use sea_orm::{
    ConnectOptions, Database as SeaDatabase, DatabaseConnection, DbErr, EntityTrait, QueryOrder,
};
use sea_orm_migration::{seaql_migrations, MigratorTrait};

use super::migrations::Migrator;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(8);

/// Database wrapper for connection management
#[derive(Clone)]
pub struct Database {
    connection: Arc<DatabaseConnection>,
}

impl Database {
    /// Open the pool and apply pending migrations.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbErr> {
        let db = Self::connect_without_migrations(config).await?;
        db.run_migrations().await?;
        tracing::info!(database = ?config, "Database connected and migrations applied");
        Ok(db)
    }

    /// Open the pool only (for CLI commands).
    pub async fn connect_without_migrations(config: &DatabaseConfig) -> Result<Self, DbErr> {
        let connection = SeaDatabase::connect(connect_options(config)).await?;
        Ok(Self {
            connection: Arc::new(connection),
        })
    }

    /// Shared handle on the pool.
    pub fn get_connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.connection)
    }

    pub async fn run_migrations(&self) -> Result<(), DbErr> {
        Migrator::up(self.connection.as_ref(), None).await
    }

    /// Roll back the most recent migration.
    pub async fn rollback_migration(&self) -> Result<(), DbErr> {
        Migrator::down(self.connection.as_ref(), Some(1)).await
    }

    /// Every known migration paired with whether it has been applied.
    pub async fn migration_status(&self) -> Result<Vec<(String, bool)>, DbErr> {
        let applied: HashSet<String> = seaql_migrations::Entity::find()
            .order_by_asc(seaql_migrations::Column::Version)
            .all(self.connection.as_ref())
            .await?
            .into_iter()
            .map(|m| m.version)
            .collect();

        Ok(Migrator::migrations()
            .iter()
            .map(|m| {
                let name = m.name().to_string();
                let is_applied = applied.contains(&name);
                (name, is_applied)
            })
            .collect())
    }

    /// Drop everything and re-apply all migrations.
    pub async fn fresh_migrations(&self) -> Result<(), DbErr> {
        Migrator::fresh(self.connection.as_ref()).await
    }
}

fn connect_options(config: &DatabaseConfig) -> ConnectOptions {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(CONNECT_TIMEOUT)
        .sqlx_logging(config.sql_logging);
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_options_follow_config() {
        let config = DatabaseConfig {
            url: "postgres://app:secret@db:5432/users".into(),
            max_connections: 7,
            min_connections: 2,
            sql_logging: true,
        };
        let options = connect_options(&config);

        assert_eq!(options.get_url(), config.url);
        assert_eq!(options.get_max_connections(), Some(7));
        assert_eq!(options.get_min_connections(), Some(2));
        assert!(options.get_sqlx_logging());
    }
}
