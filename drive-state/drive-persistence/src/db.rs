use chrono::{DateTime, SubsecRound, Utc};
use drive_common::{error::Error, state::DatabaseTrait};
use drive_migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

#[derive(Debug, Clone)]
pub struct LedgerStateDb {
    pub(crate) conn: DatabaseConnection,
}

impl LedgerStateDb {
    pub async fn new(db_url: &str) -> Result<Self, Error> {
        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.sqlx_logging(false);

        // every connection to sqlite::memory: is its own database
        if db_url.starts_with("sqlite::memory:") {
            opt.max_connections(1).min_connections(1);
        }

        let conn = Database::connect(opt)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {e}")))?;

        Ok(Self { conn })
    }

    /// Applies all pending schema migrations.
    pub async fn migrate(&self) -> Result<(), Error> {
        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| Error::Database(format!("Failed to apply migrations: {e}")))?;

        info!("Drive table migrations applied");

        Ok(())
    }
}

/// Timestamps are kept at microsecond precision so they survive a
/// round trip through any backend unchanged.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Implements the [DatabaseTrait] for [LedgerStateDb]
/// This is a wrapper trait around the ledger, sync,
/// and alert DB traits, each for a specific purpose.
/// Lets us do dyn dispatch with the actual database implementation.
impl DatabaseTrait for LedgerStateDb {}
