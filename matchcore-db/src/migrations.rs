use crate::QueryError;
use diesel::sql_types::BigInt;
use diesel::{Connection, ConnectionError, PgConnection, RunQueryDsl};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::{info, warn};
use miette::Diagnostic;
use std::error::Error;
use thiserror::Error;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
const MIGRATION_LOCK_ID: i64 = 42416;

#[derive(Debug, Error, Diagnostic)]
pub enum MigrationError {
    #[error("couldn't connect to database")]
    FailedToConnectToDatabase(#[source] ConnectionError),

    #[error("error acquiring migrations lock")]
    FailedToAcquireMigrationsLock(#[source] QueryError),

    #[error("error running migrations")]
    FailedToRunMigrations(#[source] Box<dyn Error + Send + Sync>),
}

/// Runs every pending embedded migration under a Postgres advisory lock, so
/// that two `matchcore` processes starting up at once don't race each other
/// (e.g. a scheduled `nightly_promote` overlapping a manually invoked
/// `matchcore migrate`).
pub fn run_migrations() -> Result<(), MigrationError> {
    let url = crate::postgres_url_from_environment();

    let mut conn =
        PgConnection::establish(&url).map_err(MigrationError::FailedToConnectToDatabase)?;

    info!("acquiring migrations lock");
    diesel::sql_query("select pg_advisory_lock($1);")
        .bind::<BigInt, _>(MIGRATION_LOCK_ID)
        .execute(&mut conn)
        .map_err(MigrationError::FailedToAcquireMigrationsLock)?;

    info!("running any pending migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(MigrationError::FailedToRunMigrations)?;

    let unlock_result = diesel::sql_query("select pg_advisory_unlock($1);")
        .bind::<BigInt, _>(MIGRATION_LOCK_ID)
        .execute(&mut conn);

    if let Err(e) = unlock_result {
        warn!(
            "failed to unlock migrations lock, it will be unlocked when the connection is \
            dropped, but this may still indicate an application issue: {:?}",
            e,
        );
    }

    info!("migrations finished");
    Ok(())
}
