use crate::QueryError;
use diesel::{PgConnection, RunQueryDsl, sql_query};

/// Component J: the Write-Protection Gate.
///
/// Triggers on every `prod.*` table reject `INSERT`/`UPDATE`/`DELETE` unless
/// the current session has set the `matchcore.pipeline_write` session
/// variable for the current transaction. This helper is the only supported
/// way to set it -- exploratory scripts and foreign clients that don't call
/// it get rejected at the database layer, not merely discouraged by
/// convention. Mirrors the advisory-lock handshake in
/// [`crate::migrations::run_migrations`]: a typed Rust wrapper around one
/// deliberate `sql_query` call.
pub fn authorize_pipeline_write(conn: &mut PgConnection) -> Result<(), QueryError> {
    sql_query("select set_config('matchcore.pipeline_write', 'on', true);").execute(conn)?;
    Ok(())
}

/// The shadow-table equivalent used by the Rebuild/Swap Subsystem (Component
/// I). Shadow tables are guarded by their own session variable so that a
/// rebuild in progress can never be mistaken, by the trigger, for a write
/// authorized against live production tables.
pub fn authorize_shadow_write(conn: &mut PgConnection) -> Result<(), QueryError> {
    sql_query("select set_config('matchcore.shadow_write', 'on', true);").execute(conn)?;
    Ok(())
}

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("write to a production table was attempted without pipeline write authorization")]
pub struct WriteProtectionDenied;
