use crate::QueryError;
use crate::models::{DbIngestRun, NewIngestRun};
use crate::production_schema::prod::ingest_runs;
use chrono::Utc;
use diesel::prelude::*;

/// Bookkeeping for Component K (spec.md §4.8): one row per scheduled-job
/// invocation, opened at the start of a run and closed by either
/// [`finish_run`] or [`abort_run`]. A row with neither `finished_at` nor
/// `aborted_at` set means the process that owned it died mid-run.
pub fn start_run(conn: &mut PgConnection, component: &str) -> Result<DbIngestRun, QueryError> {
    diesel::insert_into(ingest_runs::dsl::ingest_runs)
        .values(&NewIngestRun { component, started_at: Utc::now().naive_utc() })
        .get_result(conn)
}

pub fn finish_run(
    conn: &mut PgConnection,
    run_id: i64,
    stats_json: serde_json::Value,
) -> Result<usize, QueryError> {
    use ingest_runs::dsl;

    diesel::update(dsl::ingest_runs.filter(dsl::id.eq(run_id)))
        .set((dsl::finished_at.eq(Utc::now().naive_utc()), dsl::stats_json.eq(stats_json)))
        .execute(conn)
}

pub fn abort_run(
    conn: &mut PgConnection,
    run_id: i64,
    stats_json: Option<serde_json::Value>,
) -> Result<usize, QueryError> {
    use ingest_runs::dsl;

    diesel::update(dsl::ingest_runs.filter(dsl::id.eq(run_id)))
        .set((dsl::aborted_at.eq(Utc::now().naive_utc()), dsl::stats_json.eq(stats_json)))
        .execute(conn)
}
