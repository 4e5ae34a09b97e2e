use crate::QueryError;
use diesel::{PgConnection, RunQueryDsl, sql_query};
use log::{debug, warn};

/// The materialized views the pipeline invalidates/refreshes but never reads
/// from (that's the external read-serving layer's job -- see spec.md §1).
pub const MATERIALIZED_VIEWS: &[&str] = &[
    "app_rankings",
    "app_team_profile",
    "app_matches_feed",
    "app_league_standings",
    "app_upcoming_schedule",
];

/// Refresh every known materialized view. Some views (notably
/// `app_league_standings`, which aggregates rows without a unique key) lack
/// a unique index and so cannot be refreshed `CONCURRENTLY`; for those we
/// fall back to a plain (briefly lock-taking) refresh rather than fail the
/// whole pass. This mirrors spec.md §9's "try concurrent, fall back
/// non-concurrent" design note.
pub fn refresh_all_views(conn: &mut PgConnection) -> Result<(), QueryError> {
    for view in MATERIALIZED_VIEWS {
        refresh_view(conn, view)?;
    }
    Ok(())
}

pub fn refresh_view(conn: &mut PgConnection, view: &str) -> Result<(), QueryError> {
    let concurrent_result =
        sql_query(format!("refresh materialized view concurrently {view};")).execute(conn);

    match concurrent_result {
        Ok(_) => {
            debug!("refreshed {view} concurrently");
            Ok(())
        }
        Err(err) => {
            warn!(
                "concurrent refresh of {view} failed ({err}), falling back to a \
                non-concurrent refresh"
            );
            sql_query(format!("refresh materialized view {view};")).execute(conn)?;
            Ok(())
        }
    }
}
