use crate::normalize;
use chrono::Utc;
use log::{info, warn};
use matchcore_db::gate;
use matchcore_db::models::{DbStagingGame, NewShadowMatch, NewShadowTeam};
use matchcore_db::queries::{rebuild as rebuild_queries, staging};
use matchcore_db::queries::rebuild::{RebuildReport, RebuildThresholds};
use matchcore_db::{Connection, PgConnection, QueryError};

#[derive(Debug, Default, Clone, Copy)]
pub struct RebuildStats {
    pub rows_replayed: usize,
    pub rows_skipped: usize,
}

/// Component I: `rebuild_from_staging()` (spec.md §4.7). Replays *every*
/// staging row -- processed and unprocessed alike -- through a scoped-down
/// version of the Promotion Pipeline's resolution logic, targeting the
/// shadow tables instead of the live ones. The replay only does exact
/// canonical-name team matching (strategies 1-2 and create); the fuzzy
/// strategies need the full production alias/trigram index a fresh rebuild
/// doesn't have yet, so they'd only ever take the "create" branch anyway.
pub fn rebuild_from_staging(
    conn: &mut PgConnection,
    current_season_year: i32,
) -> Result<RebuildStats, QueryError> {
    rebuild_queries::create_shadow_tables(conn)?;

    let rows = staging::get_all_games_ordered(conn)?;
    let mut stats = RebuildStats::default();

    for row in &rows {
        match replay_row(conn, row, current_season_year) {
            Ok(()) => stats.rows_replayed += 1,
            Err(err) => {
                warn!("skipping staging row {} during rebuild: {err}", row.id);
                stats.rows_skipped += 1;
            }
        }
    }

    info!(
        "rebuild replay finished: {} replayed, {} skipped",
        stats.rows_replayed, stats.rows_skipped
    );
    Ok(stats)
}

fn replay_row(
    conn: &mut PgConnection,
    row: &DbStagingGame,
    current_season_year: i32,
) -> Result<(), QueryError> {
    let match_date = match row.match_date {
        Some(date) => date,
        None => return Ok(()),
    };

    // One transaction per row so `authorize_shadow_write`'s transaction-local
    // `set_config` covers both the team-resolution writes and the match
    // insert that follows it, not just whichever statement immediately
    // follows the call (spec.md §4.7, §4.9).
    conn.transaction(|conn| -> Result<(), QueryError> {
        gate::authorize_shadow_write(conn)?;
        let home = resolve_shadow_team(conn, &row.home_team_name, current_season_year)?;
        let away = resolve_shadow_team(conn, &row.away_team_name, current_season_year)?;

        if home.id == away.id {
            return Ok(());
        }

        let now = Utc::now().naive_utc();
        rebuild_queries::insert_shadow_match(
            conn,
            NewShadowMatch {
                match_date,
                match_time: row.match_time,
                home_team_id: home.id,
                away_team_id: away.id,
                home_score: row.home_score,
                away_score: row.away_score,
                league_id: None,
                tournament_id: None,
                venue: row.venue_name.as_deref(),
                source_platform: &row.source_platform,
                source_match_key: &row.source_match_key,
                created_at: now,
                updated_at: now,
            },
        )?;

        Ok(())
    })
}

fn resolve_shadow_team(
    conn: &mut PgConnection,
    raw_name: &str,
    current_season_year: i32,
) -> Result<matchcore_db::models::DbShadowTeam, QueryError> {
    let normalized = normalize::normalize(raw_name);

    if let Some(team) = rebuild_queries::find_shadow_team_by_canonical_name(conn, &normalized)? {
        return Ok(team);
    }

    let birth_year = normalize::extract_birth_year(raw_name, current_season_year);
    let gender = normalize::extract_gender(raw_name);
    let now = Utc::now().naive_utc();

    rebuild_queries::insert_shadow_team(
        conn,
        NewShadowTeam {
            canonical_name: &normalized,
            display_name: raw_name,
            birth_year,
            birth_year_source: birth_year.map(|_| "parsed"),
            gender: gender.as_db_str(),
            gender_source: None,
            state: None,
            created_at: now,
            updated_at: now,
        },
    )
}

/// `validate-rebuild [--strict]` (spec.md §4.7, §6).
pub fn validate_rebuild(
    conn: &mut PgConnection,
    thresholds: &RebuildThresholds,
) -> Result<(RebuildReport, bool), QueryError> {
    let report = rebuild_queries::validate_rebuild(conn)?;
    let passed = report.passes(thresholds);
    Ok((report, passed))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapMode {
    DryRun,
    Execute,
    Rollback,
}

/// `swap --dry-run | --execute | --rollback` (spec.md §6, §4.7
/// `execute_swap`). Callers are expected to wrap `Execute`/`Rollback` in a
/// single transaction (`conn.transaction(...)`) so a failure anywhere in
/// the rename/constraint dance leaves production untouched.
pub fn execute_swap(
    conn: &mut PgConnection,
    mode: SwapMode,
    thresholds: &RebuildThresholds,
) -> Result<SwapOutcome, QueryError> {
    match mode {
        SwapMode::DryRun => {
            let (report, passed) = validate_rebuild(conn, thresholds)?;
            Ok(SwapOutcome::DryRun { report, would_pass: passed })
        }
        SwapMode::Execute => {
            let (report, passed) = validate_rebuild(conn, thresholds)?;
            if !passed {
                warn!("rebuild failed validation, refusing to swap: {report:?}");
                return Ok(SwapOutcome::ValidationFailed(report));
            }
            rebuild_queries::swap_shadow_into_production(conn)?;
            matchcore_db::views::refresh_all_views(conn)?;
            Ok(SwapOutcome::Swapped)
        }
        SwapMode::Rollback => {
            rebuild_queries::rollback_swap(conn)?;
            Ok(SwapOutcome::RolledBack)
        }
    }
}

#[derive(Debug)]
pub enum SwapOutcome {
    DryRun { report: RebuildReport, would_pass: bool },
    ValidationFailed(RebuildReport),
    Swapped,
    RolledBack,
}
