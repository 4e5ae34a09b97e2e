use crate::QueryError;
use crate::models::{
    DbStagingEvent, DbStagingGame, DbStagingStanding, NewStagingEvent, NewStagingGame,
    NewStagingStanding,
};
use crate::staging_schema::staging::{staging_events, staging_games, staging_standings};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use itertools::Itertools;

/// Insert a batch of staged games, first-write-wins on `source_match_key`
/// within a single scraper event (spec.md §4.2 step 4), `ON CONFLICT DO
/// NOTHING` across runs (step 5).
pub fn insert_staging_games(
    conn: &mut PgConnection,
    rows: &[NewStagingGame],
) -> Result<usize, QueryError> {
    use staging_games::dsl;

    diesel::insert_into(dsl::staging_games)
        .values(rows)
        .on_conflict(dsl::source_match_key)
        .do_nothing()
        .execute(conn)
}

/// Register an event in `staging_events`; duplicates on
/// `(source_event_id, source_platform)` are ignored (spec.md §4.2 step 6).
pub fn insert_staging_event(
    conn: &mut PgConnection,
    row: &NewStagingEvent,
) -> Result<usize, QueryError> {
    use staging_events::dsl;

    diesel::insert_into(dsl::staging_events)
        .values(row)
        .on_conflict_do_nothing()
        .execute(conn)
}

/// Pull a batch of unprocessed staging rows ordered by `scraped_at`, the
/// unit of work for one iteration of the Promotion Pipeline (spec.md §4.5
/// step 1).
pub fn get_unprocessed_game_batch(
    conn: &mut PgConnection,
    batch_size: i64,
) -> Result<Vec<DbStagingGame>, QueryError> {
    use staging_games::dsl;

    dsl::staging_games
        .filter(dsl::processed.eq(false))
        .order_by(dsl::scraped_at.asc())
        .limit(batch_size)
        .select(DbStagingGame::as_select())
        .load(conn)
}

/// Stream *every* staging row, processed or not -- the Rebuild Subsystem
/// (Component I) replays the full history, not just the unprocessed tail.
pub fn get_all_games_ordered(conn: &mut PgConnection) -> Result<Vec<DbStagingGame>, QueryError> {
    use staging_games::dsl;

    dsl::staging_games
        .order_by(dsl::scraped_at.asc())
        .select(DbStagingGame::as_select())
        .load(conn)
}

pub fn count_staging_games(conn: &mut PgConnection) -> Result<i64, QueryError> {
    use staging_games::dsl;

    dsl::staging_games.count().get_result(conn)
}

/// Flip `processed` for a batch of rows, recording a reason for any row
/// that was dropped instead of promoted. `processed` is monotone: this never
/// clears the flag (spec.md §8 invariant).
pub fn mark_games_processed(
    conn: &mut PgConnection,
    outcomes: &[(i64, Option<String>)],
) -> Result<usize, QueryError> {
    use staging_games::dsl;

    let now: NaiveDateTime = Utc::now().naive_utc();
    let mut total = 0;
    for (id, error_message) in outcomes {
        total += diesel::update(dsl::staging_games.filter(dsl::id.eq(id)))
            .set((
                dsl::processed.eq(true),
                dsl::processed_at.eq(now),
                dsl::error_message.eq(error_message.as_deref()),
            ))
            .execute(conn)?;
    }
    Ok(total)
}

pub fn distinct_unprocessed_event_ids(
    conn: &mut PgConnection,
) -> Result<Vec<Option<String>>, QueryError> {
    use staging_games::dsl;

    dsl::staging_games
        .filter(dsl::processed.eq(false))
        .select(dsl::event_id)
        .distinct()
        .load(conn)
        .map(|ids: Vec<Option<String>>| ids.into_iter().unique().collect())
}

pub fn get_unprocessed_events(conn: &mut PgConnection) -> Result<Vec<DbStagingEvent>, QueryError> {
    use staging_events::dsl;

    dsl::staging_events
        .filter(dsl::processed.eq(false))
        .select(DbStagingEvent::as_select())
        .load(conn)
}

/// `staging_standings`: analogous lifecycle to `staging_games` (spec.md §3
/// "StagingStandings ... analogous"), so the insert/batch/mark functions
/// below mirror their `staging_games` counterparts one-for-one.
pub fn insert_staging_standings(
    conn: &mut PgConnection,
    rows: &[NewStagingStanding],
) -> Result<usize, QueryError> {
    use staging_standings::dsl;

    diesel::insert_into(dsl::staging_standings).values(rows).execute(conn)
}

pub fn get_unprocessed_standing_batch(
    conn: &mut PgConnection,
    batch_size: i64,
) -> Result<Vec<DbStagingStanding>, QueryError> {
    use staging_standings::dsl;

    dsl::staging_standings
        .filter(dsl::processed.eq(false))
        .order_by(dsl::scraped_at.asc())
        .limit(batch_size)
        .select(DbStagingStanding::as_select())
        .load(conn)
}

pub fn mark_standings_processed(
    conn: &mut PgConnection,
    outcomes: &[(i64, Option<String>)],
) -> Result<usize, QueryError> {
    use staging_standings::dsl;

    let now: NaiveDateTime = Utc::now().naive_utc();
    let mut total = 0;
    for (id, error_message) in outcomes {
        total += diesel::update(dsl::staging_standings.filter(dsl::id.eq(id)))
            .set((
                dsl::processed.eq(true),
                dsl::processed_at.eq(now),
                dsl::error_message.eq(error_message.as_deref()),
            ))
            .execute(conn)?;
    }
    Ok(total)
}
