use crate::QueryError;
use crate::models::{DbLeague, DbTournament, NewLeague, NewTournament};
use crate::production_schema::prod::{leagues, tournaments};
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sql_types::{Date, Text};

/// Tagged result of an Event Resolver lookup/create (spec.md §4.4). Leagues
/// and tournaments live in separate tables so this enum, not a shared
/// discriminator column, is what tells a caller which one it got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    League,
    Tournament,
}

pub fn find_league(
    conn: &mut PgConnection,
    source_event_id: &str,
    source_platform: &str,
) -> Result<Option<DbLeague>, QueryError> {
    use leagues::dsl;

    dsl::leagues
        .filter(dsl::source_event_id.eq(source_event_id))
        .filter(dsl::source_platform.eq(source_platform))
        .select(DbLeague::as_select())
        .first(conn)
        .optional()
}

pub fn find_tournament(
    conn: &mut PgConnection,
    source_event_id: &str,
    source_platform: &str,
) -> Result<Option<DbTournament>, QueryError> {
    use tournaments::dsl;

    dsl::tournaments
        .filter(dsl::source_event_id.eq(source_event_id))
        .filter(dsl::source_platform.eq(source_platform))
        .select(DbTournament::as_select())
        .first(conn)
        .optional()
}

pub fn insert_league(conn: &mut PgConnection, row: NewLeague) -> Result<DbLeague, QueryError> {
    use leagues::dsl;

    diesel::insert_into(dsl::leagues).values(&row).get_result(conn)
}

pub fn insert_tournament(
    conn: &mut PgConnection,
    row: NewTournament,
) -> Result<DbTournament, QueryError> {
    use tournaments::dsl;

    diesel::insert_into(dsl::tournaments)
        .values(&row)
        .get_result(conn)
}

pub fn get_league(conn: &mut PgConnection, id: i64) -> Result<DbLeague, QueryError> {
    use leagues::dsl;

    dsl::leagues
        .filter(dsl::id.eq(id))
        .select(DbLeague::as_select())
        .first(conn)
}

pub fn get_tournament(conn: &mut PgConnection, id: i64) -> Result<DbTournament, QueryError> {
    use tournaments::dsl;

    dsl::tournaments
        .filter(dsl::id.eq(id))
        .select(DbTournament::as_select())
        .first(conn)
}

/// `(source_platform, source_event_id)` of every event with at least one
/// match dated inside `[window_start, window_end]` -- what
/// `daily_active_events_sync` (spec.md §4.8) hands back to the Scraper
/// Engine for re-scraping.
#[derive(Debug, Clone, QueryableByName)]
pub struct ActiveEventRef {
    #[diesel(sql_type = Text)]
    pub source_platform: String,
    #[diesel(sql_type = Text)]
    pub source_event_id: String,
}

pub fn active_event_refs_in_window(
    conn: &mut PgConnection,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Result<Vec<ActiveEventRef>, QueryError> {
    diesel::sql_query(
        "select distinct l.source_platform, l.source_event_id \
         from prod.matches_v2 m join prod.leagues l on m.league_id = l.id \
         where m.match_date between $1 and $2 and m.deleted_at is null \
         union \
         select distinct t.source_platform, t.source_event_id \
         from prod.matches_v2 m join prod.tournaments t on m.tournament_id = t.id \
         where m.match_date between $1 and $2 and m.deleted_at is null",
    )
    .bind::<Date, _>(window_start)
    .bind::<Date, _>(window_end)
    .load(conn)
}
