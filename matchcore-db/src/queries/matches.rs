use crate::QueryError;
use crate::models::{DbMatch, NewMatch};
use crate::production_schema::prod::matches_v2;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;

/// Bulk-upsert a sub-batch of candidate matches (spec.md §4.5 step 5). A
/// conflict on `source_match_key` updates the mutable fields a later scrape
/// can legitimately change -- score and date -- and fills `league_id`/
/// `tournament_id` only if the existing row doesn't already have one, so a
/// link earned by the Event-Linkage Inferrer is never clobbered by a rescrape
/// that didn't see it.
pub fn upsert_matches(conn: &mut PgConnection, rows: &[NewMatch]) -> Result<usize, QueryError> {
    use matches_v2::dsl;

    diesel::insert_into(dsl::matches_v2)
        .values(rows)
        .on_conflict(dsl::source_match_key)
        .do_update()
        .set((
            dsl::home_score.eq(excluded(dsl::home_score)),
            dsl::away_score.eq(excluded(dsl::away_score)),
            dsl::match_date.eq(excluded(dsl::match_date)),
            dsl::league_id.eq(diesel::dsl::sql::<diesel::sql_types::Nullable<diesel::sql_types::Int8>>(
                "coalesce(matches_v2.league_id, excluded.league_id)",
            )),
            dsl::tournament_id.eq(diesel::dsl::sql::<diesel::sql_types::Nullable<diesel::sql_types::Int8>>(
                "coalesce(matches_v2.tournament_id, excluded.tournament_id)",
            )),
            dsl::updated_at.eq(Utc::now().naive_utc()),
        ))
        .filter(dsl::deleted_at.is_null())
        .execute(conn)
}

/// Matches with both teams linked but no event (spec.md §4.6 input set).
pub fn unlinked_matches(conn: &mut PgConnection) -> Result<Vec<DbMatch>, QueryError> {
    use matches_v2::dsl;

    dsl::matches_v2
        .filter(dsl::league_id.is_null())
        .filter(dsl::tournament_id.is_null())
        .filter(dsl::deleted_at.is_null())
        .select(DbMatch::as_select())
        .load(conn)
}

/// A team's linked matches -- the raw material the Event-Linkage Inferrer
/// reduces into an "event history" of `(kind, event_id, min_date, max_date)`
/// per team (spec.md §4.6 step 2).
pub fn linked_matches_for_team(
    conn: &mut PgConnection,
    team_id: i64,
) -> Result<Vec<DbMatch>, QueryError> {
    use matches_v2::dsl;

    dsl::matches_v2
        .filter(dsl::deleted_at.is_null())
        .filter(
            dsl::home_team_id
                .eq(team_id)
                .or(dsl::away_team_id.eq(team_id)),
        )
        .filter(dsl::league_id.is_not_null().or(dsl::tournament_id.is_not_null()))
        .select(DbMatch::as_select())
        .load(conn)
}

/// One inferred link, applied in bulk by [`apply_links`]. Carries
/// `source_match_key` alongside the id purely so callers (tests, CLI
/// summaries) can report which match was linked without a round trip back
/// to the database.
pub struct InferredLink {
    pub match_id: i64,
    pub source_match_key: String,
    pub league_id: Option<i64>,
    pub tournament_id: Option<i64>,
}

pub fn apply_links(conn: &mut PgConnection, links: &[InferredLink]) -> Result<usize, QueryError> {
    use matches_v2::dsl;

    let now = Utc::now().naive_utc();
    let mut total = 0;
    for link in links {
        total += diesel::update(dsl::matches_v2.filter(dsl::id.eq(link.match_id)))
            .set((
                dsl::league_id.eq(link.league_id),
                dsl::tournament_id.eq(link.tournament_id),
                dsl::updated_at.eq(now),
            ))
            .execute(conn)?;
    }
    Ok(total)
}

pub fn matches_touching_event_window(
    conn: &mut PgConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DbMatch>, QueryError> {
    use matches_v2::dsl;

    dsl::matches_v2
        .filter(dsl::match_date.between(from, to))
        .filter(dsl::deleted_at.is_null())
        .select(DbMatch::as_select())
        .load(conn)
}

pub fn count_matches(conn: &mut PgConnection) -> Result<i64, QueryError> {
    use matches_v2::dsl;

    dsl::matches_v2
        .filter(dsl::deleted_at.is_null())
        .count()
        .get_result(conn)
}

pub fn count_duplicate_source_match_keys(conn: &mut PgConnection) -> Result<i64, QueryError> {
    #[derive(QueryableByName)]
    struct Count {
        #[diesel(sql_type = diesel::sql_types::BigInt)]
        count: i64,
    }

    let result: Count = diesel::sql_query(
        "select count(*) as count from ( \
            select source_match_key from prod.matches_v2 \
            where deleted_at is null \
            group by source_match_key having count(*) > 1 \
         ) dupes",
    )
    .get_result(conn)?;

    Ok(result.count)
}
