use crate::QueryError;
use crate::models::NewLeagueStanding;
use diesel::prelude::*;
use diesel::sql_types::{Int4, Int8, Nullable, Text};

/// One row per `(league_id, team_id, division)` (spec.md §3 "StagingStandings
/// ... analogous [lifecycle to StagingGame]"): a later scrape's standing for
/// the same team/division replaces the prior counts rather than appending a
/// new row. The conflict target mirrors the `coalesce(division, '')`
/// expression index in the migration -- Diesel's query builder can only
/// target a conflict on a plain column list, not an expression, so this goes
/// through `sql_query` like the other expression-indexed upserts in this
/// module (e.g. `teams_v2_identity_key`).
pub fn upsert_league_standing(
    conn: &mut PgConnection,
    row: &NewLeagueStanding,
) -> Result<usize, QueryError> {
    diesel::sql_query(
        "insert into prod.league_standings (league_id, team_id, division, wins, losses, draws, points) \
         values ($1, $2, $3, $4, $5, $6, $7) \
         on conflict (league_id, team_id, (coalesce(division, ''))) \
         do update set wins = excluded.wins, losses = excluded.losses, \
             draws = excluded.draws, points = excluded.points",
    )
    .bind::<Int8, _>(row.league_id)
    .bind::<Int8, _>(row.team_id)
    .bind::<Nullable<Text>, _>(row.division.as_deref())
    .bind::<Int4, _>(row.wins)
    .bind::<Int4, _>(row.losses)
    .bind::<Int4, _>(row.draws)
    .bind::<Int4, _>(row.points)
    .execute(conn)
}
