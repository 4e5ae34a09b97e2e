use crate::QueryError;
use crate::models::{DbTeam, DbTeamAlias, NewTeam, NewTeamAlias};
use crate::production_schema::prod::{team_aliases, teams_v2};
use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_types::{Double, Nullable, Text};

pub fn find_alias(conn: &mut PgConnection, name: &str) -> Result<Option<DbTeamAlias>, QueryError> {
    use team_aliases::dsl;

    dsl::team_aliases
        .filter(dsl::alias_name.eq(name))
        .select(DbTeamAlias::as_select())
        .first(conn)
        .optional()
}

pub fn find_team_by_canonical_name(
    conn: &mut PgConnection,
    name: &str,
) -> Result<Option<DbTeam>, QueryError> {
    use teams_v2::dsl;

    dsl::teams_v2
        .filter(dsl::canonical_name.eq(name))
        .select(DbTeam::as_select())
        .first(conn)
        .optional()
}

pub fn get_team(conn: &mut PgConnection, id: i64) -> Result<DbTeam, QueryError> {
    use teams_v2::dsl;

    dsl::teams_v2
        .filter(dsl::id.eq(id))
        .select(DbTeam::as_select())
        .first(conn)
}

pub fn find_teams_by_ids(conn: &mut PgConnection, ids: &[i64]) -> Result<Vec<DbTeam>, QueryError> {
    use teams_v2::dsl;

    dsl::teams_v2
        .filter(dsl::id.eq_any(ids))
        .select(DbTeam::as_select())
        .load(conn)
}

/// Candidates sharing the first letter of the normalized name -- the index
/// the prefix-30/prefix-20 strategies (spec.md §4.3 steps 4-5) and the
/// suffix-stripped strategy (step 3) narrow down from before doing the more
/// expensive string comparison application-side.
pub fn find_teams_by_first_letter(
    conn: &mut PgConnection,
    first_letter: char,
) -> Result<Vec<DbTeam>, QueryError> {
    use teams_v2::dsl;

    let pattern = format!("{first_letter}%");
    dsl::teams_v2
        .filter(dsl::canonical_name.like(pattern))
        .select(DbTeam::as_select())
        .load(conn)
}

#[derive(Debug, QueryableByName)]
pub struct TrigramCandidate {
    #[diesel(embed)]
    pub team: DbTeamRow,
    #[diesel(sql_type = Double)]
    pub similarity: f64,
}

#[derive(Debug, QueryableByName)]
#[diesel(table_name = crate::production_schema::prod::teams_v2)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbTeamRow {
    pub id: i64,
    pub canonical_name: String,
    pub display_name: String,
    pub birth_year: Option<i32>,
    pub birth_year_source: Option<String>,
    pub gender: String,
    pub gender_source: Option<String>,
    pub state: Option<String>,
    pub elo_rating: f64,
    pub matches_played: i32,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub national_rank: Option<i32>,
    pub data_quality_score: i32,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl From<DbTeamRow> for DbTeam {
    fn from(row: DbTeamRow) -> Self {
        DbTeam {
            id: row.id,
            canonical_name: row.canonical_name,
            display_name: row.display_name,
            birth_year: row.birth_year,
            birth_year_source: row.birth_year_source,
            gender: row.gender,
            gender_source: row.gender_source,
            state: row.state,
            elo_rating: row.elo_rating,
            matches_played: row.matches_played,
            wins: row.wins,
            losses: row.losses,
            draws: row.draws,
            goals_for: row.goals_for,
            goals_against: row.goals_against,
            national_rank: row.national_rank,
            data_quality_score: row.data_quality_score,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Trigram-similarity candidates via Postgres's `pg_trgm` extension,
/// constrained to rows that share state/gender when the incoming row has
/// them (spec.md §4.3 strategy 6). The query text is static; every value,
/// including the optional state/gender filters, is bound rather than
/// interpolated -- a `NULL` bind paired with `$n is null or col = $n` opts a
/// filter out without changing the statement shape.
pub fn find_trigram_candidates(
    conn: &mut PgConnection,
    name: &str,
    state: Option<&str>,
    gender: Option<&str>,
    threshold: f64,
) -> Result<Vec<TrigramCandidate>, QueryError> {
    diesel::sql_query(
        "select *, similarity(canonical_name, $1) as similarity \
         from prod.teams_v2 \
         where similarity(canonical_name, $1) >= $2 \
           and ($3 is null or state = $3) \
           and ($4 is null or gender = $4) \
         order by similarity desc limit 25",
    )
    .bind::<Text, _>(name)
    .bind::<Double, _>(threshold)
    .bind::<Nullable<Text>, _>(state)
    .bind::<Nullable<Text>, _>(gender)
    .load(conn)
}

pub fn insert_team(conn: &mut PgConnection, new_team: NewTeam) -> Result<DbTeam, QueryError> {
    use teams_v2::dsl;

    diesel::insert_into(dsl::teams_v2)
        .values(&new_team)
        .get_result(conn)
}

pub fn insert_alias(conn: &mut PgConnection, alias: NewTeamAlias) -> Result<usize, QueryError> {
    use team_aliases::dsl;

    diesel::insert_into(dsl::team_aliases)
        .values(&alias)
        .on_conflict(dsl::alias_name)
        .do_nothing()
        .execute(conn)
}

pub fn set_national_rank(
    conn: &mut PgConnection,
    team_id: i64,
    rank: i32,
) -> Result<usize, QueryError> {
    use teams_v2::dsl;

    diesel::update(dsl::teams_v2.filter(dsl::id.eq(team_id)))
        .set((dsl::national_rank.eq(rank), dsl::updated_at.eq(Utc::now().naive_utc())))
        .execute(conn)
}

pub fn teams_with_rank_but_no_matches(
    conn: &mut PgConnection,
) -> Result<Vec<DbTeam>, QueryError> {
    use teams_v2::dsl;

    dsl::teams_v2
        .filter(dsl::national_rank.is_not_null())
        .filter(dsl::matches_played.eq(0))
        .select(DbTeam::as_select())
        .load(conn)
}

/// Every canonical team, for the periodic duplicate-prefix fixer (spec.md
/// §3 "display_name never contains an immediate repeated prefix", §8
/// scenario 4) to scan offline. `teams_v2` is expected to stay in the tens
/// of thousands of rows for this system's domain, so a full load is
/// simpler than a paginated cursor and matches how `weekly_reconciliation`
/// already loads its candidate set.
pub fn all_teams(conn: &mut PgConnection) -> Result<Vec<DbTeam>, QueryError> {
    use teams_v2::dsl;

    dsl::teams_v2.select(DbTeam::as_select()).load(conn)
}

/// Rewrites a team's `canonical_name`/`display_name` in place -- used by the
/// duplicate-prefix fixer when collapsing a name doesn't collide with an
/// existing canonical team.
pub fn rename_team(
    conn: &mut PgConnection,
    team_id: i64,
    canonical_name: &str,
    display_name: &str,
) -> Result<usize, QueryError> {
    use teams_v2::dsl;

    diesel::update(dsl::teams_v2.filter(dsl::id.eq(team_id)))
        .set((
            dsl::canonical_name.eq(canonical_name),
            dsl::display_name.eq(display_name),
            dsl::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)
}
