use crate::QueryError;
use crate::models::{DbShadowTeam, NewShadowMatch, NewShadowTeam};
use crate::production_schema::prod::{matches_v2_rebuild, teams_v2_rebuild};
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use log::info;

/// Component I: Rebuild/Swap Subsystem (spec.md §4.7). Shadow tables are
/// plain structural copies of their production counterparts, created and
/// dropped by hand-written DDL rather than Diesel's query builder -- Diesel
/// has no notion of `CREATE TABLE LIKE` or `ALTER TABLE ... RENAME`.
const SHADOW_TABLES: &[(&str, &str)] = &[
    ("prod.teams_v2", "prod.teams_v2_rebuild"),
    ("prod.matches_v2", "prod.matches_v2_rebuild"),
];

pub fn create_shadow_tables(conn: &mut PgConnection) -> Result<(), QueryError> {
    for (source, shadow) in SHADOW_TABLES {
        diesel::sql_query(format!(
            "drop table if exists {shadow}; \
             create table {shadow} (like {source} including all);"
        ))
        .execute(conn)?;
    }
    Ok(())
}

pub fn drop_shadow_tables(conn: &mut PgConnection) -> Result<(), QueryError> {
    for (_, shadow) in SHADOW_TABLES {
        diesel::sql_query(format!("drop table if exists {shadow};")).execute(conn)?;
    }
    Ok(())
}

/// Shadow-table counterparts of a handful of [`crate::queries::teams`]
/// lookups, used by the rebuild replay so it resolves team identity against
/// the shadow, never the live, teams table (spec.md §4.7 step 3: "Write to
/// shadow via a separate write-authorization token").
pub fn find_shadow_team_by_canonical_name(
    conn: &mut PgConnection,
    name: &str,
) -> Result<Option<DbShadowTeam>, QueryError> {
    use teams_v2_rebuild::dsl;

    dsl::teams_v2_rebuild
        .filter(dsl::canonical_name.eq(name))
        .select(DbShadowTeam::as_select())
        .first(conn)
        .optional()
}

pub fn insert_shadow_team(
    conn: &mut PgConnection,
    row: NewShadowTeam,
) -> Result<DbShadowTeam, QueryError> {
    use teams_v2_rebuild::dsl;

    diesel::insert_into(dsl::teams_v2_rebuild)
        .values(&row)
        .get_result(conn)
}

pub fn insert_shadow_match(
    conn: &mut PgConnection,
    row: NewShadowMatch,
) -> Result<usize, QueryError> {
    use matches_v2_rebuild::dsl;

    diesel::insert_into(dsl::matches_v2_rebuild)
        .values(&row)
        .on_conflict_do_nothing()
        .execute(conn)
}

fn scalar_count(conn: &mut PgConnection, sql: &str) -> Result<i64, QueryError> {
    #[derive(QueryableByName)]
    struct Count {
        #[diesel(sql_type = BigInt)]
        count: i64,
    }
    let row: Count = diesel::sql_query(sql).get_result(conn)?;
    Ok(row.count)
}

/// The thresholds `validate_rebuild` checks a shadow rebuild against before
/// a swap is allowed to proceed (spec.md §4.7 `validate_rebuild`).
#[derive(Debug, Clone, Copy)]
pub struct RebuildThresholds {
    pub min_team_coverage: f64,
    pub min_match_coverage: f64,
    pub min_source_match_key_coverage: f64,
}

impl Default for RebuildThresholds {
    fn default() -> Self {
        Self {
            min_team_coverage: 0.90,
            min_match_coverage: 0.95,
            min_source_match_key_coverage: 0.99,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RebuildReport {
    pub team_coverage: f64,
    pub match_coverage: f64,
    pub source_match_key_coverage: f64,
    pub duplicate_source_match_key_groups: i64,
    pub production_null_birth_year_rate: f64,
    pub rebuild_null_birth_year_rate: f64,
    pub production_null_gender_rate: f64,
    pub rebuild_null_gender_rate: f64,
}

impl RebuildReport {
    /// No regressions in NULL rates, all three coverage floors met, zero
    /// duplicate groups (spec.md §4.7 `validate_rebuild`).
    pub fn passes(&self, thresholds: &RebuildThresholds) -> bool {
        self.team_coverage >= thresholds.min_team_coverage
            && self.match_coverage >= thresholds.min_match_coverage
            && self.source_match_key_coverage >= thresholds.min_source_match_key_coverage
            && self.duplicate_source_match_key_groups == 0
            && self.rebuild_null_birth_year_rate <= self.production_null_birth_year_rate
            && self.rebuild_null_gender_rate <= self.production_null_gender_rate
    }
}

fn rate(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 { 0.0 } else { numerator as f64 / denominator as f64 }
}

pub fn validate_rebuild(conn: &mut PgConnection) -> Result<RebuildReport, QueryError> {
    let prod_teams = scalar_count(conn, "select count(*) as count from prod.teams_v2")?;
    let shadow_teams =
        scalar_count(conn, "select count(*) as count from prod.teams_v2_rebuild")?;
    let prod_matches = scalar_count(
        conn,
        "select count(*) as count from prod.matches_v2 where deleted_at is null",
    )?;
    let shadow_matches = scalar_count(
        conn,
        "select count(*) as count from prod.matches_v2_rebuild where deleted_at is null",
    )?;
    let staging_keys = scalar_count(
        conn,
        "select count(distinct source_match_key) as count from staging.staging_games",
    )?;
    let shadow_keys = scalar_count(
        conn,
        "select count(distinct source_match_key) as count from prod.matches_v2_rebuild",
    )?;
    let duplicate_groups = scalar_count(
        conn,
        "select count(*) as count from ( \
            select source_match_key from prod.matches_v2_rebuild \
            group by source_match_key having count(*) > 1 \
         ) dupes",
    )?;
    let prod_null_birth_year = scalar_count(
        conn,
        "select count(*) as count from prod.teams_v2 where birth_year is null",
    )?;
    let shadow_null_birth_year = scalar_count(
        conn,
        "select count(*) as count from prod.teams_v2_rebuild where birth_year is null",
    )?;
    let prod_null_gender = scalar_count(
        conn,
        "select count(*) as count from prod.teams_v2 where gender = 'unknown'",
    )?;
    let shadow_null_gender = scalar_count(
        conn,
        "select count(*) as count from prod.teams_v2_rebuild where gender = 'unknown'",
    )?;

    Ok(RebuildReport {
        team_coverage: rate(shadow_teams, prod_teams),
        match_coverage: rate(shadow_matches, prod_matches),
        source_match_key_coverage: rate(shadow_keys, staging_keys),
        duplicate_source_match_key_groups: duplicate_groups,
        production_null_birth_year_rate: rate(prod_null_birth_year, prod_teams),
        rebuild_null_birth_year_rate: rate(shadow_null_birth_year, shadow_teams),
        production_null_gender_rate: rate(prod_null_gender, prod_teams),
        rebuild_null_gender_rate: rate(shadow_null_gender, shadow_teams),
    })
}

/// `execute_swap --execute` (spec.md §4.7). Caller is responsible for
/// wrapping this in a transaction and for having already called
/// [`validate_rebuild`]; this function only performs the rename dance and
/// the final non-empty sanity check.
pub fn swap_shadow_into_production(conn: &mut PgConnection) -> Result<(), QueryError> {
    diesel::sql_query(
        "alter table prod.matches_v2 drop constraint if exists matches_v2_home_team_id_fkey; \
         alter table prod.matches_v2 drop constraint if exists matches_v2_away_team_id_fkey;",
    )
    .execute(conn)?;

    diesel::sql_query(
        "alter table prod.teams_v2 rename to teams_v2_backup; \
         alter table prod.matches_v2 rename to matches_v2_backup; \
         alter table prod.teams_v2_rebuild rename to teams_v2; \
         alter table prod.matches_v2_rebuild rename to matches_v2;",
    )
    .execute(conn)?;

    diesel::sql_query(
        "alter table prod.matches_v2 \
            add constraint matches_v2_home_team_id_fkey \
                foreign key (home_team_id) references prod.teams_v2 (id), \
            add constraint matches_v2_away_team_id_fkey \
                foreign key (away_team_id) references prod.teams_v2 (id); \
         alter table prod.matches_v2 \
            add constraint matches_v2_source_match_key_key unique (source_match_key);",
    )
    .execute(conn)?;

    let remaining = scalar_count(conn, "select count(*) as count from prod.teams_v2")?;
    if remaining == 0 {
        return Err(QueryError::RollbackTransaction);
    }

    info!("swap complete: production now serves the rebuilt tables");
    Ok(())
}

/// `execute_swap --rollback`: restore the pre-swap tables from their backup
/// copies. Only valid if a prior swap left `*_backup` tables in place.
pub fn rollback_swap(conn: &mut PgConnection) -> Result<(), QueryError> {
    diesel::sql_query(
        "alter table prod.matches_v2 drop constraint if exists matches_v2_home_team_id_fkey; \
         alter table prod.matches_v2 drop constraint if exists matches_v2_away_team_id_fkey; \
         alter table prod.teams_v2 rename to teams_v2_failed_rebuild; \
         alter table prod.matches_v2 rename to matches_v2_failed_rebuild; \
         alter table prod.teams_v2_backup rename to teams_v2; \
         alter table prod.matches_v2_backup rename to matches_v2; \
         alter table prod.matches_v2 \
            add constraint matches_v2_home_team_id_fkey \
                foreign key (home_team_id) references prod.teams_v2 (id), \
            add constraint matches_v2_away_team_id_fkey \
                foreign key (away_team_id) references prod.teams_v2 (id);",
    )
    .execute(conn)?;
    Ok(())
}
