use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::prelude::*;

// ───────────────────────── staging ─────────────────────────

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::staging_schema::staging::staging_games)]
pub struct NewStagingGame<'a> {
    pub match_date: Option<NaiveDate>,
    pub match_time: Option<NaiveTime>,
    pub home_team_name: &'a str,
    pub away_team_name: &'a str,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub event_name: Option<&'a str>,
    pub event_id: Option<&'a str>,
    pub venue_name: Option<&'a str>,
    pub field_name: Option<&'a str>,
    pub division: Option<&'a str>,
    pub source_platform: &'a str,
    pub source_match_key: &'a str,
    pub raw_data: &'a serde_json::Value,
    pub scraped_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::staging_schema::staging::staging_games)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbStagingGame {
    pub id: i64,
    pub match_date: Option<NaiveDate>,
    pub match_time: Option<NaiveTime>,
    pub home_team_name: String,
    pub away_team_name: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub event_name: Option<String>,
    pub event_id: Option<String>,
    pub venue_name: Option<String>,
    pub field_name: Option<String>,
    pub division: Option<String>,
    pub source_platform: String,
    pub source_match_key: String,
    pub raw_data: serde_json::Value,
    pub processed: bool,
    pub processed_at: Option<NaiveDateTime>,
    pub error_message: Option<String>,
    pub scraped_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::staging_schema::staging::staging_events)]
pub struct NewStagingEvent<'a> {
    pub event_name: &'a str,
    pub event_type: Option<&'a str>,
    pub source_platform: &'a str,
    pub source_event_id: &'a str,
    pub state: Option<&'a str>,
    pub raw_data: &'a serde_json::Value,
    pub scraped_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::staging_schema::staging::staging_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbStagingEvent {
    pub id: i64,
    pub event_name: String,
    pub event_type: Option<String>,
    pub source_platform: String,
    pub source_event_id: String,
    pub state: Option<String>,
    pub raw_data: serde_json::Value,
    pub processed: bool,
    pub scraped_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::staging_schema::staging::staging_standings)]
pub struct NewStagingStanding<'a> {
    pub team_name: &'a str,
    pub team_source_id: Option<&'a str>,
    pub division: Option<&'a str>,
    pub age_group: Option<&'a str>,
    pub gender: Option<&'a str>,
    pub event_id: Option<&'a str>,
    pub source_platform: &'a str,
    pub wins: Option<i32>,
    pub losses: Option<i32>,
    pub draws: Option<i32>,
    pub points: Option<i32>,
    pub raw_data: &'a serde_json::Value,
    pub scraped_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::staging_schema::staging::staging_standings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbStagingStanding {
    pub id: i64,
    pub team_name: String,
    pub team_source_id: Option<String>,
    pub division: Option<String>,
    pub age_group: Option<String>,
    pub gender: Option<String>,
    pub event_id: Option<String>,
    pub source_platform: String,
    pub wins: Option<i32>,
    pub losses: Option<i32>,
    pub draws: Option<i32>,
    pub points: Option<i32>,
    pub raw_data: serde_json::Value,
    pub processed: bool,
    pub processed_at: Option<NaiveDateTime>,
    pub error_message: Option<String>,
    pub scraped_at: NaiveDateTime,
}

// ───────────────────────── teams ─────────────────────────

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::production_schema::prod::teams_v2)]
pub struct NewTeam<'a> {
    pub canonical_name: &'a str,
    pub display_name: &'a str,
    pub birth_year: Option<i32>,
    pub birth_year_source: Option<&'a str>,
    pub gender: &'a str,
    pub gender_source: Option<&'a str>,
    pub state: Option<&'a str>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::production_schema::prod::teams_v2)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbTeam {
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
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::production_schema::prod::team_aliases)]
pub struct NewTeamAlias<'a> {
    pub alias_name: &'a str,
    pub team_id: i64,
    pub source: &'a str,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::production_schema::prod::team_aliases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbTeamAlias {
    pub id: i64,
    pub alias_name: String,
    pub team_id: i64,
    pub source: String,
    pub created_at: NaiveDateTime,
}

// ───────────────────────── events ─────────────────────────

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::production_schema::prod::leagues)]
pub struct NewLeague<'a> {
    pub name: &'a str,
    pub source_event_id: &'a str,
    pub source_platform: &'a str,
    pub state: Option<&'a str>,
    pub season: Option<&'a str>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::production_schema::prod::leagues)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbLeague {
    pub id: i64,
    pub name: String,
    pub source_event_id: String,
    pub source_platform: String,
    pub state: Option<String>,
    pub season: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::production_schema::prod::tournaments)]
pub struct NewTournament<'a> {
    pub name: &'a str,
    pub source_event_id: &'a str,
    pub source_platform: &'a str,
    pub state: Option<&'a str>,
    pub season: Option<&'a str>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::production_schema::prod::tournaments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbTournament {
    pub id: i64,
    pub name: String,
    pub source_event_id: String,
    pub source_platform: String,
    pub state: Option<String>,
    pub season: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

// ───────────────────────── league standings ─────────────────────────

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::production_schema::prod::league_standings)]
pub struct NewLeagueStanding {
    pub league_id: i64,
    pub team_id: i64,
    pub division: Option<String>,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
    pub points: i32,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::production_schema::prod::league_standings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbLeagueStanding {
    pub id: i64,
    pub league_id: i64,
    pub team_id: i64,
    pub division: Option<String>,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
    pub points: i32,
}

// ───────────────────────── matches ─────────────────────────

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::production_schema::prod::matches_v2)]
pub struct NewMatch<'a> {
    pub match_date: NaiveDate,
    pub match_time: Option<NaiveTime>,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub league_id: Option<i64>,
    pub tournament_id: Option<i64>,
    pub venue: Option<&'a str>,
    pub source_platform: &'a str,
    pub source_match_key: &'a str,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::production_schema::prod::matches_v2)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbMatch {
    pub id: i64,
    pub match_date: NaiveDate,
    pub match_time: Option<NaiveTime>,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub league_id: Option<i64>,
    pub tournament_id: Option<i64>,
    pub venue: Option<String>,
    pub source_platform: String,
    pub source_match_key: String,
    pub deleted_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ───────────────────────── rebuild shadow tables ─────────────────────────
// Structurally identical to teams_v2/matches_v2 (spec.md §4.7); separate
// structs because Diesel's `Insertable`/`Queryable` derives bind to one
// table via `table_name` and the shadow tables are distinct tables, not an
// alias of the production ones.

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::production_schema::prod::teams_v2_rebuild)]
pub struct NewShadowTeam<'a> {
    pub canonical_name: &'a str,
    pub display_name: &'a str,
    pub birth_year: Option<i32>,
    pub birth_year_source: Option<&'a str>,
    pub gender: &'a str,
    pub gender_source: Option<&'a str>,
    pub state: Option<&'a str>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::production_schema::prod::teams_v2_rebuild)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbShadowTeam {
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
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::production_schema::prod::matches_v2_rebuild)]
pub struct NewShadowMatch<'a> {
    pub match_date: NaiveDate,
    pub match_time: Option<NaiveTime>,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub league_id: Option<i64>,
    pub tournament_id: Option<i64>,
    pub venue: Option<&'a str>,
    pub source_platform: &'a str,
    pub source_match_key: &'a str,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ───────────────────────── bookkeeping ─────────────────────────

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::production_schema::prod::ingest_runs)]
pub struct NewIngestRun<'a> {
    pub component: &'a str,
    pub started_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::production_schema::prod::ingest_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbIngestRun {
    pub id: i64,
    pub component: String,
    pub started_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
    pub aborted_at: Option<NaiveDateTime>,
    pub stats_json: Option<serde_json::Value>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::production_schema::prod::audit_log)]
pub struct NewAuditLogEntry<'a> {
    pub table_name: &'a str,
    pub action: &'a str,
    pub record_id: i64,
    pub old_data: Option<&'a serde_json::Value>,
    pub new_data: Option<&'a serde_json::Value>,
    pub changed_at: NaiveDateTime,
}
