// @generated-by-hand to match the embedded Diesel migrations under `migrations/`.
// Every table here is writable only through a session that has called
// `authorize_pipeline_write()` -- enforced by a trigger, not by Rust (see
// `crate::gate`).

pub mod prod {
    diesel::table! {
        prod.teams_v2 (id) {
            id -> Int8,
            canonical_name -> Text,
            display_name -> Text,
            birth_year -> Nullable<Int4>,
            birth_year_source -> Nullable<Text>,
            gender -> Text,
            gender_source -> Nullable<Text>,
            state -> Nullable<Text>,
            elo_rating -> Float8,
            matches_played -> Int4,
            wins -> Int4,
            losses -> Int4,
            draws -> Int4,
            goals_for -> Int4,
            goals_against -> Int4,
            national_rank -> Nullable<Int4>,
            data_quality_score -> Int4,
            created_at -> Timestamp,
            updated_at -> Timestamp,
        }
    }

    diesel::table! {
        prod.team_aliases (id) {
            id -> Int8,
            alias_name -> Text,
            team_id -> Int8,
            source -> Text,
            created_at -> Timestamp,
        }
    }

    diesel::table! {
        prod.leagues (id) {
            id -> Int8,
            name -> Text,
            source_event_id -> Text,
            source_platform -> Text,
            state -> Nullable<Text>,
            season -> Nullable<Text>,
            start_date -> Nullable<Date>,
            end_date -> Nullable<Date>,
        }
    }

    diesel::table! {
        prod.tournaments (id) {
            id -> Int8,
            name -> Text,
            source_event_id -> Text,
            source_platform -> Text,
            state -> Nullable<Text>,
            season -> Nullable<Text>,
            start_date -> Nullable<Date>,
            end_date -> Nullable<Date>,
        }
    }

    diesel::table! {
        prod.matches_v2 (id) {
            id -> Int8,
            match_date -> Date,
            match_time -> Nullable<Time>,
            home_team_id -> Int8,
            away_team_id -> Int8,
            home_score -> Nullable<Int4>,
            away_score -> Nullable<Int4>,
            league_id -> Nullable<Int8>,
            tournament_id -> Nullable<Int8>,
            venue -> Nullable<Text>,
            source_platform -> Text,
            source_match_key -> Text,
            deleted_at -> Nullable<Timestamp>,
            created_at -> Timestamp,
            updated_at -> Timestamp,
        }
    }

    diesel::table! {
        prod.clubs (id) {
            id -> Int8,
            name -> Text,
            state -> Nullable<Text>,
        }
    }

    diesel::table! {
        prod.venues (id) {
            id -> Int8,
            name -> Text,
            city -> Nullable<Text>,
            state -> Nullable<Text>,
        }
    }

    diesel::table! {
        prod.seasons (id) {
            id -> Int8,
            label -> Text,
            start_date -> Date,
            end_date -> Date,
        }
    }

    diesel::table! {
        prod.schedules (id) {
            id -> Int8,
            event_kind -> Text,
            event_id -> Int8,
            match_id -> Nullable<Int8>,
            scheduled_date -> Date,
        }
    }

    diesel::table! {
        prod.league_standings (id) {
            id -> Int8,
            league_id -> Int8,
            team_id -> Int8,
            division -> Nullable<Text>,
            wins -> Int4,
            losses -> Int4,
            draws -> Int4,
            points -> Int4,
        }
    }

    diesel::table! {
        prod.audit_log (id) {
            id -> Int8,
            table_name -> Text,
            action -> Text,
            record_id -> Int8,
            old_data -> Nullable<Jsonb>,
            new_data -> Nullable<Jsonb>,
            changed_at -> Timestamp,
        }
    }

    diesel::table! {
        prod.ingest_runs (id) {
            id -> Int8,
            component -> Text,
            started_at -> Timestamp,
            finished_at -> Nullable<Timestamp>,
            aborted_at -> Nullable<Timestamp>,
            stats_json -> Nullable<Jsonb>,
        }
    }

    // Shadow tables the Rebuild/Swap Subsystem writes to (spec.md §4.7).
    // Structurally identical to their `_v2` counterparts; created/dropped
    // by hand-written DDL (`queries::rebuild`) since Diesel's `table!`
    // macro only describes a table's shape to the query builder, it
    // doesn't create one.
    diesel::table! {
        prod.teams_v2_rebuild (id) {
            id -> Int8,
            canonical_name -> Text,
            display_name -> Text,
            birth_year -> Nullable<Int4>,
            birth_year_source -> Nullable<Text>,
            gender -> Text,
            gender_source -> Nullable<Text>,
            state -> Nullable<Text>,
            elo_rating -> Float8,
            matches_played -> Int4,
            wins -> Int4,
            losses -> Int4,
            draws -> Int4,
            goals_for -> Int4,
            goals_against -> Int4,
            national_rank -> Nullable<Int4>,
            data_quality_score -> Int4,
            created_at -> Timestamp,
            updated_at -> Timestamp,
        }
    }

    diesel::table! {
        prod.matches_v2_rebuild (id) {
            id -> Int8,
            match_date -> Date,
            match_time -> Nullable<Time>,
            home_team_id -> Int8,
            away_team_id -> Int8,
            home_score -> Nullable<Int4>,
            away_score -> Nullable<Int4>,
            league_id -> Nullable<Int8>,
            tournament_id -> Nullable<Int8>,
            venue -> Nullable<Text>,
            source_platform -> Text,
            source_match_key -> Text,
            deleted_at -> Nullable<Timestamp>,
            created_at -> Timestamp,
            updated_at -> Timestamp,
        }
    }

    diesel::joinable!(team_aliases -> teams_v2 (team_id));
    diesel::joinable!(league_standings -> leagues (league_id));
    diesel::joinable!(league_standings -> teams_v2 (team_id));
    diesel::allow_tables_to_appear_in_same_query!(teams_v2, team_aliases);
    diesel::allow_tables_to_appear_in_same_query!(leagues, tournaments, matches_v2);
}
