// @generated-by-hand to match the embedded Diesel migrations under `migrations/`.
// Staging tables are append-only: scrapers insert, the Promotion Pipeline
// flips `processed`, nothing else ever touches them.

pub mod staging {
    diesel::table! {
        staging.staging_games (id) {
            id -> Int8,
            match_date -> Nullable<Date>,
            match_time -> Nullable<Time>,
            home_team_name -> Text,
            away_team_name -> Text,
            home_score -> Nullable<Int4>,
            away_score -> Nullable<Int4>,
            event_name -> Nullable<Text>,
            event_id -> Nullable<Text>,
            venue_name -> Nullable<Text>,
            field_name -> Nullable<Text>,
            division -> Nullable<Text>,
            source_platform -> Text,
            source_match_key -> Text,
            raw_data -> Jsonb,
            processed -> Bool,
            processed_at -> Nullable<Timestamp>,
            error_message -> Nullable<Text>,
            scraped_at -> Timestamp,
        }
    }

    diesel::table! {
        staging.staging_standings (id) {
            id -> Int8,
            team_name -> Text,
            team_source_id -> Nullable<Text>,
            division -> Nullable<Text>,
            age_group -> Nullable<Text>,
            gender -> Nullable<Text>,
            event_id -> Nullable<Text>,
            source_platform -> Text,
            wins -> Nullable<Int4>,
            losses -> Nullable<Int4>,
            draws -> Nullable<Int4>,
            points -> Nullable<Int4>,
            raw_data -> Jsonb,
            processed -> Bool,
            processed_at -> Nullable<Timestamp>,
            error_message -> Nullable<Text>,
            scraped_at -> Timestamp,
        }
    }

    diesel::table! {
        staging.staging_events (id) {
            id -> Int8,
            event_name -> Text,
            event_type -> Nullable<Text>,
            source_platform -> Text,
            source_event_id -> Text,
            state -> Nullable<Text>,
            raw_data -> Jsonb,
            processed -> Bool,
            scraped_at -> Timestamp,
        }
    }
}
