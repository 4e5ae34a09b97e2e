//! The six concrete end-to-end scenarios in spec.md §8 ("seed the test
//! suite"). Each needs a live Postgres database -- set `DATABASE_URL` to run
//! them; without it every test prints a skip notice and returns.

mod support;

use chrono::{NaiveDate, Utc};
use matchcore_db::gate;
use matchcore_db::models::{NewLeague, NewStagingGame, NewTeam, NewTeamAlias};
use matchcore_db::queries::{events, staging, teams};
use matchcore_db::Connection;
use matchcore_pipeline::adapter::{
    AdapterEvent, AdapterTechnology, DataPolicy, Discovery, SourceAdapter, StagedMatch,
};
use matchcore_pipeline::config::{DataPolicyConfig, PromotionConfig};
use matchcore_pipeline::engine::ScraperEngine;
use matchcore_pipeline::normalize::Gender;
use matchcore_pipeline::resolver::{self, ResolveInput, ResolverConfig};
use matchcore_pipeline::{linkage, promotion};
use matchcore_fetch::{Fetcher, RateController, RateLimiting, RetryLadder};
use std::sync::Arc;
use std::time::Duration;

const CURRENT_SEASON_YEAR: i32 = 2026;

fn resolver_config() -> ResolverConfig {
    ResolverConfig { trigram_threshold: 0.75, current_season_year: CURRENT_SEASON_YEAR }
}

fn build_adapter(id: &str, matches: Vec<StagedMatch>) -> SourceAdapter {
    let matches = Arc::new(matches);
    SourceAdapter {
        id: id.to_string(),
        name: id.to_string(),
        base_url: "https://example.invalid".to_string(),
        technology: AdapterTechnology::Http,
        rate_limiting: RateLimiting::default(),
        user_agents: vec!["matchcore-test/1.0".to_string()],
        data_policy: DataPolicy {
            min_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            max_future_days: 365,
            max_events_per_run: 10,
        },
        discovery: Discovery::Static(vec![AdapterEvent {
            event_id: "ev1".to_string(),
            event_name: "Test League".to_string(),
        }]),
        scrape_event: Arc::new(move |_fetcher, _event| {
            let matches = matches.clone();
            Box::pin(async move { Ok((*matches).clone()) })
        }),
    }
}

fn build_fetcher(adapter: &SourceAdapter) -> Arc<Fetcher> {
    let rate = Arc::new(RateController::new(adapter.rate_limiting));
    Arc::new(Fetcher::new(
        adapter.user_agents.clone(),
        RetryLadder::default(),
        rate,
        Duration::from_secs(5),
        std::num::NonZero::new(3).unwrap(),
    ))
}

/// Scenario 1 (spec.md §8): the scraper inserts exactly one staged match,
/// lower-cased match key, unprocessed.
#[tokio::test]
async fn scraper_inserts_new_matches() {
    let Some(mut conn) = support::connect() else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let suffix = support::unique_suffix();
    let platform = format!("testsrc-{suffix}");
    let staged = StagedMatch {
        match_date: NaiveDate::from_ymd_opt(2026, 1, 15),
        match_time: None,
        home_team_name: "FC Blue 2015".to_string(),
        away_team_name: "FC Red 2015".to_string(),
        home_score: Some(2),
        away_score: Some(1),
        event_name: Some("Test League".to_string()),
        event_id: Some("EV1".to_string()),
        venue_name: None,
        field_name: None,
        division: None,
        match_key: format!("{platform}-ev1-m1"),
        raw_data: serde_json::json!({"home": "FC Blue 2015", "away": "FC Red 2015"}),
    };

    let mut adapter = build_adapter(&format!("adapter-{suffix}"), vec![staged]);
    adapter.base_url = format!("https://example.invalid/{platform}");
    let fetcher = build_fetcher(&adapter);
    let config = matchcore_pipeline::config::ScraperConfig {
        checkpoint_dir: std::env::temp_dir().to_string_lossy().to_string(),
        ..Default::default()
    };

    let pool = matchcore_db::pool::get_pool(2).expect("pool");
    let engine = ScraperEngine::new(pool, config);
    let stats = engine.run(&adapter, fetcher, None).await.expect("engine run");
    assert_eq!(stats.events_succeeded, 1);
    assert_eq!(stats.matches_staged, 1);

    let all = staging::get_all_games_ordered(&mut conn).expect("read staging");
    let row = all
        .iter()
        .find(|r| r.source_match_key == format!("{platform}-ev1-m1"))
        .expect("staged row present");
    assert!(!row.processed);
    assert_eq!(row.source_match_key, format!("{platform}-ev1-m1"));
}

/// Scenario 2 (spec.md §8): promotion creates two canonical teams and one
/// match, and marks the staging row processed.
#[test]
fn promotion_creates_canonical_teams_and_match() {
    let Some(mut conn) = support::connect() else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let suffix = support::unique_suffix();
    let home_name = format!("FC Blue {suffix} 2015");
    let away_name = format!("FC Red {suffix} 2015");
    let match_key = format!("test-{suffix}-ev1-m1");
    let raw = serde_json::json!({});

    staging::insert_staging_games(
        &mut conn,
        &[NewStagingGame {
            match_date: NaiveDate::from_ymd_opt(2026, 1, 15),
            match_time: None,
            home_team_name: &home_name,
            away_team_name: &away_name,
            home_score: Some(2),
            away_score: Some(1),
            event_name: None,
            event_id: None,
            venue_name: None,
            field_name: None,
            division: None,
            source_platform: "testsrc",
            source_match_key: &match_key,
            raw_data: &raw,
            scraped_at: Utc::now().naive_utc(),
        }],
    )
    .expect("insert staging game");

    let stats = promotion::promote_one_batch(
        &mut conn,
        &PromotionConfig::default(),
        &DataPolicyConfig::default(),
        CURRENT_SEASON_YEAR,
    )
    .expect("promote batch");
    assert!(stats.rows_promoted >= 1, "expected the new row to promote");

    let home = teams::find_team_by_canonical_name(&mut conn, &home_name.to_lowercase())
        .expect("query")
        .expect("home team created");
    let away = teams::find_team_by_canonical_name(&mut conn, &away_name.to_lowercase())
        .expect("query")
        .expect("away team created");
    assert_eq!(home.birth_year, Some(2015));
    assert_eq!(away.birth_year, Some(2015));
    assert_eq!(home.gender, "unknown");

    let all = staging::get_all_games_ordered(&mut conn).expect("read staging");
    let row = all.iter().find(|r| r.source_match_key == match_key).expect("row present");
    assert!(row.processed);
}

/// Scenario 3 (spec.md §8): the birth-year gate stops a prefix match between
/// two different age groups -- the resolver creates a new team rather than
/// reusing one whose birth year conflicts with the incoming parsed year.
#[test]
fn birth_year_gate_prevents_cross_age_linking() {
    let Some(mut conn) = support::connect() else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let suffix = support::unique_suffix();
    let shared_prefix = format!("central valley alliance {suffix} academy select team");
    let now = Utc::now().naive_utc();

    let existing = conn
        .transaction(|conn| -> Result<_, diesel::result::Error> {
            gate::authorize_pipeline_write(conn)?;
            teams::insert_team(
                conn,
                NewTeam {
                    canonical_name: &shared_prefix,
                    display_name: "Central Valley Alliance Academy Select Team",
                    birth_year: Some(2012),
                    birth_year_source: Some("parsed"),
                    gender: "unknown",
                    gender_source: None,
                    state: None,
                    created_at: now,
                    updated_at: now,
                },
            )
        })
        .expect("insert existing team");

    let incoming_name = format!("{shared_prefix} extra words that share the prefix");
    let resolved = resolver::resolve(
        &mut conn,
        &ResolveInput { raw_name: &incoming_name, birth_year: Some(2011), gender: Gender::Unknown, state: None },
        &resolver_config(),
    )
    .expect("resolve");

    assert_ne!(resolved.id, existing.id, "a birth-year mismatch must not reuse the existing team");
    assert_eq!(resolved.birth_year, Some(2011));
}

/// Scenario 4 (spec.md §8): duplicate-prefix normalization is idempotent
/// and recursive, collapsing an immediate repeated prefix of any length up
/// to six words.
#[test]
fn duplicate_prefix_self_healing() {
    use matchcore_pipeline::normalize::fix_double_prefix;

    assert_eq!(
        fix_double_prefix("kansas rush kansas rush pre-ecnl 14b"),
        "kansas rush pre-ecnl 14b"
    );
}

/// Scenario 4 end-to-end (spec.md §8): the periodic fixer collapses a
/// persisted duplicate-prefix canonical name in place when nothing else
/// already holds the collapsed name.
#[test]
fn duplicate_prefix_fixer_renames_unconflicted_team() {
    use matchcore_pipeline::reconciliation::fix_duplicate_prefixes;

    let Some(mut conn) = support::connect() else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let suffix = support::unique_suffix();
    let duplicated = format!("kansas rush {suffix} kansas rush {suffix} pre-ecnl 14b");
    let collapsed = format!("kansas rush {suffix} pre-ecnl 14b");
    let now = Utc::now().naive_utc();

    let team = conn
        .transaction(|conn| -> Result<_, diesel::result::Error> {
            gate::authorize_pipeline_write(conn)?;
            teams::insert_team(
                conn,
                NewTeam {
                    canonical_name: &duplicated,
                    display_name: "Kansas Rush Kansas Rush Pre-ECNL 14B",
                    birth_year: None,
                    birth_year_source: None,
                    gender: "unknown",
                    gender_source: None,
                    state: None,
                    created_at: now,
                    updated_at: now,
                },
            )
        })
        .expect("insert duplicated-prefix team");

    fix_duplicate_prefixes(&mut conn).expect("fix duplicate prefixes");

    let renamed = teams::get_team(&mut conn, team.id).expect("reload team");
    assert_eq!(renamed.canonical_name, collapsed);

    let gone = teams::find_team_by_canonical_name(&mut conn, &duplicated).expect("query");
    assert!(gone.is_none(), "the duplicated-prefix name must no longer resolve");
}

/// Scenario 4 end-to-end, conflicting case: when the collapsed name already
/// belongs to another team, the periodic fixer keeps the team with more
/// matches played and records the loser's old name as a learned alias
/// instead of renaming over the existing row.
#[test]
fn duplicate_prefix_fixer_merges_as_alias_on_conflict() {
    use matchcore_pipeline::reconciliation::fix_duplicate_prefixes;

    let Some(mut conn) = support::connect() else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let suffix = support::unique_suffix();
    let collapsed = format!("derby united {suffix} 15b");
    let duplicated = format!("derby united {suffix} derby united {suffix} 15b");
    let earlier = Utc::now().naive_utc() - chrono::Duration::days(30);
    let now = Utc::now().naive_utc();

    // Both rows have zero `matches_played` (not set by `NewTeam`), so the
    // winner comes down to the tie-break: whichever was created first.
    let established = conn
        .transaction(|conn| -> Result<_, diesel::result::Error> {
            gate::authorize_pipeline_write(conn)?;
            teams::insert_team(
                conn,
                NewTeam {
                    canonical_name: &collapsed,
                    display_name: "Derby United 15B",
                    birth_year: None,
                    birth_year_source: None,
                    gender: "unknown",
                    gender_source: None,
                    state: None,
                    created_at: earlier,
                    updated_at: earlier,
                },
            )
        })
        .expect("insert established team");

    let duplicate_row = conn
        .transaction(|conn| -> Result<_, diesel::result::Error> {
            gate::authorize_pipeline_write(conn)?;
            teams::insert_team(
                conn,
                NewTeam {
                    canonical_name: &duplicated,
                    display_name: "Derby United Derby United 15B",
                    birth_year: None,
                    birth_year_source: None,
                    gender: "unknown",
                    gender_source: None,
                    state: None,
                    created_at: now,
                    updated_at: now,
                },
            )
        })
        .expect("insert duplicated-prefix team");

    fix_duplicate_prefixes(&mut conn).expect("fix duplicate prefixes");

    let still_there = teams::get_team(&mut conn, duplicate_row.id).expect("reload duplicate row");
    assert_eq!(
        still_there.canonical_name, duplicated,
        "the conflicting row must not be deleted or renamed, only aliased away"
    );

    let alias = teams::find_alias(&mut conn, &duplicated).expect("query alias").expect("alias recorded");
    assert_eq!(
        alias.team_id, established.id,
        "the fresh established team (more matches, or tie-broken by created_at) should win"
    );
}

/// Scenario 5 (spec.md §8, §4.6): a match with both teams resolved but no
/// event gets retroactively linked to the league its teams already share,
/// when the match date falls in that league's observed window.
#[test]
fn event_linkage_infers_shared_league() {
    let Some(mut conn) = support::connect() else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let suffix = support::unique_suffix();
    let platform = format!("linktest-{suffix}");
    let now = Utc::now().naive_utc();
    let rc = resolver_config();

    let team_a = resolver::resolve(
        &mut conn,
        &ResolveInput {
            raw_name: &format!("Linkage United A {suffix}"),
            birth_year: Some(2013),
            gender: Gender::Unknown,
            state: None,
        },
        &rc,
    )
    .expect("resolve team a");
    let team_b = resolver::resolve(
        &mut conn,
        &ResolveInput {
            raw_name: &format!("Linkage United B {suffix}"),
            birth_year: Some(2013),
            gender: Gender::Unknown,
            state: None,
        },
        &rc,
    )
    .expect("resolve team b");

    let _league = conn
        .transaction(|conn| -> Result<_, diesel::result::Error> {
            gate::authorize_pipeline_write(conn)?;
            let league = events::insert_league(
                conn,
                NewLeague {
                    name: "Linkage Spring League",
                    source_event_id: &format!("LEAGUE-{suffix}"),
                    source_platform: &platform,
                    state: None,
                    season: None,
                    start_date: NaiveDate::from_ymd_opt(2026, 1, 1),
                    end_date: NaiveDate::from_ymd_opt(2026, 6, 1),
                },
            )?;

            // A linked match establishes the teams' shared event history.
            matchcore_db::queries::matches::upsert_matches(
                conn,
                &[matchcore_db::models::NewMatch {
                    match_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
                    match_time: None,
                    home_team_id: team_a.id,
                    away_team_id: team_b.id,
                    home_score: Some(1),
                    away_score: Some(0),
                    league_id: Some(league.id),
                    tournament_id: None,
                    venue: None,
                    source_platform: &platform,
                    source_match_key: &format!("{platform}-linked-m1"),
                    created_at: now,
                    updated_at: now,
                }],
            )?;

            // An unlinked match between the same two teams, inside the
            // league's observed window.
            matchcore_db::queries::matches::upsert_matches(
                conn,
                &[matchcore_db::models::NewMatch {
                    match_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                    match_time: None,
                    home_team_id: team_a.id,
                    away_team_id: team_b.id,
                    home_score: Some(2),
                    away_score: Some(2),
                    league_id: None,
                    tournament_id: None,
                    venue: None,
                    source_platform: &platform,
                    source_match_key: &format!("{platform}-unlinked-m1"),
                    created_at: now,
                    updated_at: now,
                }],
            )?;

            Ok(league)
        })
        .expect("seed league and matches");

    let links = linkage::infer_links(&mut conn, false).expect("infer links");
    assert!(
        links.iter().any(|l| l.source_match_key == format!("{platform}-unlinked-m1")),
        "expected the unlinked match to be inferred into the shared league"
    );
}

/// Scenario 6 (spec.md §8, §4.7): rebuild validation rejects a swap when
/// coverage thresholds aren't met, leaving production untouched.
#[test]
fn rebuild_validation_blocks_swap_on_low_coverage() {
    use matchcore_db::queries::rebuild::{create_shadow_tables, RebuildThresholds};
    use matchcore_pipeline::rebuild::{self, SwapMode, SwapOutcome};

    let Some(mut conn) = support::connect() else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    // Empty shadow tables with no staging replayed into them: coverage
    // against whatever production already holds (from other tests in this
    // run) is 0%, which never clears the default thresholds.
    create_shadow_tables(&mut conn).expect("create empty shadow tables");

    let thresholds = RebuildThresholds::default();
    let (report, passed) =
        rebuild::validate_rebuild(&mut conn, &thresholds).expect("validate rebuild runs");
    assert!(!passed, "an empty shadow rebuild must not pass validation: {report:?}");

    let matches_before = matchcore_db::queries::matches::count_matches(&mut conn).expect("count");

    let outcome = conn
        .transaction(|conn| rebuild::execute_swap(conn, SwapMode::Execute, &thresholds))
        .expect("execute_swap itself must not error, only refuse to swap");
    assert!(
        matches!(outcome, SwapOutcome::ValidationFailed(_)),
        "expected the swap to refuse on failed validation, got {outcome:?}"
    );

    let matches_after = matchcore_db::queries::matches::count_matches(&mut conn).expect("count");
    assert_eq!(matches_before, matches_after, "production matches_v2 must be untouched");
}
