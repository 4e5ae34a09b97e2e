use crate::config::{DataPolicyConfig, PromotionConfig};
use crate::error::PromotionRejection;
use crate::event_resolver::{self, EventResolverInput};
use crate::normalize;
use crate::resolver::{self, ResolveInput, ResolverConfig};
use chrono::Utc;
use log::{debug, info};
use matchcore_db::gate;
use matchcore_db::models::{DbStagingGame, DbStagingStanding, NewLeagueStanding, NewMatch};
use matchcore_db::queries::{matches, staging, standings};
use matchcore_db::{Connection, PgConnection, QueryError};

#[derive(Debug, Default, Clone, Copy)]
pub struct PromotionStats {
    pub rows_seen: usize,
    pub rows_promoted: usize,
    pub rows_rejected: usize,
    pub standings_seen: usize,
    pub standings_promoted: usize,
    pub standings_rejected: usize,
}

/// Component G: `promote(batch_size)` (spec.md §4.5). Runs until a batch
/// comes back empty or `max_iterations` is hit, whichever first -- the
/// caller (scheduler or CLI) decides which bound applies.
pub fn promote_one_batch(
    conn: &mut PgConnection,
    config: &PromotionConfig,
    data_policy: &DataPolicyConfig,
    current_season_year: i32,
) -> Result<PromotionStats, QueryError> {
    let batch = staging::get_unprocessed_game_batch(conn, config.batch_size)?;
    let resolver_config = ResolverConfig { trigram_threshold: config.trigram_similarity_threshold, current_season_year };
    let mut stats = PromotionStats { rows_seen: batch.len(), ..Default::default() };

    if !batch.is_empty() {
        // One transaction per batch so `authorize_pipeline_write`'s
        // transaction-local `set_config` stays set for every write this
        // batch makes -- team/alias/event creation during resolution
        // included, not just the final match upsert (spec.md §4.5, §4.9).
        conn.transaction(|conn| -> Result<(), QueryError> {
            gate::authorize_pipeline_write(conn)?;

            let mut outcomes = Vec::with_capacity(batch.len());
            let mut candidate_matches = Vec::with_capacity(batch.len());

            for row in &batch {
                match build_match(conn, row, data_policy, &resolver_config) {
                    Ok(new_match) => {
                        candidate_matches.push(new_match);
                        outcomes.push((row.id, None));
                        stats.rows_promoted += 1;
                    }
                    Err(rejection) => {
                        debug!("rejecting staging row {}: {rejection}", row.id);
                        outcomes.push((row.id, Some(rejection.message())));
                        stats.rows_rejected += 1;
                    }
                }
            }

            for sub_batch in candidate_matches.chunks(500) {
                matches::upsert_matches(conn, sub_batch)?;
            }
            staging::mark_games_processed(conn, &outcomes)?;
            Ok(())
        })?;

        info!(
            "promoted batch: {} seen, {} promoted, {} rejected",
            stats.rows_seen, stats.rows_promoted, stats.rows_rejected
        );
    }

    let standing_stats = promote_standing_batch(conn, config, &resolver_config)?;
    stats.standings_seen = standing_stats.standings_seen;
    stats.standings_promoted = standing_stats.standings_promoted;
    stats.standings_rejected = standing_stats.standings_rejected;

    Ok(stats)
}

/// `staging_standings` half of `promote(batch_size)` (spec.md §3
/// "StagingStandings ... analogous [lifecycle to StagingGame]"): resolve the
/// team via E and the league via F, then upsert the per-team-per-division
/// row into `league_standings`. Standings never carry a tournament -- a
/// standings table only makes sense for something with a season, so an
/// unresolvable or tournament-classified event rejects the row rather than
/// guessing.
fn promote_standing_batch(
    conn: &mut PgConnection,
    config: &PromotionConfig,
    resolver_config: &ResolverConfig,
) -> Result<PromotionStats, QueryError> {
    let batch = staging::get_unprocessed_standing_batch(conn, config.batch_size)?;
    if batch.is_empty() {
        return Ok(PromotionStats::default());
    }

    let mut stats = PromotionStats { standings_seen: batch.len(), ..Default::default() };

    conn.transaction(|conn| -> Result<(), QueryError> {
        gate::authorize_pipeline_write(conn)?;
        let mut outcomes = Vec::with_capacity(batch.len());

        for row in &batch {
            match build_league_standing(conn, row, resolver_config) {
                Ok(new_standing) => {
                    standings::upsert_league_standing(conn, &new_standing)?;
                    outcomes.push((row.id, None));
                    stats.standings_promoted += 1;
                }
                Err(rejection) => {
                    debug!("rejecting staging standing {}: {rejection}", row.id);
                    outcomes.push((row.id, Some(rejection.message())));
                    stats.standings_rejected += 1;
                }
            }
        }

        staging::mark_standings_processed(conn, &outcomes)?;
        Ok(())
    })?;

    info!(
        "promoted standings batch: {} seen, {} promoted, {} rejected",
        stats.standings_seen, stats.standings_promoted, stats.standings_rejected
    );
    Ok(stats)
}

fn build_league_standing(
    conn: &mut PgConnection,
    row: &DbStagingStanding,
    resolver_config: &ResolverConfig,
) -> Result<NewLeagueStanding, PromotionRejection> {
    let event_id = row.event_id.as_deref().ok_or(PromotionRejection::StandingUnlinked)?;

    let team = resolve_standing_team(conn, row, resolver_config)
        .map_err(|_| PromotionRejection::TeamUnresolved)?;

    let resolved = event_resolver::resolve(
        conn,
        &EventResolverInput {
            source_event_id: event_id,
            source_platform: &row.source_platform,
            event_name: event_id,
            state: None,
            season: None,
            is_league_hint: true,
            inferred_start_date: None,
            inferred_end_date: None,
        },
    )
    .map_err(|_| PromotionRejection::StandingUnlinked)?;

    let league_id = match resolved.0 {
        matchcore_db::queries::events::EventKind::League => resolved.1,
        matchcore_db::queries::events::EventKind::Tournament => {
            return Err(PromotionRejection::StandingUnlinked);
        }
    };

    Ok(NewLeagueStanding {
        league_id,
        team_id: team.id,
        division: row.division.clone(),
        wins: row.wins.unwrap_or(0),
        losses: row.losses.unwrap_or(0),
        draws: row.draws.unwrap_or(0),
        points: row.points.unwrap_or(0),
    })
}

fn resolve_standing_team(
    conn: &mut PgConnection,
    row: &DbStagingStanding,
    resolver_config: &ResolverConfig,
) -> Result<matchcore_db::models::DbTeam, QueryError> {
    let birth_year = normalize::extract_birth_year(&row.team_name, resolver_config.current_season_year)
        .or_else(|| row.age_group.as_deref().and_then(|age_group| {
            normalize::extract_birth_year(age_group, resolver_config.current_season_year)
        }));
    let gender = match row.gender.as_deref().map(str::to_lowercase) {
        Some(ref g) if g.starts_with('m') || g == "boys" => normalize::Gender::Male,
        Some(ref g) if g.starts_with('f') || g == "girls" => normalize::Gender::Female,
        Some(_) => normalize::extract_gender(&row.team_name),
        None => normalize::extract_gender(&row.team_name),
    };
    resolver::resolve(
        conn,
        &ResolveInput { raw_name: &row.team_name, birth_year, gender, state: None },
        resolver_config,
    )
}

/// Runs batches until one comes back empty or `max_iterations` is reached
/// (spec.md §6 `promote [--batch-size N] [--max-iters N]`).
pub fn promote_until_drained(
    conn: &mut PgConnection,
    config: &PromotionConfig,
    data_policy: &DataPolicyConfig,
    current_season_year: i32,
) -> Result<PromotionStats, QueryError> {
    let mut total = PromotionStats::default();
    let mut iterations = 0u32;
    loop {
        let batch_stats = promote_one_batch(conn, config, data_policy, current_season_year)?;
        total.rows_seen += batch_stats.rows_seen;
        total.rows_promoted += batch_stats.rows_promoted;
        total.rows_rejected += batch_stats.rows_rejected;
        total.standings_seen += batch_stats.standings_seen;
        total.standings_promoted += batch_stats.standings_promoted;
        total.standings_rejected += batch_stats.standings_rejected;

        if batch_stats.rows_seen == 0 && batch_stats.standings_seen == 0 {
            break;
        }

        iterations += 1;
        if let Some(max) = config.max_iterations {
            if iterations >= max {
                break;
            }
        }
    }
    matchcore_db::views::refresh_all_views(conn)?;
    Ok(total)
}

fn build_match<'a>(
    conn: &mut PgConnection,
    row: &'a DbStagingGame,
    data_policy: &DataPolicyConfig,
    resolver_config: &ResolverConfig,
) -> Result<NewMatch<'a>, PromotionRejection> {
    let match_date = row.match_date.ok_or(PromotionRejection::MissingDate)?;

    // spec.md §4.5 step 4(d): `[data_policy.min_date, today + max_future_date]`.
    let max_date = Utc::now().date_naive() + chrono::Duration::days(data_policy.max_future_days);
    if match_date < data_policy.min_date || match_date > max_date {
        return Err(PromotionRejection::DateOutOfRange);
    }

    let home = resolve_row_team(conn, &row.home_team_name, row.division.as_deref(), resolver_config)
        .map_err(|_| PromotionRejection::TeamUnresolved)?;
    let away = resolve_row_team(conn, &row.away_team_name, row.division.as_deref(), resolver_config)
        .map_err(|_| PromotionRejection::TeamUnresolved)?;

    if home.id == away.id {
        return Err(PromotionRejection::SelfMatch);
    }
    if let (Some(a), Some(b)) = (home.birth_year, away.birth_year) {
        if (a - b).abs() > 1 {
            return Err(PromotionRejection::BirthYearMismatch);
        }
    }
    if home.gender != "unknown" && away.gender != "unknown" && home.gender != away.gender {
        return Err(PromotionRejection::GenderMismatch);
    }

    let (league_id, tournament_id) = match &row.event_id {
        Some(event_id) => {
            let resolved = event_resolver::resolve(
                conn,
                &EventResolverInput {
                    source_event_id: event_id,
                    source_platform: &row.source_platform,
                    event_name: row.event_name.as_deref().unwrap_or(event_id),
                    state: None,
                    season: None,
                    is_league_hint: false,
                    inferred_start_date: Some(match_date),
                    inferred_end_date: Some(match_date),
                },
            )
            .map_err(|_| PromotionRejection::TeamUnresolved)?;
            match resolved.0 {
                matchcore_db::queries::events::EventKind::League => (Some(resolved.1), None),
                matchcore_db::queries::events::EventKind::Tournament => (None, Some(resolved.1)),
            }
        }
        None => (None, None),
    };

    let now = Utc::now().naive_utc();
    Ok(NewMatch {
        match_date,
        match_time: row.match_time,
        home_team_id: home.id,
        away_team_id: away.id,
        home_score: row.home_score,
        away_score: row.away_score,
        league_id,
        tournament_id,
        venue: row.venue_name.as_deref(),
        source_platform: &row.source_platform,
        source_match_key: &row.source_match_key,
        created_at: now,
        updated_at: now,
    })
}

/// Resolves a team from its raw staged name, falling back to the staged
/// row's `division` text (spec.md §4.1 `parse_division`) for whichever of
/// birth year / gender the name itself doesn't carry -- e.g. "FC Blue" in
/// a "U14 Boys" division still resolves with both fields populated.
fn resolve_row_team(
    conn: &mut PgConnection,
    raw_name: &str,
    division: Option<&str>,
    resolver_config: &ResolverConfig,
) -> Result<matchcore_db::models::DbTeam, QueryError> {
    let (division_gender, division_birth_year) = division
        .map(|d| normalize::parse_division(d, resolver_config.current_season_year))
        .unwrap_or((normalize::Gender::Unknown, None));

    let birth_year = normalize::extract_birth_year(raw_name, resolver_config.current_season_year)
        .or(division_birth_year);
    let gender = match normalize::extract_gender(raw_name) {
        normalize::Gender::Unknown => division_gender,
        g => g,
    };
    resolver::resolve(
        conn,
        &ResolveInput { raw_name, birth_year, gender, state: None },
        resolver_config,
    )
}
