use crate::normalize;
use crate::resolver;
use chrono::Utc;
use log::info;
use matchcore_db::gate;
use matchcore_db::models::NewTeamAlias;
use matchcore_db::queries::teams;
use matchcore_db::{Connection, PgConnection, QueryError};

#[derive(Debug, Default, Clone, Copy)]
pub struct ReconciliationStats {
    pub candidates_examined: usize,
    pub teams_linked: usize,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PrefixFixStats {
    pub candidates_examined: usize,
    pub renamed: usize,
    pub merged_as_alias: usize,
}

/// `weekly_reconciliation` (spec.md §4.8): teams that carry a national rank
/// but have never played a match -- typically a ranking feed's name variant
/// of a team the Promotion Pipeline already resolved under a slightly
/// different spelling. Reuses the strategy-6 trigram search (spec.md §4.3)
/// against every *other* team, and on a hit records the ranked team's name
/// as a learned alias of the match rather than merging or deleting either
/// row (CanonicalTeam is "never deleted except by Rebuild/Swap", spec.md
/// §3).
pub fn reconcile_ranked_teams(
    conn: &mut PgConnection,
    trigram_threshold: f64,
) -> Result<ReconciliationStats, QueryError> {
    let unmatched = teams::teams_with_rank_but_no_matches(conn)?;
    let mut stats = ReconciliationStats { candidates_examined: unmatched.len(), ..Default::default() };

    for team in &unmatched {
        let gender = crate::normalize::Gender::from_db_str(&team.gender);
        let winner = resolver::find_fuzzy_match(
            conn,
            &team.canonical_name,
            team.birth_year,
            gender,
            team.state.as_deref(),
            trigram_threshold,
            Some(team.id),
        )?;

        let Some(winner) = winner else { continue };

        conn.transaction(|conn| -> Result<(), QueryError> {
            gate::authorize_pipeline_write(conn)?;
            teams::insert_alias(
                conn,
                NewTeamAlias {
                    alias_name: &team.canonical_name,
                    team_id: winner.id,
                    source: "fuzzy_learned",
                    created_at: Utc::now().naive_utc(),
                },
            )?;
            if let Some(rank) = team.national_rank {
                teams::set_national_rank(conn, winner.id, rank)?;
            }
            Ok(())
        })?;
        stats.teams_linked += 1;
    }

    info!(
        "weekly reconciliation: {} ranked-but-unmatched team(s) examined, {} linked",
        stats.candidates_examined, stats.teams_linked
    );
    Ok(stats)
}

/// The "periodic fixer" (spec.md §8 scenario 4, §9 duplicate-prefix
/// invariant): collapse any immediate repeated prefix left in a persisted
/// `canonical_name` -- these slip in when a source repeats a club name in
/// its raw division string in a way [`normalize::normalize`] didn't catch
/// at ingest time, e.g. a prefix only one of the two source feeds uses. If
/// collapsing doesn't collide with an existing team, rename in place. If it
/// does, the two rows describe the same team under two spellings: keep the
/// one with more matches played (ties by earliest `created_at`, mirroring
/// the strategy-6 tie-break in [`resolver::pick_trigram_winner`]) and record
/// the loser's old canonical name as a learned alias of the winner, since
/// CanonicalTeam rows are never deleted outside Rebuild/Swap (spec.md §3).
pub fn fix_duplicate_prefixes(conn: &mut PgConnection) -> Result<PrefixFixStats, QueryError> {
    let all = teams::all_teams(conn)?;
    let mut stats = PrefixFixStats::default();

    for team in &all {
        let fixed = normalize::fix_double_prefix(&team.canonical_name);
        if fixed == team.canonical_name {
            continue;
        }
        stats.candidates_examined += 1;

        let collision = all
            .iter()
            .find(|other| other.id != team.id && other.canonical_name == fixed);

        match collision {
            None => {
                conn.transaction(|conn| -> Result<(), QueryError> {
                    gate::authorize_pipeline_write(conn)?;
                    teams::rename_team(conn, team.id, &fixed, &team.display_name)?;
                    Ok(())
                })?;
                stats.renamed += 1;
            }
            Some(other) => {
                let (winner, loser) = pick_prefix_fix_winner(team, other);
                conn.transaction(|conn| -> Result<(), QueryError> {
                    gate::authorize_pipeline_write(conn)?;
                    teams::insert_alias(
                        conn,
                        NewTeamAlias {
                            alias_name: &loser.canonical_name,
                            team_id: winner.id,
                            source: "operator",
                            created_at: Utc::now().naive_utc(),
                        },
                    )?;
                    Ok(())
                })?;
                stats.merged_as_alias += 1;
            }
        }
    }

    info!(
        "duplicate-prefix fixer: {} candidate(s), {} renamed, {} merged as alias",
        stats.candidates_examined, stats.renamed, stats.merged_as_alias
    );
    Ok(stats)
}

/// Most `matches_played` wins; ties go to whichever row was created first
/// (spec.md §8 scenario 4 "winner chosen by most-matches-played").
fn pick_prefix_fix_winner<'a>(
    a: &'a matchcore_db::models::DbTeam,
    b: &'a matchcore_db::models::DbTeam,
) -> (&'a matchcore_db::models::DbTeam, &'a matchcore_db::models::DbTeam) {
    let a_wins = match a.matches_played.cmp(&b.matches_played) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => a.created_at <= b.created_at,
    };
    if a_wins { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchcore_db::models::DbTeam;

    fn team(id: i64, matches_played: i32, created_at: chrono::NaiveDateTime) -> DbTeam {
        DbTeam {
            id,
            canonical_name: format!("team {id}"),
            display_name: format!("Team {id}"),
            birth_year: None,
            birth_year_source: None,
            gender: "unknown".to_string(),
            gender_source: None,
            state: None,
            elo_rating: 1500.0,
            matches_played,
            wins: 0,
            losses: 0,
            draws: 0,
            goals_for: 0,
            goals_against: 0,
            national_rank: None,
            data_quality_score: 0,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn prefix_fix_winner_prefers_more_matches_played() {
        let early = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let late = chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let few_matches_but_older = team(1, 2, early);
        let many_matches_but_newer = team(2, 10, late);

        let (winner, loser) = pick_prefix_fix_winner(&few_matches_but_older, &many_matches_but_newer);
        assert_eq!(winner.id, 2);
        assert_eq!(loser.id, 1);
    }

    #[test]
    fn prefix_fix_winner_ties_go_to_earlier_created_at() {
        let early = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let late = chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let older = team(1, 5, early);
        let newer = team(2, 5, late);

        let (winner, loser) = pick_prefix_fix_winner(&older, &newer);
        assert_eq!(winner.id, 1);
        assert_eq!(loser.id, 2);
    }
}
