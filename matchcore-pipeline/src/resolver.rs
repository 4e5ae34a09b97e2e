use crate::normalize::{self, Gender};
use chrono::Utc;
use matchcore_db::QueryError;
use matchcore_db::gate;
use matchcore_db::models::{DbTeam, NewTeam, NewTeamAlias};
use matchcore_db::queries::teams;
use matchcore_db::{Connection, PgConnection};

/// The one number in the resolver that isn't a hard rule: how close a
/// trigram match has to be to count (spec.md §4.3 strategy 6, default
/// 0.75 -- overridable via [`crate::config::PromotionConfig`]).
pub struct ResolverConfig {
    pub trigram_threshold: f64,
    pub current_season_year: i32,
}

/// `(name, birth_year?, gender?, state?)`, already parsed by the caller
/// (spec.md §4.3 contract input).
#[derive(Debug, Clone)]
pub struct ResolveInput<'a> {
    pub raw_name: &'a str,
    pub birth_year: Option<i32>,
    pub gender: Gender,
    pub state: Option<&'a str>,
}

/// Component E: `resolve(name, birth_year?, gender?, state?) -> team_id`
/// (spec.md §4.3). Never fails except on a structural DB error -- a team is
/// always either matched or created (§4.3 "Failure modes").
pub fn resolve(
    conn: &mut PgConnection,
    input: &ResolveInput,
    config: &ResolverConfig,
) -> Result<DbTeam, QueryError> {
    let normalized = normalize::normalize(input.raw_name);

    // Strategy 1: exact alias hit.
    if let Some(alias) = teams::find_alias(conn, &normalized)? {
        return teams::get_team(conn, alias.team_id);
    }

    // Strategy 2: exact canonical match.
    if let Some(team) = teams::find_team_by_canonical_name(conn, &normalized)? {
        return Ok(team);
    }

    // Strategy 3: suffix-stripped canonical match.
    let stripped = normalize::strip_parenthetical_suffix(&normalized);
    if stripped != normalized {
        if let Some(team) = teams::find_team_by_canonical_name(conn, &stripped)? {
            return Ok(team);
        }
    }

    let first_letter = normalized.chars().next();
    let candidates = match first_letter {
        Some(c) => teams::find_teams_by_first_letter(conn, c)?,
        None => Vec::new(),
    };

    // Strategies 4-5: prefix match (30 then 20 chars) gated on birth year.
    for prefix_len in [30usize, 20] {
        if let Some(team) = find_prefix_match(&candidates, &normalized, prefix_len, input.birth_year)
        {
            return Ok(team);
        }
    }

    // Strategy 6: trigram similarity, constrained by state/gender when known.
    if let Some(best) = find_fuzzy_match(
        conn,
        &normalized,
        input.birth_year,
        input.gender,
        input.state,
        config.trigram_threshold,
        None,
    )? {
        // Self-contained transaction (diesel nests it as a SAVEPOINT when
        // called from inside an already-open one, e.g. a Promotion Pipeline
        // batch): `resolve` is also called directly by callers with no
        // transaction of their own (weekly reconciliation, tests), so it
        // can't rely on a caller having already authorized this write
        // (spec.md §4.9).
        conn.transaction(|conn| -> Result<(), QueryError> {
            gate::authorize_pipeline_write(conn)?;
            teams::insert_alias(
                conn,
                NewTeamAlias {
                    alias_name: &normalized,
                    team_id: best.id,
                    source: "fuzzy_learned",
                    created_at: Utc::now().naive_utc(),
                },
            )?;
            Ok(())
        })?;
        return Ok(best);
    }

    // Strategy 7: create.
    conn.transaction(|conn| create_team(conn, input, &normalized, config.current_season_year))
}

/// The trigram-similarity half of strategy 6, factored out so the weekly
/// reconciliation job (spec.md §4.8 `weekly_reconciliation`) can reuse the
/// exact same candidate search and tie-break rules against a team it already
/// knows about, rather than an incoming staging name -- with `exclude_id` so
/// a team never matches itself.
pub fn find_fuzzy_match(
    conn: &mut PgConnection,
    normalized_name: &str,
    birth_year: Option<i32>,
    gender: Gender,
    state: Option<&str>,
    threshold: f64,
    exclude_id: Option<i64>,
) -> Result<Option<DbTeam>, QueryError> {
    let gender_filter = match gender {
        Gender::Unknown => None,
        other => Some(other.as_db_str()),
    };
    let candidates = teams::find_trigram_candidates(conn, normalized_name, state, gender_filter, threshold)?
        .into_iter()
        .filter(|c| Some(c.team.id) != exclude_id)
        .collect();
    Ok(pick_trigram_winner(candidates, birth_year))
}

fn find_prefix_match(
    candidates: &[DbTeam],
    normalized: &str,
    prefix_len: usize,
    incoming_birth_year: Option<i32>,
) -> Option<DbTeam> {
    let incoming_prefix = prefix(normalized, prefix_len);
    candidates
        .iter()
        .find(|team| {
            let candidate_stripped = normalize::strip_parenthetical_suffix(&team.canonical_name);
            prefix(&candidate_stripped, prefix_len) == incoming_prefix
                && birth_years_compatible(team.birth_year, incoming_birth_year)
        })
        .cloned()
}

fn prefix(s: &str, len: usize) -> &str {
    match s.char_indices().nth(len) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Birth years either both absent, or equal (spec.md §4.3 strategies 4-5 AND
/// the strategy-4/5 "Birth-year validity gate"). A birth year present on
/// only one side does *not* gate -- only a parseable mismatch does.
fn birth_years_compatible(candidate: Option<i32>, incoming: Option<i32>) -> bool {
    match (candidate, incoming) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

/// Among candidates at or above the similarity threshold: highest
/// similarity wins; ties broken by greatest `matches_played`, then earliest
/// `created_at` (spec.md §4.3 "Tie-break in strategy 6"). Also applies the
/// birth-year validity gate.
fn pick_trigram_winner(
    candidates: Vec<teams::TrigramCandidate>,
    incoming_birth_year: Option<i32>,
) -> Option<DbTeam> {
    candidates
        .into_iter()
        .filter(|c| birth_years_compatible(c.team.birth_year, incoming_birth_year))
        .max_by(|a, b| {
            a.similarity
                .partial_cmp(&b.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.team.matches_played.cmp(&b.team.matches_played))
                .then_with(|| b.team.created_at.cmp(&a.team.created_at))
        })
        .map(|c| c.team.into())
}

fn create_team(
    conn: &mut PgConnection,
    input: &ResolveInput,
    normalized: &str,
    current_season_year: i32,
) -> Result<DbTeam, QueryError> {
    let birth_year = input
        .birth_year
        .or_else(|| normalize::extract_birth_year(input.raw_name, current_season_year));
    let birth_year_source = if birth_year.is_some() { Some("parsed") } else { None };

    let gender = match input.gender {
        Gender::Unknown => normalize::extract_gender(input.raw_name),
        known => known,
    };
    let gender_source = if matches!(gender, Gender::Unknown) { None } else { Some("parsed") };

    let now = Utc::now().naive_utc();
    gate::authorize_pipeline_write(conn)?;
    teams::insert_team(
        conn,
        NewTeam {
            canonical_name: normalized,
            display_name: input.raw_name,
            birth_year,
            birth_year_source,
            gender: gender.as_db_str(),
            gender_source,
            state: input.state,
            created_at: now,
            updated_at: now,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn birth_years_compatible_when_one_side_absent() {
        assert!(birth_years_compatible(None, Some(2015)));
        assert!(birth_years_compatible(Some(2015), None));
    }

    #[test]
    fn birth_years_incompatible_on_mismatch() {
        assert!(!birth_years_compatible(Some(2012), Some(2011)));
    }

    #[test]
    fn prefix_truncates_on_char_boundaries() {
        assert_eq!(prefix("fc blue 2015", 7), "fc blue");
        assert_eq!(prefix("fc", 30), "fc");
    }
}
