use chrono::NaiveDate;
use matchcore_db::QueryError;
use matchcore_db::gate;
use matchcore_db::models::{NewLeague, NewTournament};
use matchcore_db::queries::events::{self, EventKind};
use matchcore_db::{Connection, PgConnection};

pub struct EventResolverInput<'a> {
    pub source_event_id: &'a str,
    pub source_platform: &'a str,
    pub event_name: &'a str,
    pub state: Option<&'a str>,
    pub season: Option<&'a str>,
    pub is_league_hint: bool,
    pub inferred_start_date: Option<NaiveDate>,
    pub inferred_end_date: Option<NaiveDate>,
}

/// Component F: `resolve(source_event_id, source_platform, event_name, hint)
/// -> (kind, id)` (spec.md §4.4). Leagues and tournaments share a uniqueness
/// key but live in separate tables, so lookup and insert both have to check
/// both tables before concluding "missing".
pub fn resolve(
    conn: &mut PgConnection,
    input: &EventResolverInput,
) -> Result<(EventKind, i64), QueryError> {
    if let Some(league) = events::find_league(conn, input.source_event_id, input.source_platform)? {
        return Ok((EventKind::League, league.id));
    }
    if let Some(tournament) =
        events::find_tournament(conn, input.source_event_id, input.source_platform)?
    {
        return Ok((EventKind::Tournament, tournament.id));
    }

    // Self-contained transaction (nests as a SAVEPOINT inside a caller's
    // transaction, e.g. the Promotion Pipeline's per-batch one): `resolve`
    // has no guarantee a caller already authorized this write (spec.md
    // §4.9), the same reasoning as `resolver::resolve`.
    if classify(input.event_name, input.is_league_hint) == EventKind::League {
        let league = conn.transaction(|conn| {
            gate::authorize_pipeline_write(conn)?;
            events::insert_league(
                conn,
                NewLeague {
                    name: input.event_name,
                    source_event_id: input.source_event_id,
                    source_platform: input.source_platform,
                    state: input.state,
                    season: input.season,
                    start_date: input.inferred_start_date,
                    end_date: input.inferred_end_date,
                },
            )
        })?;
        Ok((EventKind::League, league.id))
    } else {
        let tournament = conn.transaction(|conn| {
            gate::authorize_pipeline_write(conn)?;
            events::insert_tournament(
                conn,
                NewTournament {
                    name: input.event_name,
                    source_event_id: input.source_event_id,
                    source_platform: input.source_platform,
                    state: input.state,
                    season: input.season,
                    start_date: input.inferred_start_date,
                    end_date: input.inferred_end_date,
                },
            )
        })?;
        Ok((EventKind::Tournament, tournament.id))
    }
}

/// `event_name` contains "league" (case-insensitive) or the adapter says so
/// (spec.md §4.4 step 2); everything else defaults to a tournament.
fn classify(event_name: &str, is_league_hint: bool) -> EventKind {
    if is_league_hint || event_name.to_lowercase().contains("league") {
        EventKind::League
    } else {
        EventKind::Tournament
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_name_keyword() {
        assert_eq!(classify("Texas Spring League", false), EventKind::League);
        assert_eq!(classify("Dallas Cup", false), EventKind::Tournament);
    }

    #[test]
    fn classify_by_hint_overrides_name() {
        assert_eq!(classify("Dallas Cup", true), EventKind::League);
    }
}
