use chrono::NaiveDate;
use hashbrown::HashMap;
use itertools::Itertools;
use log::info;
use matchcore_db::QueryError;
use matchcore_db::gate;
use matchcore_db::models::DbMatch;
use matchcore_db::queries::matches::{self, InferredLink};
use matchcore_db::{Connection, PgConnection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EventRef {
    League(i64),
    Tournament(i64),
}

#[derive(Debug, Clone, Copy)]
struct EventWindow {
    min_date: NaiveDate,
    max_date: NaiveDate,
    occurrences: u32,
}

/// Component H: Event-Linkage Inferrer (spec.md §4.6). `dry_run` mirrors
/// `infer-links --dry-run`: compute the same updates, just don't apply them.
pub fn infer_links(
    conn: &mut PgConnection,
    dry_run: bool,
) -> Result<Vec<InferredLink>, QueryError> {
    let unlinked = matches::unlinked_matches(conn)?;
    if unlinked.is_empty() {
        return Ok(Vec::new());
    }

    let team_ids: Vec<i64> = unlinked
        .iter()
        .flat_map(|m| [m.home_team_id, m.away_team_id])
        .unique()
        .collect();

    let mut history_by_team: HashMap<i64, HashMap<EventRef, EventWindow>> = HashMap::new();
    for team_id in team_ids {
        let linked = matches::linked_matches_for_team(conn, team_id)?;
        history_by_team.insert(team_id, build_event_history(&linked, team_id));
    }

    let mut links = Vec::new();
    for m in &unlinked {
        if let Some(event) = infer_match_event(m, &history_by_team) {
            links.push(to_inferred_link(m, event));
        }
    }

    info!("inferred {} event links ({} unlinked matches examined)", links.len(), unlinked.len());

    if !dry_run && !links.is_empty() {
        conn.transaction(|conn| -> Result<(), QueryError> {
            gate::authorize_pipeline_write(conn)?;
            matches::apply_links(conn, &links)
        })?;
        matchcore_db::views::refresh_all_views(conn)?;
    }

    Ok(links)
}

/// A team's event history: `(kind, event_id, min_date, max_date)` derived
/// from its already-linked matches (spec.md §4.6 step 2).
fn build_event_history(linked: &[DbMatch], team_id: i64) -> HashMap<EventRef, EventWindow> {
    let mut history: HashMap<EventRef, EventWindow> = HashMap::new();
    for m in linked {
        if m.home_team_id != team_id && m.away_team_id != team_id {
            continue;
        }
        let event = match (m.league_id, m.tournament_id) {
            (Some(id), _) => EventRef::League(id),
            (_, Some(id)) => EventRef::Tournament(id),
            (None, None) => continue,
        };
        history
            .entry(event)
            .and_modify(|w| {
                w.min_date = w.min_date.min(m.match_date);
                w.max_date = w.max_date.max(m.match_date);
                w.occurrences += 1;
            })
            .or_insert(EventWindow { min_date: m.match_date, max_date: m.match_date, occurrences: 1 });
    }
    history
}

/// spec.md §4.6 step 3: shared events first (with the date-window + most-
/// frequent tie-break), else single-team inference, else leave unlinked.
fn infer_match_event(
    m: &DbMatch,
    history_by_team: &HashMap<i64, HashMap<EventRef, EventWindow>>,
) -> Option<EventRef> {
    let empty = HashMap::new();
    let home_history = history_by_team.get(&m.home_team_id).unwrap_or(&empty);
    let away_history = history_by_team.get(&m.away_team_id).unwrap_or(&empty);

    let shared: Vec<(EventRef, EventWindow)> = home_history
        .iter()
        .filter_map(|(event, window)| away_history.get(event).map(|_| (*event, *window)))
        .filter(|(_, window)| date_in_window(m.match_date, window))
        .collect();

    if let Some((event, _)) = shared.iter().max_by_key(|(_, w)| w.occurrences) {
        return Some(*event);
    }

    match (home_history.len(), away_history.len()) {
        (1, other) if other != 1 => home_history
            .iter()
            .find(|(_, w)| date_in_window(m.match_date, w))
            .map(|(event, _)| *event),
        (other, 1) if other != 1 => away_history
            .iter()
            .find(|(_, w)| date_in_window(m.match_date, w))
            .map(|(event, _)| *event),
        _ => None,
    }
}

fn date_in_window(date: NaiveDate, window: &EventWindow) -> bool {
    let padding = chrono::Duration::days(30);
    date >= window.min_date - padding && date <= window.max_date + padding
}

fn to_inferred_link(m: &DbMatch, event: EventRef) -> InferredLink {
    let source_match_key = m.source_match_key.clone();
    match event {
        EventRef::League(id) => InferredLink {
            match_id: m.id,
            source_match_key,
            league_id: Some(id),
            tournament_id: None,
        },
        EventRef::Tournament(id) => InferredLink {
            match_id: m.id,
            source_match_key,
            league_id: None,
            tournament_id: Some(id),
        },
    }
}
