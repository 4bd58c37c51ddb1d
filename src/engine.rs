//! Entry points that run the bracket logic against a `MatchStore`.
//!
//! Each function reads what it needs, computes the change with the pure
//! functions in [`crate::logic`], and commits it as one guarded batch. On any
//! error nothing has been written and the caller can reload and retry.

use crate::logic::{self, Advancement, GroupStandings, ResultSubmission};
use crate::models::{
    BracketConfig, MatchGraph, MatchPatch, Stage, Team, Tournament, TournamentError, TournamentId,
    TournamentStatus,
};
use crate::store::MatchStore;

pub fn load_tournament<S: MatchStore + ?Sized>(store: &S, id: TournamentId) -> Result<Tournament, TournamentError> {
    store
        .get_tournament(id)?
        .ok_or(TournamentError::TournamentNotFound(id))
}

pub fn load_graph<S: MatchStore + ?Sized>(store: &S, id: TournamentId) -> Result<MatchGraph, TournamentError> {
    let graph = MatchGraph::new(store.get_matches(id)?);
    for problem in graph.violations() {
        log::warn!("Tournament {}: {}", id, problem);
    }
    Ok(graph)
}

/// Generate the bracket for `teams` (already in seeding order) and store a Draft tournament.
pub fn create_tournament<S: MatchStore + ?Sized>(
    store: &S,
    name: impl Into<String>,
    teams: Vec<Team>,
    config: BracketConfig,
) -> Result<Tournament, TournamentError> {
    let (tournament, matches) = logic::setup_tournament(name, teams, config)?;
    log::info!(
        "Created tournament {} ({} teams, {} matches)",
        tournament.id,
        tournament.teams.len(),
        matches.len()
    );
    store.create_tournament(tournament.clone(), matches)?;
    Ok(tournament)
}

fn update_status<S: MatchStore + ?Sized>(
    store: &S,
    id: TournamentId,
    change: fn(&mut Tournament) -> Result<(), TournamentError>,
) -> Result<Tournament, TournamentError> {
    let tournament = store.update_tournament(id, &mut |t| change(t))?;
    log::info!("Tournament {} is now {:?}", id, tournament.status);
    Ok(tournament)
}

pub fn submit_for_approval<S: MatchStore + ?Sized>(store: &S, id: TournamentId) -> Result<Tournament, TournamentError> {
    update_status(store, id, Tournament::submit_for_approval)
}

pub fn approve<S: MatchStore + ?Sized>(store: &S, id: TournamentId) -> Result<Tournament, TournamentError> {
    update_status(store, id, Tournament::approve)
}

pub fn reject<S: MatchStore + ?Sized>(store: &S, id: TournamentId) -> Result<Tournament, TournamentError> {
    update_status(store, id, Tournament::reject)
}

/// Rename a team or change its logo, everywhere it appears.
///
/// The roster edit and the slot rewrites happen in one commit against the
/// stored graph, so a result landing at the same time cannot keep a stale copy.
pub fn update_team<S: MatchStore + ?Sized>(
    store: &S,
    id: TournamentId,
    team_id: &str,
    name: Option<String>,
    logo_url: Option<String>,
) -> Result<Tournament, TournamentError> {
    let tournament = store.commit(id, &[], &mut |t, graph| {
        logic::update_team(t, graph, team_id, name.clone(), logo_url.clone())
    })?;
    log::info!("Updated team {} in tournament {}", team_id, id);
    Ok(tournament)
}

/// Bring copies of teams in the graph up to date with the roster.
fn sync_roster(tournament: &mut Tournament, graph: &MatchGraph) -> Result<Vec<MatchPatch>, TournamentError> {
    Ok(logic::refresh_teams(&tournament.teams, graph))
}

/// Record a result (or just a start time) for one match and advance teams.
///
/// Only Approved/Ongoing tournaments accept submissions. The match writes and
/// the status change are one commit: if another write completed the match,
/// filled a target slot or closed the tournament first, this fails with
/// `PersistenceConflict` or `InvalidState` and nothing is written.
pub fn submit_result<S: MatchStore + ?Sized>(
    store: &S,
    id: TournamentId,
    match_id: &str,
    submission: &ResultSubmission,
) -> Result<Advancement, TournamentError> {
    let tournament = load_tournament(store, id)?;
    if !tournament.status.accepts_results() {
        return Err(TournamentError::InvalidState);
    }

    let graph = load_graph(store, id)?;
    let mut advancement = logic::submit_result(&graph, match_id, submission)?;
    let schedule_only = advancement.is_schedule_only();
    let committed = store.commit(id, &advancement.patches(), &mut |t, graph| {
        if !t.status.accepts_results() {
            return Err(TournamentError::InvalidState);
        }
        if !schedule_only {
            t.record_result(graph.is_decided())?;
        }
        sync_roster(t, graph)
    });
    let tournament = match committed {
        Ok(t) => t,
        Err(e) => {
            log::warn!("Result for {} in tournament {} not saved: {}", match_id, id, e);
            return Err(e);
        }
    };

    if schedule_only {
        log::info!("Scheduled {} ({})", advancement.updated_match.name, match_id);
        return Ok(advancement);
    }
    log::info!(
        "{} finished {}-{}",
        advancement.updated_match.name,
        submission.score1,
        submission.score2
    );
    if tournament.status == TournamentStatus::Completed {
        log::info!("Tournament {} completed", id);
    }

    // The read above may have been stale if the last two group results landed together.
    // The result itself is already stored, so a failure here is only logged.
    if advancement.updated_match.stage == Stage::Group && !advancement.playoffs_seeded {
        match seed_playoffs(store, id) {
            Ok(seeded) => advancement.playoffs_seeded = seeded > 0,
            Err(e) => log::warn!("Playoff seeding for tournament {} deferred: {}", id, e),
        }
    }
    Ok(advancement)
}

/// Replace playoff seed placeholders with group qualifiers, if the group
/// stage is over and that has not happened yet. Returns the number of
/// playoff matches that were filled.
pub fn seed_playoffs<S: MatchStore + ?Sized>(store: &S, id: TournamentId) -> Result<usize, TournamentError> {
    let graph = load_graph(store, id)?;
    let patches = logic::seed_playoffs(&graph);
    if patches.is_empty() {
        return Ok(0);
    }
    match store.commit(id, &patches, &mut sync_roster) {
        Ok(_) => {
            log::info!("Seeded {} playoff match(es) in tournament {}", patches.len(), id);
            Ok(patches.len())
        }
        Err(TournamentError::PersistenceConflict(match_id)) => {
            // Someone else seeded first; fine as long as nothing is left to seed.
            if logic::seed_playoffs(&load_graph(store, id)?).is_empty() {
                Ok(0)
            } else {
                Err(TournamentError::PersistenceConflict(match_id))
            }
        }
        Err(e) => Err(e),
    }
}

/// Current group tables.
pub fn standings<S: MatchStore + ?Sized>(store: &S, id: TournamentId) -> Result<GroupStandings, TournamentError> {
    let graph = load_graph(store, id)?;
    Ok(logic::group_standings(graph.group_matches()))
}
