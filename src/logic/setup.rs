//! Setup: turning registered team names into a shuffled, generated tournament,
//! and editing team details afterwards.

use crate::logic::bracket::generate;
use crate::models::{
    BracketConfig, Entrant, GameMatch, MatchGraph, MatchPatch, Slot, Team, Tournament, TournamentError,
    SEED_ID_PREFIX,
};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A team as entered by the organizer, before it has an id.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TeamEntry {
    pub name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl TeamEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logo_url: None,
        }
    }
}

/// Shuffle the entries, then number them with [`assign_team_ids`].
pub fn shuffle_teams<R: Rng + ?Sized>(entries: &[TeamEntry], rng: &mut R) -> Vec<Team> {
    let mut shuffled = entries.to_vec();
    shuffled.shuffle(rng);
    assign_team_ids(&shuffled)
}

/// Assign ids `team-1`, `team-2`, ... in the given order.
/// Names and logo URLs are trimmed; a blank logo becomes `None`.
pub fn assign_team_ids(entries: &[TeamEntry]) -> Vec<Team> {
    entries
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, e)| Team {
            id: format!("team-{}", i + 1),
            name: e.name.trim().to_string(),
            logo_url: e
                .logo_url
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
        })
        .collect()
}

/// Create a Draft tournament and its full match graph.
///
/// Every team needs a non-blank name and names must be unique (case-insensitive).
/// Ids must be unique, non-blank and must not look like a seed placeholder's.
pub fn setup_tournament(
    name: impl Into<String>,
    teams: Vec<Team>,
    config: BracketConfig,
) -> Result<(Tournament, Vec<GameMatch>), TournamentError> {
    let mut names = HashSet::new();
    let mut ids = HashSet::new();
    for team in &teams {
        let key = team.name.trim().to_lowercase();
        if key.is_empty() || !names.insert(key) {
            return Err(TournamentError::InvalidState);
        }
        if team.id.is_empty() || team.id.starts_with(SEED_ID_PREFIX) || !ids.insert(team.id.as_str()) {
            return Err(TournamentError::InvalidState);
        }
    }
    let matches = generate(&teams, &config)?;
    Ok((Tournament::new(name, teams, config), matches))
}

/// Change a team's name and/or logo. The team's id and bracket position stay
/// the same; every match slot carrying the team gets the new details.
pub fn update_team(
    tournament: &mut Tournament,
    graph: &MatchGraph,
    team_id: &str,
    name: Option<String>,
    logo_url: Option<String>,
) -> Result<Vec<MatchPatch>, TournamentError> {
    if let Some(name) = &name {
        let key = name.trim().to_lowercase();
        if key.is_empty()
            || tournament
                .teams
                .iter()
                .any(|t| t.id != team_id && t.name.trim().to_lowercase() == key)
        {
            return Err(TournamentError::InvalidState);
        }
    }
    let team = tournament
        .get_team_mut(team_id)
        .ok_or_else(|| TournamentError::TeamNotFound(team_id.to_string()))?;
    if let Some(name) = name {
        team.name = name.trim().to_string();
    }
    if let Some(url) = logo_url {
        let url = url.trim();
        team.logo_url = (!url.is_empty()).then(|| url.to_string());
    }
    Ok(refresh_teams(&tournament.teams, graph))
}

/// Patches that bring every team slot in `graph` in line with the roster,
/// matching by team id. Slots that already agree are left alone.
pub fn refresh_teams(teams: &[Team], graph: &MatchGraph) -> Vec<MatchPatch> {
    let mut patches = Vec::new();
    for m in graph.iter() {
        let mut patch = MatchPatch::new(m.id.clone());
        let mut touched = false;
        for slot in [Slot::Team1, Slot::Team2] {
            let Some(current) = m.slot(slot).and_then(Entrant::team) else {
                continue;
            };
            if let Some(latest) = teams.iter().find(|t| t.id == current.id && *t != current) {
                patch = patch.place(slot, latest.clone());
                touched = true;
            }
        }
        if touched {
            patches.push(patch);
        }
    }
    patches
}
