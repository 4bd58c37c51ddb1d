//! Group standings: wins, point differential and deterministic tie-breaks.

use crate::logic::group_play::ADVANCE_PER_GROUP;
use crate::models::{GameMatch, Stage, Team, TeamId, TournamentError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// One team's line in a group table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub team: Team,
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    /// Own score minus opponent score, summed over completed matches.
    pub point_differential: i64,
}

impl Standing {
    fn new(team: Team) -> Self {
        Self {
            team,
            played: 0,
            wins: 0,
            losses: 0,
            point_differential: 0,
        }
    }
}

/// Ranked tables keyed by group letter.
pub type GroupStandings = BTreeMap<char, Vec<Standing>>;

/// Rank every group from its matches. Non-group matches are ignored; teams
/// appear as soon as they are in a group match, even before playing.
///
/// Order: wins, then point differential, then head-to-head wins among the
/// teams still level, then team id.
pub fn group_standings<'a>(matches: impl IntoIterator<Item = &'a GameMatch>) -> GroupStandings {
    let mut by_group: BTreeMap<char, Vec<&GameMatch>> = BTreeMap::new();
    for m in matches {
        if let (Stage::Group, Some(group)) = (m.stage, m.group) {
            by_group.entry(group).or_default().push(m);
        }
    }
    by_group
        .into_iter()
        .map(|(group, ms)| (group, rank_group(&ms)))
        .collect()
}

fn rank_group(matches: &[&GameMatch]) -> Vec<Standing> {
    let mut table: HashMap<TeamId, Standing> = HashMap::new();
    for m in matches {
        for team in [&m.team1, &m.team2].into_iter().flatten().filter_map(|e| e.team()) {
            table
                .entry(team.id.clone())
                .or_insert_with(|| Standing::new(team.clone()));
        }
    }

    for m in matches.iter().filter(|m| m.is_completed()) {
        let Some((winner, loser)) = m.outcome() else {
            continue;
        };
        for id in [&winner.id, &loser.id] {
            if let Some(row) = table.get_mut(id) {
                row.played += 1;
                row.point_differential += m.differential_for(id).unwrap_or(0);
            }
        }
        if let Some(row) = table.get_mut(&winner.id) {
            row.wins += 1;
        }
        if let Some(row) = table.get_mut(&loser.id) {
            row.losses += 1;
        }
    }

    let mut rows: Vec<Standing> = table.into_values().collect();
    rows.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then(b.point_differential.cmp(&a.point_differential))
            .then_with(|| a.team.id.cmp(&b.team.id))
    });

    // Break remaining ties on results between the tied teams only.
    let mut start = 0;
    while start < rows.len() {
        let key = (rows[start].wins, rows[start].point_differential);
        let end = rows[start..]
            .iter()
            .position(|r| (r.wins, r.point_differential) != key)
            .map_or(rows.len(), |offset| start + offset);
        if end - start > 1 {
            let tied: HashSet<TeamId> = rows[start..end].iter().map(|r| r.team.id.clone()).collect();
            let h2h = head_to_head_wins(matches, &tied);
            rows[start..end].sort_by(|a, b| {
                let wa = h2h.get(&a.team.id).copied().unwrap_or(0);
                let wb = h2h.get(&b.team.id).copied().unwrap_or(0);
                wb.cmp(&wa).then_with(|| a.team.id.cmp(&b.team.id))
            });
        }
        start = end;
    }
    rows
}

/// Wins each tied team took off the other tied teams.
fn head_to_head_wins(matches: &[&GameMatch], tied: &HashSet<TeamId>) -> HashMap<TeamId, u32> {
    let mut wins = HashMap::new();
    for m in matches {
        if let Some((winner, loser)) = m.outcome() {
            if tied.contains(&winner.id) && tied.contains(&loser.id) {
                *wins.entry(winner.id.clone()).or_insert(0) += 1;
            }
        }
    }
    wins
}

/// The teams that advance: the top two of each group, in group order.
pub fn qualifiers(standings: &GroupStandings) -> Vec<(char, Vec<Team>)> {
    standings
        .iter()
        .map(|(group, rows)| {
            let teams = rows.iter().take(ADVANCE_PER_GROUP).map(|r| r.team.clone()).collect();
            (*group, teams)
        })
        .collect()
}

#[derive(Serialize)]
struct CsvRow<'a> {
    group: char,
    rank: usize,
    team: &'a str,
    played: u32,
    wins: u32,
    losses: u32,
    point_differential: i64,
}

/// Render all group tables as CSV (one row per team, with a header).
pub fn standings_csv(standings: &GroupStandings) -> Result<String, TournamentError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for (group, rows) in standings {
        for (i, row) in rows.iter().enumerate() {
            writer
                .serialize(CsvRow {
                    group: *group,
                    rank: i + 1,
                    team: &row.team.name,
                    played: row.played,
                    wins: row.wins,
                    losses: row.losses,
                    point_differential: row.point_differential,
                })
                .map_err(|e| TournamentError::Export(e.to_string()))?;
        }
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| TournamentError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| TournamentError::Export(e.to_string()))
}
