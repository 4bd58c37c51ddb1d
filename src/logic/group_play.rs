//! Group stage: group layout and round-robin match generation.

use crate::logic::bracket::MatchIds;
use crate::models::{Entrant, GameMatch, MatchFormat, Stage, Team, TournamentError};

/// Group letters in order of creation.
pub const GROUP_LABELS: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

/// Teams per group that reach the playoffs.
pub const ADVANCE_PER_GROUP: usize = 2;

/// Team counts a group stage can be built for.
pub const GROUP_STAGE_TEAM_COUNTS: [usize; 6] = [4, 8, 12, 16, 24, 32];

/// Number of groups for a team count.
///
/// | teams | groups | per group |
/// |-------|--------|-----------|
/// | 4     | 1      | 4         |
/// | 8     | 2      | 4         |
/// | 12    | 4      | 3         |
/// | 16    | 4      | 4         |
/// | 24    | 8      | 3         |
/// | 32    | 8      | 4         |
pub fn group_count(team_count: usize) -> Result<usize, TournamentError> {
    if !GROUP_STAGE_TEAM_COUNTS.contains(&team_count) {
        return Err(TournamentError::UnsupportedTeamCount {
            count: team_count,
            has_group_stage: true,
        });
    }
    Ok(match team_count {
        4 => 1,
        8 => 2,
        n if n <= 16 => 4,
        _ => 8,
    })
}

/// Split teams into labelled groups, filling each group from the front of the list.
pub fn partition_groups(teams: &[Team]) -> Result<Vec<(char, Vec<Team>)>, TournamentError> {
    let groups = group_count(teams.len())?;
    let size = teams.len() / groups;
    Ok(GROUP_LABELS
        .iter()
        .zip(teams.chunks_exact(size))
        .map(|(&label, chunk)| (label, chunk.to_vec()))
        .collect())
}

/// Round robin inside every group: each pair of group-mates meets once.
pub(crate) fn generate_group_stage(
    groups: &[(char, Vec<Team>)],
    format: MatchFormat,
    ids: &mut MatchIds,
) -> Vec<GameMatch> {
    let mut matches = Vec::new();
    for (label, members) in groups {
        let mut counter = 1;
        for (i, home) in members.iter().enumerate() {
            for away in &members[i + 1..] {
                let mut m = GameMatch::new(
                    ids.next_id(),
                    0,
                    Stage::Group,
                    format,
                    format!("Group {} Match {}", label, counter),
                );
                m.group = Some(*label);
                m.team1 = Some(Entrant::Team(home.clone()));
                m.team2 = Some(Entrant::Team(away.clone()));
                matches.push(m);
                counter += 1;
            }
        }
    }
    matches
}

/// Round-robin matches in a group of `size` teams.
pub fn round_robin_match_count(size: usize) -> usize {
    size * size.saturating_sub(1) / 2
}
