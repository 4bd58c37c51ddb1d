//! Bracket generation entry point: teams + config -> fully wired match list.

use crate::logic::finals::generate_playoff_bracket;
use crate::logic::group_play::{generate_group_stage, partition_groups, ADVANCE_PER_GROUP};
use crate::logic::playoff_seeding::{cross_seed_placeholders, place_in_round_one};
use crate::models::{BracketConfig, Entrant, GameMatch, MatchId, Team, TournamentError};

/// Hands out match ids in generation order: `match-1`, `match-2`, ...
#[derive(Debug, Default)]
pub(crate) struct MatchIds {
    next: u32,
}

impl MatchIds {
    pub(crate) fn next_id(&mut self) -> MatchId {
        self.next += 1;
        format!("match-{}", self.next)
    }
}

/// Build every match of a tournament.
///
/// Teams are used in the given order; shuffle them first (see
/// [`shuffle_teams`](crate::shuffle_teams)) if the draw should be random.
///
/// * Without a group stage the team count must be a power of two. Round 1
///   pairs `teams[0]` with `teams[1]`, `teams[2]` with `teams[3]`, and so on.
///   Fewer than two teams gives an empty bracket.
/// * With a group stage the count must be 4, 8, 12, 16, 24 or 32. Groups
///   play a round robin, the top two of each group advance, and playoff
///   round 1 starts out holding seed placeholders.
pub fn generate(teams: &[Team], config: &BracketConfig) -> Result<Vec<GameMatch>, TournamentError> {
    let mut ids = MatchIds::default();

    if config.has_group_stage {
        let groups = partition_groups(teams)?;
        let mut matches = generate_group_stage(&groups, config.group_stage_format, &mut ids);

        let advancing = groups.len() * ADVANCE_PER_GROUP;
        let slots = advancing.max(2).next_power_of_two();
        let mut playoffs = generate_playoff_bracket(slots, config, &mut ids);

        let labels: Vec<char> = groups.iter().map(|(label, _)| *label).collect();
        let seeds = cross_seed_placeholders(&labels)
            .into_iter()
            .map(Entrant::Seed)
            .collect();
        place_in_round_one(&mut playoffs, seeds);

        log::debug!(
            "Generated {} group matches in {} group(s) and {} playoff matches ({} slots)",
            matches.len(),
            groups.len(),
            playoffs.len(),
            slots
        );
        matches.extend(playoffs);
        return Ok(matches);
    }

    if teams.len() < 2 {
        return Ok(Vec::new());
    }
    if !teams.len().is_power_of_two() {
        return Err(TournamentError::UnsupportedTeamCount {
            count: teams.len(),
            has_group_stage: false,
        });
    }

    let mut playoffs = generate_playoff_bracket(teams.len(), config, &mut ids);
    let entrants = teams.iter().cloned().map(Entrant::Team).collect();
    place_in_round_one(&mut playoffs, entrants);

    log::debug!("Generated {} playoff matches for {} teams", playoffs.len(), teams.len());
    Ok(playoffs)
}
