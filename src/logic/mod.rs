//! Bracket engine logic: generation, standings, advancement, setup.

mod advancement;
mod bracket;
mod finals;
mod group_play;
mod playoff_seeding;
mod setup;
mod standings;

pub use advancement::{submit_result, Advancement, ResultSubmission, SkippedEdge};
pub use bracket::generate;
pub use finals::{double_elimination_match_count, round_count, single_elimination_match_count};
pub use group_play::{
    group_count, partition_groups, round_robin_match_count, ADVANCE_PER_GROUP, GROUP_LABELS,
    GROUP_STAGE_TEAM_COUNTS,
};
pub use playoff_seeding::{cross_seed_placeholders, seed_playoffs};
pub use setup::{assign_team_ids, refresh_teams, setup_tournament, shuffle_teams, update_team, TeamEntry};
pub use standings::{group_standings, qualifiers, standings_csv, GroupStandings, Standing};
