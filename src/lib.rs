//! Esports tournament bracket engine: library with models, bracket logic and persistence.

pub mod engine;
pub mod logic;
pub mod models;
pub mod store;

pub use logic::{
    assign_team_ids, cross_seed_placeholders, generate, group_standings, qualifiers, refresh_teams,
    seed_playoffs, setup_tournament, shuffle_teams, standings_csv, submit_result, update_team,
    Advancement, GroupStandings, ResultSubmission, SkippedEdge, Standing, TeamEntry,
};
pub use models::{
    BracketConfig, BracketSide, EliminationFormat, Entrant, GameMatch, MatchFormat, MatchGraph,
    MatchId, MatchPatch, MatchState, PatchGuard, SeedPlaceholder, Slot, Stage, Team, TeamId,
    Tournament, TournamentError, TournamentId, TournamentStatus,
};
pub use store::{InMemoryStore, MatchStore, TournamentUpdate};
