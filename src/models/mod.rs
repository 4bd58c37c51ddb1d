//! Data structures for the bracket engine: teams, matches, the match graph, tournaments.

mod config;
mod game;
mod graph;
mod team;
mod tournament;

pub use config::{BracketConfig, EliminationFormat};
pub use game::{BracketSide, GameMatch, MatchFormat, MatchId, MatchState, Slot, Stage};
pub use graph::{MatchGraph, MatchPatch, PatchGuard};
pub use team::{Entrant, SeedPlaceholder, Team, TeamId, SEED_ID_PREFIX};
pub use tournament::{Tournament, TournamentError, TournamentId, TournamentStatus};
