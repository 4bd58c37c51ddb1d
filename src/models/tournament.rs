//! Tournament, TournamentStatus and TournamentError.

use crate::models::config::BracketConfig;
use crate::models::game::{MatchFormat, MatchId};
use crate::models::team::{Team, TeamId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur during tournament operations.
///
/// Every variant is recoverable: the operation that produced it left the
/// stored tournament untouched.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    /// Tie, or a score that does not fit the match's best-of format.
    InvalidScore { format: MatchFormat, message: String },
    /// Match is missing a team or is already completed.
    MatchNotPlayable(MatchId),
    /// Downstream slot was unexpectedly full; that edge was skipped.
    SlotOccupied(MatchId),
    /// Neither a score nor a start time was supplied.
    NothingToUpdate,
    /// A concurrent write got there first; reload and retry.
    PersistenceConflict(MatchId),
    /// Team count is outside the supported table for this configuration.
    UnsupportedTeamCount { count: usize, has_group_stage: bool },
    TournamentNotFound(TournamentId),
    MatchNotFound(MatchId),
    TeamNotFound(TeamId),
    /// Tournament status does not allow this action.
    InvalidState,
    /// Standings could not be rendered for export.
    Export(String),
    /// The persistence backend failed (e.g. a poisoned lock).
    Storage(String),
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::InvalidScore { message, .. } => write!(f, "Invalid score. {}.", message),
            TournamentError::MatchNotPlayable(id) => {
                write!(f, "Match {} is not playable (missing a team or already completed)", id)
            }
            TournamentError::SlotOccupied(id) => write!(f, "Both slots of match {} are already filled", id),
            TournamentError::NothingToUpdate => write!(f, "Please set a date/time or enter scores"),
            TournamentError::PersistenceConflict(id) => {
                write!(f, "Match {} was changed by someone else; reload and try again", id)
            }
            TournamentError::UnsupportedTeamCount { count, has_group_stage: true } => {
                write!(f, "{} teams is not supported with a group stage (use 4, 8, 12, 16, 24 or 32)", count)
            }
            TournamentError::UnsupportedTeamCount { count, has_group_stage: false } => {
                write!(f, "{} teams is not supported without a group stage (use a power of two)", count)
            }
            TournamentError::TournamentNotFound(_) => write!(f, "No tournament"),
            TournamentError::MatchNotFound(id) => write!(f, "Match {} not found", id),
            TournamentError::TeamNotFound(id) => write!(f, "Team {} not found", id),
            TournamentError::InvalidState => write!(f, "Invalid state for this action"),
            TournamentError::Export(e) => write!(f, "Could not export standings: {}", e),
            TournamentError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for TournamentError {}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Lifecycle of a tournament.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Bracket generated, still editable by the organizer.
    #[default]
    Draft,
    PendingApproval,
    /// Approved by an admin; accepts results.
    Approved,
    Rejected,
    /// At least one result recorded.
    Ongoing,
    /// The final playoff match has a winner.
    Completed,
}

impl TournamentStatus {
    /// Whether match results may be submitted.
    pub fn accepts_results(self) -> bool {
        matches!(self, TournamentStatus::Approved | TournamentStatus::Ongoing)
    }
}

/// Tournament metadata. Matches are stored separately, keyed by tournament and match id.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Teams in seeding order (already shuffled).
    pub teams: Vec<Team>,
    pub config: BracketConfig,
    pub status: TournamentStatus,
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    /// Create a new tournament in Draft status.
    pub fn new(name: impl Into<String>, teams: Vec<Team>, config: BracketConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            teams,
            config,
            status: TournamentStatus::Draft,
            created_at: Utc::now(),
        }
    }

    pub fn get_team(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn get_team_mut(&mut self, id: &str) -> Option<&mut Team> {
        self.teams.iter_mut().find(|t| t.id == id)
    }

    /// Draft -> PendingApproval.
    pub fn submit_for_approval(&mut self) -> Result<(), TournamentError> {
        self.transition(TournamentStatus::Draft, TournamentStatus::PendingApproval)
    }

    /// PendingApproval -> Approved.
    pub fn approve(&mut self) -> Result<(), TournamentError> {
        self.transition(TournamentStatus::PendingApproval, TournamentStatus::Approved)
    }

    /// PendingApproval -> Rejected.
    pub fn reject(&mut self) -> Result<(), TournamentError> {
        self.transition(TournamentStatus::PendingApproval, TournamentStatus::Rejected)
    }

    /// Record that a result was accepted; `final_decided` when the last playoff match finished.
    pub fn record_result(&mut self, final_decided: bool) -> Result<(), TournamentError> {
        if !self.status.accepts_results() {
            return Err(TournamentError::InvalidState);
        }
        self.status = if final_decided {
            TournamentStatus::Completed
        } else {
            TournamentStatus::Ongoing
        };
        Ok(())
    }

    fn transition(&mut self, from: TournamentStatus, to: TournamentStatus) -> Result<(), TournamentError> {
        if self.status != from {
            return Err(TournamentError::InvalidState);
        }
        self.status = to;
        Ok(())
    }
}
