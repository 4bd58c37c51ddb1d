//! Match, MatchFormat, Stage and BracketSide.

use crate::models::team::{Entrant, Team, TeamId};
use crate::models::tournament::TournamentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a match, unique within a tournament (`match-1`, `match-2`, ...).
pub type MatchId = String;

/// Best-of-N format of a match.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum MatchFormat {
    #[default]
    Bo1,
    Bo2,
    Bo3,
    Bo5,
    Bo7,
}

impl MatchFormat {
    /// Games the winner must take.
    pub fn wins_needed(self) -> u32 {
        match self {
            MatchFormat::Bo1 => 1,
            MatchFormat::Bo2 => 2,
            MatchFormat::Bo3 => 2,
            MatchFormat::Bo5 => 3,
            MatchFormat::Bo7 => 4,
        }
    }

    /// Human hint listing the final scores this format allows.
    fn allowed_scores(self) -> String {
        let need = self.wins_needed();
        let max_loser = match self {
            // 1-1 is a draw, so a decided Bo2 is always 2-0.
            MatchFormat::Bo2 => 0,
            _ => need - 1,
        };
        let scores: Vec<String> = (0..=max_loser).map(|l| format!("{need}-{l}")).collect();
        match scores.as_slice() {
            [only] => only.clone(),
            [rest @ .., last] => format!("{} or {}", rest.join(", "), last),
            [] => String::new(),
        }
    }

    /// Check a final score against this format. Draws are never valid.
    pub fn validate_score(self, score1: u32, score2: u32) -> Result<(), TournamentError> {
        if score1 == score2 {
            return Err(TournamentError::InvalidScore {
                format: self,
                message: "Matches cannot end in a tie".to_string(),
            });
        }
        let (high, low) = (score1.max(score2), score1.min(score2));
        let loser_ok = match self {
            MatchFormat::Bo2 => low == 0,
            _ => low < high,
        };
        if high != self.wins_needed() || !loser_ok {
            return Err(TournamentError::InvalidScore {
                format: self,
                message: format!("A {} must end in {}", self, self.allowed_scores()),
            });
        }
        Ok(())
    }
}

impl fmt::Display for MatchFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchFormat::Bo1 => "Bo1",
            MatchFormat::Bo2 => "Bo2",
            MatchFormat::Bo3 => "Bo3",
            MatchFormat::Bo5 => "Bo5",
            MatchFormat::Bo7 => "Bo7",
        };
        f.write_str(s)
    }
}

/// Phase of the tournament this match belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Group,
    Playoff,
}

/// Which part of the playoff tree a match sits in.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketSide {
    /// Winners bracket (the whole tree in single elimination).
    Upper,
    /// Losers bracket (double elimination only).
    Lower,
    GrandFinal,
}

/// One of the two entrant slots of a match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Team1,
    Team2,
}

/// Where a match is in its life.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    /// At least one slot still waits for a team (or holds a seed placeholder).
    Empty,
    /// Both teams known, no kickoff time.
    Scheduled,
    /// Both teams known and a kickoff time set.
    TimeSet,
    /// Result recorded. Terminal.
    Completed,
}

/// A single match in the bracket graph.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    /// 0 for group matches; 1-based within the upper or lower bracket otherwise.
    pub round: u32,
    pub stage: Stage,
    /// Set for playoff matches only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<BracketSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<char>,
    pub format: MatchFormat,
    pub team1: Option<Entrant>,
    pub team2: Option<Entrant>,
    pub score1: Option<u32>,
    pub score2: Option<u32>,
    pub winner_id: Option<TeamId>,
    pub start_time: Option<DateTime<Utc>>,
    /// Where the winner goes.
    pub next_match_id: Option<MatchId>,
    /// Where the loser goes (double elimination).
    pub loser_match_id: Option<MatchId>,
    pub name: String,
}

impl GameMatch {
    pub fn new(id: MatchId, round: u32, stage: Stage, format: MatchFormat, name: impl Into<String>) -> Self {
        Self {
            id,
            round,
            stage,
            side: None,
            group: None,
            format,
            team1: None,
            team2: None,
            score1: None,
            score2: None,
            winner_id: None,
            start_time: None,
            next_match_id: None,
            loser_match_id: None,
            name: name.into(),
        }
    }

    pub fn slot(&self, slot: Slot) -> Option<&Entrant> {
        match slot {
            Slot::Team1 => self.team1.as_ref(),
            Slot::Team2 => self.team2.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, slot: Slot) -> &mut Option<Entrant> {
        match slot {
            Slot::Team1 => &mut self.team1,
            Slot::Team2 => &mut self.team2,
        }
    }

    /// First slot with nobody in it, team1 before team2.
    pub fn first_empty_slot(&self) -> Option<Slot> {
        [Slot::Team1, Slot::Team2]
            .into_iter()
            .find(|&s| self.slot(s).is_none())
    }

    /// Both real teams, when present.
    pub fn teams(&self) -> Option<(&Team, &Team)> {
        let t1 = self.team1.as_ref().and_then(Entrant::team)?;
        let t2 = self.team2.as_ref().and_then(Entrant::team)?;
        Some((t1, t2))
    }

    pub fn is_completed(&self) -> bool {
        self.winner_id.is_some()
    }

    /// Both slots hold real teams and no winner is recorded.
    pub fn is_playable(&self) -> bool {
        self.teams().is_some() && !self.is_completed()
    }

    pub fn state(&self) -> MatchState {
        if self.is_completed() {
            MatchState::Completed
        } else if self.teams().is_none() {
            MatchState::Empty
        } else if self.start_time.is_some() {
            MatchState::TimeSet
        } else {
            MatchState::Scheduled
        }
    }

    /// Winner and loser of a completed match.
    pub fn outcome(&self) -> Option<(&Team, &Team)> {
        let winner_id = self.winner_id.as_deref()?;
        let (t1, t2) = self.teams()?;
        if t1.id == winner_id {
            Some((t1, t2))
        } else if t2.id == winner_id {
            Some((t2, t1))
        } else {
            None
        }
    }

    /// Points scored minus points conceded by `team_id` in this match.
    pub fn differential_for(&self, team_id: &str) -> Option<i64> {
        let (t1, t2) = self.teams()?;
        let s1 = i64::from(self.score1.unwrap_or(0));
        let s2 = i64::from(self.score2.unwrap_or(0));
        if t1.id == team_id {
            Some(s1 - s2)
        } else if t2.id == team_id {
            Some(s2 - s1)
        } else {
            None
        }
    }

    pub fn involves(&self, team_id: &str) -> bool {
        [&self.team1, &self.team2]
            .into_iter()
            .flatten()
            .any(|e| e.id() == team_id)
    }
}
