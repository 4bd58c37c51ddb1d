//! MatchGraph: the authoritative set of matches with id-indexed lookup, and
//! MatchPatch, the partial update every write goes through.

use crate::models::game::{GameMatch, MatchId, Slot, Stage};
use crate::models::team::{Entrant, TeamId};
use crate::models::tournament::TournamentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Condition that must hold on the stored match for a patch to apply.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchGuard {
    /// The match has no winner yet.
    WinnerUnset,
    /// The slot is still empty.
    SlotEmpty(Slot),
    /// The slot still holds a seed placeholder.
    SlotHoldsSeed(Slot),
}

/// Partial update of one match. Only fields that are `Some` are written.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchPatch {
    pub match_id: MatchId,
    #[serde(default)]
    pub guards: Vec<PatchGuard>,
    pub team1: Option<Entrant>,
    pub team2: Option<Entrant>,
    pub score1: Option<u32>,
    pub score2: Option<u32>,
    pub winner_id: Option<TeamId>,
    pub start_time: Option<DateTime<Utc>>,
}

impl MatchPatch {
    pub fn new(match_id: impl Into<MatchId>) -> Self {
        Self {
            match_id: match_id.into(),
            ..Self::default()
        }
    }

    pub fn guard(mut self, guard: PatchGuard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn place(mut self, slot: Slot, entrant: impl Into<Entrant>) -> Self {
        match slot {
            Slot::Team1 => self.team1 = Some(entrant.into()),
            Slot::Team2 => self.team2 = Some(entrant.into()),
        }
        self
    }

    pub fn result(mut self, score1: u32, score2: u32, winner_id: impl Into<TeamId>) -> Self {
        self.score1 = Some(score1);
        self.score2 = Some(score2);
        self.winner_id = Some(winner_id.into());
        self
    }

    pub fn start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Whether every guard holds against `m`.
    pub fn guards_hold(&self, m: &GameMatch) -> bool {
        self.guards.iter().all(|g| match *g {
            PatchGuard::WinnerUnset => m.winner_id.is_none(),
            PatchGuard::SlotEmpty(slot) => m.slot(slot).is_none(),
            PatchGuard::SlotHoldsSeed(slot) => m.slot(slot).is_some_and(Entrant::is_seed),
        })
    }

    fn apply_to(&self, m: &mut GameMatch) {
        if let Some(t) = &self.team1 {
            m.team1 = Some(t.clone());
        }
        if let Some(t) = &self.team2 {
            m.team2 = Some(t.clone());
        }
        if let Some(s) = self.score1 {
            m.score1 = Some(s);
        }
        if let Some(s) = self.score2 {
            m.score2 = Some(s);
        }
        if let Some(w) = &self.winner_id {
            m.winner_id = Some(w.clone());
        }
        if let Some(t) = self.start_time {
            m.start_time = Some(t);
        }
    }
}

/// All matches of one tournament, in generation order, with O(1) lookup by id.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<GameMatch>", into = "Vec<GameMatch>")]
pub struct MatchGraph {
    matches: Vec<GameMatch>,
    index: HashMap<MatchId, usize>,
}

impl From<Vec<GameMatch>> for MatchGraph {
    fn from(matches: Vec<GameMatch>) -> Self {
        Self::new(matches)
    }
}

impl From<MatchGraph> for Vec<GameMatch> {
    fn from(graph: MatchGraph) -> Self {
        graph.matches
    }
}

impl MatchGraph {
    pub fn new(matches: Vec<GameMatch>) -> Self {
        let index = matches
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.clone(), i))
            .collect();
        Self { matches, index }
    }

    pub fn get(&self, id: &str) -> Option<&GameMatch> {
        self.index.get(id).map(|&i| &self.matches[i])
    }

    pub fn try_get(&self, id: &str) -> Result<&GameMatch, TournamentError> {
        self.get(id)
            .ok_or_else(|| TournamentError::MatchNotFound(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameMatch> {
        self.matches.iter()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn matches(&self) -> &[GameMatch] {
        &self.matches
    }

    pub fn into_matches(self) -> Vec<GameMatch> {
        self.matches
    }

    pub fn group_matches(&self) -> impl Iterator<Item = &GameMatch> {
        self.matches.iter().filter(|m| m.stage == Stage::Group)
    }

    /// True when there is a group stage and every group match has a winner.
    pub fn group_stage_complete(&self) -> bool {
        let mut group = self.group_matches().peekable();
        group.peek().is_some() && group.all(GameMatch::is_completed)
    }

    /// Playoff matches with nowhere to send their winner.
    pub fn terminal_matches(&self) -> Vec<&GameMatch> {
        self.matches
            .iter()
            .filter(|m| m.stage == Stage::Playoff && m.next_match_id.is_none())
            .collect()
    }

    /// Whether the tournament's last playoff match has been decided.
    pub fn is_decided(&self) -> bool {
        match self.terminal_matches().as_slice() {
            [last] => last.is_completed(),
            _ => false,
        }
    }

    /// Apply one patch, checking its guards first.
    pub fn apply(&mut self, patch: &MatchPatch) -> Result<(), TournamentError> {
        let &i = self
            .index
            .get(&patch.match_id)
            .ok_or_else(|| TournamentError::MatchNotFound(patch.match_id.clone()))?;
        if !patch.guards_hold(&self.matches[i]) {
            return Err(TournamentError::PersistenceConflict(patch.match_id.clone()));
        }
        patch.apply_to(&mut self.matches[i]);
        Ok(())
    }

    /// Apply patches in order, all or nothing.
    pub fn apply_all(&mut self, patches: &[MatchPatch]) -> Result<(), TournamentError> {
        let mut staged = self.clone();
        for patch in patches {
            staged.apply(patch)?;
        }
        *self = staged;
        Ok(())
    }

    /// Structural problems in the graph; empty when every invariant holds.
    pub fn violations(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for m in &self.matches {
            for target in [&m.next_match_id, &m.loser_match_id].into_iter().flatten() {
                if !self.index.contains_key(target) {
                    problems.push(format!("{} points at missing match {}", m.id, target));
                }
            }
            if let Some(w) = &m.winner_id {
                if !m.involves(w) {
                    problems.push(format!("{} has winner {} who is not in the match", m.id, w));
                }
            }
            if let (Some(s1), Some(s2)) = (m.score1, m.score2) {
                if m.is_completed() && s1 == s2 {
                    problems.push(format!("{} ended in a draw", m.id));
                }
            }
        }
        let terminals = self.terminal_matches().len();
        let has_playoffs = self.matches.iter().any(|m| m.stage == Stage::Playoff);
        if has_playoffs && terminals != 1 {
            problems.push(format!("expected one terminal playoff match, found {}", terminals));
        }
        problems
    }
}
