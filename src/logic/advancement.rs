//! Result submission: validate a score, complete the match, and push the
//! winner (and loser, in double elimination) into their next matches.

use crate::logic::playoff_seeding::seed_playoffs;
use crate::models::{
    GameMatch, MatchGraph, MatchId, MatchPatch, PatchGuard, Stage, TeamId, TournamentError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the organizer entered for a match.
///
/// A 0-0 score means "no result yet": only the start time is written.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResultSubmission {
    #[serde(default)]
    pub score1: u32,
    #[serde(default)]
    pub score2: u32,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
}

impl ResultSubmission {
    pub fn score(score1: u32, score2: u32) -> Self {
        Self {
            score1,
            score2,
            start_time: None,
        }
    }

    pub fn schedule(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time: Some(start_time),
            ..Self::default()
        }
    }

    pub fn at(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn is_schedule_only(&self) -> bool {
        self.score1 == 0 && self.score2 == 0
    }
}

/// An advancement edge that could not be followed because the target was full.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SkippedEdge {
    pub from: MatchId,
    pub to: MatchId,
    pub team_id: TeamId,
}

impl SkippedEdge {
    pub fn error(&self) -> TournamentError {
        TournamentError::SlotOccupied(self.to.clone())
    }
}

/// Everything one submission changes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Advancement {
    /// The submitted match after the update.
    pub updated_match: GameMatch,
    /// Write for the submitted match, guarded on it having no winner yet.
    pub patch: MatchPatch,
    /// Writes for downstream matches: advancement placements, then playoff seeding.
    pub downstream: Vec<MatchPatch>,
    pub skipped: Vec<SkippedEdge>,
    /// Whether this result closed the group stage and filled playoff round 1.
    pub playoffs_seeded: bool,
}

impl Advancement {
    /// All writes in commit order.
    pub fn patches(&self) -> Vec<MatchPatch> {
        std::iter::once(self.patch.clone())
            .chain(self.downstream.iter().cloned())
            .collect()
    }

    pub fn is_schedule_only(&self) -> bool {
        self.updated_match.winner_id.is_none()
    }
}

/// Work out the effect of a submission on `graph` without changing it.
///
/// Fails with `MatchNotPlayable` when the match lacks a team or already has a
/// winner, `NothingToUpdate` for a 0-0 submission without a start time, and
/// `InvalidScore` when the score does not fit the match's format.
pub fn submit_result(
    graph: &MatchGraph,
    match_id: &str,
    submission: &ResultSubmission,
) -> Result<Advancement, TournamentError> {
    let m = graph.try_get(match_id)?;
    let Some((team1, team2)) = m.teams() else {
        return Err(TournamentError::MatchNotPlayable(m.id.clone()));
    };
    if m.is_completed() {
        return Err(TournamentError::MatchNotPlayable(m.id.clone()));
    }

    if submission.is_schedule_only() {
        let start_time = submission.start_time.ok_or(TournamentError::NothingToUpdate)?;
        let patch = MatchPatch::new(m.id.clone())
            .guard(PatchGuard::WinnerUnset)
            .start_time(start_time);
        let mut updated_match = m.clone();
        updated_match.start_time = Some(start_time);
        return Ok(Advancement {
            updated_match,
            patch,
            downstream: Vec::new(),
            skipped: Vec::new(),
            playoffs_seeded: false,
        });
    }

    let (score1, score2) = (submission.score1, submission.score2);
    m.format.validate_score(score1, score2)?;
    let (winner, loser) = if score1 > score2 {
        (team1, team2)
    } else {
        (team2, team1)
    };

    let mut patch = MatchPatch::new(m.id.clone())
        .guard(PatchGuard::WinnerUnset)
        .result(score1, score2, winner.id.clone());
    if let Some(start_time) = submission.start_time {
        patch = patch.start_time(start_time);
    }

    // Apply to a scratch copy so later placements see earlier ones.
    let mut working = graph.clone();
    working.apply(&patch)?;

    let mut downstream = Vec::new();
    let mut skipped = Vec::new();
    for (target, team) in [(&m.next_match_id, winner), (&m.loser_match_id, loser)] {
        let Some(target) = target else {
            continue;
        };
        match working.try_get(target)?.first_empty_slot() {
            Some(slot) => {
                let placement = MatchPatch::new(target.clone())
                    .guard(PatchGuard::SlotEmpty(slot))
                    .place(slot, team.clone());
                working.apply(&placement)?;
                downstream.push(placement);
            }
            None => {
                log::warn!("Target match {} is already full; {} not advanced", target, team.name);
                skipped.push(SkippedEdge {
                    from: m.id.clone(),
                    to: target.clone(),
                    team_id: team.id.clone(),
                });
            }
        }
    }

    let mut playoffs_seeded = false;
    if m.stage == Stage::Group {
        let seeding = seed_playoffs(&working);
        if !seeding.is_empty() {
            working.apply_all(&seeding)?;
            log::info!("Group stage complete; seeded {} playoff match(es)", seeding.len());
            downstream.extend(seeding);
            playoffs_seeded = true;
        }
    }

    let updated_match = working.try_get(match_id)?.clone();
    Ok(Advancement {
        updated_match,
        patch,
        downstream,
        skipped,
        playoffs_seeded,
    })
}
