//! Playoff seeding: cross-seeded placeholders at generation time, and their
//! replacement by the real qualifiers once the group stage is over.

use crate::logic::standings::group_standings;
use crate::models::{
    BracketSide, Entrant, GameMatch, MatchGraph, MatchPatch, PatchGuard, SeedPlaceholder, Slot, Stage,
};

/// Placeholders in playoff order: groups are taken in pairs (A,B), (C,D), ...
/// and each pair yields `1st A, 2nd B, 1st B, 2nd A`, so no winner meets its
/// own group's runner-up in round 1. A lone group yields `1st A, 2nd A`.
pub fn cross_seed_placeholders(labels: &[char]) -> Vec<SeedPlaceholder> {
    let mut order: Vec<(char, u8)> = Vec::with_capacity(labels.len() * 2);
    for (g, &a) in labels.iter().enumerate().step_by(2) {
        match labels.get(g + 1) {
            Some(&b) => order.extend([(a, 1), (b, 2), (b, 1), (a, 2)]),
            None => order.extend([(a, 1), (a, 2)]),
        }
    }
    order
        .into_iter()
        .enumerate()
        .map(|(i, (group, place))| SeedPlaceholder::new(i, group, place))
        .collect()
}

fn is_upper_round_one(m: &GameMatch) -> bool {
    m.stage == Stage::Playoff && m.round == 1 && m.side == Some(BracketSide::Upper)
}

/// Fill upper-bracket round 1, match by match, team1 then team2.
pub(crate) fn place_in_round_one(playoffs: &mut [GameMatch], entrants: Vec<Entrant>) {
    let mut entrants = entrants.into_iter();
    for m in playoffs.iter_mut().filter(|m| is_upper_round_one(m)) {
        m.team1 = entrants.next();
        m.team2 = entrants.next();
    }
}

/// Replace every seed placeholder in playoff round 1 with the team that
/// finished in that (group, place).
///
/// Returns no patches until every group match is complete, and none once the
/// placeholders are gone, so calling it repeatedly is harmless. Each patch
/// is guarded on the slot still holding a placeholder.
pub fn seed_playoffs(graph: &MatchGraph) -> Vec<MatchPatch> {
    if !graph.group_stage_complete() {
        return Vec::new();
    }
    let has_placeholders = graph
        .iter()
        .filter(|m| is_upper_round_one(m))
        .any(|m| [&m.team1, &m.team2].into_iter().flatten().any(Entrant::is_seed));
    if !has_placeholders {
        return Vec::new();
    }

    let standings = group_standings(graph.group_matches());
    let qualifier = |seed: &SeedPlaceholder| {
        standings
            .get(&seed.group)
            .and_then(|table| table.get(usize::from(seed.place).checked_sub(1)?))
            .map(|row| row.team.clone())
    };

    let mut patches = Vec::new();
    for m in graph.iter().filter(|m| is_upper_round_one(m)) {
        let mut patch = MatchPatch::new(m.id.clone());
        let mut touched = false;
        for slot in [Slot::Team1, Slot::Team2] {
            let Some(seed) = m.slot(slot).and_then(Entrant::seed) else {
                continue;
            };
            match qualifier(seed) {
                Some(team) => {
                    log::debug!("{} -> {} ({})", seed.name, team.name, m.name);
                    patch = patch.guard(PatchGuard::SlotHoldsSeed(slot)).place(slot, team);
                    touched = true;
                }
                None => log::warn!("No qualifier found for {} in {}", seed.name, m.name),
            }
        }
        if touched {
            patches.push(patch);
        }
    }
    patches
}
