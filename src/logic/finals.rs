//! Playoff trees: single elimination and double elimination (upper + lower bracket + grand final).

use crate::logic::bracket::MatchIds;
use crate::models::{BracketConfig, BracketSide, GameMatch, MatchFormat, Stage};

/// Which outgoing edge of a match to wire.
#[derive(Clone, Copy)]
enum Edge {
    Winner,
    Loser,
}

/// Point every match in `from` at `to[target(index)]`. Indices past the end are left unwired.
fn link(from: &mut [GameMatch], to: &[GameMatch], edge: Edge, target: impl Fn(usize) -> usize) {
    for (i, m) in from.iter_mut().enumerate() {
        let Some(dest) = to.get(target(i)) else {
            continue;
        };
        let id = Some(dest.id.clone());
        match edge {
            Edge::Winner => m.next_match_id = id,
            Edge::Loser => m.loser_match_id = id,
        }
    }
}

fn playoff_match(
    ids: &mut MatchIds,
    round: usize,
    side: BracketSide,
    format: MatchFormat,
    name: String,
) -> GameMatch {
    let mut m = GameMatch::new(ids.next_id(), round as u32, Stage::Playoff, format, name);
    m.side = Some(side);
    m
}

/// Generate an empty playoff bracket for `slots` entrants (a power of two).
/// Fewer than two slots gives no matches.
pub(crate) fn generate_playoff_bracket(slots: usize, config: &BracketConfig, ids: &mut MatchIds) -> Vec<GameMatch> {
    if slots < 2 {
        return Vec::new();
    }
    if config.is_double_elimination() {
        double_elimination(slots, config, ids)
    } else {
        single_elimination(slots, config, ids)
    }
}

/// Rounds needed to reduce `slots` entrants to one.
pub fn round_count(slots: usize) -> usize {
    slots.trailing_zeros() as usize
}

fn single_elimination_name(round: usize, index: usize, in_round: usize, total_rounds: usize) -> String {
    let n = index + 1;
    if round == 0 {
        return match in_round {
            4 => format!("Quarter-Final {}", n),
            2 => format!("Semi-Final {}", n),
            1 => "Final".to_string(),
            _ => format!("Round 1 Match {}", n),
        };
    }
    if round == total_rounds - 1 {
        return if in_round == 1 {
            "Grand Final".to_string()
        } else {
            format!("Final {}", n)
        };
    }
    match in_round {
        2 => format!("Semi-Final {}", n),
        4 => format!("Quarter-Final {}", n),
        _ => format!("Round {} Match {}", round + 1, n),
    }
}

fn single_elimination(slots: usize, config: &BracketConfig, ids: &mut MatchIds) -> Vec<GameMatch> {
    let total_rounds = round_count(slots);
    let mut rounds: Vec<Vec<GameMatch>> = Vec::with_capacity(total_rounds);

    for r in 0..total_rounds {
        let in_round = slots >> (r + 1);
        // Round 1 always plays the upper-bracket format, even when it is the only round.
        let format = if r > 0 && r == total_rounds - 1 {
            config.grand_final_format
        } else {
            config.upper_bracket_format
        };
        let mut round = Vec::with_capacity(in_round);
        for m in 0..in_round {
            let name = single_elimination_name(r, m, in_round, total_rounds);
            round.push(playoff_match(ids, r + 1, BracketSide::Upper, format, name));
        }
        rounds.push(round);
    }

    wire_winners(&mut rounds);
    rounds.into_iter().flatten().collect()
}

/// Match `m` of each round feeds match `m / 2` of the next.
fn wire_winners(rounds: &mut [Vec<GameMatch>]) {
    for r in 1..rounds.len() {
        let (before, after) = rounds.split_at_mut(r);
        link(&mut before[r - 1], &after[0], Edge::Winner, |m| m / 2);
    }
}

fn upper_bracket_name(round: usize, index: usize, in_round: usize, total_rounds: usize) -> String {
    if round == total_rounds - 1 || in_round == 1 {
        "Upper Bracket Final".to_string()
    } else if in_round == 2 {
        format!("Upper Bracket Semi-Final {}", index + 1)
    } else {
        format!("Upper Bracket R{} Match {}", round + 1, index + 1)
    }
}

fn double_elimination(slots: usize, config: &BracketConfig, ids: &mut MatchIds) -> Vec<GameMatch> {
    let total_rounds = round_count(slots);

    let mut upper: Vec<Vec<GameMatch>> = Vec::with_capacity(total_rounds);
    for r in 0..total_rounds {
        let in_round = slots >> (r + 1);
        let mut round = Vec::with_capacity(in_round);
        for m in 0..in_round {
            let name = upper_bracket_name(r, m, in_round, total_rounds);
            round.push(playoff_match(ids, r + 1, BracketSide::Upper, config.upper_bracket_format, name));
        }
        upper.push(round);
    }
    wire_winners(&mut upper);

    let mut lower = if total_rounds >= 2 {
        lower_bracket(&mut upper, slots, config, ids)
    } else {
        Vec::new()
    };

    let grand_final = playoff_match(
        ids,
        total_rounds + 1,
        BracketSide::GrandFinal,
        config.grand_final_format,
        "Grand Final".to_string(),
    );

    let gf = std::slice::from_ref(&grand_final);
    if let Some(upper_final) = upper.last_mut() {
        link(upper_final, gf, Edge::Winner, |_| 0);
        // Two-team bracket: no lower bracket, so the upper final's loser gets the rematch.
        if lower.is_empty() {
            link(upper_final, gf, Edge::Loser, |_| 0);
        }
    }

    if let Some(lower_final) = lower.last_mut() {
        link(lower_final, gf, Edge::Winner, |_| 0);
    }

    let mut all: Vec<GameMatch> = upper.into_iter().flatten().collect();
    all.extend(lower.into_iter().flatten());
    all.push(grand_final);
    all
}

/// Build the losers bracket and wire the upper bracket's loser edges into it.
///
/// Round 1 takes upper round-1 losers two at a time. Then, for every later
/// upper round, a dropout round pairs that round's losers 1:1 with the previous
/// lower-round winners, followed by a consolidation round (2:1) whenever the
/// dropout round has two or more matches.
fn lower_bracket(
    upper: &mut [Vec<GameMatch>],
    slots: usize,
    config: &BracketConfig,
    ids: &mut MatchIds,
) -> Vec<Vec<GameMatch>> {
    let format = config.lower_bracket_format;
    let total_rounds = upper.len();
    let mut lower: Vec<Vec<GameMatch>> = Vec::new();

    let first_size = slots / 4;
    let first: Vec<GameMatch> = (0..first_size)
        .map(|m| {
            let name = if first_size == 1 {
                "Elimination Match".to_string()
            } else {
                format!("Elimination Match {}", m + 1)
            };
            playoff_match(ids, 1, BracketSide::Lower, format, name)
        })
        .collect();
    link(&mut upper[0], &first, Edge::Loser, |m| m / 2);
    lower.push(first);

    for upper_round in 1..total_rounds {
        let dropped = upper[upper_round].len();
        let round_no = lower.len() + 1;
        let is_lower_final = dropped == 1 && upper_round == total_rounds - 1;

        let dropout: Vec<GameMatch> = (0..dropped)
            .map(|m| {
                let name = if is_lower_final {
                    "Lower Bracket Final".to_string()
                } else {
                    format!("Lower Bracket R{} Match {}", round_no, m + 1)
                };
                playoff_match(ids, round_no, BracketSide::Lower, format, name)
            })
            .collect();
        link(&mut upper[upper_round], &dropout, Edge::Loser, |m| m);
        if let Some(previous) = lower.last_mut() {
            link(previous, &dropout, Edge::Winner, |m| m);
        }
        lower.push(dropout);

        if dropped >= 2 {
            let size = dropped / 2;
            let round_no = lower.len() + 1;
            let consolidation: Vec<GameMatch> = (0..size)
                .map(|m| {
                    let name = if size == 1 {
                        format!("Lower Bracket R{}", round_no)
                    } else {
                        format!("Lower Bracket R{} Match {}", round_no, m + 1)
                    };
                    playoff_match(ids, round_no, BracketSide::Lower, format, name)
                })
                .collect();
            if let Some(previous) = lower.last_mut() {
                link(previous, &consolidation, Edge::Winner, |m| m / 2);
            }
            lower.push(consolidation);
        }
    }

    lower
}

/// Matches in a single-elimination tree of `slots` entrants.
pub fn single_elimination_match_count(slots: usize) -> usize {
    slots.saturating_sub(1)
}

/// Matches in a double-elimination tree of `slots` entrants, grand final included.
pub fn double_elimination_match_count(slots: usize) -> usize {
    if slots < 2 {
        0
    } else {
        2 * slots - 2
    }
}
