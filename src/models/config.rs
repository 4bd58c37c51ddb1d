//! BracketConfig: how a tournament's match graph is shaped.

use crate::models::game::MatchFormat;
use serde::{Deserialize, Serialize};

/// Playoff elimination style.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationFormat {
    #[default]
    SingleElimination,
    DoubleElimination,
}

/// Chosen once when the tournament is created; never changed afterwards.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BracketConfig {
    pub format: EliminationFormat,
    pub has_group_stage: bool,
    pub group_stage_format: MatchFormat,
    pub upper_bracket_format: MatchFormat,
    pub lower_bracket_format: MatchFormat,
    pub grand_final_format: MatchFormat,
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self {
            format: EliminationFormat::SingleElimination,
            has_group_stage: false,
            group_stage_format: MatchFormat::Bo1,
            upper_bracket_format: MatchFormat::Bo3,
            lower_bracket_format: MatchFormat::Bo1,
            grand_final_format: MatchFormat::Bo5,
        }
    }
}

impl BracketConfig {
    pub fn single_elimination() -> Self {
        Self::default()
    }

    pub fn double_elimination() -> Self {
        Self {
            format: EliminationFormat::DoubleElimination,
            ..Self::default()
        }
    }

    pub fn with_group_stage(mut self) -> Self {
        self.has_group_stage = true;
        self
    }

    pub fn is_double_elimination(&self) -> bool {
        self.format == EliminationFormat::DoubleElimination
    }
}
