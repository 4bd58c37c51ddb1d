//! Team and SeedPlaceholder: the occupants of a match slot.

use serde::{Deserialize, Serialize};

/// Identifier for a team. Assigned once (e.g. `team-3`) and never changed.
pub type TeamId = String;

/// Prefix carried by every seed placeholder id.
pub const SEED_ID_PREFIX: &str = "seed-";

/// A participating team.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

impl Team {
    pub fn new(id: impl Into<TeamId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            logo_url: None,
        }
    }

    pub fn with_logo(mut self, logo_url: impl Into<String>) -> Self {
        self.logo_url = Some(logo_url.into());
        self
    }
}

/// Stand-in for a group-stage qualifier that is not known yet ("1st Group A").
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeedPlaceholder {
    pub id: String,
    pub name: String,
    pub group: char,
    /// 1 for the group winner, 2 for the runner-up.
    pub place: u8,
}

impl SeedPlaceholder {
    /// `index` is the position in the cross-seed order; it only feeds the id.
    pub fn new(index: usize, group: char, place: u8) -> Self {
        let ordinal = match place {
            1 => "1st",
            2 => "2nd",
            3 => "3rd",
            _ => "Nth",
        };
        Self {
            id: format!("{SEED_ID_PREFIX}{index}"),
            name: format!("{ordinal} Group {group}"),
            group,
            place,
        }
    }
}

/// Whatever currently sits in a match slot.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entrant {
    Team(Team),
    Seed(SeedPlaceholder),
}

impl Entrant {
    pub fn id(&self) -> &str {
        match self {
            Entrant::Team(t) => &t.id,
            Entrant::Seed(s) => &s.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entrant::Team(t) => &t.name,
            Entrant::Seed(s) => &s.name,
        }
    }

    pub fn team(&self) -> Option<&Team> {
        match self {
            Entrant::Team(t) => Some(t),
            Entrant::Seed(_) => None,
        }
    }

    pub fn seed(&self) -> Option<&SeedPlaceholder> {
        match self {
            Entrant::Team(_) => None,
            Entrant::Seed(s) => Some(s),
        }
    }

    pub fn is_seed(&self) -> bool {
        matches!(self, Entrant::Seed(_))
    }
}

impl From<Team> for Entrant {
    fn from(team: Team) -> Self {
        Entrant::Team(team)
    }
}

impl From<SeedPlaceholder> for Entrant {
    fn from(seed: SeedPlaceholder) -> Self {
        Entrant::Seed(seed)
    }
}
