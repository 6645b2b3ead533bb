use serde::{Deserialize, Serialize};

pub const BALANCE_LABEL: &str = "Balance";
pub const VETO_LABEL: &str = "Veto";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Motion {
    #[serde(default)]
    pub url: String,
    pub text: String,
    #[serde(default)]
    pub reference: String,
    /// Raw info-slide markup as delivered by the API.
    #[serde(default)]
    pub info_slide: String,
    #[serde(default)]
    pub info_slide_plain: String,
}

/// A labelled row of counts, e.g. `Balance [3, 2, 5]` or `OG [4, 1, 0, 2]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionStats {
    pub label: String,
    pub value: Vec<u32>,
}

impl MotionStats {
    pub fn new(label: impl Into<String>, value: Vec<u32>) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }

    pub fn is_balance(&self) -> bool {
        self.label == BALANCE_LABEL
    }

    pub fn is_veto(&self) -> bool {
        self.label == VETO_LABEL
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundMotion {
    pub motion: Motion,
    pub seq: u32,
    #[serde(default)]
    pub stats: Vec<MotionStats>,
}

impl RoundMotion {
    pub fn balance(&self) -> Option<&MotionStats> {
        self.stats.iter().find(|stat| stat.is_balance())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    #[serde(default)]
    pub url: String,
    pub seq: u32,
    pub name: String,
    pub pretty_name: String,
    #[serde(default)]
    pub motions: Vec<RoundMotion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TournamentYear {
    pub name: String,
    #[serde(default)]
    pub rounds: Vec<Round>,
}

impl TournamentYear {
    pub fn motion_count(&self) -> usize {
        self.rounds.iter().map(|round| round.motions.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TournamentGroup {
    pub name: String,
    #[serde(default)]
    pub tournaments: Vec<TournamentYear>,
}
