//! Battle outcome model.
//!
//! # Invariants
//! - A resolved battle always has exactly one winner and one loser.
//! - `battle_id` is unique per resolution and only used for correlation.

use crate::model::meal::MealId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Per-meal stat update applied after a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleResult {
    /// `battles_fought + 1`, `wins + 1`.
    Win,
    /// `battles_fought + 1`.
    Loss,
}

/// What happens to the losing meal of a battle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossPolicy {
    /// Loser is soft-deleted and its stats are discarded.
    #[default]
    Eliminate,
    /// Loser keeps its record with one more battle fought.
    RecordLoss,
}

impl LossPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eliminate => "eliminate",
            Self::RecordLoss => "record_loss",
        }
    }
}

impl FromStr for LossPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "eliminate" => Ok(Self::Eliminate),
            "record_loss" => Ok(Self::RecordLoss),
            other => Err(format!(
                "unsupported loss policy `{other}`; expected eliminate|record_loss"
            )),
        }
    }
}

/// Staging position of a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// First staged combatant.
    A,
    /// Second staged combatant.
    B,
}

/// Result of one resolved battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleOutcome {
    pub battle_id: Uuid,
    pub winner_id: MealId,
    pub winner_name: String,
    pub loser_id: MealId,
    pub loser_name: String,
    pub winning_side: Side,
    pub score_a: f64,
    pub score_b: f64,
    /// Probability that side A wins, in `[0, 1]`.
    pub win_probability_a: f64,
    /// Uniform draw in `[0, 1)` that decided the battle.
    pub draw: f64,
    pub loss_policy: LossPolicy,
}
