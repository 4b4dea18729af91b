//! Response envelopes.
//!
//! # Invariants
//! - Every envelope except health carries `status` = `success` | `error`.
//! - Error envelopes always carry a human-readable `message`.

use mealmax_core::{
    Difficulty, ErrorKind, KitchenError, LeaderboardEntry, Meal, MealId,
};
use serde::Serialize;

/// Uniform success/error envelope. Success payload fields are flattened
/// next to `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApiResponse<T> {
    Success(T),
    Error {
        message: String,
        error_kind: &'static str,
    },
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            Self::Success(payload) => Some(payload),
            Self::Error { .. } => None,
        }
    }

    /// Error category, for status-code mapping by the transport.
    pub fn error_kind(&self) -> Option<&'static str> {
        match self {
            Self::Success(_) => None,
            Self::Error { error_kind, .. } => Some(error_kind),
        }
    }
}

impl<T> From<KitchenError> for ApiResponse<T> {
    fn from(err: KitchenError) -> Self {
        Self::Error {
            message: err.to_string(),
            error_kind: err.kind().as_str(),
        }
    }
}

impl<T> From<Result<T, KitchenError>> for ApiResponse<T> {
    fn from(result: Result<T, KitchenError>) -> Self {
        match result {
            Ok(payload) => Self::Success(payload),
            Err(err) => err.into(),
        }
    }
}

/// Empty success payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Ack {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DbCheckBody {
    pub database_status: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MealCreated {
    pub id: MealId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealBody {
    pub meal: Meal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinnerBody {
    /// Winning meal name.
    pub winner: String,
    pub winner_id: MealId,
    pub loser_id: MealId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatantsBody {
    pub combatants: Vec<Meal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardBody {
    pub leaderboard: Vec<LeaderboardRow>,
}

/// Leaderboard row in wire shape. `win_pct` is a percentage with one decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub id: MealId,
    pub meal: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: Difficulty,
    pub battles: u32,
    pub wins: u32,
    pub win_pct: f64,
}

impl From<LeaderboardEntry> for LeaderboardRow {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            id: entry.id,
            meal: entry.name,
            cuisine: entry.cuisine,
            price: entry.price,
            difficulty: entry.difficulty,
            battles: entry.battles_fought,
            wins: entry.wins,
            win_pct: (entry.win_percentage * 1000.0).round() / 10.0,
        }
    }
}

pub(crate) fn validation_error<T>(message: impl Into<String>) -> ApiResponse<T> {
    ApiResponse::Error {
        message: message.into(),
        error_kind: ErrorKind::Validation.as_str(),
    }
}
