//! Meal domain model.
//!
//! # Responsibility
//! - Define the catalog record used by staging, battles and the leaderboard.
//! - Validate user-provided attributes before they reach storage.
//!
//! # Invariants
//! - `id` is assigned by storage and never reused for another meal.
//! - `wins <= battles_fought` for every persisted meal.
//! - `deleted` is the source of truth for tombstone state.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Storage-assigned meal identifier.
pub type MealId = i64;

/// Self-declared preparation difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Low,
    Med,
    High,
}

impl Difficulty {
    /// Score penalty subtracted from a meal's raw battle score.
    pub fn penalty(self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Med => 2.0,
            Self::High => 3.0,
        }
    }

    /// Canonical wire/storage label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Med => "MED",
            Self::High => "HIGH",
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = MealValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "LOW" => Ok(Self::Low),
            "MED" => Ok(Self::Med),
            "HIGH" => Ok(Self::High),
            other => Err(MealValidationError::InvalidDifficulty(other.to_string())),
        }
    }
}

/// Validation failures for meal attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum MealValidationError {
    EmptyName,
    EmptyCuisine,
    InvalidPrice(f64),
    InvalidDifficulty(String),
    WinsExceedBattles { wins: u32, battles_fought: u32 },
}

impl Display for MealValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "meal name cannot be empty"),
            Self::EmptyCuisine => write!(f, "cuisine cannot be empty"),
            Self::InvalidPrice(price) => {
                write!(f, "Invalid price: {price}. Price must be a positive number.")
            }
            Self::InvalidDifficulty(value) => write!(
                f,
                "Invalid difficulty level: {value}. Must be 'LOW', 'MED', or 'HIGH'."
            ),
            Self::WinsExceedBattles {
                wins,
                battles_fought,
            } => write!(
                f,
                "wins ({wins}) cannot exceed battles fought ({battles_fought})"
            ),
        }
    }
}

impl Error for MealValidationError {}

/// Input for creating a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMeal {
    pub name: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: Difficulty,
}

impl NewMeal {
    pub fn new(
        name: impl Into<String>,
        cuisine: impl Into<String>,
        price: f64,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            name: name.into(),
            cuisine: cuisine.into(),
            price,
            difficulty,
        }
    }

    /// Checks user-provided attributes.
    ///
    /// # Errors
    /// - Empty (or whitespace-only) name or cuisine.
    /// - Price that is not a finite number greater than zero.
    pub fn validate(&self) -> Result<(), MealValidationError> {
        validate_attributes(&self.name, &self.cuisine, self.price)
    }
}

/// Canonical catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: MealId,
    /// Serialized as `meal` to match the external schema naming.
    #[serde(rename = "meal")]
    pub name: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: Difficulty,
    pub battles_fought: u32,
    pub wins: u32,
    /// Soft delete tombstone. Deleted ids stay retired.
    pub deleted: bool,
}

impl Meal {
    /// Validates attributes and stat bookkeeping of a loaded record.
    pub fn validate(&self) -> Result<(), MealValidationError> {
        validate_attributes(&self.name, &self.cuisine, self.price)?;
        if self.wins > self.battles_fought {
            return Err(MealValidationError::WinsExceedBattles {
                wins: self.wins,
                battles_fought: self.battles_fought,
            });
        }
        Ok(())
    }

    /// Returns whether this meal should be considered visible/active.
    pub fn is_active(&self) -> bool {
        !self.deleted
    }

    /// Win ratio in `[0, 1]`; zero for meals that never fought.
    pub fn win_ratio(&self) -> f64 {
        if self.battles_fought == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(self.battles_fought)
        }
    }
}

fn validate_attributes(name: &str, cuisine: &str, price: f64) -> Result<(), MealValidationError> {
    if name.trim().is_empty() {
        return Err(MealValidationError::EmptyName);
    }
    if cuisine.trim().is_empty() {
        return Err(MealValidationError::EmptyCuisine);
    }
    if !price.is_finite() || price <= 0.0 {
        return Err(MealValidationError::InvalidPrice(price));
    }
    Ok(())
}
