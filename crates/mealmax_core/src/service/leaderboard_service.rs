//! Read-only ranking over live catalog meals.
//!
//! # Invariants
//! - Deleted meals never appear.
//! - Ordering is total: sort key desc, then wins desc, then id asc.

use crate::model::meal::{Difficulty, Meal, MealId};
use crate::repo::meal_repo::{MealRepository, RepoError};
use crate::service::catalog_service::ActiveMeals;
use crate::service::error::ErrorKind;
use log::info;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Primary ranking criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    WinPct,
    Wins,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WinPct => "win_pct",
            Self::Wins => "wins",
        }
    }
}

impl FromStr for SortKey {
    type Err = LeaderboardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "win_pct" => Ok(Self::WinPct),
            "wins" => Ok(Self::Wins),
            other => Err(LeaderboardError::InvalidSortKey(other.to_string())),
        }
    }
}

#[derive(Debug)]
pub enum LeaderboardError {
    InvalidSortKey(String),
    Repo(RepoError),
}

impl LeaderboardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSortKey(_) => ErrorKind::Validation,
            Self::Repo(_) => ErrorKind::Infrastructure,
        }
    }
}

impl Display for LeaderboardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSortKey(value) => write!(f, "Invalid sort_by parameter: {value}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LeaderboardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::InvalidSortKey(_) => None,
        }
    }
}

impl From<RepoError> for LeaderboardError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Read-only projection of one live meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: MealId,
    #[serde(rename = "meal")]
    pub name: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: Difficulty,
    pub battles_fought: u32,
    pub wins: u32,
    /// `wins / battles_fought` in `[0, 1]`; zero without battles.
    pub win_percentage: f64,
}

impl From<Meal> for LeaderboardEntry {
    fn from(meal: Meal) -> Self {
        let win_percentage = meal.win_ratio();
        Self {
            id: meal.id,
            name: meal.name,
            cuisine: meal.cuisine,
            price: meal.price,
            difficulty: meal.difficulty,
            battles_fought: meal.battles_fought,
            wins: meal.wins,
            win_percentage,
        }
    }
}

/// Sorts entries in leaderboard order for `key`.
pub fn rank_entries(entries: &mut [LeaderboardEntry], key: SortKey) {
    entries.sort_by(|a, b| compare_entries(a, b, key));
}

fn compare_entries(a: &LeaderboardEntry, b: &LeaderboardEntry, key: SortKey) -> Ordering {
    let primary = match key {
        SortKey::WinPct => b.win_percentage.total_cmp(&a.win_percentage),
        SortKey::Wins => b.wins.cmp(&a.wins),
    };
    primary
        .then_with(|| b.wins.cmp(&a.wins))
        .then_with(|| a.id.cmp(&b.id))
}

pub struct LeaderboardService<R: MealRepository> {
    repo: R,
}

impl<R: MealRepository> LeaderboardService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Ranks every live meal. An empty catalog yields an empty board.
    pub fn rank(&self, key: SortKey) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let mut entries = ActiveMeals::new(&self.repo)
            .map(|meal| meal.map(LeaderboardEntry::from))
            .collect::<Result<Vec<_>, _>>()?;
        rank_entries(&mut entries, key);
        info!(
            "event=leaderboard_rank module=leaderboard status=ok sort_by={} entries={}",
            key.as_str(),
            entries.len()
        );
        Ok(entries)
    }
}
