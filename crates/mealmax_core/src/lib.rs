//! Core domain logic for MealMax meal battles.
//! This crate is the single source of truth for catalog and battle invariants.

pub mod config;
pub mod db;
pub mod kitchen;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, KitchenConfig};
pub use kitchen::{Kitchen, KitchenError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::battle::{BattleOutcome, BattleResult, LossPolicy, Side};
pub use model::meal::{Difficulty, Meal, MealId, MealValidationError, NewMeal};
pub use repo::meal_repo::{
    MealListQuery, MealRepository, RepoError, RepoResult, SqliteMealRepository,
};
pub use service::arena::{ArenaError, CombatantArena, ARENA_CAPACITY};
pub use service::battle_service::{
    battle_score, pick_winner, win_probability, BattleError, BattleService,
};
pub use service::catalog_service::{ActiveMeals, CatalogError, CatalogService, MealLookup};
pub use service::error::ErrorKind;
pub use service::leaderboard_service::{
    rank_entries, LeaderboardEntry, LeaderboardError, LeaderboardService, SortKey,
};
pub use service::random::{FixedRandom, RandomSource, SeededRandom, ThreadRandom};

/// Liveness probe that touches no state.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
