//! Transport-agnostic request handlers for the MealMax service surface.
//!
//! Each route is a plain function over a shared [`mealmax_core::Kitchen`]
//! that returns a serializable envelope. Binding them to an HTTP router is
//! left to the embedding server.

pub mod api;
pub mod envelope;

pub use api::{
    battle, clear_combatants, clear_meals, core_version, create_meal, db_check, delete_meal,
    get_combatants, get_meal_by_id, get_meal_by_name, health, leaderboard, ping, prep_combatant,
    CreateMealRequest, PrepCombatantRequest,
};
pub use envelope::{
    Ack, ApiResponse, CombatantsBody, DbCheckBody, HealthResponse, LeaderboardBody,
    LeaderboardRow, MealBody, MealCreated, WinnerBody,
};
