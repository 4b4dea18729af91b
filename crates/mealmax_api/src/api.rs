//! Route handlers for the meal battle surface.
//!
//! # Responsibility
//! - Map one request to one `Kitchen` use case.
//! - Translate domain errors into error envelopes.
//!
//! # Invariants
//! - Handlers never panic; every failure becomes an error envelope.
//! - Handlers hold no state of their own beyond the borrowed kitchen.

use crate::envelope::{
    validation_error, Ack, ApiResponse, CombatantsBody, DbCheckBody, HealthResponse,
    LeaderboardBody, LeaderboardRow, MealBody, MealCreated, WinnerBody,
};
use log::{info, warn};
use mealmax_core::{
    core_version as core_version_inner, ping as ping_inner, Difficulty, Kitchen, KitchenError,
    MealId, NewMeal, SortKey,
};
use serde::Deserialize;

/// Body of a create-meal request. `difficulty` is parsed strictly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateMealRequest {
    pub meal: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: String,
}

/// Body of a prep-combatant request. Only the meal name is used.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PrepCombatantRequest {
    pub meal: String,
}

/// Liveness probe. Touches no state.
pub fn health() -> HealthResponse {
    HealthResponse { status: "healthy" }
}

pub fn ping() -> String {
    ping_inner().to_owned()
}

pub fn core_version() -> String {
    core_version_inner().to_owned()
}

pub fn db_check(kitchen: &Kitchen) -> ApiResponse<DbCheckBody> {
    respond("db_check", kitchen.db_check().map(|()| DbCheckBody {
        database_status: "healthy",
    }))
}

pub fn clear_meals(kitchen: &Kitchen) -> ApiResponse<Ack> {
    respond("clear_meals", kitchen.clear_meals().map(|()| Ack {}))
}

pub fn create_meal(kitchen: &Kitchen, request: &CreateMealRequest) -> ApiResponse<MealCreated> {
    let difficulty = match request.difficulty.parse::<Difficulty>() {
        Ok(difficulty) => difficulty,
        Err(err) => {
            warn!(
                "event=api_request module=api status=error route=create_meal error_kind=validation"
            );
            return validation_error(err.to_string());
        }
    };
    let meal = NewMeal::new(
        request.meal.as_str(),
        request.cuisine.as_str(),
        request.price,
        difficulty,
    );
    respond(
        "create_meal",
        kitchen.create_meal(&meal).map(|id| MealCreated { id }),
    )
}

pub fn delete_meal(kitchen: &Kitchen, id: MealId) -> ApiResponse<Ack> {
    respond("delete_meal", kitchen.delete_meal(id).map(|()| Ack {}))
}

pub fn get_meal_by_id(kitchen: &Kitchen, id: MealId) -> ApiResponse<MealBody> {
    respond(
        "get_meal_by_id",
        kitchen.get_meal_by_id(id).map(|meal| MealBody { meal }),
    )
}

pub fn get_meal_by_name(kitchen: &Kitchen, name: &str) -> ApiResponse<MealBody> {
    respond(
        "get_meal_by_name",
        kitchen.get_meal_by_name(name).map(|meal| MealBody { meal }),
    )
}

pub fn prep_combatant(kitchen: &Kitchen, request: &PrepCombatantRequest) -> ApiResponse<Ack> {
    respond(
        "prep_combatant",
        kitchen.prep_combatant(&request.meal).map(|_| Ack {}),
    )
}

pub fn clear_combatants(kitchen: &Kitchen) -> ApiResponse<Ack> {
    respond("clear_combatants", kitchen.clear_combatants().map(|()| Ack {}))
}

pub fn battle(kitchen: &Kitchen) -> ApiResponse<WinnerBody> {
    respond(
        "battle",
        kitchen.battle().map(|outcome| WinnerBody {
            winner: outcome.winner_name,
            winner_id: outcome.winner_id,
            loser_id: outcome.loser_id,
        }),
    )
}

pub fn get_combatants(kitchen: &Kitchen) -> ApiResponse<CombatantsBody> {
    respond(
        "get_combatants",
        kitchen
            .combatants()
            .map(|combatants| CombatantsBody { combatants }),
    )
}

/// Ranked leaderboard. `sort_by` defaults to `win_pct`.
pub fn leaderboard(kitchen: &Kitchen, sort_by: Option<&str>) -> ApiResponse<LeaderboardBody> {
    let result = sort_by
        .map_or(Ok(SortKey::default()), str::parse::<SortKey>)
        .map_err(KitchenError::from)
        .and_then(|key| kitchen.leaderboard(key))
        .map(|entries| LeaderboardBody {
            leaderboard: entries.into_iter().map(LeaderboardRow::from).collect(),
        });
    respond("leaderboard", result)
}

fn respond<T>(route: &'static str, result: Result<T, KitchenError>) -> ApiResponse<T> {
    match &result {
        Ok(_) => info!("event=api_request module=api status=ok route={route}"),
        Err(err) => warn!(
            "event=api_request module=api status=error route={route} error_kind={}",
            err.kind()
        ),
    }
    ApiResponse::from(result)
}
