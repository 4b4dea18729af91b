//! Meal repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, stat bookkeeping and battle commits over `meals`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Ids come from `AUTOINCREMENT`; only `clear_meals` resets allocation.
//! - `record_battle` applies winner and loser updates in one transaction.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::ensure_latest;
use crate::db::DbError;
use crate::model::battle::{BattleResult, LossPolicy};
use crate::model::meal::{Difficulty, Meal, MealId, MealValidationError, NewMeal};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MEAL_SELECT_SQL: &str = "SELECT
    id,
    meal,
    cuisine,
    price,
    difficulty,
    battles,
    wins,
    deleted
FROM meals";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for meal persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(MealValidationError),
    Db(DbError),
    /// No live meal with this id.
    NotFound(MealId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "Meal with ID {id} not found"),
            Self::InvalidData(message) => write!(f, "invalid persisted meal data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<MealValidationError> for RepoError {
    fn from(value: MealValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing meals. Results are always ordered by id.
#[derive(Debug, Clone, Default)]
pub struct MealListQuery {
    pub include_deleted: bool,
    /// Keyset cursor: only ids strictly greater than this are returned.
    pub after_id: Option<MealId>,
    pub limit: Option<u32>,
}

/// Repository interface for the meal catalog.
pub trait MealRepository {
    fn create_meal(&self, meal: &NewMeal) -> RepoResult<MealId>;
    fn get_meal(&self, id: MealId, include_deleted: bool) -> RepoResult<Option<Meal>>;
    /// Newest live exact-name match, falling back to the newest tombstone.
    fn find_meal_by_name(&self, name: &str) -> RepoResult<Option<Meal>>;
    fn list_meals(&self, query: &MealListQuery) -> RepoResult<Vec<Meal>>;
    fn soft_delete_meal(&self, id: MealId) -> RepoResult<()>;
    /// Removes every meal and restarts id allocation.
    fn clear_meals(&self) -> RepoResult<()>;
    fn update_meal_stats(&self, id: MealId, result: BattleResult) -> RepoResult<()>;
    /// Commits a battle: winner gets a win, loser is handled per `policy`.
    fn record_battle(&self, winner: MealId, loser: MealId, policy: LossPolicy) -> RepoResult<()>;
}

/// SQLite-backed meal repository.
pub struct SqliteMealRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMealRepository<'conn> {
    /// Creates a repository over a connection migrated to the latest schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_latest(conn)?;
        Ok(Self { conn })
    }
}

impl MealRepository for SqliteMealRepository<'_> {
    fn create_meal(&self, meal: &NewMeal) -> RepoResult<MealId> {
        meal.validate()?;

        self.conn.execute(
            "INSERT INTO meals (meal, cuisine, price, difficulty)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                meal.name.as_str(),
                meal.cuisine.as_str(),
                meal.price,
                meal.difficulty.as_str(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_meal(&self, id: MealId, include_deleted: bool) -> RepoResult<Option<Meal>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEAL_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![id, bool_to_int(include_deleted)])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_meal_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_meal_by_name(&self, name: &str) -> RepoResult<Option<Meal>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEAL_SELECT_SQL}
             WHERE meal = ?1
             ORDER BY deleted ASC, id DESC
             LIMIT 1;"
        ))?;

        let mut rows = stmt.query([name])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_meal_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_meals(&self, query: &MealListQuery) -> RepoResult<Vec<Meal>> {
        let mut sql = format!("{MEAL_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_deleted {
            sql.push_str(" AND deleted = 0");
        }
        if let Some(after_id) = query.after_id {
            sql.push_str(" AND id > ?");
            bind_values.push(Value::Integer(after_id));
        }

        sql.push_str(" ORDER BY id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut meals = Vec::new();
        while let Some(row) = rows.next()? {
            meals.push(parse_meal_row(row)?);
        }

        Ok(meals)
    }

    fn soft_delete_meal(&self, id: MealId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE meals SET deleted = 1 WHERE id = ?1 AND deleted = 0;",
            [id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn clear_meals(&self) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM meals;", [])?;
        tx.execute("DELETE FROM sqlite_sequence WHERE name = 'meals';", [])?;
        tx.commit()?;
        Ok(())
    }

    fn update_meal_stats(&self, id: MealId, result: BattleResult) -> RepoResult<()> {
        apply_stats(self.conn, id, result)
    }

    fn record_battle(&self, winner: MealId, loser: MealId, policy: LossPolicy) -> RepoResult<()> {
        if winner == loser {
            return Err(RepoError::InvalidData(format!(
                "meal {winner} cannot battle itself"
            )));
        }

        // Dropping `tx` on an early return rolls both updates back.
        let tx = self.conn.unchecked_transaction()?;
        apply_stats(&tx, winner, BattleResult::Win)?;
        match policy {
            LossPolicy::Eliminate => {
                let changed = tx.execute(
                    "UPDATE meals
                     SET deleted = 1, battles = 0, wins = 0
                     WHERE id = ?1 AND deleted = 0;",
                    [loser],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound(loser));
                }
            }
            LossPolicy::RecordLoss => apply_stats(&tx, loser, BattleResult::Loss)?,
        }
        tx.commit()?;
        Ok(())
    }
}

fn apply_stats(conn: &Connection, id: MealId, result: BattleResult) -> RepoResult<()> {
    let sql = match result {
        BattleResult::Win => {
            "UPDATE meals SET battles = battles + 1, wins = wins + 1 WHERE id = ?1 AND deleted = 0;"
        }
        BattleResult::Loss => {
            "UPDATE meals SET battles = battles + 1 WHERE id = ?1 AND deleted = 0;"
        }
    };

    if conn.execute(sql, [id])? == 0 {
        return Err(RepoError::NotFound(id));
    }
    Ok(())
}

fn parse_meal_row(row: &Row<'_>) -> RepoResult<Meal> {
    let id: MealId = row.get("id")?;

    let difficulty_text: String = row.get("difficulty")?;
    let difficulty = difficulty_text.parse::<Difficulty>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid difficulty `{difficulty_text}` in meals.difficulty for id {id}"
        ))
    })?;

    let deleted = match row.get::<_, i64>("deleted")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid deleted value `{other}` in meals.deleted for id {id}"
            )));
        }
    };

    let meal = Meal {
        id,
        name: row.get("meal")?,
        cuisine: row.get("cuisine")?,
        price: row.get("price")?,
        difficulty,
        battles_fought: row.get("battles")?,
        wins: row.get("wins")?,
        deleted,
    };
    meal.validate()
        .map_err(|err| RepoError::InvalidData(format!("meal {id}: {err}")))?;
    Ok(meal)
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
