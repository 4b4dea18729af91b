//! Shared kitchen state handed to request handlers.
//!
//! # Responsibility
//! - Own the catalog connection, the combatant arena and the random source.
//! - Serialize mutations so a battle is all-or-nothing for other callers.
//!
//! # Invariants
//! - Lock order is arena, then connection, then random source.
//! - Readers hold the connection lock, so they never see half a battle.
//! - A poisoned lock is reported as an infrastructure error.

use crate::config::KitchenConfig;
use crate::db::migrations::ensure_latest;
use crate::db::{check_connection, open_db, open_db_in_memory, DbError};
use crate::model::battle::{BattleOutcome, LossPolicy};
use crate::model::meal::{Meal, MealId, NewMeal};
use crate::repo::meal_repo::{MealRepository, RepoError, SqliteMealRepository};
use crate::service::arena::{ArenaError, CombatantArena};
use crate::service::battle_service::{BattleError, BattleService};
use crate::service::catalog_service::{CatalogError, CatalogService};
use crate::service::error::ErrorKind;
use crate::service::leaderboard_service::{
    LeaderboardEntry, LeaderboardError, LeaderboardService, SortKey,
};
use crate::service::random::{RandomSource, ThreadRandom};
use log::{error, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
pub enum KitchenError {
    Catalog(CatalogError),
    Arena(ArenaError),
    Battle(BattleError),
    Leaderboard(LeaderboardError),
    Repo(RepoError),
    Db(DbError),
    LockPoisoned(&'static str),
}

impl KitchenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Catalog(err) => err.kind(),
            Self::Arena(err) => err.kind(),
            Self::Battle(err) => err.kind(),
            Self::Leaderboard(err) => err.kind(),
            Self::Repo(_) | Self::Db(_) | Self::LockPoisoned(_) => ErrorKind::Infrastructure,
        }
    }
}

impl Display for KitchenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Arena(err) => write!(f, "{err}"),
            Self::Battle(err) => write!(f, "{err}"),
            Self::Leaderboard(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::LockPoisoned(name) => write!(f, "{name} lock poisoned by a panicked request"),
        }
    }
}

impl Error for KitchenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Catalog(err) => Some(err),
            Self::Arena(err) => Some(err),
            Self::Battle(err) => Some(err),
            Self::Leaderboard(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::LockPoisoned(_) => None,
        }
    }
}

impl From<CatalogError> for KitchenError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<ArenaError> for KitchenError {
    fn from(value: ArenaError) -> Self {
        Self::Arena(value)
    }
}

impl From<BattleError> for KitchenError {
    fn from(value: BattleError) -> Self {
        Self::Battle(value)
    }
}

impl From<LeaderboardError> for KitchenError {
    fn from(value: LeaderboardError) -> Self {
        Self::Leaderboard(value)
    }
}

impl From<RepoError> for KitchenError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for KitchenError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// One catalog plus one arena, safe to share across request threads.
pub struct Kitchen {
    conn: Mutex<Connection>,
    arena: Mutex<CombatantArena>,
    random: Mutex<Box<dyn RandomSource + Send>>,
    loss_policy: LossPolicy,
}

impl Kitchen {
    /// Wraps a migrated connection.
    pub fn new(
        conn: Connection,
        random: Box<dyn RandomSource + Send>,
        loss_policy: LossPolicy,
    ) -> Result<Self, KitchenError> {
        ensure_latest(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            arena: Mutex::new(CombatantArena::new()),
            random: Mutex::new(random),
            loss_policy,
        })
    }

    /// Opens the database named by `config` (in-memory when unset).
    pub fn open(config: &KitchenConfig) -> Result<Self, KitchenError> {
        let conn = match &config.db_path {
            Some(path) => open_db(path)?,
            None => open_db_in_memory()?,
        };
        info!(
            "event=kitchen_open module=kitchen status=ok loss_policy={} seeded={}",
            config.loss_policy.as_str(),
            config.battle_seed.is_some()
        );
        Self::new(conn, config.random_source(), config.loss_policy)
    }

    /// Fresh in-memory kitchen with thread-random draws.
    pub fn in_memory() -> Result<Self, KitchenError> {
        Self::new(
            open_db_in_memory()?,
            Box::new(ThreadRandom),
            LossPolicy::default(),
        )
    }

    pub fn loss_policy(&self) -> LossPolicy {
        self.loss_policy
    }

    /// Swaps the random source used by later battles.
    pub fn set_random_source(
        &self,
        random: Box<dyn RandomSource + Send>,
    ) -> Result<(), KitchenError> {
        *lock(&self.random, "random")? = random;
        Ok(())
    }

    /// Verifies the catalog database answers queries.
    pub fn db_check(&self) -> Result<(), KitchenError> {
        let conn = lock(&self.conn, "catalog")?;
        check_connection(&conn)?;
        Ok(())
    }

    pub fn create_meal(&self, meal: &NewMeal) -> Result<MealId, KitchenError> {
        self.with_catalog(|catalog| catalog.create_meal(meal))
    }

    /// Soft-deletes a meal and drops it from the arena.
    pub fn delete_meal(&self, id: MealId) -> Result<(), KitchenError> {
        let mut arena = lock(&self.arena, "arena")?;
        self.with_catalog(|catalog| catalog.delete_meal(id))?;
        if arena.unstage(id) {
            info!("event=combatant_unstage module=kitchen status=ok meal_id={id}");
        }
        Ok(())
    }

    /// Clears the catalog and the arena together.
    ///
    /// Ids restart at 1 afterwards, so staged ids would otherwise point at
    /// whatever meal is created next.
    pub fn clear_meals(&self) -> Result<(), KitchenError> {
        let mut arena = lock(&self.arena, "arena")?;
        self.with_catalog(|catalog| catalog.clear_meals())?;
        arena.clear();
        Ok(())
    }

    pub fn get_meal_by_id(&self, id: MealId) -> Result<Meal, KitchenError> {
        self.with_catalog(|catalog| catalog.get_meal_by_id(id))
    }

    pub fn get_meal_by_name(&self, name: &str) -> Result<Meal, KitchenError> {
        self.with_catalog(|catalog| catalog.get_meal_by_name(name))
    }

    /// Snapshot of live meals in insertion order.
    pub fn list_active(&self) -> Result<Vec<Meal>, KitchenError> {
        let conn = lock(&self.conn, "catalog")?;
        let catalog = CatalogService::new(SqliteMealRepository::try_new(&conn)?);
        let meals = catalog.list_active().collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }

    /// Stages a live meal by id.
    pub fn stage_combatant(&self, id: MealId) -> Result<(), KitchenError> {
        let mut arena = lock(&self.arena, "arena")?;
        let conn = lock(&self.conn, "catalog")?;
        let repo = SqliteMealRepository::try_new(&conn)?;
        arena.stage(&repo, id)?;
        Ok(())
    }

    /// Looks a meal up by name and stages it, returning its id.
    pub fn prep_combatant(&self, name: &str) -> Result<MealId, KitchenError> {
        let mut arena = lock(&self.arena, "arena")?;
        let conn = lock(&self.conn, "catalog")?;
        let catalog = CatalogService::new(SqliteMealRepository::try_new(&conn)?);
        let meal = catalog.get_meal_by_name(name)?;
        arena.stage(catalog.repo(), meal.id)?;
        Ok(meal.id)
    }

    pub fn clear_combatants(&self) -> Result<(), KitchenError> {
        lock(&self.arena, "arena")?.clear();
        info!("event=combatants_clear module=kitchen status=ok");
        Ok(())
    }

    /// Staged ids in staging order.
    pub fn combatant_ids(&self) -> Result<Vec<MealId>, KitchenError> {
        Ok(lock(&self.arena, "arena")?.list().to_vec())
    }

    /// Staged meals in staging order.
    pub fn combatants(&self) -> Result<Vec<Meal>, KitchenError> {
        let arena = lock(&self.arena, "arena")?;
        let conn = lock(&self.conn, "catalog")?;
        let repo = SqliteMealRepository::try_new(&conn)?;
        let mut meals = Vec::with_capacity(arena.len());
        for id in arena.list() {
            if let Some(meal) = repo.get_meal(*id, false)? {
                meals.push(meal);
            }
        }
        Ok(meals)
    }

    /// Resolves one battle between the two staged combatants.
    ///
    /// Holds the arena and catalog locks for the whole resolution. The arena
    /// is emptied even when the catalog or random source is unavailable.
    pub fn battle(&self) -> Result<BattleOutcome, KitchenError> {
        let mut arena = lock(&self.arena, "arena")?;
        let prepared = lock(&self.conn, "catalog").and_then(|conn| {
            let random = lock(&self.random, "random")?;
            Ok((conn, random))
        });
        let (conn, mut random) = match prepared {
            Ok(guards) => guards,
            Err(err) => {
                arena.clear();
                return Err(err);
            }
        };

        let repo = match SqliteMealRepository::try_new(&conn) {
            Ok(repo) => repo,
            Err(err) => {
                arena.clear();
                return Err(err.into());
            }
        };
        let engine = BattleService::with_loss_policy(repo, self.loss_policy);
        Ok(engine.resolve(&mut arena, &mut **random)?)
    }

    pub fn leaderboard(&self, sort_key: SortKey) -> Result<Vec<LeaderboardEntry>, KitchenError> {
        let conn = lock(&self.conn, "catalog")?;
        let board = LeaderboardService::new(SqliteMealRepository::try_new(&conn)?);
        Ok(board.rank(sort_key)?)
    }

    fn with_catalog<T>(
        &self,
        f: impl FnOnce(&CatalogService<SqliteMealRepository<'_>>) -> Result<T, CatalogError>,
    ) -> Result<T, KitchenError> {
        let conn = lock(&self.conn, "catalog")?;
        let catalog = CatalogService::new(SqliteMealRepository::try_new(&conn)?);
        Ok(f(&catalog)?)
    }
}

fn lock<'a, T: ?Sized>(
    mutex: &'a Mutex<T>,
    name: &'static str,
) -> Result<MutexGuard<'a, T>, KitchenError> {
    mutex.lock().map_err(|_| {
        error!("event=lock_acquire module=kitchen status=error lock={name} error_code=poisoned");
        KitchenError::LockPoisoned(name)
    })
}
