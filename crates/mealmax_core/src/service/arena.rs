//! Combatant staging area.
//!
//! # Invariants
//! - Holds at most [`ARENA_CAPACITY`] distinct meal ids.
//! - Only live meals can be staged; staged ids are never mutated here.
//! - Callers that delete a meal must unstage it in the same critical section.

use crate::model::meal::MealId;
use crate::repo::meal_repo::{MealRepository, RepoError};
use crate::service::error::ErrorKind;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Number of combatants a battle consumes.
pub const ARENA_CAPACITY: usize = 2;

#[derive(Debug)]
pub enum ArenaError {
    ArenaFull,
    AlreadyStaged(MealId),
    /// Unknown or deleted meal.
    MealUnavailable(MealId),
    Repo(RepoError),
}

impl ArenaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Repo(_) => ErrorKind::Infrastructure,
            _ => ErrorKind::Validation,
        }
    }
}

impl Display for ArenaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ArenaFull => write!(f, "Combatant list is full, cannot add more combatants."),
            Self::AlreadyStaged(id) => write!(f, "Meal with ID {id} is already a combatant"),
            Self::MealUnavailable(id) => {
                write!(f, "Meal with ID {id} cannot be staged: not found or deleted")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ArenaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ArenaError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Ordered queue of meal ids awaiting the next battle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombatantArena {
    staged: Vec<MealId>,
}

impl CombatantArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a live meal to the arena.
    ///
    /// Checks run in order: capacity, duplicate, then catalog liveness.
    pub fn stage<R: MealRepository>(&mut self, repo: &R, id: MealId) -> Result<(), ArenaError> {
        let rejected = if self.is_full() {
            Some(ArenaError::ArenaFull)
        } else if self.staged.contains(&id) {
            Some(ArenaError::AlreadyStaged(id))
        } else if repo.get_meal(id, false)?.is_none() {
            Some(ArenaError::MealUnavailable(id))
        } else {
            None
        };

        if let Some(err) = rejected {
            warn!("event=combatant_stage module=arena status=error meal_id={id} error={err}");
            return Err(err);
        }

        self.staged.push(id);
        info!(
            "event=combatant_stage module=arena status=ok meal_id={id} staged={}",
            self.staged.len()
        );
        Ok(())
    }

    /// Empties the arena. Always succeeds.
    pub fn clear(&mut self) {
        self.staged.clear();
    }

    /// Staged ids in staging order.
    pub fn list(&self) -> &[MealId] {
        &self.staged
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.staged.len() >= ARENA_CAPACITY
    }

    /// Drops `id` from the arena, keeping the order of the rest.
    ///
    /// Returns whether the id was staged.
    pub(crate) fn unstage(&mut self, id: MealId) -> bool {
        let before = self.staged.len();
        self.staged.retain(|staged| *staged != id);
        self.staged.len() != before
    }

    /// Removes and returns every staged id, leaving the arena empty.
    pub(crate) fn take(&mut self) -> Vec<MealId> {
        std::mem::take(&mut self.staged)
    }
}
