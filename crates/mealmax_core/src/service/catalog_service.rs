//! Meal catalog use-case service.
//!
//! # Responsibility
//! - Create, delete, look up and clear catalog meals.
//! - Expose live meals as a lazy, restartable sequence.
//!
//! # Invariants
//! - Deleted meals are reported as not found by every lookup.
//! - A second delete of the same id fails instead of being a no-op.

use crate::model::meal::{Meal, MealId, MealValidationError, NewMeal};
use crate::repo::meal_repo::{MealListQuery, MealRepository, RepoError, RepoResult};
use crate::service::error::ErrorKind;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ACTIVE_PAGE_SIZE: u32 = 64;

/// How a meal was looked up, kept for error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MealLookup {
    Id(MealId),
    Name(String),
}

impl Display for MealLookup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "Meal with ID {id}"),
            Self::Name(name) => write!(f, "Meal with name {name}"),
        }
    }
}

/// Service error for catalog use-cases.
#[derive(Debug)]
pub enum CatalogError {
    Validation(MealValidationError),
    /// No meal ever matched the lookup.
    MealNotFound(MealLookup),
    /// Only a tombstoned meal matched the lookup.
    MealDeleted(MealLookup),
    Repo(RepoError),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::MealNotFound(_) | Self::MealDeleted(_) => ErrorKind::NotFound,
            Self::Repo(_) => ErrorKind::Infrastructure,
        }
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::MealNotFound(lookup) => write!(f, "{lookup} not found"),
            Self::MealDeleted(lookup) => write!(f, "{lookup} has been deleted"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound(id) => Self::MealNotFound(MealLookup::Id(id)),
            other => Self::Repo(other),
        }
    }
}

impl From<MealValidationError> for CatalogError {
    fn from(value: MealValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Catalog service facade over repository implementations.
pub struct CatalogService<R: MealRepository> {
    repo: R,
}

impl<R: MealRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Underlying repository, for collaborators that share the catalog.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Validates and stores a new meal, returning its fresh id.
    pub fn create_meal(&self, meal: &NewMeal) -> Result<MealId, CatalogError> {
        if let Err(err) = meal.validate() {
            warn!("event=meal_create module=catalog status=error error_code=validation error={err}");
            return Err(err.into());
        }

        let id = self.repo.create_meal(meal)?;
        info!(
            "event=meal_create module=catalog status=ok meal_id={id} difficulty={}",
            meal.difficulty
        );
        Ok(id)
    }

    /// Soft-deletes a live meal.
    ///
    /// # Errors
    /// - `MealNotFound` for ids that never existed.
    /// - `MealDeleted` for ids that are already tombstoned.
    pub fn delete_meal(&self, id: MealId) -> Result<(), CatalogError> {
        match self.repo.get_meal(id, true)? {
            None => {
                warn!("event=meal_delete module=catalog status=error error_code=not_found meal_id={id}");
                Err(CatalogError::MealNotFound(MealLookup::Id(id)))
            }
            Some(meal) if meal.deleted => {
                warn!("event=meal_delete module=catalog status=error error_code=already_deleted meal_id={id}");
                Err(CatalogError::MealDeleted(MealLookup::Id(id)))
            }
            Some(_) => {
                self.repo.soft_delete_meal(id)?;
                info!("event=meal_delete module=catalog status=ok meal_id={id}");
                Ok(())
            }
        }
    }

    pub fn get_meal_by_id(&self, id: MealId) -> Result<Meal, CatalogError> {
        match self.repo.get_meal(id, true)? {
            Some(meal) if meal.is_active() => Ok(meal),
            Some(_) => Err(CatalogError::MealDeleted(MealLookup::Id(id))),
            None => Err(CatalogError::MealNotFound(MealLookup::Id(id))),
        }
    }

    /// Exact-name lookup. The newest live meal wins when names repeat.
    pub fn get_meal_by_name(&self, name: &str) -> Result<Meal, CatalogError> {
        let lookup = || MealLookup::Name(name.to_string());
        match self.repo.find_meal_by_name(name)? {
            Some(meal) if meal.is_active() => Ok(meal),
            Some(_) => Err(CatalogError::MealDeleted(lookup())),
            None => Err(CatalogError::MealNotFound(lookup())),
        }
    }

    /// Removes every meal and restarts id allocation from 1.
    pub fn clear_meals(&self) -> Result<(), CatalogError> {
        self.repo.clear_meals()?;
        info!("event=meals_clear module=catalog status=ok");
        Ok(())
    }

    /// Lazily iterates live meals in insertion order.
    ///
    /// Every call starts a fresh pass over the catalog.
    pub fn list_active(&self) -> ActiveMeals<'_, R> {
        ActiveMeals::new(&self.repo)
    }

    /// Same as [`Self::list_active`] with an explicit storage page size.
    pub fn list_active_with_page_size(&self, page_size: u32) -> ActiveMeals<'_, R> {
        ActiveMeals::with_page_size(&self.repo, page_size)
    }
}

/// Keyset-paginated iterator over live meals.
///
/// Pages are fetched on demand; the iterator ends after a short page or the
/// first storage error.
pub struct ActiveMeals<'repo, R: MealRepository> {
    repo: &'repo R,
    page_size: u32,
    after_id: Option<MealId>,
    page: std::vec::IntoIter<Meal>,
    exhausted: bool,
}

impl<'repo, R: MealRepository> ActiveMeals<'repo, R> {
    pub fn new(repo: &'repo R) -> Self {
        Self::with_page_size(repo, ACTIVE_PAGE_SIZE)
    }

    pub fn with_page_size(repo: &'repo R, page_size: u32) -> Self {
        Self {
            repo,
            page_size: page_size.max(1),
            after_id: None,
            page: Vec::new().into_iter(),
            exhausted: false,
        }
    }

    fn fetch_page(&mut self) -> RepoResult<()> {
        let page = self.repo.list_meals(&MealListQuery {
            include_deleted: false,
            after_id: self.after_id,
            limit: Some(self.page_size),
        })?;
        if page.len() < self.page_size as usize {
            self.exhausted = true;
        }
        self.page = page.into_iter();
        Ok(())
    }
}

impl<R: MealRepository> Iterator for ActiveMeals<'_, R> {
    type Item = RepoResult<Meal>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(meal) = self.page.next() {
                self.after_id = Some(meal.id);
                return Some(Ok(meal));
            }
            if self.exhausted {
                return None;
            }
            if let Err(err) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
    }
}
