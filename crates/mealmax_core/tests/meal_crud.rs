use mealmax_core::db::open_db_in_memory;
use mealmax_core::{
    BattleResult, CatalogError, CatalogService, Difficulty, ErrorKind, MealListQuery, MealLookup,
    MealRepository, MealValidationError, NewMeal, RepoError, SqliteMealRepository,
};
use rusqlite::Connection;
use std::collections::HashSet;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn spaghetti() -> NewMeal {
    NewMeal::new("Spaghetti", "Italian", 12.99, Difficulty::Med)
}

fn pizza() -> NewMeal {
    NewMeal::new("Pizza", "Italian", 14.99, Difficulty::Low)
}

fn sushi() -> NewMeal {
    NewMeal::new("Sushi", "Japanese", 19.99, Difficulty::High)
}

#[test]
fn create_and_get_roundtrip() {
    let conn = setup();
    let catalog = CatalogService::new(SqliteMealRepository::try_new(&conn).unwrap());

    let id = catalog.create_meal(&pizza()).unwrap();
    let loaded = catalog.get_meal_by_id(id).unwrap();

    assert_eq!(loaded.id, id);
    assert_eq!(loaded.name, "Pizza");
    assert_eq!(loaded.cuisine, "Italian");
    assert_eq!(loaded.price, 14.99);
    assert_eq!(loaded.difficulty, Difficulty::Low);
    assert_eq!((loaded.battles_fought, loaded.wins), (0, 0));
    assert!(!loaded.deleted);
}

#[test]
fn create_rejects_invalid_input_without_writing() {
    let conn = setup();
    let catalog = CatalogService::new(SqliteMealRepository::try_new(&conn).unwrap());

    let err = catalog
        .create_meal(&NewMeal::new("Meal", "Cuisine", -10.0, Difficulty::Low))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(
        err.to_string(),
        "Invalid price: -10. Price must be a positive number."
    );

    let err = catalog
        .create_meal(&NewMeal::new("", "Cuisine", 1.0, Difficulty::Low))
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(MealValidationError::EmptyName)
    ));

    assert_eq!(catalog.list_active().count(), 0);
}

#[test]
fn ids_are_distinct_and_never_reused_after_delete() {
    let conn = setup();
    let catalog = CatalogService::new(SqliteMealRepository::try_new(&conn).unwrap());

    let mut seen = HashSet::new();
    for _ in 0..3 {
        let id = catalog.create_meal(&pizza()).unwrap();
        assert!(seen.insert(id));
    }

    let max_id = *seen.iter().max().unwrap();
    catalog.delete_meal(max_id).unwrap();
    let next = catalog.create_meal(&sushi()).unwrap();
    assert!(next > max_id);
    assert!(!seen.contains(&next));
}

#[test]
fn clear_resets_id_allocation_and_is_repeatable() {
    let conn = setup();
    let catalog = CatalogService::new(SqliteMealRepository::try_new(&conn).unwrap());

    catalog.create_meal(&spaghetti()).unwrap();
    catalog.create_meal(&pizza()).unwrap();

    catalog.clear_meals().unwrap();
    catalog.clear_meals().unwrap();
    assert_eq!(catalog.list_active().count(), 0);

    let id = catalog.create_meal(&sushi()).unwrap();
    assert_eq!(id, 1);
}

#[test]
fn second_delete_reports_deleted_and_unknown_reports_not_found() {
    let conn = setup();
    let catalog = CatalogService::new(SqliteMealRepository::try_new(&conn).unwrap());
    let id = catalog.create_meal(&spaghetti()).unwrap();

    catalog.delete_meal(id).unwrap();
    let err = catalog.delete_meal(id).unwrap_err();
    assert!(matches!(err, CatalogError::MealDeleted(MealLookup::Id(found)) if found == id));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), format!("Meal with ID {id} has been deleted"));

    let err = catalog.delete_meal(999).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Meal with ID 999 not found");
}

#[test]
fn deleted_meals_are_invisible_to_lookups_and_listing() {
    let conn = setup();
    let catalog = CatalogService::new(SqliteMealRepository::try_new(&conn).unwrap());
    let id = catalog.create_meal(&spaghetti()).unwrap();
    catalog.create_meal(&pizza()).unwrap();
    catalog.delete_meal(id).unwrap();

    assert_eq!(
        catalog.get_meal_by_id(id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    let err = catalog.get_meal_by_name("Spaghetti").unwrap_err();
    assert_eq!(err.to_string(), "Meal with name Spaghetti has been deleted");

    let names: Vec<String> = catalog
        .list_active()
        .map(|meal| meal.unwrap().name)
        .collect();
    assert_eq!(names, vec!["Pizza".to_string()]);

    let tombstone = catalog.repo().get_meal(id, true).unwrap().unwrap();
    assert!(tombstone.deleted);
}

#[test]
fn name_lookup_is_exact_and_prefers_newest_live_duplicate() {
    let conn = setup();
    let catalog = CatalogService::new(SqliteMealRepository::try_new(&conn).unwrap());

    let first = catalog.create_meal(&pizza()).unwrap();
    let second = catalog
        .create_meal(&NewMeal::new("Pizza", "Neapolitan", 18.0, Difficulty::High))
        .unwrap();

    assert_eq!(catalog.get_meal_by_name("Pizza").unwrap().id, second);
    assert!(catalog.get_meal_by_name("pizza").is_err());

    catalog.delete_meal(second).unwrap();
    assert_eq!(catalog.get_meal_by_name("Pizza").unwrap().id, first);

    let err = catalog.get_meal_by_name("Ramen").unwrap_err();
    assert_eq!(err.to_string(), "Meal with name Ramen not found");
}

#[test]
fn list_active_pages_lazily_in_insertion_order_and_restarts() {
    let conn = setup();
    let catalog = CatalogService::new(SqliteMealRepository::try_new(&conn).unwrap());

    let mut ids = Vec::new();
    for index in 0..7 {
        let meal = NewMeal::new(format!("Meal {index}"), "Fusion", 5.0, Difficulty::Low);
        ids.push(catalog.create_meal(&meal).unwrap());
    }
    catalog.delete_meal(ids[2]).unwrap();
    let expected: Vec<i64> = ids
        .iter()
        .copied()
        .filter(|id| *id != ids[2])
        .collect();

    for _ in 0..2 {
        let listed: Vec<i64> = catalog
            .list_active_with_page_size(2)
            .map(|meal| meal.unwrap().id)
            .collect();
        assert_eq!(listed, expected);
    }

    let first_two: Vec<i64> = catalog
        .list_active()
        .take(2)
        .map(|meal| meal.unwrap().id)
        .collect();
    assert_eq!(first_two, expected[..2].to_vec());
}

#[test]
fn update_meal_stats_counts_wins_and_losses() {
    let conn = setup();
    let repo = SqliteMealRepository::try_new(&conn).unwrap();
    let id = repo.create_meal(&sushi()).unwrap();

    repo.update_meal_stats(id, BattleResult::Win).unwrap();
    repo.update_meal_stats(id, BattleResult::Loss).unwrap();

    let meal = repo.get_meal(id, false).unwrap().unwrap();
    assert_eq!(meal.battles_fought, 2);
    assert_eq!(meal.wins, 1);

    repo.soft_delete_meal(id).unwrap();
    let err = repo.update_meal_stats(id, BattleResult::Win).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(found) if found == id));
    let err = repo.update_meal_stats(999, BattleResult::Loss).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(999)));
}

#[test]
fn list_meals_can_include_tombstones() {
    let conn = setup();
    let repo = SqliteMealRepository::try_new(&conn).unwrap();
    let a = repo.create_meal(&spaghetti()).unwrap();
    repo.create_meal(&pizza()).unwrap();
    repo.soft_delete_meal(a).unwrap();

    assert_eq!(repo.list_meals(&MealListQuery::default()).unwrap().len(), 1);
    let all = repo
        .list_meals(&MealListQuery {
            include_deleted: true,
            ..MealListQuery::default()
        })
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn read_path_rejects_corrupted_rows() {
    let conn = setup();
    let repo = SqliteMealRepository::try_new(&conn).unwrap();
    let id = repo.create_meal(&pizza()).unwrap();
    conn.execute_batch("PRAGMA ignore_check_constraints = ON;")
        .unwrap();
    conn.execute("UPDATE meals SET difficulty = 'EASY' WHERE id = ?1;", [id])
        .unwrap();

    let err = repo.get_meal(id, false).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("EASY")));
}
