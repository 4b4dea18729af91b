use mealmax_core::db::open_db_in_memory;
use mealmax_core::{
    battle_score, ArenaError, BattleError, BattleService, CombatantArena, Difficulty, ErrorKind,
    FixedRandom, LossPolicy, Meal, MealId, MealListQuery, MealRepository, NewMeal, Side,
    SqliteMealRepository,
};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn create(repo: &SqliteMealRepository<'_>, name: &str, cuisine: &str, price: f64, difficulty: Difficulty) -> MealId {
    repo.create_meal(&NewMeal::new(name, cuisine, price, difficulty))
        .unwrap()
}

fn all_meals(repo: &SqliteMealRepository<'_>) -> Vec<Meal> {
    repo.list_meals(&MealListQuery {
        include_deleted: true,
        ..MealListQuery::default()
    })
    .unwrap()
}

#[test]
fn stage_rejects_full_duplicate_and_unavailable_meals() {
    let conn = setup();
    let repo = SqliteMealRepository::try_new(&conn).unwrap();
    let a = create(&repo, "Pizza", "Italian", 14.99, Difficulty::Low);
    let b = create(&repo, "Sushi", "Japanese", 19.99, Difficulty::High);
    let c = create(&repo, "Tacos", "Mexican", 8.5, Difficulty::Med);
    let gone = create(&repo, "Paella", "Spanish", 22.0, Difficulty::High);
    repo.soft_delete_meal(gone).unwrap();

    let mut arena = CombatantArena::new();
    let err = arena.stage(&repo, gone).unwrap_err();
    assert!(matches!(err, ArenaError::MealUnavailable(id) if id == gone));
    assert!(matches!(
        arena.stage(&repo, 404).unwrap_err(),
        ArenaError::MealUnavailable(404)
    ));

    arena.stage(&repo, a).unwrap();
    let err = arena.stage(&repo, a).unwrap_err();
    assert!(matches!(err, ArenaError::AlreadyStaged(id) if id == a));
    assert_eq!(err.kind(), ErrorKind::Validation);

    arena.stage(&repo, b).unwrap();
    let err = arena.stage(&repo, c).unwrap_err();
    assert!(matches!(err, ArenaError::ArenaFull));
    assert_eq!(
        err.to_string(),
        "Combatant list is full, cannot add more combatants."
    );

    assert_eq!(arena.list(), &[a, b]);
    arena.clear();
    arena.clear();
    assert!(arena.is_empty());
}

#[test]
fn resolve_without_two_combatants_fails_and_leaves_catalog_untouched() {
    let conn = setup();
    let repo = SqliteMealRepository::try_new(&conn).unwrap();
    let a = create(&repo, "Pizza", "Italian", 14.99, Difficulty::Low);
    let before = all_meals(&repo);

    let engine = BattleService::new(SqliteMealRepository::try_new(&conn).unwrap());
    let mut arena = CombatantArena::new();
    let mut random = FixedRandom(0.0);

    let err = engine.resolve(&mut arena, &mut random).unwrap_err();
    assert!(matches!(err, BattleError::NotEnoughCombatants { staged: 0 }));
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    arena.stage(&repo, a).unwrap();
    let err = engine.resolve(&mut arena, &mut random).unwrap_err();
    assert!(matches!(err, BattleError::NotEnoughCombatants { staged: 1 }));
    assert!(err.to_string().contains("two combatants required"));

    assert!(arena.is_empty());
    assert_eq!(all_meals(&repo), before);
}

#[test]
fn resolve_fails_when_staged_meal_was_deleted_meanwhile() {
    let conn = setup();
    let repo = SqliteMealRepository::try_new(&conn).unwrap();
    let a = create(&repo, "Pizza", "Italian", 14.99, Difficulty::Low);
    let b = create(&repo, "Sushi", "Japanese", 19.99, Difficulty::High);

    let mut arena = CombatantArena::new();
    arena.stage(&repo, a).unwrap();
    arena.stage(&repo, b).unwrap();
    repo.soft_delete_meal(b).unwrap();
    let before = all_meals(&repo);

    let engine = BattleService::new(SqliteMealRepository::try_new(&conn).unwrap());
    let err = engine
        .resolve(&mut arena, &mut FixedRandom(0.0))
        .unwrap_err();

    assert!(matches!(err, BattleError::CombatantUnavailable(id) if id == b));
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert!(arena.is_empty());
    assert_eq!(all_meals(&repo), before);
}

#[test]
fn low_draw_favors_higher_scoring_first_combatant() {
    let conn = setup();
    let repo = SqliteMealRepository::try_new(&conn).unwrap();
    let strong = create(&repo, "Sushi", "Japanese", 19.99, Difficulty::High);
    let weak = create(&repo, "Pizza", "Italian", 14.99, Difficulty::Low);

    let mut arena = CombatantArena::new();
    arena.stage(&repo, strong).unwrap();
    arena.stage(&repo, weak).unwrap();

    let engine = BattleService::new(SqliteMealRepository::try_new(&conn).unwrap());
    let outcome = engine
        .resolve(&mut arena, &mut FixedRandom(0.0))
        .unwrap();

    assert_eq!(outcome.winning_side, Side::A);
    assert_eq!(outcome.winner_id, strong);
    assert_eq!(outcome.winner_name, "Sushi");
    assert_eq!(outcome.loser_id, weak);
    assert!(outcome.score_a > outcome.score_b);
    assert!(outcome.win_probability_a > 0.5);
}

#[test]
fn high_draw_favors_second_combatant_when_first_is_weaker() {
    let conn = setup();
    let repo = SqliteMealRepository::try_new(&conn).unwrap();
    let weak = create(&repo, "Pizza", "Italian", 14.99, Difficulty::Low);
    let strong = create(&repo, "Sushi", "Japanese", 19.99, Difficulty::High);

    let mut arena = CombatantArena::new();
    arena.stage(&repo, weak).unwrap();
    arena.stage(&repo, strong).unwrap();

    let engine = BattleService::new(SqliteMealRepository::try_new(&conn).unwrap());
    let outcome = engine
        .resolve(&mut arena, &mut FixedRandom(0.999))
        .unwrap();

    assert_eq!(outcome.winning_side, Side::B);
    assert_eq!(outcome.winner_id, strong);
    assert_eq!(outcome.draw, 0.999);
}

#[test]
fn elimination_purges_loser_and_credits_winner() {
    let conn = setup();
    let repo = SqliteMealRepository::try_new(&conn).unwrap();
    let a = create(&repo, "Pizza", "Italian", 14.99, Difficulty::Low);
    let b = create(&repo, "Sushi", "Japanese", 19.99, Difficulty::High);
    repo.update_meal_stats(a, mealmax_core::BattleResult::Loss)
        .unwrap();

    let mut arena = CombatantArena::new();
    arena.stage(&repo, a).unwrap();
    arena.stage(&repo, b).unwrap();

    let engine = BattleService::new(SqliteMealRepository::try_new(&conn).unwrap());
    let outcome = engine
        .resolve(&mut arena, &mut FixedRandom(0.999))
        .unwrap();
    assert_eq!(outcome.loss_policy, LossPolicy::Eliminate);
    assert_eq!(outcome.winner_id, b);

    let winner = repo.get_meal(b, false).unwrap().unwrap();
    assert_eq!((winner.wins, winner.battles_fought), (1, 1));

    assert!(repo.get_meal(a, false).unwrap().is_none());
    let loser = repo.get_meal(a, true).unwrap().unwrap();
    assert!(loser.deleted);
    assert_eq!((loser.wins, loser.battles_fought), (0, 0));
    assert!(arena.is_empty());
}

#[test]
fn record_loss_policy_keeps_loser_with_extra_battle() {
    let conn = setup();
    let repo = SqliteMealRepository::try_new(&conn).unwrap();
    let a = create(&repo, "Pizza", "Italian", 14.99, Difficulty::Low);
    let b = create(&repo, "Sushi", "Japanese", 19.99, Difficulty::High);

    let mut arena = CombatantArena::new();
    arena.stage(&repo, a).unwrap();
    arena.stage(&repo, b).unwrap();

    let engine = BattleService::with_loss_policy(
        SqliteMealRepository::try_new(&conn).unwrap(),
        LossPolicy::RecordLoss,
    );
    let outcome = engine.resolve(&mut arena, &mut FixedRandom(0.0)).unwrap();
    assert_eq!(outcome.winner_id, a);

    let loser = repo.get_meal(b, false).unwrap().unwrap();
    assert_eq!((loser.wins, loser.battles_fought), (0, 1));
    let winner = repo.get_meal(a, false).unwrap().unwrap();
    assert_eq!((winner.wins, winner.battles_fought), (1, 1));
}

#[test]
fn out_of_range_draw_is_rejected_before_mutation() {
    let conn = setup();
    let repo = SqliteMealRepository::try_new(&conn).unwrap();
    let a = create(&repo, "Pizza", "Italian", 14.99, Difficulty::Low);
    let b = create(&repo, "Sushi", "Japanese", 19.99, Difficulty::High);
    let before = all_meals(&repo);

    let mut arena = CombatantArena::new();
    arena.stage(&repo, a).unwrap();
    arena.stage(&repo, b).unwrap();

    let engine = BattleService::new(SqliteMealRepository::try_new(&conn).unwrap());
    let err = engine
        .resolve(&mut arena, &mut FixedRandom(1.0))
        .unwrap_err();
    assert!(matches!(err, BattleError::InvalidDraw(_)));
    assert_eq!(err.kind(), ErrorKind::Infrastructure);
    assert!(arena.is_empty());
    assert_eq!(all_meals(&repo), before);
}

#[test]
fn outcome_scores_match_score_function() {
    let conn = setup();
    let repo = SqliteMealRepository::try_new(&conn).unwrap();
    let a = create(&repo, "Meal 1", "Italian", 24.99, Difficulty::Med);
    let b = create(&repo, "Meal 2", "French", 49.99, Difficulty::High);
    let meal_a = repo.get_meal(a, false).unwrap().unwrap();
    let meal_b = repo.get_meal(b, false).unwrap().unwrap();

    let mut arena = CombatantArena::new();
    arena.stage(&repo, a).unwrap();
    arena.stage(&repo, b).unwrap();

    let engine = BattleService::new(SqliteMealRepository::try_new(&conn).unwrap());
    let outcome = engine.resolve(&mut arena, &mut FixedRandom(0.52)).unwrap();

    assert_eq!(outcome.score_a, battle_score(&meal_a));
    assert_eq!(outcome.score_b, battle_score(&meal_b));
    // 172.93 vs 296.94: delta clamps to -1, so B always wins.
    assert_eq!(outcome.win_probability_a, 0.0);
    assert_eq!(outcome.winner_id, b);
}
