//! Battle resolution engine.
//!
//! # Responsibility
//! - Score the two staged combatants and turn the score gap into a win
//!   probability.
//! - Draw once from the injected random source and commit the outcome.
//!
//! # Invariants
//! - The arena is empty after `resolve`, whether it succeeds or not.
//! - No catalog mutation happens unless both combatants are live and the
//!   draw is valid.
//! - Winner and loser updates are committed in one transaction.

use crate::model::battle::{BattleOutcome, LossPolicy, Side};
use crate::model::meal::{Meal, MealId};
use crate::repo::meal_repo::{MealRepository, RepoError};
use crate::service::arena::{CombatantArena, ARENA_CAPACITY};
use crate::service::error::ErrorKind;
use crate::service::random::RandomSource;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Score gap that maps to a certain win.
pub const SCORE_DELTA_SCALE: f64 = 100.0;

#[derive(Debug)]
pub enum BattleError {
    NotEnoughCombatants { staged: usize },
    /// A staged meal was deleted before the battle started.
    CombatantUnavailable(MealId),
    /// Random source returned a value outside `[0, 1)`.
    InvalidDraw(f64),
    Repo(RepoError),
}

impl BattleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotEnoughCombatants { .. } | Self::CombatantUnavailable(_) => {
                ErrorKind::InvalidState
            }
            Self::InvalidDraw(_) | Self::Repo(_) => ErrorKind::Infrastructure,
        }
    }
}

impl Display for BattleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotEnoughCombatants { staged } => {
                write!(f, "two combatants required, {staged} staged")
            }
            Self::CombatantUnavailable(id) => write!(
                f,
                "two combatants required, meal {id} is no longer available"
            ),
            Self::InvalidDraw(draw) => write!(f, "random draw {draw} is outside [0, 1)"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BattleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BattleError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Raw battle score: `price * chars(cuisine) - difficulty penalty`.
pub fn battle_score(meal: &Meal) -> f64 {
    meal.price * meal.cuisine.chars().count() as f64 - meal.difficulty.penalty()
}

/// Probability that side A beats side B, in `[0, 1]`.
///
/// Scores that overflowed to the same infinity count as equal.
pub fn win_probability(score_a: f64, score_b: f64) -> f64 {
    let gap = score_a - score_b;
    let delta = if gap.is_nan() {
        0.0
    } else {
        (gap / SCORE_DELTA_SCALE).clamp(-1.0, 1.0)
    };
    0.5 + delta / 2.0
}

/// Side A wins iff `draw < win_probability_a`.
pub fn pick_winner(win_probability_a: f64, draw: f64) -> Side {
    if draw < win_probability_a {
        Side::A
    } else {
        Side::B
    }
}

/// Battle engine over a meal repository.
pub struct BattleService<R: MealRepository> {
    repo: R,
    loss_policy: LossPolicy,
}

impl<R: MealRepository> BattleService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_loss_policy(repo, LossPolicy::default())
    }

    pub fn with_loss_policy(repo: R, loss_policy: LossPolicy) -> Self {
        Self { repo, loss_policy }
    }

    pub fn loss_policy(&self) -> LossPolicy {
        self.loss_policy
    }

    /// Consumes the staged pair and resolves one battle.
    ///
    /// # Errors
    /// - `NotEnoughCombatants` / `CombatantUnavailable` when the arena does
    ///   not hold two live meals. The catalog is left untouched.
    /// - `InvalidDraw` when the random source misbehaves.
    pub fn resolve(
        &self,
        arena: &mut CombatantArena,
        random: &mut dyn RandomSource,
    ) -> Result<BattleOutcome, BattleError> {
        let staged = arena.take();
        let (id_a, id_b) = match staged.as_slice() {
            [a, b] => (*a, *b),
            _ => {
                warn!(
                    "event=battle_resolve module=battle status=error error_code=not_enough_combatants staged={} required={ARENA_CAPACITY}",
                    staged.len()
                );
                return Err(BattleError::NotEnoughCombatants {
                    staged: staged.len(),
                });
            }
        };

        let meal_a = self.live_combatant(id_a)?;
        let meal_b = self.live_combatant(id_b)?;

        let score_a = battle_score(&meal_a);
        let score_b = battle_score(&meal_b);
        let win_probability_a = win_probability(score_a, score_b);

        let draw = random.next_unit();
        if !(0.0..1.0).contains(&draw) {
            warn!("event=battle_resolve module=battle status=error error_code=invalid_draw draw={draw}");
            return Err(BattleError::InvalidDraw(draw));
        }

        let winning_side = pick_winner(win_probability_a, draw);
        let (winner, loser) = match winning_side {
            Side::A => (meal_a, meal_b),
            Side::B => (meal_b, meal_a),
        };

        self.repo
            .record_battle(winner.id, loser.id, self.loss_policy)?;

        let outcome = BattleOutcome {
            battle_id: Uuid::new_v4(),
            winner_id: winner.id,
            winner_name: winner.name,
            loser_id: loser.id,
            loser_name: loser.name,
            winning_side,
            score_a,
            score_b,
            win_probability_a,
            draw,
            loss_policy: self.loss_policy,
        };
        info!(
            "event=battle_resolve module=battle status=ok battle_id={} winner_id={} loser_id={} score_a={:.2} score_b={:.2} p_a={:.4} draw={:.4} loss_policy={}",
            outcome.battle_id,
            outcome.winner_id,
            outcome.loser_id,
            score_a,
            score_b,
            win_probability_a,
            draw,
            self.loss_policy.as_str()
        );
        Ok(outcome)
    }

    fn live_combatant(&self, id: MealId) -> Result<Meal, BattleError> {
        match self.repo.get_meal(id, false)? {
            Some(meal) => Ok(meal),
            None => {
                warn!("event=battle_resolve module=battle status=error error_code=combatant_unavailable meal_id={id}");
                Err(BattleError::CombatantUnavailable(id))
            }
        }
    }
}
