//! Domain model for meals and battle outcomes.
//!
//! # Responsibility
//! - Define canonical data structures used by catalog and battle logic.
//! - Keep validation rules next to the types they protect.
//!
//! # Invariants
//! - Every meal is identified by a stable `MealId` that is never reused.
//! - Deletion is represented by soft-delete tombstones, not hard delete.

pub mod battle;
pub mod meal;
