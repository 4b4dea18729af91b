//! Repository layer for the meal catalog.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from catalog and battle orchestration.
//!
//! # Invariants
//! - Write paths validate input before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod meal_repo;
