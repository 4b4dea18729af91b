//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into catalog, arena, battle and
//!   leaderboard use-cases.
//! - Keep callers decoupled from storage details.

pub mod arena;
pub mod battle_service;
pub mod catalog_service;
pub mod error;
pub mod leaderboard_service;
pub mod random;
