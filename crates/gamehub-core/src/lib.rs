//! Gamehub Core: shared domain abstractions.
//!
//! This crate defines the clock, error, and persistence abstractions that the
//! achievements context and its storage adapters depend on. It contains no
//! infrastructure code.

pub mod clock;
pub mod error;
pub mod repository;
