//! Gamehub Store: `PostgreSQL` persistence for achievements and progress.

pub mod pg_achievement_repository;
pub mod seed;
