//! Persistence layer for households, members, preferences and meal plans.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
