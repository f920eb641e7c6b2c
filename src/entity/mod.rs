//! SeaORM entity definitions for PostgreSQL database.

pub mod account;
pub mod collaborator;
pub mod repository;
pub mod review;
