//! PR Roast server library.
//!
//! GitHub App backend: verifies and dispatches webhooks, mirrors
//! installations, repositories and collaborators, and posts generated
//! pull request reviews. Also serves the session-authenticated read API
//! used by the companion frontend.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
