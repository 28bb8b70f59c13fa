//! Drill Tracker server library
//!
//! Scheduling and tracking of safety drills for organizations and teams.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod policy;
pub mod routes;
pub mod schedule;
pub mod security;
pub mod stats;

pub use config::Config;
pub use db::{open_database, Db};
pub use error::{AppError, Result};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState with the given database and configuration
    pub fn new(db: Db, config: Config) -> Self {
        Self { db, config }
    }
}
