pub mod sqlite;

pub use sqlite::*;

use async_trait::async_trait;

use crate::{NewObservation, StoredObservation};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to query sqlite: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Failed to run database migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("Failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database writer unavailable: {0}")]
    Writer(String),
}

#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Inserts the rows in the given order, returning how many were written.
    async fn insert_observations(&self, rows: Vec<NewObservation>) -> Result<usize, Error>;
    /// Most recent rows by `obs_time_local`, newest first.
    async fn latest_observations(&self, limit: u32) -> Result<Vec<StoredObservation>, Error>;
}
