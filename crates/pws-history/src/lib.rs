pub mod db;
pub mod ingest;
mod observation;
pub mod routes;
mod startup;
mod utils;
pub mod wu_client;

pub use db::{Database, ObservationStore};
pub use ingest::{expand_range, save_observations, HistoryIngest, RangeHistory};
pub use observation::*;
pub use routes::*;
pub use startup::*;
pub use utils::*;
pub use wu_client::{HistoryFetcher, WuClient, WuConfig};
