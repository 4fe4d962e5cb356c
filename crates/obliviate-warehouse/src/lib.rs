pub mod api;
pub mod config;
pub mod schema;
pub mod store;

#[cfg(test)]
pub(crate) mod stub;

pub use api::{FmpClient, Http};
pub use config::Config;
pub use schema::stock::ingest::{Action, BatchSummary, Ingestor, Status};
pub use schema::stock::StockRecord;
pub use store::{FileStore, MemoryStore, Store};
