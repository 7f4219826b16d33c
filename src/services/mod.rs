// Service exports
pub mod cache;
pub mod postgres;

pub use cache::RoundConfigCache;
pub use postgres::{PostgresClient, PostgresError};
