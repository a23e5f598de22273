// Service exports
pub mod cache;
pub mod geodata;
pub mod postgres;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use geodata::{GeodataClient, GeodataEndpoints, GeodataError};
pub use postgres::{PostgresClient, StoreError};
