pub mod app_config;
pub mod booking_api;
pub mod catalog_repo;
pub mod database;
pub mod file_queue;
pub mod redis_queue;

pub use app_config::{Config, QueueBackend};
pub use booking_api::{PostgresBookingApi, UnconfiguredBookingApi};
pub use catalog_repo::PostgresCatalog;
pub use database::DbClient;
pub use file_queue::FileQueueStore;
pub use redis_queue::RedisQueueStore;
