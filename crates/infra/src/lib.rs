//! Infrastructure layer: durable key-value storage, collection persistence,
//! and configuration.

pub mod config;
pub mod persistence;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use persistence::{LoadedState, Persistence};
pub use store::{InMemoryStore, KeyValueStore, SqliteStore, StoreError};
