//! Configuration management

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_or_default};
pub use schema::{DocveilConfig, LoggingConfig, NlpConfig, ReportsConfig};
