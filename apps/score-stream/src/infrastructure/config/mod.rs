//! Configuration Module
//!
//! Configuration loading for the relay service.

mod settings;

pub use settings::{
    ConfigError, DEFAULT_CHANNEL, DatabaseUrl, NotifySettings, RelayConfig, ServerSettings,
    SessionSettings,
};
