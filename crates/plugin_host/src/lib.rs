//! In-process plugin host for the `plugin_events` registry.
//!
//! The host is the plugin-loading layer: it owns configuration and logging,
//! gives each plugin its own [`EventsProxy`](plugin_events::EventsProxy),
//! and decides whether a refused registration aborts the plugin load or is
//! logged and skipped.

pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod plugins;

pub use config::{AppConfig, LoggingSettings, PluginSettings, RegistrationPolicy};
pub use error::HostError;
pub use host::{Plugin, PluginEvents, PluginHost, PluginInfo};
pub use logging::setup_logging;
