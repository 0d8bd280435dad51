use plugin_events::EventError;

/// Errors raised by the plugin host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// A registry or proxy operation failed
    #[error(transparent)]
    Event(#[from] EventError),
    /// A plugin's registrations were refused and the policy is to abort
    #[error("Plugin {plugin} failed to load: {source}")]
    LoadFailed {
        plugin: String,
        #[source]
        source: EventError,
    },
    #[error("Plugin {0} is already loaded")]
    PluginAlreadyLoaded(String),
    #[error("Plugin not found: {0}")]
    PluginNotFound(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("Failed to serialize configuration: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Logging setup failed: {0}")]
    Logging(String),
}
