//! Error types for registry and proxy operations.
//!
//! Every failure here is a precondition violation in plugin code rather than
//! an environmental condition, so none of them are retryable. They are
//! surfaced as values so the loading layer can choose between skipping a
//! single registration and aborting the whole plugin.

/// Errors raised by [`Events`](crate::Events) and
/// [`EventsProxy`](crate::EventsProxy).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    /// The (plugin, event) pair already has a live registration.
    #[error("Event '{event}' is already registered for plugin '{plugin}'")]
    DuplicateRegistration { plugin: String, event: String },
    /// A token did not resolve to a live registration in the registry.
    #[error("Invalid or already cleared registration token for '{plugin}:{event}'")]
    UnknownRegistration { plugin: String, event: String },
    /// A proxy was asked to clear an event it never registered.
    #[error("Plugin '{plugin}' tried to clear unrecognised event '{event}'")]
    UnrecognizedEvent { plugin: String, event: String },
    /// Dispatch was requested for an identity with no registered callback.
    #[error("No handler registered for '{plugin}:{event}'")]
    HandlerNotFound { plugin: String, event: String },
    /// A plugin or event name failed validation.
    #[error("Invalid name: {0}")]
    InvalidName(String),
}

impl EventError {
    /// Returns true for the errors produced by a clear that did not resolve.
    pub fn is_unresolved_clear(&self) -> bool {
        matches!(
            self,
            EventError::UnknownRegistration { .. } | EventError::UnrecognizedEvent { .. }
        )
    }
}
