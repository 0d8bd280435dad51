//! Registration identities and the single-use tokens that name them.

use std::fmt;

/// Identity of one registration: the owning plugin and the event name.
///
/// Equality is exact string match on both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventData {
    pub plugin_name: String,
    pub event_name: String,
}

impl EventData {
    pub fn new(plugin_name: impl Into<String>, event_name: impl Into<String>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            event_name: event_name.into(),
        }
    }

    pub(crate) fn matches(&self, plugin_name: &str, event_name: &str) -> bool {
        self.plugin_name == plugin_name && self.event_name == event_name
    }
}

impl fmt::Display for EventData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.plugin_name, self.event_name)
    }
}

/// Capability returned by a successful registration.
///
/// The token carries a copy of the identity, not a reference to the stored
/// callback; clearing re-resolves it by identity. It is neither `Clone` nor
/// `Copy`, and [`EventRegistry::clear_event`](crate::EventRegistry::clear_event)
/// takes it by value, so a token can be spent at most once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a registration token makes the registration impossible to clear"]
pub struct RegistrationToken {
    data: EventData,
}

impl RegistrationToken {
    pub(crate) fn new(data: EventData) -> Self {
        Self { data }
    }

    /// The (plugin, event) identity this token was issued for.
    pub fn data(&self) -> &EventData {
        &self.data
    }

    pub fn plugin_name(&self) -> &str {
        &self.data.plugin_name
    }

    pub fn event_name(&self) -> &str {
        &self.data.event_name
    }

    pub(crate) fn into_data(self) -> EventData {
        self.data
    }
}

impl fmt::Display for RegistrationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token({})", self.data)
    }
}
