//! # Per-plugin Registry Proxy
//!
//! An [`EventsProxy`] is bound to one plugin name and borrows the shared
//! registry. Every token it obtains is kept in registration order, and when
//! the proxy goes out of scope each remaining token is forwarded to the
//! registry for removal. No callback of the plugin can outlive its proxy.
//!
//! ```rust
//! use plugin_events::{Argument, Events, EventsProxy};
//!
//! let events = Events::new();
//! {
//!     let mut proxy = EventsProxy::new(&events, "Combat");
//!     proxy.register_event("OnDamage", |_| Some(Argument::Int(1))).unwrap();
//!     assert!(events.is_registered("Combat", "OnDamage"));
//! }
//! assert!(!events.is_registered("Combat", "OnDamage"));
//! ```

use crate::argument::Argument;
use crate::error::EventError;
use crate::registry::{EventRegistry, Events};
use crate::token::RegistrationToken;
use tracing::{debug, warn};

/// Scoped façade over an [`EventRegistry`] for a single plugin.
///
/// The `'a` lifetime ties the proxy to the registry it was created from, so
/// the registry is statically guaranteed to outlive it.
pub struct EventsProxy<'a, R: EventRegistry = Events> {
    registry: &'a R,
    plugin_name: String,
    tokens: Vec<RegistrationToken>,
}

impl<'a, R: EventRegistry> EventsProxy<'a, R> {
    /// Creates a proxy that registers everything under `plugin_name`.
    ///
    /// # Arguments
    ///
    /// * `registry` - Registry the proxy forwards to; it must outlive the proxy
    /// * `plugin_name` - Plugin identity bound to every registration
    ///
    /// Nothing is registered until [`register_event`](Self::register_event)
    /// is called, and an empty proxy touches nothing when dropped.
    pub fn new(registry: &'a R, plugin_name: impl Into<String>) -> Self {
        Self {
            registry,
            plugin_name: plugin_name.into(),
            tokens: Vec::new(),
        }
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// Registers `callback` under this proxy's plugin name and keeps the
    /// resulting token. Registry errors are returned unchanged.
    pub fn register_event<F>(&mut self, event_name: &str, callback: F) -> Result<(), EventError>
    where
        F: Fn(&[Argument]) -> Option<Argument> + 'static,
    {
        let token = self
            .registry
            .register_event(&self.plugin_name, event_name, Box::new(callback))?;
        self.tokens.push(token);
        Ok(())
    }

    /// Clears an event this proxy registered earlier.
    ///
    /// Only tokens held by this proxy are considered; an event registered by
    /// another plugin under the same name yields
    /// [`EventError::UnrecognizedEvent`] without touching the registry.
    pub fn clear_event(&mut self, event_name: &str) -> Result<(), EventError> {
        let position = self
            .tokens
            .iter()
            .position(|token| token.data().matches(&self.plugin_name, event_name));

        let Some(index) = position else {
            warn!(
                "Plugin {} tried to clear unrecognised event {}",
                self.plugin_name, event_name
            );
            return Err(EventError::UnrecognizedEvent {
                plugin: self.plugin_name.clone(),
                event: event_name.to_string(),
            });
        };

        let token = self.tokens.remove(index);
        self.registry.clear_event(token)
    }

    pub fn is_registered(&self, event_name: &str) -> bool {
        self.tokens
            .iter()
            .any(|token| token.data().matches(&self.plugin_name, event_name))
    }

    /// Event names currently held, in registration order.
    pub fn registered_events(&self) -> Vec<&str> {
        self.tokens.iter().map(RegistrationToken::event_name).collect()
    }

    /// Number of registrations this proxy will release on teardown.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tears the proxy down now and reports the first clear that failed.
    ///
    /// All tokens are forwarded even if an earlier one fails. Dropping the
    /// proxy afterwards has nothing left to release.
    pub fn close(mut self) -> Result<(), EventError> {
        match self.release_all().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn release_all(&mut self) -> Vec<EventError> {
        let tokens = std::mem::take(&mut self.tokens);
        if tokens.is_empty() {
            return Vec::new();
        }

        debug!(
            "Releasing {} event registrations for plugin {}",
            tokens.len(),
            self.plugin_name
        );

        tokens
            .into_iter()
            .filter_map(|token| self.registry.clear_event(token).err())
            .collect()
    }
}

impl<R: EventRegistry> Drop for EventsProxy<'_, R> {
    fn drop(&mut self) {
        for err in self.release_all() {
            warn!(
                "Failed to release event for plugin {} during teardown: {}",
                self.plugin_name, err
            );
        }
    }
}

impl<R: EventRegistry> std::fmt::Debug for EventsProxy<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventsProxy")
            .field("plugin_name", &self.plugin_name)
            .field("events", &self.registered_events())
            .finish()
    }
}
