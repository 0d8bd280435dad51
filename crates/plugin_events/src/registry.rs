//! # Central Event Registry
//!
//! [`Events`] maps each plugin name to an ordered bucket of registrations and
//! enforces that a plugin registers any given event name at most once.
//! Different plugins may register the same event name independently.
//!
//! The registry is built for the engine's single synchronous event path. It
//! uses interior mutability without locking and is therefore `!Sync`; hosts
//! that run plugins on several threads must serialize access themselves.
//!
//! A registry is created once by the hosting layer and lent to every
//! [`EventsProxy`](crate::EventsProxy) by reference, so the borrow checker
//! guarantees it outlives them all.

use crate::argument::Argument;
use crate::config::RegistryConfig;
use crate::error::EventError;
use crate::stats::RegistryStats;
use crate::token::{EventData, RegistrationToken};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, warn};

/// Callback stored for a registration. Receives the engine-supplied
/// arguments and may produce a result value.
pub type FunctionCallback = Box<dyn Fn(&[Argument]) -> Option<Argument>>;

type SharedCallback = Rc<dyn Fn(&[Argument]) -> Option<Argument>>;

/// Registration and removal, the surface an [`EventsProxy`](crate::EventsProxy)
/// forwards to.
pub trait EventRegistry {
    /// Binds `callback` to (`plugin_name`, `event_name`).
    ///
    /// Fails with [`EventError::DuplicateRegistration`] if the pair is
    /// already registered; the existing registration is left untouched.
    fn register_event(
        &self,
        plugin_name: &str,
        event_name: &str,
        callback: FunctionCallback,
    ) -> Result<RegistrationToken, EventError>;

    /// Removes the registration named by `token`, consuming it.
    ///
    /// Fails with [`EventError::UnknownRegistration`] if the identity does
    /// not resolve to a live registration.
    fn clear_event(&self, token: RegistrationToken) -> Result<(), EventError>;
}

struct Registration {
    data: EventData,
    callback: SharedCallback,
}

/// The per-process registry of plugin event callbacks.
pub struct Events {
    buckets: RefCell<HashMap<String, Vec<Registration>>>,
    stats: RefCell<RegistryStats>,
    config: RegistryConfig,
}

impl std::fmt::Debug for Events {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Events")
            .field("plugins", &self.plugin_count())
            .field("registrations", &self.registration_count())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for Events {
    fn default() -> Self {
        Self::new()
    }
}

impl Events {
    /// Creates an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates an empty registry.
    ///
    /// # Arguments
    ///
    /// * `config` - Validation switches applied to every registration
    ///
    /// # Examples
    ///
    /// ```rust
    /// use plugin_events::{EventRegistry, Events, RegistryConfig};
    ///
    /// let events = Events::with_config(RegistryConfig::permissive());
    /// assert!(events.register_event("", "OnTick", Box::new(|_| None)).is_ok());
    /// ```
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            buckets: RefCell::new(HashMap::new()),
            stats: RefCell::new(RegistryStats::default()),
            config,
        }
    }

    /// The configuration this registry was created with.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Whether (`plugin_name`, `event_name`) currently has a callback.
    pub fn is_registered(&self, plugin_name: &str, event_name: &str) -> bool {
        self.buckets
            .borrow()
            .get(plugin_name)
            .is_some_and(|bucket| bucket.iter().any(|r| r.data.event_name == event_name))
    }

    /// Event names registered by `plugin_name`, in registration order.
    pub fn registered_events(&self, plugin_name: &str) -> Vec<String> {
        self.buckets
            .borrow()
            .get(plugin_name)
            .map(|bucket| bucket.iter().map(|r| r.data.event_name.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of plugins with at least one live registration.
    pub fn plugin_count(&self) -> usize {
        self.buckets.borrow().len()
    }

    /// Total number of live registrations across all plugins.
    ///
    /// # Returns
    ///
    /// The sum of every plugin's registrations. Cleared registrations are not
    /// counted, so this drops back to zero once every token is released.
    pub fn registration_count(&self) -> usize {
        self.buckets.borrow().values().map(Vec::len).sum()
    }

    /// Whether no plugin holds a live registration.
    pub fn is_empty(&self) -> bool {
        self.registration_count() == 0
    }

    /// Snapshot of the registry's lifetime counters.
    ///
    /// # Returns
    ///
    /// A copy of the counters at the time of the call. Later registrations
    /// do not update a snapshot already taken.
    pub fn stats(&self) -> RegistryStats {
        self.stats.borrow().clone()
    }

    /// Calls the callback registered for (`plugin_name`, `event_name`).
    ///
    /// The callback runs after the registry's internal borrow is released,
    /// so it may itself register or clear events.
    pub fn invoke(
        &self,
        plugin_name: &str,
        event_name: &str,
        args: &[Argument],
    ) -> Result<Option<Argument>, EventError> {
        let callback = self.find_callback(plugin_name, event_name).ok_or_else(|| {
            EventError::HandlerNotFound {
                plugin: plugin_name.to_string(),
                event: event_name.to_string(),
            }
        })?;

        self.stats.borrow_mut().events_dispatched += 1;
        Ok(callback(args))
    }

    /// Calls every plugin's callback for `event_name`, ordered by plugin
    /// name, and returns each plugin's result.
    pub fn invoke_all(&self, event_name: &str, args: &[Argument]) -> Vec<(String, Option<Argument>)> {
        let mut targets: Vec<(String, SharedCallback)> = self
            .buckets
            .borrow()
            .iter()
            .filter_map(|(plugin_name, bucket)| {
                bucket
                    .iter()
                    .find(|r| r.data.event_name == event_name)
                    .map(|r| (plugin_name.clone(), Rc::clone(&r.callback)))
            })
            .collect();
        targets.sort_by(|a, b| a.0.cmp(&b.0));

        self.stats.borrow_mut().events_dispatched += targets.len() as u64;
        targets
            .into_iter()
            .map(|(plugin_name, callback)| {
                let result = callback(args);
                (plugin_name, result)
            })
            .collect()
    }

    fn find_callback(&self, plugin_name: &str, event_name: &str) -> Option<SharedCallback> {
        self.buckets.borrow().get(plugin_name).and_then(|bucket| {
            bucket
                .iter()
                .find(|r| r.data.event_name == event_name)
                .map(|r| Rc::clone(&r.callback))
        })
    }

    fn validate_names(&self, plugin_name: &str, event_name: &str) -> Result<(), EventError> {
        if !self.config.reject_empty_names {
            return Ok(());
        }
        if plugin_name.is_empty() {
            return Err(EventError::InvalidName(format!(
                "empty plugin name for event '{}'",
                event_name
            )));
        }
        if event_name.is_empty() {
            return Err(EventError::InvalidName(format!(
                "empty event name for plugin '{}'",
                plugin_name
            )));
        }
        Ok(())
    }
}

impl EventRegistry for Events {
    fn register_event(
        &self,
        plugin_name: &str,
        event_name: &str,
        callback: FunctionCallback,
    ) -> Result<RegistrationToken, EventError> {
        if let Err(e) = self.validate_names(plugin_name, event_name) {
            warn!("Rejected registration: {}", e);
            self.stats.borrow_mut().rejected_registrations += 1;
            return Err(e);
        }

        let mut buckets = self.buckets.borrow_mut();
        let bucket = buckets.entry(plugin_name.to_string()).or_default();

        if bucket.iter().any(|r| r.data.event_name == event_name) {
            drop(buckets);
            warn!(
                "Plugin {} tried to register event {} twice",
                plugin_name, event_name
            );
            self.stats.borrow_mut().rejected_registrations += 1;
            return Err(EventError::DuplicateRegistration {
                plugin: plugin_name.to_string(),
                event: event_name.to_string(),
            });
        }

        let data = EventData::new(plugin_name, event_name);
        bucket.push(Registration {
            data: data.clone(),
            callback: Rc::from(callback),
        });
        drop(buckets);

        let mut stats = self.stats.borrow_mut();
        stats.events_registered += 1;
        stats.total_registrations += 1;
        debug!("Registered event {}", data);

        Ok(RegistrationToken::new(data))
    }

    fn clear_event(&self, token: RegistrationToken) -> Result<(), EventError> {
        let data = token.into_data();
        let mut buckets = self.buckets.borrow_mut();

        let removed = match buckets.get_mut(&data.plugin_name) {
            Some(bucket) => match bucket.iter().position(|r| r.data == data) {
                Some(index) => {
                    let registration = bucket.remove(index);
                    if bucket.is_empty() {
                        buckets.remove(&data.plugin_name);
                    }
                    Some(registration)
                }
                None => None,
            },
            None => None,
        };
        drop(buckets);

        // Dropped outside the borrow so a callback's captured state may touch the registry.
        let Some(registration) = removed else {
            warn!("Invalid or duplicate registration token for {}", data);
            self.stats.borrow_mut().rejected_clears += 1;
            return Err(EventError::UnknownRegistration {
                plugin: data.plugin_name,
                event: data.event_name,
            });
        };
        drop(registration);

        let mut stats = self.stats.borrow_mut();
        stats.events_cleared += 1;
        stats.total_registrations = stats.total_registrations.saturating_sub(1);
        debug!("Cleared event {}", data);
        Ok(())
    }
}
