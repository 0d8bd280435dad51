//! Plugin lifecycle management on top of the shared registry.
//!
//! Each loaded plugin gets its own [`EventsProxy`]. Unloading a plugin, or
//! dropping the host, shuts the plugin down and then drops that proxy and
//! with it every registration the plugin made.

use crate::config::{PluginSettings, RegistrationPolicy};
use crate::error::HostError;
use plugin_events::{Argument, EventError, Events, EventsProxy};
use tracing::{debug, error, info, warn};

/// An in-process plugin.
pub trait Plugin {
    fn name(&self) -> &str;

    fn version(&self) -> &str {
        "0.1.0"
    }

    /// Registers the plugin's event callbacks.
    fn register_events(&mut self, events: &mut PluginEvents<'_, '_>) -> Result<(), HostError>;

    /// Called before the plugin's registrations are released.
    fn shutdown(&mut self) {}
}

/// Registration handle given to [`Plugin::register_events`].
///
/// Applies the host's [`RegistrationPolicy`]: under `SkipAndLog` a refused
/// registration is logged and reported as success so the plugin keeps going.
pub struct PluginEvents<'p, 'a> {
    proxy: &'p mut EventsProxy<'a>,
    policy: RegistrationPolicy,
    skipped: Vec<EventError>,
}

impl PluginEvents<'_, '_> {
    pub fn register<F>(&mut self, event_name: &str, callback: F) -> Result<(), HostError>
    where
        F: Fn(&[Argument]) -> Option<Argument> + 'static,
    {
        match self.proxy.register_event(event_name, callback) {
            Ok(()) => Ok(()),
            Err(e) if self.policy == RegistrationPolicy::SkipAndLog => {
                warn!(
                    "Skipping registration of {} for plugin {}: {}",
                    event_name,
                    self.proxy.plugin_name(),
                    e
                );
                self.skipped.push(e);
                Ok(())
            }
            Err(e) => Err(HostError::LoadFailed {
                plugin: self.proxy.plugin_name().to_string(),
                source: e,
            }),
        }
    }

    /// Clears one of the plugin's own registrations.
    pub fn clear(&mut self, event_name: &str) -> Result<(), HostError> {
        self.proxy.clear_event(event_name).map_err(HostError::from)
    }

    pub fn plugin_name(&self) -> &str {
        self.proxy.plugin_name()
    }
}

struct LoadedPlugin<'a> {
    plugin: Box<dyn Plugin>,
    proxy: EventsProxy<'a>,
    skipped: usize,
}

/// Information about a loaded plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub events: Vec<String>,
    pub skipped_registrations: usize,
}

/// Loads plugins against a shared [`Events`] registry.
pub struct PluginHost<'a> {
    events: &'a Events,
    settings: PluginSettings,
    plugins: Vec<LoadedPlugin<'a>>,
}

impl<'a> PluginHost<'a> {
    pub fn new(events: &'a Events, settings: PluginSettings) -> Self {
        Self {
            events,
            settings,
            plugins: Vec::new(),
        }
    }

    /// The registry every plugin of this host registers into.
    pub fn events(&self) -> &'a Events {
        self.events
    }

    /// Loads a plugin and runs its registrations.
    ///
    /// Returns `Ok(false)` if the plugin is not in the enabled list. On
    /// failure the plugin's partial registrations are rolled back before
    /// the error is returned.
    pub fn load_plugin(&mut self, mut plugin: Box<dyn Plugin>) -> Result<bool, HostError> {
        let name = plugin.name().to_string();

        if !self.settings.is_enabled(&name) {
            info!("Plugin {} is not enabled, skipping", name);
            return Ok(false);
        }
        if self.find(&name).is_some() {
            return Err(HostError::PluginAlreadyLoaded(name));
        }

        let mut proxy = EventsProxy::new(self.events, name.clone());
        let mut registrar = PluginEvents {
            proxy: &mut proxy,
            policy: self.settings.registration_policy,
            skipped: Vec::new(),
        };

        let outcome = plugin.register_events(&mut registrar);
        let skipped = registrar.skipped.len();

        if let Err(e) = outcome {
            error!("Plugin {} failed to register events: {}", name, e);
            // Dropping the proxy releases whatever was registered before the failure
            drop(proxy);
            return Err(e);
        }

        info!(
            "Plugin {} v{} loaded with {} events ({} skipped)",
            name,
            plugin.version(),
            proxy.len(),
            skipped
        );

        self.plugins.push(LoadedPlugin {
            plugin,
            proxy,
            skipped,
        });
        Ok(true)
    }

    /// Shuts a plugin down and releases all of its registrations.
    pub fn unload_plugin(&mut self, plugin_name: &str) -> Result<(), HostError> {
        let index = self
            .find(plugin_name)
            .ok_or_else(|| HostError::PluginNotFound(plugin_name.to_string()))?;

        let LoadedPlugin {
            mut plugin, proxy, ..
        } = self.plugins.remove(index);

        plugin.shutdown();
        let released = proxy.len();
        proxy.close()?;

        info!(
            "Plugin {} unloaded, released {} events",
            plugin_name, released
        );
        Ok(())
    }

    /// Unloads every plugin in reverse load order.
    pub fn shutdown_all(&mut self) -> Result<(), HostError> {
        let names: Vec<String> = self
            .plugins
            .iter()
            .rev()
            .map(|loaded| loaded.proxy.plugin_name().to_string())
            .collect();

        info!("Shutting down {} plugins", names.len());

        let mut first_error = None;
        for name in names {
            if let Err(e) = self.unload_plugin(&name) {
                error!("Error unloading plugin {}: {}", name, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Invokes one plugin's callback for `event_name`.
    pub fn dispatch(
        &self,
        plugin_name: &str,
        event_name: &str,
        args: &[Argument],
    ) -> Result<Option<Argument>, HostError> {
        debug!("Dispatching {} to {}", event_name, plugin_name);
        Ok(self.events.invoke(plugin_name, event_name, args)?)
    }

    /// Invokes every plugin's callback for `event_name`.
    pub fn broadcast(&self, event_name: &str, args: &[Argument]) -> Vec<(String, Option<Argument>)> {
        let results = self.events.invoke_all(event_name, args);
        debug!("Broadcast {} reached {} plugins", event_name, results.len());
        results
    }

    pub fn loaded_plugins(&self) -> Vec<&str> {
        self.plugins
            .iter()
            .map(|loaded| loaded.plugin.name())
            .collect()
    }

    pub fn plugin_info(&self, plugin_name: &str) -> Option<PluginInfo> {
        self.find(plugin_name).map(|index| {
            let loaded = &self.plugins[index];
            PluginInfo {
                name: loaded.plugin.name().to_string(),
                version: loaded.plugin.version().to_string(),
                events: loaded
                    .proxy
                    .registered_events()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                skipped_registrations: loaded.skipped,
            }
        })
    }

    fn find(&self, plugin_name: &str) -> Option<usize> {
        self.plugins
            .iter()
            .position(|loaded| loaded.proxy.plugin_name() == plugin_name)
    }
}

impl Drop for PluginHost<'_> {
    fn drop(&mut self) {
        // Same order as shutdown_all, without surfacing teardown errors
        while let Some(LoadedPlugin {
            mut plugin, proxy, ..
        }) = self.plugins.pop()
        {
            plugin.shutdown();
            debug!(
                "Plugin {} dropped with host, releasing {} events",
                proxy.plugin_name(),
                proxy.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Registers the listed events, returning the event name as a string.
    struct ScriptedPlugin {
        name: String,
        events: Vec<&'static str>,
        shutdowns: Rc<Cell<u32>>,
    }

    impl ScriptedPlugin {
        fn boxed(name: &str, events: Vec<&'static str>) -> Box<dyn Plugin> {
            Box::new(Self {
                name: name.to_string(),
                events,
                shutdowns: Rc::new(Cell::new(0)),
            })
        }
    }

    impl Plugin for ScriptedPlugin {
        fn name(&self) -> &str {
            &self.name
        }

        fn register_events(&mut self, events: &mut PluginEvents<'_, '_>) -> Result<(), HostError> {
            for event in &self.events {
                let event = *event;
                events.register(event, move |_| Some(Argument::from(event)))?;
            }
            Ok(())
        }

        fn shutdown(&mut self) {
            self.shutdowns.set(self.shutdowns.get() + 1);
        }
    }

    fn settings(policy: RegistrationPolicy) -> PluginSettings {
        PluginSettings {
            enabled: Vec::new(),
            registration_policy: policy,
        }
    }

    #[test]
    fn test_load_and_dispatch() {
        let events = Events::new();
        let mut host = PluginHost::new(&events, PluginSettings::default());

        assert!(host
            .load_plugin(ScriptedPlugin::boxed("combat", vec!["OnDamage", "OnHeal"]))
            .unwrap());
        assert_eq!(host.loaded_plugins(), vec!["combat"]);
        assert_eq!(
            host.dispatch("combat", "OnHeal", &[]).unwrap(),
            Some(Argument::from("OnHeal"))
        );
        assert!(matches!(
            host.dispatch("combat", "OnDeath", &[]),
            Err(HostError::Event(EventError::HandlerNotFound { .. }))
        ));
    }

    #[test]
    fn test_abort_policy_rolls_back_partial_registrations() {
        let events = Events::new();
        let mut host = PluginHost::new(&events, settings(RegistrationPolicy::Abort));

        let result = host.load_plugin(ScriptedPlugin::boxed(
            "combat",
            vec!["OnDamage", "OnHeal", "OnDamage"],
        ));

        assert!(matches!(
            result,
            Err(HostError::LoadFailed {
                source: EventError::DuplicateRegistration { .. },
                ..
            })
        ));
        assert!(events.is_empty());
        assert!(host.loaded_plugins().is_empty());
    }

    #[test]
    fn test_skip_policy_keeps_loading() {
        let events = Events::new();
        let mut host = PluginHost::new(&events, settings(RegistrationPolicy::SkipAndLog));

        host.load_plugin(ScriptedPlugin::boxed(
            "combat",
            vec!["OnDamage", "OnDamage", "OnHeal"],
        ))
        .unwrap();

        let info = host.plugin_info("combat").unwrap();
        assert_eq!(info.events, vec!["OnDamage", "OnHeal"]);
        assert_eq!(info.skipped_registrations, 1);
        assert_eq!(info.version, "0.1.0");
    }

    #[test]
    fn test_disabled_plugin_is_not_loaded() {
        let events = Events::new();
        let mut host = PluginHost::new(
            &events,
            PluginSettings {
                enabled: vec!["loot".to_string()],
                registration_policy: RegistrationPolicy::Abort,
            },
        );

        assert!(!host
            .load_plugin(ScriptedPlugin::boxed("combat", vec!["OnDamage"]))
            .unwrap());
        assert!(events.is_empty());
    }

    #[test]
    fn test_double_load_rejected() {
        let events = Events::new();
        let mut host = PluginHost::new(&events, PluginSettings::default());
        host.load_plugin(ScriptedPlugin::boxed("combat", vec!["OnDamage"]))
            .unwrap();

        assert!(matches!(
            host.load_plugin(ScriptedPlugin::boxed("combat", vec!["OnHeal"])),
            Err(HostError::PluginAlreadyLoaded(_))
        ));
        assert!(!events.is_registered("combat", "OnHeal"));
    }

    #[test]
    fn test_unload_releases_registrations_and_calls_shutdown() {
        let events = Events::new();
        let mut host = PluginHost::new(&events, PluginSettings::default());
        let shutdowns = Rc::new(Cell::new(0));

        host.load_plugin(Box::new(ScriptedPlugin {
            name: "combat".to_string(),
            events: vec!["OnDamage", "OnHeal"],
            shutdowns: Rc::clone(&shutdowns),
        }))
        .unwrap();
        host.load_plugin(ScriptedPlugin::boxed("loot", vec!["OnDamage"]))
            .unwrap();

        host.unload_plugin("combat").unwrap();
        assert_eq!(shutdowns.get(), 1);
        assert!(events.registered_events("combat").is_empty());
        assert!(events.is_registered("loot", "OnDamage"));

        assert!(matches!(
            host.unload_plugin("combat"),
            Err(HostError::PluginNotFound(_))
        ));
    }

    #[test]
    fn test_broadcast_reaches_every_plugin() {
        let events = Events::new();
        let mut host = PluginHost::new(&events, PluginSettings::default());
        host.load_plugin(ScriptedPlugin::boxed("loot", vec!["OnDamage"]))
            .unwrap();
        host.load_plugin(ScriptedPlugin::boxed("combat", vec!["OnDamage"]))
            .unwrap();

        let plugins: Vec<String> = host
            .broadcast("OnDamage", &[])
            .into_iter()
            .map(|(plugin, _)| plugin)
            .collect();
        assert_eq!(plugins, vec!["combat", "loot"]);
    }

    #[test]
    fn test_shutdown_all_and_drop_leave_registry_empty() {
        let events = Events::new();
        let shutdowns = Rc::new(Cell::new(0));
        {
            let mut host = PluginHost::new(&events, PluginSettings::default());
            host.load_plugin(ScriptedPlugin::boxed("combat", vec!["OnDamage"]))
                .unwrap();
            host.load_plugin(ScriptedPlugin::boxed("loot", vec!["OnLoot"]))
                .unwrap();
            host.shutdown_all().unwrap();
            assert!(host.loaded_plugins().is_empty());
            assert!(events.is_empty());

            host.load_plugin(Box::new(ScriptedPlugin {
                name: "combat".to_string(),
                events: vec!["OnDamage"],
                shutdowns: Rc::clone(&shutdowns),
            }))
            .unwrap();
            assert_eq!(shutdowns.get(), 0);
        }
        // Dropping the host shuts each plugin down, then drops its proxy
        assert_eq!(shutdowns.get(), 1);
        assert!(events.is_empty());
    }

    /// Records its name into a shared log on shutdown, along with how many
    /// of its events were still registered at that moment.
    struct OrderedPlugin {
        name: &'static str,
        events: &'static Events,
        log: Rc<RefCell<Vec<(&'static str, usize)>>>,
    }

    impl Plugin for OrderedPlugin {
        fn name(&self) -> &str {
            self.name
        }

        fn register_events(&mut self, events: &mut PluginEvents<'_, '_>) -> Result<(), HostError> {
            events.register("OnTick", |_| None)
        }

        fn shutdown(&mut self) {
            let live = self.events.registered_events(self.name).len();
            self.log.borrow_mut().push((self.name, live));
        }
    }

    #[test]
    fn test_drop_shuts_down_in_reverse_order_before_release() {
        let events: &'static Events = Box::leak(Box::new(Events::new()));
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let mut host = PluginHost::new(events, PluginSettings::default());
            for name in ["combat", "loot", "chronicle"] {
                host.load_plugin(Box::new(OrderedPlugin {
                    name,
                    events,
                    log: Rc::clone(&log),
                }))
                .unwrap();
            }
        }

        assert_eq!(
            *log.borrow(),
            vec![("chronicle", 1), ("loot", 1), ("combat", 1)]
        );
        assert!(events.is_empty());
    }

    /// Registers a pair of events, then drops the one it turns out not to need.
    struct PruningPlugin;

    impl Plugin for PruningPlugin {
        fn name(&self) -> &str {
            "pruner"
        }

        fn register_events(&mut self, events: &mut PluginEvents<'_, '_>) -> Result<(), HostError> {
            events.register("OnDamage", |_| Some(Argument::Int(1)))?;
            events.register("OnHeal", |_| Some(Argument::Int(2)))?;
            assert_eq!(events.plugin_name(), "pruner");
            events.clear("OnHeal")
        }
    }

    #[test]
    fn test_plugin_can_clear_its_own_registration() {
        let events = Events::new();
        let mut host = PluginHost::new(&events, PluginSettings::default());
        host.load_plugin(Box::new(PruningPlugin)).unwrap();

        let registry = host.events();
        assert!(registry.is_registered("pruner", "OnDamage"));
        assert!(!registry.is_registered("pruner", "OnHeal"));
        assert_eq!(registry.stats().events_cleared, 1);
        assert_eq!(
            host.plugin_info("pruner").unwrap().events,
            vec!["OnDamage"]
        );
        assert!(matches!(
            host.dispatch("pruner", "OnHeal", &[]),
            Err(HostError::Event(EventError::HandlerNotFound { .. }))
        ));
    }

    /// Clears an event it never registered.
    struct StrayClearPlugin;

    impl Plugin for StrayClearPlugin {
        fn name(&self) -> &str {
            "stray"
        }

        fn register_events(&mut self, events: &mut PluginEvents<'_, '_>) -> Result<(), HostError> {
            events.register("OnDamage", |_| None)?;
            events.clear("OnHeal")
        }
    }

    #[test]
    fn test_clearing_unknown_event_fails_load_and_rolls_back() {
        let events = Events::new();
        let mut host = PluginHost::new(&events, PluginSettings::default());

        assert!(matches!(
            host.load_plugin(Box::new(StrayClearPlugin)),
            Err(HostError::Event(EventError::UnrecognizedEvent { .. }))
        ));
        assert!(events.is_empty());
        assert!(host.loaded_plugins().is_empty());
    }
}
