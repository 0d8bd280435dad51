//! Built-in plugins shipped with the host.

use crate::error::HostError;
use crate::host::{Plugin, PluginEvents};
use plugin_events::{Argument, EffectHandle, ObjectId};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::info;

/// Applies flat damage reduction and reports applied effects.
///
/// `OnDamage(target: object, amount: int) -> int` returns the damage left
/// after armor. `OnApplyEffect(target: object, effect: effect) -> string`
/// describes the application.
pub struct CombatPlugin {
    armor: i32,
}

impl CombatPlugin {
    pub fn new(armor: i32) -> Self {
        Self { armor }
    }
}

impl Plugin for CombatPlugin {
    fn name(&self) -> &str {
        "combat"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn register_events(&mut self, events: &mut PluginEvents<'_, '_>) -> Result<(), HostError> {
        let armor = self.armor;
        events.register("OnDamage", move |args| {
            let amount = *args.get(1)?.get::<i32>()?;
            Some(Argument::Int((amount - armor).max(0)))
        })?;

        events.register("OnApplyEffect", |args| {
            let target = args.first()?.get::<ObjectId>()?;
            let effect = args.get(1)?.get::<EffectHandle>()?;
            Some(Argument::String(format!(
                "{} applied to {}",
                Argument::Effect(*effect),
                target
            )))
        })?;

        Ok(())
    }
}

/// Writes a line for every event it hears about.
pub struct ChroniclePlugin {
    entries: Rc<RefCell<Vec<String>>>,
}

impl ChroniclePlugin {
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Shared view of the recorded lines.
    pub fn entries(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.entries)
    }

    fn recorder(&self, event_name: &'static str) -> impl Fn(&[Argument]) -> Option<Argument> + 'static {
        let entries = Rc::clone(&self.entries);
        move |args: &[Argument]| {
            let rendered: Vec<String> = args.iter().map(Argument::to_string).collect();
            let line = format!("{}({})", event_name, rendered.join(", "));
            info!("{}", line);
            entries.borrow_mut().push(line);
            None
        }
    }
}

impl Default for ChroniclePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ChroniclePlugin {
    fn name(&self) -> &str {
        "chronicle"
    }

    fn register_events(&mut self, events: &mut PluginEvents<'_, '_>) -> Result<(), HostError> {
        events.register("OnDamage", self.recorder("OnDamage"))?;
        events.register("OnDeath", self.recorder("OnDeath"))?;
        Ok(())
    }

    fn shutdown(&mut self) {
        info!("Chronicle closing with {} entries", self.entries.borrow().len());
    }
}

/// Every built-in plugin, in load order.
pub fn builtin_plugins() -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(CombatPlugin::new(2)),
        Box::new(ChroniclePlugin::new()),
    ]
}
