//! # Plugin Events
//!
//! Per-process event registration broker for plugins hosted inside an
//! engine. A plugin registers a named callback for a named event exactly
//! once, receives a [`RegistrationToken`] for it, and all of its
//! registrations are removed automatically when its [`EventsProxy`] goes out
//! of scope.
//!
//! ## Components
//!
//! - [`Argument`] - tagged union used for callback arguments and results
//! - [`Events`] - the central registry, one per process, shared by reference
//! - [`EventsProxy`] - per-plugin scoped façade that owns the plugin's tokens
//!
//! ## Quick Start
//!
//! ```rust
//! use plugin_events::{Argument, Events, EventsProxy, EventError};
//!
//! let events = Events::new();
//!
//! let mut combat = EventsProxy::new(&events, "Combat");
//! combat
//!     .register_event("OnDamage", |args| {
//!         let amount = args.first().and_then(|a| a.get::<i32>()).copied()?;
//!         Some(Argument::Int(amount * 2))
//!     })
//!     .unwrap();
//!
//! // A plugin may bind each event name once
//! let err = combat.register_event("OnDamage", |_| None).unwrap_err();
//! assert!(matches!(err, EventError::DuplicateRegistration { .. }));
//!
//! let result = events.invoke("Combat", "OnDamage", &[Argument::Int(21)]).unwrap();
//! assert_eq!(result, Some(Argument::Int(42)));
//!
//! drop(combat);
//! assert!(events.is_empty());
//! ```
//!
//! ## Threading
//!
//! Everything here is single-threaded. [`Events`] is `!Sync`; a host that
//! drives plugins from several threads has to serialize access itself.

pub mod argument;
pub mod config;
pub mod error;
pub mod proxy;
pub mod registry;
pub mod stats;
pub mod token;

pub use argument::{
    object_id_to_string, Argument, ArgumentKind, ArgumentStack, ArgumentValue, EffectHandle,
    ObjectId,
};
pub use config::RegistryConfig;
pub use error::EventError;
pub use proxy::EventsProxy;
pub use registry::{EventRegistry, Events, FunctionCallback};
pub use stats::RegistryStats;
pub use token::{EventData, RegistrationToken};
