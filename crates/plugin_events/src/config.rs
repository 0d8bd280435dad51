//! Registry configuration.

use serde::{Deserialize, Serialize};

fn default_reject_empty_names() -> bool {
    true
}

/// Behaviour switches for an [`Events`](crate::Events) registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Refuse registrations whose plugin or event name is empty
    #[serde(default = "default_reject_empty_names")]
    pub reject_empty_names: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            reject_empty_names: default_reject_empty_names(),
        }
    }
}

impl RegistryConfig {
    /// Configuration that accepts any name, including empty ones.
    pub fn permissive() -> Self {
        Self {
            reject_empty_names: false,
        }
    }
}
