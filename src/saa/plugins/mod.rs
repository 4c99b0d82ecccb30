//! Use-case plugins.
//!
//! A plugin is a pure function turning an objective into a tailored planning prompt.
//! Plugins live in a [`PluginRegistry`] keyed by name; the orchestrator only ever talks to
//! the registry, so how it gets populated (the built-in set, an application's own
//! registrations) does not matter to the workflow.
//!
//! ```rust
//! use saa_orchestrator::plugins::{Plugin, PluginRegistry};
//!
//! fn release_notes(objective: &str) -> String {
//!     format!("Draft release notes for: {}", objective)
//! }
//!
//! let mut registry = PluginRegistry::with_builtin_plugins();
//! registry.register(Plugin::new("release_notes", "Drafts release notes.", release_notes));
//!
//! assert_eq!(
//!     registry.prompt_for("release_notes", "v2.0").unwrap(),
//!     "Draft release notes for: v2.0"
//! );
//! assert!(registry.prompt_for("does_not_exist", "v2.0").is_err());
//! ```

mod builtin;

use crate::error::{SaaError, SaaResult};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub use builtin::builtin_plugins;

/// Prompt builder signature shared by all plugins.
pub type PromptFn = dyn Fn(&str) -> String + Send + Sync;

#[derive(Clone)]
pub struct Plugin {
    name: String,
    description: String,
    prompt: Arc<PromptFn>,
}

impl Plugin {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, prompt: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Plugin {
            name: name.into(),
            description: description.into(),
            prompt: Arc::new(prompt),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The planning prompt for `objective`.
    pub fn prompt(&self, objective: &str) -> String {
        (self.prompt)(objective)
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// Plugins by name, iterated in name order.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, Plugin>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        PluginRegistry::default()
    }

    /// A registry holding every plugin shipped with the crate.
    pub fn with_builtin_plugins() -> Self {
        let mut registry = PluginRegistry::new();
        for plugin in builtin_plugins() {
            registry.register(plugin);
        }
        registry
    }

    /// Add `plugin`, returning the plugin it replaced, if any.
    pub fn register(&mut self, plugin: Plugin) -> Option<Plugin> {
        let replaced = self.plugins.insert(plugin.name.clone(), plugin);
        if let Some(old) = &replaced {
            log::warn!("Plugin '{}' was registered twice; keeping the latest", old.name);
        }
        replaced
    }

    pub fn get(&self, name: &str) -> Option<&Plugin> {
        self.plugins.get(name)
    }

    /// The prompt of plugin `name` for `objective`, or [`SaaError::PluginNotFound`].
    pub fn prompt_for(&self, name: &str, objective: &str) -> SaaResult<String> {
        self.get(name)
            .map(|plugin| plugin.prompt(objective))
            .ok_or_else(|| SaaError::PluginNotFound(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.values()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
