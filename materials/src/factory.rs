//! Plugin factories.
//!
//! Materials restored from records, or cloned, need to create plugins from a
//! class name. [`PluginFactories`] maps class names to constructors of
//! unregistered plugins. Factories registered with
//! [`register_auto`](PluginFactories::register_auto) are also attached to
//! every material created through
//! [`PluginMaterial::with_factories`](crate::PluginMaterial::with_factories).

use std::sync::Arc;

use crate::plugin::MaterialPlugin;
use crate::plugins::{DetailMapPlugin, RimLightPlugin};

/// Constructor of an unregistered plugin.
pub type PluginConstructor = Arc<dyn Fn() -> Box<dyn MaterialPlugin> + Send + Sync>;

struct Factory {
    class_name: String,
    constructor: PluginConstructor,
    auto: bool,
}

/// Class name to plugin constructor registry.
#[derive(Default)]
pub struct PluginFactories {
    factories: Vec<Factory>,
}

impl PluginFactories {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in plugins, none attached automatically.
    pub fn with_builtins() -> Self {
        let mut factories = Self::new();
        factories.register("DetailMapConfiguration", || Box::new(DetailMapPlugin::new()));
        factories.register("RimLightPlugin", || Box::new(RimLightPlugin::new()));
        factories
    }

    /// Register a constructor for `class_name`, replacing any previous one.
    pub fn register<F>(&mut self, class_name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn MaterialPlugin> + Send + Sync + 'static,
    {
        self.insert(class_name.into(), Arc::new(constructor), false);
    }

    /// Register a constructor whose plugin is attached to every new material.
    pub fn register_auto<F>(&mut self, class_name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn MaterialPlugin> + Send + Sync + 'static,
    {
        self.insert(class_name.into(), Arc::new(constructor), true);
    }

    fn insert(&mut self, class_name: String, constructor: PluginConstructor, auto: bool) {
        log::debug!("Registered plugin factory '{class_name}' (auto: {auto})");
        let factory = Factory {
            class_name,
            constructor,
            auto,
        };
        match self
            .factories
            .iter_mut()
            .find(|f| f.class_name == factory.class_name)
        {
            Some(existing) => *existing = factory,
            None => self.factories.push(factory),
        }
    }

    /// Remove the factory of `class_name`. Returns whether one existed.
    pub fn unregister(&mut self, class_name: &str) -> bool {
        let before = self.factories.len();
        self.factories.retain(|f| f.class_name != class_name);
        self.factories.len() != before
    }

    /// Remove every factory.
    pub fn unregister_all(&mut self) {
        self.factories.clear();
    }

    /// Whether `class_name` has a factory.
    pub fn contains(&self, class_name: &str) -> bool {
        self.factories.iter().any(|f| f.class_name == class_name)
    }

    /// Create an unregistered plugin of `class_name`.
    pub fn create(&self, class_name: &str) -> Option<Box<dyn MaterialPlugin>> {
        self.factories
            .iter()
            .find(|f| f.class_name == class_name)
            .map(|f| (f.constructor)())
    }

    /// Create one plugin per auto factory, in registration order.
    pub fn create_auto(&self) -> Vec<Box<dyn MaterialPlugin>> {
        self.factories
            .iter()
            .filter(|f| f.auto)
            .map(|f| (f.constructor)())
            .collect()
    }

    /// Number of factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no factory is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for PluginFactories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.factories.iter().map(|f| &f.class_name))
            .finish()
    }
}
