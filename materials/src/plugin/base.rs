//! State shared by every plugin.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::defines::DefineValue;

/// Default plugin priority. Lower priorities run first.
pub const DEFAULT_PRIORITY: i32 = 500;

static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);

/// Non-owning reference from a plugin to the manager it is registered with.
///
/// It only identifies the manager; it never keeps it (or the material) alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManagerHandle(u64);

impl ManagerHandle {
    /// Allocate a handle unique for the process.
    pub(crate) fn next() -> Self {
        Self(NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Identity, ordering and declared defines of a plugin.
///
/// Concrete plugins embed one `PluginBase` and expose it through
/// [`MaterialPlugin::base`](super::MaterialPlugin::base).
///
/// # Example
///
/// ```
/// use redlilium_materials::PluginBase;
///
/// let base = PluginBase::new("Outline")
///     .with_priority(150)
///     .with_define("OUTLINE", true)
///     .with_define("OUTLINE_WIDTH", 2)
///     .with_define("_OUTLINE_CACHE", false);
/// assert_eq!(base.priority(), 150);
/// assert_eq!(base.define_properties().len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct PluginBase {
    name: String,
    priority: i32,
    define_properties: Vec<(String, DefineValue)>,
    /// Whether the plugin contributes its effect. Plugins consult it themselves.
    pub enabled: bool,
    /// Excluded from material serialization when set.
    pub do_not_serialize: bool,
    manager: Option<ManagerHandle>,
    registration_order: u64,
    disposed: bool,
}

impl PluginBase {
    /// Create a base with [`DEFAULT_PRIORITY`] and no declared defines.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: DEFAULT_PRIORITY,
            define_properties: Vec::new(),
            enabled: true,
            do_not_serialize: false,
            manager: None,
            registration_order: 0,
            disposed: false,
        }
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Declare a define property with its default value.
    ///
    /// Names starting with `_` are private: kept on the plugin but never
    /// emitted by [`collect_defines`](super::MaterialPlugin::collect_defines).
    #[must_use]
    pub fn with_define(
        mut self,
        name: impl Into<String>,
        default_value: impl Into<DefineValue>,
    ) -> Self {
        let name = name.into();
        let value = default_value.into();
        match self.define_properties.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.define_properties.push((name, value)),
        }
        self
    }

    /// Plugin name, unique per material.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename an unregistered plugin. The manager keys plugins by name, so
    /// only the crate renames, and never while registered.
    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Execution priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Change the priority. A registered plugin moves to its new place from
    /// the manager's next pass on.
    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// Declared define properties, private ones included.
    pub fn define_properties(&self) -> &[(String, DefineValue)] {
        &self.define_properties
    }

    /// Manager the plugin is registered with.
    pub fn manager(&self) -> Option<ManagerHandle> {
        self.manager
    }

    /// Order in which the plugin was registered; breaks priority ties.
    pub fn registration_order(&self) -> u64 {
        self.registration_order
    }

    pub(crate) fn attach(&mut self, manager: ManagerHandle, order: u64) {
        self.manager = Some(manager);
        self.registration_order = order;
    }

    pub(crate) fn detach(&mut self) {
        self.manager = None;
    }

    /// Whether [`MaterialPlugin::dispose`](super::MaterialPlugin::dispose)
    /// already ran to completion.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Mark the plugin disposed, returning `false` if it already was.
    pub fn mark_disposed(&mut self) -> bool {
        !std::mem::replace(&mut self.disposed, true)
    }
}
