//! Shader define declarations and runtime define values.
//!
//! Plugins *declare* the defines they own ([`DefineDeclarations`]) with a
//! typed default value, and later *update* their runtime values
//! ([`MaterialDefines`]) while a material is prepared for a mesh. The runtime
//! values decide which shader variant is compiled.

use serde::{Deserialize, Serialize};

use crate::error::{PluginError, PluginResult};

/// Kind of a define default value, derived from the [`DefineValue`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefineKind {
    /// Numeric define (`#define NAME 2`).
    Number,
    /// String define (`#define NAME value`).
    String,
    /// Boolean define (`#define NAME` when true, absent when false).
    Boolean,
    /// Opaque value the preprocessor does not interpret.
    Object,
}

/// Value of a shader define.
///
/// The variant is chosen by the plugin author when the define is declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefineValue {
    /// Numeric value.
    Number(f64),
    /// String value.
    String(String),
    /// Boolean switch.
    Boolean(bool),
    /// Opaque value; `None` is an unset object.
    Opaque(Option<String>),
}

impl DefineValue {
    /// Kind of this value.
    pub fn kind(&self) -> DefineKind {
        match self {
            Self::Number(_) => DefineKind::Number,
            Self::String(_) => DefineKind::String,
            Self::Boolean(_) => DefineKind::Boolean,
            Self::Opaque(_) => DefineKind::Object,
        }
    }

    /// Whether the define is considered set.
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Number(v) => *v != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::Boolean(b) => *b,
            Self::Opaque(o) => o.is_some(),
        }
    }

    /// Value of the same kind that switches the define off.
    pub fn disabled(&self) -> Self {
        self.kind().disabled_value()
    }

    /// Text handed to the shader preprocessor, `None` when the define is omitted.
    fn shader_value(&self) -> Option<String> {
        match self {
            Self::Boolean(true) => Some(String::new()),
            Self::Boolean(false) => None,
            Self::Number(v) => Some(v.to_string()),
            Self::String(s) if s.is_empty() => None,
            Self::String(s) => Some(s.clone()),
            Self::Opaque(o) => o.clone(),
        }
    }
}

impl DefineKind {
    /// Value of this kind that is not [enabled](DefineValue::is_enabled).
    pub fn disabled_value(self) -> DefineValue {
        match self {
            Self::Number => DefineValue::Number(0.0),
            Self::String => DefineValue::String(String::new()),
            Self::Boolean => DefineValue::Boolean(false),
            Self::Object => DefineValue::Opaque(None),
        }
    }
}

/// Render `(name, value)` defines as preprocessor lines.
///
/// An empty value renders a bare `#define NAME`.
pub fn render_defines<'a>(defines: impl IntoIterator<Item = &'a (String, String)>) -> String {
    let mut source = String::new();
    for (name, value) in defines {
        if value.is_empty() {
            source.push_str(&format!("#define {name}\n"));
        } else {
            source.push_str(&format!("#define {name} {value}\n"));
        }
    }
    source
}

impl From<bool> for DefineValue {
    fn from(v: bool) -> Self {
        DefineValue::Boolean(v)
    }
}

impl From<f64> for DefineValue {
    fn from(v: f64) -> Self {
        DefineValue::Number(v)
    }
}

impl From<i32> for DefineValue {
    fn from(v: i32) -> Self {
        DefineValue::Number(f64::from(v))
    }
}

impl From<u32> for DefineValue {
    fn from(v: u32) -> Self {
        DefineValue::Number(f64::from(v))
    }
}

impl From<&str> for DefineValue {
    fn from(v: &str) -> Self {
        DefineValue::String(v.to_string())
    }
}

impl From<String> for DefineValue {
    fn from(v: String) -> Self {
        DefineValue::String(v)
    }
}

/// Declared define: kind plus default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefineDescriptor {
    /// Kind of the default value.
    pub kind: DefineKind,
    /// Default value.
    pub default_value: DefineValue,
}

impl DefineDescriptor {
    /// Describe a define from its default value.
    pub fn new(default_value: DefineValue) -> Self {
        Self {
            kind: default_value.kind(),
            default_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Declaration {
    descriptor: DefineDescriptor,
    owner: Option<String>,
}

/// Insertion-ordered set of define declarations.
///
/// One instance is filled per plugin by
/// [`MaterialPlugin::collect_defines`](crate::MaterialPlugin::collect_defines)
/// and merged into the material-wide aggregate with
/// [`merge_from`](Self::merge_from), which rejects keys declared twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefineDeclarations {
    entries: Vec<(String, Declaration)>,
}

impl DefineDeclarations {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a define, replacing an earlier declaration of the same name.
    pub fn declare(&mut self, name: impl Into<String>, default_value: DefineValue) {
        let name = name.into();
        let declaration = Declaration {
            descriptor: DefineDescriptor::new(default_value),
            owner: None,
        };
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = declaration,
            None => self.entries.push((name, declaration)),
        }
    }

    /// Merge `other` into this set, attributing its entries to `owner`.
    ///
    /// Fails on the first key already present; entries merged before the
    /// collision are kept.
    pub fn merge_from(&mut self, owner: &str, other: DefineDeclarations) -> PluginResult<()> {
        for (name, declaration) in other.entries {
            if let Some((_, existing)) = self.entries.iter().find(|(n, _)| *n == name) {
                return Err(PluginError::DefineCollision {
                    define: name,
                    first: existing.owner.clone().unwrap_or_default(),
                    second: owner.to_string(),
                });
            }
            self.entries.push((
                name,
                Declaration {
                    descriptor: declaration.descriptor,
                    owner: Some(owner.to_string()),
                },
            ));
        }
        Ok(())
    }

    /// Descriptor of a declared define.
    pub fn get(&self, name: &str) -> Option<&DefineDescriptor> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| &d.descriptor)
    }

    /// Name of the plugin that declared `name`, once merged.
    pub fn owner(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, d)| d.owner.as_deref())
    }

    /// Whether `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of declared defines.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate declarations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DefineDescriptor)> {
        self.entries
            .iter()
            .map(|(n, d)| (n.as_str(), &d.descriptor))
    }
}

/// Runtime define values of a material.
///
/// Values are updated every preparation pass. Any change marks the set dirty,
/// which tells the host that the shader variant must be looked up again.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDefines {
    values: Vec<(String, DefineValue)>,
    declared: Vec<String>,
    dirty: bool,
}

impl Default for MaterialDefines {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialDefines {
    /// Create an empty, dirty set.
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            declared: Vec::new(),
            dirty: true,
        }
    }

    /// Create a set holding the defaults of every declaration.
    pub fn from_declarations(declarations: &DefineDeclarations) -> Self {
        let mut defines = Self::new();
        defines.apply_declarations(declarations);
        defines
    }

    /// Add defaults for declarations not present yet. Returns how many were added.
    ///
    /// Every declared name is remembered so that [`retain_declared`](Self::retain_declared)
    /// can drop it once no plugin declares it anymore.
    pub fn apply_declarations(&mut self, declarations: &DefineDeclarations) -> usize {
        let mut added = 0;
        for (name, descriptor) in declarations.iter() {
            if !self.declared.iter().any(|n| n == name) {
                self.declared.push(name.to_string());
            }
            if !self.contains(name) {
                self.values
                    .push((name.to_string(), descriptor.default_value.clone()));
                added += 1;
            }
        }
        if added > 0 {
            self.dirty = true;
        }
        added
    }

    /// Drop values of previously declared defines missing from `declarations`.
    ///
    /// Defines set directly by the host are kept. Returns how many were dropped.
    pub fn retain_declared(&mut self, declarations: &DefineDeclarations) -> usize {
        let stale: Vec<String> = self
            .declared
            .iter()
            .filter(|name| !declarations.contains(name))
            .cloned()
            .collect();
        if stale.is_empty() {
            return 0;
        }

        let before = self.values.len();
        self.values.retain(|(name, _)| !stale.contains(name));
        self.declared.retain(|name| !stale.contains(name));
        let dropped = before - self.values.len();
        if dropped > 0 {
            self.dirty = true;
        }
        dropped
    }

    /// Set a define value. Marks the set dirty only if the value changed.
    pub fn set(&mut self, name: &str, value: impl Into<DefineValue>) {
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => {
                if *existing != value {
                    *existing = value;
                    self.dirty = true;
                }
            }
            None => {
                self.values.push((name.to_string(), value));
                self.dirty = true;
            }
        }
    }

    /// Current value of a define.
    pub fn get(&self, name: &str) -> Option<&DefineValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Whether a define is present and set.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).is_some_and(DefineValue::is_enabled)
    }

    /// Whether `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of defines.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set holds no defines.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether any value changed since the last [`mark_as_processed`](Self::mark_as_processed).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Acknowledge the current values (after the shader variant was resolved).
    pub fn mark_as_processed(&mut self) {
        self.dirty = false;
    }

    /// Force the next preparation pass to re-resolve the shader variant.
    pub fn mark_all_as_dirty(&mut self) {
        self.dirty = true;
    }

    /// Iterate values in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DefineValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Build the `(name, value)` list handed to the shader compiler.
    ///
    /// True booleans map to an empty value, false booleans and unset
    /// opaque values are omitted.
    pub fn to_shader_defines(&self) -> Vec<(String, String)> {
        self.values
            .iter()
            .filter_map(|(name, value)| value.shader_value().map(|v| (name.clone(), v)))
            .collect()
    }

    /// Render the defines as preprocessor source.
    pub fn to_source(&self) -> String {
        render_defines(&self.to_shader_defines())
    }
}
