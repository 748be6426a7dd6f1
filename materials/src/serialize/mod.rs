//! Serialization of plugin state.
//!
//! Each plugin type exposes a static field table
//! ([`MaterialPlugin::field_table`](crate::MaterialPlugin::field_table)) and
//! reads/writes its fields by name. The generic routines here walk that
//! table, so any plugin gets save, restore and deep copy without
//! plugin-specific code:
//!
//! - [`serialize_fields`] captures name, priority and every table field
//! - [`parse_fields`] restores them, tolerating records from other versions
//! - [`copy_fields`] deep-copies them into another instance of the same type
//!
//! [`Format`] / [`encode`] / [`decode`] turn records into bytes (feature-gated).

pub mod field;
mod format;
mod record;

use std::sync::Arc;

use redlilium_core::scene::Scene;
use redlilium_core::texture::Texture;

use crate::plugin::MaterialPlugin;

pub use field::{FieldDescriptor, FieldKind, FieldValue};
pub use format::{Format, decode, encode};
pub use record::{SerializedMaterial, SerializedPlugin, SerializedValue};

/// Capture the serializable state of `plugin`.
pub fn serialize_fields<P: MaterialPlugin + ?Sized>(plugin: &P) -> SerializedPlugin {
    let fields = plugin
        .field_table()
        .iter()
        .filter_map(|desc| {
            plugin
                .read_field(desc.name)
                .map(|value| (desc.name.to_string(), SerializedValue::from(&value)))
        })
        .collect();

    SerializedPlugin {
        class_name: plugin.class_name().to_string(),
        name: plugin.name().to_string(),
        priority: plugin.priority(),
        fields,
    }
}

/// Restore the state of `plugin` from `source`.
///
/// Unknown fields are ignored and missing fields keep their current value.
/// Fields whose value does not fit the declared kind are skipped with a
/// warning. Texture urls are resolved against `root_url`. The name is only
/// restored while the plugin is not registered with a manager.
pub fn parse_fields<P: MaterialPlugin + ?Sized>(
    plugin: &mut P,
    source: &SerializedPlugin,
    scene: &Scene,
    root_url: &str,
) {
    log::trace!(
        "Parsing plugin '{}' ({}) for scene '{}'",
        source.name,
        source.class_name,
        scene.name
    );

    if plugin.base().manager().is_none() {
        plugin.base_mut().set_name(source.name.clone());
    }
    plugin.base_mut().set_priority(source.priority);

    let table = plugin.field_table();
    for (name, value) in &source.fields {
        let Some(desc) = table.iter().find(|d| d.name == name) else {
            log::trace!("Plugin '{}': ignoring unknown field '{name}'", source.name);
            continue;
        };
        if !value.fits(desc.kind) {
            log::warn!(
                "Plugin '{}': field '{name}' expects {:?}, skipping",
                source.name,
                desc.kind
            );
            continue;
        }

        let value = match value {
            SerializedValue::Null => FieldValue::Texture(None),
            SerializedValue::Boolean(v) => FieldValue::Boolean(*v),
            SerializedValue::Number(v) => FieldValue::Number(*v),
            SerializedValue::String(v) => FieldValue::String(v.clone()),
            SerializedValue::Vector(v) => FieldValue::Vector(v.clone()),
            SerializedValue::Texture(record) => {
                FieldValue::Texture(Some(Arc::new(Texture::from_record(record, root_url))))
            }
        };
        if !plugin.write_field(name, value) {
            log::warn!("Plugin '{}': field '{name}' rejected its value", source.name);
        }
    }
}

/// Deep-copy the serializable state of `source` into `target`.
///
/// Priority and every table field are copied; the name is not. Textures are
/// cloned so the two plugins share nothing.
pub fn copy_fields<P: MaterialPlugin + ?Sized>(source: &P, target: &mut dyn MaterialPlugin) {
    if source.class_name() != target.class_name() {
        log::warn!(
            "Cannot copy plugin '{}' ({}) into '{}' ({})",
            source.name(),
            source.class_name(),
            target.name(),
            target.class_name()
        );
        return;
    }

    target.base_mut().set_priority(source.priority());
    for desc in source.field_table() {
        if let Some(value) = source.read_field(desc.name) {
            target.write_field(desc.name, value.deep_clone());
        }
    }
}
