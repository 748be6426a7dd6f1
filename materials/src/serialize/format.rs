//! Format-specific encoding and decoding (feature-gated).

use crate::error::PluginResult;

/// Supported serialization formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// RON (Rusty Object Notation), human-readable text.
    #[cfg(feature = "serialize-ron")]
    Ron,
}

/// Encode a record to bytes in the given format.
#[allow(unused_variables)]
pub fn encode<T: serde::Serialize>(value: &T, format: Format) -> PluginResult<Vec<u8>> {
    match format {
        #[cfg(feature = "serialize-ron")]
        Format::Ron => ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
            .map(String::into_bytes)
            .map_err(|e| PluginError::Format(e.to_string())),
    }
}

/// Decode a record from bytes in the given format.
#[allow(unused_variables)]
pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8], format: Format) -> PluginResult<T> {
    match format {
        #[cfg(feature = "serialize-ron")]
        Format::Ron => {
            let s = std::str::from_utf8(bytes).map_err(|e| PluginError::Format(e.to_string()))?;
            ron::from_str(s).map_err(|e| PluginError::Format(e.to_string()))
        }
    }
}

#[cfg(all(test, feature = "serialize-ron"))]
mod tests {
    use super::*;
    use crate::serialize::{SerializedMaterial, SerializedPlugin, SerializedValue};

    #[test]
    fn test_ron_material_record() {
        let material = SerializedMaterial {
            name: "ground".into(),
            plugins: vec![SerializedPlugin {
                class_name: "RimLightPlugin".into(),
                name: "RimLight".into(),
                priority: 300,
                fields: vec![
                    ("power".into(), SerializedValue::Number(2.5)),
                    ("color".into(), SerializedValue::Vector(vec![1.0, 0.5, 0.25])),
                ],
            }],
        };

        let bytes = encode(&material, Format::Ron).unwrap();
        let decoded: SerializedMaterial = decode(&bytes, Format::Ron).unwrap();
        assert_eq!(decoded, material);
    }

    #[test]
    fn test_ron_decode_error() {
        let result: PluginResult<SerializedMaterial> = decode(b"(name: ", Format::Ron);
        assert!(matches!(result, Err(PluginError::Format(_))));
    }
}
