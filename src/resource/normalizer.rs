//! Resource Class Normalizer
//!
//! Maps vendor resource class names reported by Placement (`DISK_GB`,
//! `MEMORY_MB`, `VCPU`, ...) to the short names used for display, converting
//! the value into the display unit where needed.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Unit conversion applied to a raw quantity
pub type Conversion = fn(u64) -> u64;

/// Mapping for one known resource class
#[derive(Debug, Clone, Copy)]
pub struct ClassMapping {
    pub internal_name: &'static str,
    pub convert: Option<Conversion>,
}

/// Gigabytes to megabytes
fn gb_to_mb(value: u64) -> u64 {
    value.saturating_mul(1024)
}

/// Known resource classes, keyed by lower-cased vendor name
const KNOWN_CLASSES: &[(&str, ClassMapping)] = &[
    (
        "disk_gb",
        ClassMapping {
            internal_name: "disk",
            convert: Some(gb_to_mb),
        },
    ),
    (
        "memory_mb",
        ClassMapping {
            internal_name: "memory",
            convert: None,
        },
    ),
    (
        "vcpu",
        ClassMapping {
            internal_name: "cpu",
            convert: None,
        },
    ),
];

static TABLE: OnceLock<HashMap<&'static str, ClassMapping>> = OnceLock::new();

/// Get the class table (built on first access)
pub fn class_table() -> &'static HashMap<&'static str, ClassMapping> {
    TABLE.get_or_init(|| KNOWN_CLASSES.iter().copied().collect())
}

/// Look up the mapping for a vendor class name (case-insensitive)
pub fn lookup(class_name: &str) -> Option<&'static ClassMapping> {
    class_table().get(class_name.to_lowercase().as_str())
}

/// Normalize a (class, value) pair into (internal name, converted value).
///
/// Unknown classes keep their lower-cased name and their value, so custom
/// resource classes still show up in the snapshot.
pub fn normalize(class_name: &str, value: u64) -> (String, u64) {
    let lowered = class_name.to_lowercase();

    match class_table().get(lowered.as_str()) {
        Some(mapping) => {
            let converted = mapping.convert.map_or(value, |convert| convert(value));
            (mapping.internal_name.to_string(), converted)
        }
        None => (lowered, value),
    }
}
