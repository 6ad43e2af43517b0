//! Snapshot types
//!
//! The nested cloud -> provider -> resources/instances document returned by a
//! collection. Recorded fake-data documents are carried as raw JSON and never
//! pass through these types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Total and used amount of one resource class on a provider, in display units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedResource {
    pub total: u64,
    /// Zero when the provider reported no usage for the class
    #[serde(default)]
    pub used: u64,
}

/// Resources claimed by one consumer instance, keyed by internal class name
pub type InstanceResources = BTreeMap<String, u64>;

/// Everything known about one resource provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSnapshot {
    pub uuid: String,
    pub resources: BTreeMap<String, NormalizedResource>,
    pub instances: BTreeMap<String, InstanceResources>,
}

/// All providers of one cloud
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudSnapshot {
    pub nodes: BTreeMap<String, ProviderSnapshot>,
}

/// Snapshots keyed by cloud identity
pub type Clouds = BTreeMap<String, CloudSnapshot>;

/// Outcome of a whole collection: every requested cloud, or one error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectionResult {
    Error { error: String },
    Collected(Clouds),
    /// Fake-data document, exactly as stored
    Recorded(Value),
}

impl CollectionResult {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Error message, if this is the error shape
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error { error } => Some(error),
            Self::Collected(_) | Self::Recorded(_) => None,
        }
    }

    /// Collected clouds, if this is the success shape
    pub fn clouds(&self) -> Option<&Clouds> {
        match self {
            Self::Collected(clouds) => Some(clouds),
            Self::Error { .. } | Self::Recorded(_) => None,
        }
    }

    /// Recorded document, if this came from fake data
    pub fn recorded(&self) -> Option<&Value> {
        match self {
            Self::Recorded(document) => Some(document),
            Self::Error { .. } | Self::Collected(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_shape_serializes_flat() {
        let result = CollectionResult::Error {
            error: "boom".to_string(),
        };
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({"error": "boom"}));
        assert!(result.is_error());
        assert_eq!(result.error(), Some("boom"));
    }

    #[test]
    fn test_success_shape_serializes_nested() {
        let mut provider = ProviderSnapshot {
            uuid: "4e8e5957-649f-477b-9e5b-f1f75b21c03c".to_string(),
            ..Default::default()
        };
        provider.resources.insert(
            "disk".to_string(),
            NormalizedResource {
                total: 10240,
                used: 2048,
            },
        );

        let mut cloud = CloudSnapshot::default();
        cloud.nodes.insert("compute-0".to_string(), provider);

        let mut clouds = Clouds::new();
        clouds.insert("devstack".to_string(), cloud);

        let value = serde_json::to_value(CollectionResult::Collected(clouds)).unwrap();
        assert_eq!(
            value,
            json!({
                "devstack": {
                    "nodes": {
                        "compute-0": {
                            "uuid": "4e8e5957-649f-477b-9e5b-f1f75b21c03c",
                            "resources": {"disk": {"total": 10240, "used": 2048}},
                            "instances": {}
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_missing_used_defaults_to_zero() {
        let resource: NormalizedResource = serde_json::from_value(json!({"total": 8})).unwrap();
        assert_eq!(resource, NormalizedResource { total: 8, used: 0 });
    }

    #[test]
    fn test_recorded_document_serializes_verbatim() {
        let document = json!({"demo": {"nodes": {}, "region": "RegionOne"}, "total": 8.0});
        let result = CollectionResult::Recorded(document.clone());
        assert_eq!(serde_json::to_value(&result).unwrap(), document);
        assert!(!result.is_error());
        assert!(result.clouds().is_none());
        assert_eq!(result.recorded(), Some(&document));
    }

    #[test]
    fn test_error_document_is_not_a_cloud_map() {
        let parsed: Result<Clouds, _> = serde_json::from_value(json!({"error": "boom"}));
        assert!(parsed.is_err());
    }
}
