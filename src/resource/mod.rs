//! Resource snapshot layer
//!
//! Turns raw Placement data into the per-cloud snapshot shown to users.
//!
//! # Architecture
//!
//! - [`normalizer`] - Maps vendor resource classes to display names and units
//! - [`collector`] - Fetches and joins inventories, usages and allocations
//! - [`snapshot`] - The nested snapshot document and the collection result
//!
//! # Example
//!
//! ```ignore
//! use placement_explorer::config::CollectorConfig;
//! use placement_explorer::openstack::OpenStackConnector;
//! use placement_explorer::resource::collect;
//!
//! async fn snapshot() -> String {
//!     let config = CollectorConfig {
//!         clouds: vec!["devstack".to_string()],
//!         ..Default::default()
//!     };
//!     let result = collect(&config, &OpenStackConnector::new(None)).await;
//!     serde_json::to_string_pretty(&result).unwrap_or_default()
//! }
//! ```

pub mod collector;
pub mod normalizer;
pub mod snapshot;

pub use collector::{collect, collect_for_cloud, load_fake_data};
pub use normalizer::normalize;
pub use snapshot::{
    CloudSnapshot, Clouds, CollectionResult, InstanceResources, NormalizedResource,
    ProviderSnapshot,
};
