//! OpenStack API interaction module
//!
//! Everything needed to read one cloud's Placement service: cloud definitions
//! from clouds.yaml, Keystone authentication, and the Placement client.
//!
//! # Module Structure
//!
//! - [`auth`] - clouds.yaml loading and Keystone v3 token authentication
//! - [`client`] - Placement client and the clouds.yaml-backed connector
//! - [`http`] - HTTP utilities for REST API calls
//! - [`placement`] - Placement response models and the `PlacementApi`/`Connector` traits
//!
//! # Example
//!
//! ```ignore
//! use placement_explorer::openstack::{Connector, OpenStackConnector, PlacementApi};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let connector = OpenStackConnector::new(None);
//!     let placement = connector.connect("devstack").await?;
//!     let providers = placement.list_resource_providers().await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod placement;

pub use client::{OpenStackConnector, PlacementClient};
pub use placement::{Connector, PlacementApi, ResourceProvider};
