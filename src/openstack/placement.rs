//! Placement API
//!
//! Response models for the four Placement calls the collector needs, and the
//! traits the collector is written against.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::CollectResult;

/// Resource provider as listed by `GET /resource_providers`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceProvider {
    pub uuid: String,
    pub name: String,
}

/// One inventory record; only the total is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Inventory {
    pub total: u64,
}

/// Resources claimed by one consumer on a provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderAllocation {
    pub resources: BTreeMap<String, u64>,
}

pub type Inventories = BTreeMap<String, Inventory>;
pub type Usages = BTreeMap<String, u64>;
pub type Allocations = BTreeMap<String, ProviderAllocation>;

#[derive(Debug, Deserialize)]
pub(crate) struct ResourceProvidersResponse {
    pub resource_providers: Vec<ResourceProvider>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InventoriesResponse {
    pub inventories: Inventories,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsagesResponse {
    pub usages: Usages,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AllocationsResponse {
    pub allocations: Allocations,
}

/// Read-only view of one cloud's Placement service
#[async_trait]
pub trait PlacementApi: Send + Sync {
    async fn list_resource_providers(&self) -> Result<Vec<ResourceProvider>>;

    async fn get_inventories(&self, provider_uuid: &str) -> Result<Inventories>;

    async fn get_usages(&self, provider_uuid: &str) -> Result<Usages>;

    async fn get_allocations(&self, provider_uuid: &str) -> Result<Allocations>;
}

/// Opens an authenticated Placement handle for a named cloud
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, cloud: &str) -> CollectResult<Box<dyn PlacementApi>>;
}
