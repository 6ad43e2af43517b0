//! Snapshot Collector
//!
//! Builds the cloud -> provider -> resources/instances snapshot from the
//! Placement API, or loads a recorded one in fake-data mode.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use super::normalizer::normalize;
use super::snapshot::{
    CloudSnapshot, Clouds, CollectionResult, InstanceResources, NormalizedResource,
    ProviderSnapshot,
};
use crate::config::{CollectorConfig, NodeKey};
use crate::error::{CollectError, CollectResult};
use crate::openstack::placement::{
    Allocations, Connector, Inventories, PlacementApi, ResourceProvider, Usages,
};

/// Collect a snapshot of every configured cloud.
///
/// Never fails: any error anywhere turns the whole result into
/// `{"error": ...}`, partial snapshots are never returned.
pub async fn collect(config: &CollectorConfig, connector: &dyn Connector) -> CollectionResult {
    let outcome = match &config.fake_data {
        Some(path) => {
            tracing::info!("Using fake data from {:?}", path);
            load_fake_data(path).map(CollectionResult::Recorded)
        }
        None => try_collect(config, connector)
            .await
            .map(CollectionResult::Collected),
    };

    outcome.unwrap_or_else(|e| {
        tracing::error!("Error happened during resource collection: {}", e);
        CollectionResult::Error {
            error: e.to_string(),
        }
    })
}

async fn try_collect(config: &CollectorConfig, connector: &dyn Connector) -> CollectResult<Clouds> {
    if config.clouds.is_empty() {
        return Err(CollectError::configuration(
            "no cloud configured. Set OS_CLOUD or use --cloud",
        ));
    }

    let mut clouds = Clouds::new();
    for cloud in &config.clouds {
        let placement = connector.connect(cloud).await?;
        let snapshot = collect_for_cloud(placement.as_ref(), cloud, config.node_key)
            .await
            .map_err(CollectError::Transport)?;
        clouds.insert(cloud.clone(), snapshot);
    }

    Ok(clouds)
}

/// Load a recorded snapshot document.
///
/// The document is returned as stored; it only has to be a JSON object.
pub fn load_fake_data(path: &Path) -> CollectResult<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fake data {}", path.display()))
        .map_err(CollectError::Data)?;

    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("Malformed fake data {}", path.display()))
        .map_err(CollectError::Data)?;

    if !document.is_object() {
        return Err(CollectError::Data(anyhow::anyhow!(
            "Malformed fake data {}: expected a JSON object",
            path.display()
        )));
    }

    Ok(document)
}

/// Collect the snapshot of one cloud
pub async fn collect_for_cloud(
    placement: &dyn PlacementApi,
    cloud: &str,
    node_key: NodeKey,
) -> Result<CloudSnapshot> {
    let providers = placement
        .list_resource_providers()
        .await
        .context("Failed to list resource providers")?;

    tracing::info!("Cloud {}: {} resource providers", cloud, providers.len());

    let mut snapshot = CloudSnapshot::default();

    for provider in providers {
        let (inventories, usages, allocations) = futures::try_join!(
            placement.get_inventories(&provider.uuid),
            placement.get_usages(&provider.uuid),
            placement.get_allocations(&provider.uuid),
        )?;

        let key = match node_key {
            NodeKey::Name => provider.name.clone(),
            NodeKey::Uuid => provider.uuid.clone(),
        };
        let provider_snapshot =
            build_provider_snapshot(&provider, &inventories, &usages, &allocations);

        // Later providers win on name collisions.
        if snapshot.nodes.insert(key.clone(), provider_snapshot).is_some() {
            tracing::warn!(
                "Cloud {}: duplicate resource provider {}, keeping {}",
                cloud,
                key,
                provider.uuid
            );
        }
    }

    Ok(snapshot)
}

/// Join the three per-provider data sets into one snapshot
pub fn build_provider_snapshot(
    provider: &ResourceProvider,
    inventories: &Inventories,
    usages: &Usages,
    allocations: &Allocations,
) -> ProviderSnapshot {
    ProviderSnapshot {
        uuid: provider.uuid.clone(),
        resources: build_resources(inventories, usages),
        instances: build_instances(allocations),
    }
}

/// Totals from inventories, used amounts from usages, keyed by internal name
pub fn build_resources(
    inventories: &Inventories,
    usages: &Usages,
) -> BTreeMap<String, NormalizedResource> {
    let mut resources: BTreeMap<String, NormalizedResource> = BTreeMap::new();

    for (class, inventory) in inventories {
        let (name, total) = normalize(class, inventory.total);
        resources.entry(name).or_default().total = total;
    }

    // Usage may name a class the inventory does not have; it still gets an entry.
    for (class, used) in usages {
        let (name, used) = normalize(class, *used);
        resources.entry(name).or_default().used = used;
    }

    resources
}

/// Per-instance claimed resources, keyed by internal name
pub fn build_instances(allocations: &Allocations) -> BTreeMap<String, InstanceResources> {
    allocations
        .iter()
        .map(|(instance, allocation)| {
            let resources: InstanceResources = allocation
                .resources
                .iter()
                .map(|(class, amount)| normalize(class, *amount))
                .collect();
            (instance.clone(), resources)
        })
        .collect()
}
