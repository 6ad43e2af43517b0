//! Placement Client
//!
//! Authenticated client for one cloud's Placement service, and the connector
//! that builds one per cloud from clouds.yaml.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

use super::auth::{self, CloudsFile, Session};
use super::http::OpenStackHttpClient;
use super::placement::{
    Allocations, AllocationsResponse, Connector, Inventories, InventoriesResponse, PlacementApi,
    ResourceProvider, ResourceProvidersResponse, Usages, UsagesResponse,
};
use crate::error::{CollectError, CollectResult};

/// Placement client bound to one authenticated session
#[derive(Clone, Debug)]
pub struct PlacementClient {
    http: OpenStackHttpClient,
    session: Session,
}

impl PlacementClient {
    pub fn new(http: OpenStackHttpClient, session: Session) -> Self {
        Self { http, session }
    }

    /// Build a Placement API URL
    pub fn placement_url(&self, path: &str) -> String {
        format!("{}/{}", self.session.placement_url, path)
    }

    /// Build a URL under one resource provider
    pub fn provider_url(&self, provider_uuid: &str, resource: &str) -> String {
        self.placement_url(&format!(
            "resource_providers/{}/{}",
            urlencoding::encode(provider_uuid),
            resource
        ))
    }

    /// GET a Placement URL and decode the expected response shape
    async fn get<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        let value = self
            .http
            .get(url, &self.session.token, &self.session.microversion)
            .await
            .with_context(|| format!("Failed to fetch {}", what))?;

        serde_json::from_value(value).with_context(|| format!("Malformed {} response", what))
    }
}

#[async_trait]
impl PlacementApi for PlacementClient {
    async fn list_resource_providers(&self) -> Result<Vec<ResourceProvider>> {
        let url = self.placement_url("resource_providers");
        let response: ResourceProvidersResponse = self.get(&url, "resource providers").await?;
        Ok(response.resource_providers)
    }

    async fn get_inventories(&self, provider_uuid: &str) -> Result<Inventories> {
        let url = self.provider_url(provider_uuid, "inventories");
        let what = format!("inventories of provider {}", provider_uuid);
        let response: InventoriesResponse = self.get(&url, &what).await?;
        Ok(response.inventories)
    }

    async fn get_usages(&self, provider_uuid: &str) -> Result<Usages> {
        let url = self.provider_url(provider_uuid, "usages");
        let what = format!("usages of provider {}", provider_uuid);
        let response: UsagesResponse = self.get(&url, &what).await?;
        Ok(response.usages)
    }

    async fn get_allocations(&self, provider_uuid: &str) -> Result<Allocations> {
        let url = self.provider_url(provider_uuid, "allocations");
        let what = format!("allocations of provider {}", provider_uuid);
        let response: AllocationsResponse = self.get(&url, &what).await?;
        Ok(response.allocations)
    }
}

#[derive(Debug, Clone)]
enum CloudsSource {
    /// Read clouds.yaml on every connect (explicit path or standard locations)
    File(Option<PathBuf>),
    Loaded(CloudsFile),
}

/// Connector that authenticates through Keystone using clouds.yaml
#[derive(Debug, Clone)]
pub struct OpenStackConnector {
    source: CloudsSource,
}

impl OpenStackConnector {
    /// Connector reading clouds.yaml from `path`, or the standard locations if `None`
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            source: CloudsSource::File(path),
        }
    }

    /// Connector over already parsed cloud definitions
    pub fn from_clouds(clouds: CloudsFile) -> Self {
        Self {
            source: CloudsSource::Loaded(clouds),
        }
    }

    fn clouds(&self) -> CollectResult<CloudsFile> {
        match &self.source {
            CloudsSource::File(path) => {
                CloudsFile::load(path.as_deref()).map_err(CollectError::Configuration)
            }
            CloudsSource::Loaded(clouds) => Ok(clouds.clone()),
        }
    }
}

#[async_trait]
impl Connector for OpenStackConnector {
    async fn connect(&self, cloud: &str) -> CollectResult<Box<dyn PlacementApi>> {
        let clouds = self.clouds()?;
        let Some(config) = clouds.cloud(cloud) else {
            return Err(CollectError::configuration(format!(
                "cloud {} not found in clouds.yaml",
                cloud
            )));
        };

        let http = OpenStackHttpClient::new().map_err(CollectError::Transport)?;
        let session = auth::authenticate(&http, cloud, config).await?;

        Ok(Box::new(PlacementClient::new(http, session)))
    }
}
