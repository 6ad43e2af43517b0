//! OpenStack Authentication
//!
//! Reads cloud definitions from `clouds.yaml` and obtains a Keystone v3 token
//! plus the Placement endpoint from the service catalog.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::http::OpenStackHttpClient;
use crate::error::{CollectError, CollectResult};

/// Placement microversion requested when clouds.yaml does not name one
pub const DEFAULT_PLACEMENT_VERSION: &str = "1.10";

/// Catalog interface used when clouds.yaml does not name one
const DEFAULT_INTERFACE: &str = "public";

/// Domain assumed for users and projects given by name
const DEFAULT_DOMAIN: &str = "Default";

/// Header in which Keystone returns the issued token
const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Root of a clouds.yaml file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CloudsFile {
    #[serde(default)]
    pub clouds: HashMap<String, CloudConfig>,
}

/// One entry under `clouds:`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CloudConfig {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub region_name: Option<String>,
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub placement_endpoint_override: Option<String>,
    #[serde(default)]
    pub placement_api_version: Option<String>,
}

/// The `auth:` section of a cloud
#[derive(Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub auth_url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub user_domain_name: Option<String>,
    #[serde(default)]
    pub user_domain_id: Option<String>,
    #[serde(default)]
    pub project_domain_name: Option<String>,
    #[serde(default)]
    pub project_domain_id: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

// Keeps secrets out of logs and error messages.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("auth_url", &self.auth_url)
            .field("username", &self.username)
            .field("project_name", &self.project_name)
            .field("project_id", &self.project_id)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl CloudsFile {
    /// Parse clouds.yaml content
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse clouds.yaml")
    }

    /// Load clouds.yaml from the explicit path or the standard locations
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = find_clouds_file(explicit).context(
            "No clouds.yaml found. Set OS_CLIENT_CONFIG_FILE or use --clouds-file",
        )?;

        tracing::debug!("Loading clouds from {:?}", path);

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn cloud(&self, name: &str) -> Option<&CloudConfig> {
        self.clouds.get(name)
    }
}

/// Locate clouds.yaml: explicit path, working directory, user config, system config
pub fn find_clouds_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let mut candidates = vec![PathBuf::from("clouds.yaml")];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("openstack").join("clouds.yaml"));
    }
    candidates.push(PathBuf::from("/etc/openstack/clouds.yaml"));

    candidates.into_iter().find(|p| p.is_file())
}

/// Authenticated access to one cloud's Placement service
#[derive(Clone)]
pub struct Session {
    pub token: String,
    pub placement_url: String,
    pub microversion: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("placement_url", &self.placement_url)
            .field("microversion", &self.microversion)
            .finish_non_exhaustive()
    }
}

/// Catalog entry from a Keystone token response
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEndpoint {
    pub interface: String,
    pub url: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub region_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

/// Keystone v3 token URL for an auth_url with or without the version suffix
pub fn tokens_url(auth_url: &str) -> String {
    let base = auth_url.trim_end_matches('/');
    if base.ends_with("/v3") {
        format!("{}/auth/tokens", base)
    } else {
        format!("{}/v3/auth/tokens", base)
    }
}

/// Find the placement endpoint matching the interface and, if given, the region
pub fn placement_endpoint(
    catalog: &[CatalogEntry],
    interface: &str,
    region: Option<&str>,
) -> Option<String> {
    catalog
        .iter()
        .filter(|entry| entry.service_type == "placement")
        .flat_map(|entry| entry.endpoints.iter())
        .filter(|ep| ep.interface == interface)
        .find(|ep| match region {
            Some(region) => {
                ep.region.as_deref() == Some(region) || ep.region_id.as_deref() == Some(region)
            }
            None => true,
        })
        .map(|ep| ep.url.trim_end_matches('/').to_string())
}

fn domain_ref(id: Option<&String>, name: Option<&String>) -> Value {
    match (id, name) {
        (Some(id), _) => json!({ "id": id }),
        (None, Some(name)) => json!({ "name": name }),
        (None, None) => json!({ "name": DEFAULT_DOMAIN }),
    }
}

/// Build the Keystone v3 auth request body
pub fn auth_request_body(auth: &AuthConfig) -> CollectResult<Value> {
    let identity = if let Some(token) = &auth.token {
        json!({
            "methods": ["token"],
            "token": { "id": token }
        })
    } else {
        let (Some(username), Some(password)) = (&auth.username, &auth.password) else {
            return Err(CollectError::configuration(
                "auth needs either a token or a username and password",
            ));
        };
        json!({
            "methods": ["password"],
            "password": {
                "user": {
                    "name": username,
                    "domain": domain_ref(auth.user_domain_id.as_ref(), auth.user_domain_name.as_ref()),
                    "password": password
                }
            }
        })
    };

    let mut body = json!({ "auth": { "identity": identity } });

    let scope = match (&auth.project_id, &auth.project_name) {
        (Some(id), _) => Some(json!({ "project": { "id": id } })),
        (None, Some(name)) => Some(json!({
            "project": {
                "name": name,
                "domain": domain_ref(auth.project_domain_id.as_ref(), auth.project_domain_name.as_ref())
            }
        })),
        (None, None) => None,
    };

    if let Some(scope) = scope {
        body["auth"]["scope"] = scope;
    }

    Ok(body)
}

/// Authenticate against a cloud and resolve its Placement endpoint
pub async fn authenticate(
    http: &OpenStackHttpClient,
    cloud_name: &str,
    cloud: &CloudConfig,
) -> CollectResult<Session> {
    let microversion = format!(
        "placement {}",
        cloud
            .placement_api_version
            .as_deref()
            .unwrap_or(DEFAULT_PLACEMENT_VERSION)
    );

    // A pre-issued token with a fixed endpoint needs no Keystone round trip.
    if let (Some(token), Some(endpoint)) = (&cloud.auth.token, &cloud.placement_endpoint_override) {
        tracing::debug!("Using pre-issued token for cloud {}", cloud_name);
        return Ok(Session {
            token: token.clone(),
            placement_url: endpoint.trim_end_matches('/').to_string(),
            microversion,
        });
    }

    let Some(auth_url) = &cloud.auth.auth_url else {
        return Err(CollectError::configuration(format!(
            "cloud {} has no auth_url",
            cloud_name
        )));
    };

    let body = auth_request_body(&cloud.auth)?;
    let response = http
        .post_json(&tokens_url(auth_url), &body)
        .await
        .context("Keystone authentication failed")
        .map_err(CollectError::Transport)?;

    let token = response
        .headers
        .get(SUBJECT_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            CollectError::Transport(anyhow::anyhow!(
                "Keystone response has no {} header",
                SUBJECT_TOKEN_HEADER
            ))
        })?;

    let placement_url = match &cloud.placement_endpoint_override {
        Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
        None => {
            let parsed: TokenResponse = serde_json::from_value(response.body)
                .context("Malformed Keystone token response")
                .map_err(CollectError::Transport)?;
            let interface = cloud.interface.as_deref().unwrap_or(DEFAULT_INTERFACE);

            placement_endpoint(&parsed.token.catalog, interface, cloud.region_name.as_deref())
                .ok_or_else(|| {
                    CollectError::configuration(format!(
                        "no {} placement endpoint in the catalog of cloud {}",
                        interface, cloud_name
                    ))
                })?
        }
    };

    tracing::info!("Authenticated to {}, placement at {}", cloud_name, placement_url);

    Ok(Session {
        token,
        placement_url,
        microversion,
    })
}
