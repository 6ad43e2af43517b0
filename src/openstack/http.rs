//! HTTP utilities for OpenStack REST API calls

use anyhow::{Context, Result};
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Request timeout for every API call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the Keystone token on service requests
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Header selecting the service microversion
pub const API_VERSION_HEADER: &str = "OpenStack-API-Version";

/// Prefix of the error raised for a non-success HTTP status
const REQUEST_FAILED: &str = "API request failed: ";

/// Sanitize response body for logging
/// Truncates long responses and drops non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Response of a POST whose headers matter (Keystone returns the token there)
pub struct JsonResponse {
    pub headers: HeaderMap,
    pub body: Value,
}

/// HTTP client wrapper for OpenStack API calls
#[derive(Clone, Debug)]
pub struct OpenStackHttpClient {
    client: Client,
}

impl OpenStackHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("placement-explorer/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make an authenticated GET request to an OpenStack service at a microversion
    pub async fn get(&self, url: &str, token: &str, microversion: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(AUTH_TOKEN_HEADER, token)
            .header(API_VERSION_HEADER, microversion)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(anyhow::anyhow!("{}{}", REQUEST_FAILED, status));
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }

    /// Make an unauthenticated POST with a JSON body, keeping response headers
    pub async fn post_json(&self, url: &str, body: &Value) -> Result<JsonResponse> {
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let headers = response.headers().clone();
        let response_body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
            return Err(anyhow::anyhow!("{}{}", REQUEST_FAILED, status));
        }

        if response_body.is_empty() {
            return Ok(JsonResponse {
                headers,
                body: Value::Null,
            });
        }

        let body = serde_json::from_str(&response_body).context("Failed to parse response JSON")?;
        Ok(JsonResponse { headers, body })
    }
}

/// HTTP status carried by an "API request failed: <status>" error message
fn failed_status(error: &str) -> Option<u16> {
    let (_, rest) = error.rsplit_once(REQUEST_FAILED)?;
    rest.get(..3)?.parse().ok()
}

/// Turn a collection error message into a short hint for the terminal
pub fn format_api_error(error: &str) -> Option<&'static str> {
    match failed_status(error)? {
        401 => Some("Authentication failed. Check the credentials in clouds.yaml."),
        403 => Some("Permission denied. Reading Placement usually needs an admin role."),
        404 => Some("Resource not found. Check the placement endpoint and microversion."),
        406 => Some("Microversion not supported by this Placement service."),
        409 => Some("Resource conflict reported by the API."),
        429 => Some("Rate limit exceeded. Please try again later."),
        500 | 502 | 503 => Some("Service temporarily unavailable. Please try again."),
        _ => None,
    }
}
