//! Enrichment clients wrapping the external IP information services

use crate::config::LookupConfig;
use crate::error::LookupError;
use crate::lookup::models::{Address, EnrichmentRecord, LookupOutcome, ProxyStatus};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Failure reason reported when the information lookup fails
pub const INFO_FAILURE: &str = "Failed to fetch IP information";

/// Failure reason reported when the proxy check fails
pub const PROXY_FAILURE: &str = "Failed to check proxy status";

/// Response keys that may carry the proxy check flag
const PROXY_FLAG_KEYS: [&str; 3] = ["proxyip", "active", "proxy"];

type JsonObject = Map<String, Value>;

/// A source that can resolve one address into a record
#[async_trait]
pub trait EnrichmentClient: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Look up one address. Never fails outright: errors become
    /// [`LookupOutcome::Failure`].
    async fn resolve(&self, ip: &Address) -> LookupOutcome;
}

/// Build the HTTP client shared by the enrichment clients
pub fn build_http_client(config: &LookupConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(config.timeout)
        .user_agent(&config.user_agent)
        .build()?;

    Ok(client)
}

/// Send a GET request and decode a JSON object body
async fn get_json(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
) -> std::result::Result<JsonObject, LookupError> {
    let response = client.get(url).query(query).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(LookupError::Status(status));
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Read a field as text. Empty strings and nulls count as absent,
/// numbers and booleans are stringified.
fn text_field(object: &JsonObject, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn flag_field(object: &JsonObject, key: &str) -> Option<bool> {
    match object.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "active" | "yes" | "1" => Some(true),
            "false" | "dead" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

/// Client for the primary IP information service
#[derive(Debug, Clone)]
pub struct PrimaryInfoClient {
    client: Client,
    url: String,
    key: String,
}

impl PrimaryInfoClient {
    pub fn new(client: Client, config: &LookupConfig) -> Self {
        Self {
            client,
            url: config.info_url.clone(),
            key: config.info_key.clone(),
        }
    }

    /// Create a client with its own HTTP client
    pub fn with_config(config: &LookupConfig) -> Result<Self> {
        Ok(Self::new(build_http_client(config)?, config))
    }

    async fn fetch(&self, ip: &Address) -> std::result::Result<EnrichmentRecord, LookupError> {
        let object = get_json(
            &self.client,
            &self.url,
            &[("key", self.key.as_str()), ("ip", ip.as_str())],
        )
        .await?;

        if let Some(message) = text_field(&object, "error") {
            return Err(LookupError::Rejected(message));
        }

        Ok(Self::map_record(&object))
    }

    /// Map the service's JSON schema onto the normalized record
    fn map_record(object: &JsonObject) -> EnrichmentRecord {
        EnrichmentRecord {
            ip: text_field(object, "ip"),
            origin_ip: text_field(object, "originIp"),
            isp: text_field(object, "isp"),
            country: text_field(object, "country"),
            country_code: text_field(object, "countryCode"),
            city: text_field(object, "city"),
            proxy_status: text_field(object, "proxyStatus"),
        }
    }
}

#[async_trait]
impl EnrichmentClient for PrimaryInfoClient {
    fn name(&self) -> &'static str {
        "ip-info"
    }

    async fn resolve(&self, ip: &Address) -> LookupOutcome {
        match self.fetch(ip).await {
            Ok(record) => {
                debug!(ip = %ip, source = self.name(), "lookup succeeded");
                LookupOutcome::success(record)
            }
            // The service's own reason is shown to the user as-is
            Err(LookupError::Rejected(message)) => {
                warn!(ip = %ip, source = self.name(), reason = %message, "lookup rejected");
                LookupOutcome::failure(message)
            }
            Err(e) => {
                warn!(ip = %ip, source = self.name(), error = %e, "lookup failed");
                LookupOutcome::failure(INFO_FAILURE)
            }
        }
    }
}

/// Client for the proxy check service
///
/// The service tries to reach a fixed target host through the candidate
/// address and reports whether that worked.
#[derive(Debug, Clone)]
pub struct ProxyStatusClient {
    client: Client,
    url: String,
    target_host: String,
    target_port: String,
    target_tls: &'static str,
}

impl ProxyStatusClient {
    pub fn new(client: Client, url: String, config: &LookupConfig) -> Self {
        Self {
            client,
            url,
            target_host: config.proxy_target_host.clone(),
            target_port: config.proxy_target_port.to_string(),
            target_tls: if config.proxy_target_tls { "true" } else { "false" },
        }
    }

    /// Create a client with its own HTTP client, if a check URL is configured
    pub fn with_config(config: &LookupConfig) -> Result<Option<Self>> {
        match &config.proxy_check_url {
            Some(url) => Ok(Some(Self::new(
                build_http_client(config)?,
                url.clone(),
                config,
            ))),
            None => Ok(None),
        }
    }

    async fn fetch(&self, ip: &Address) -> std::result::Result<ProxyStatus, LookupError> {
        let object = get_json(
            &self.client,
            &self.url,
            &[
                ("ip", ip.as_str()),
                ("host", self.target_host.as_str()),
                ("port", self.target_port.as_str()),
                ("tls", self.target_tls),
            ],
        )
        .await?;

        Ok(Self::map_status(&object))
    }

    /// A missing flag means the service could not confirm the relay
    fn map_status(object: &JsonObject) -> ProxyStatus {
        PROXY_FLAG_KEYS
            .iter()
            .find_map(|key| flag_field(object, key))
            .unwrap_or(false)
            .into()
    }
}

#[async_trait]
impl EnrichmentClient for ProxyStatusClient {
    fn name(&self) -> &'static str {
        "proxy-check"
    }

    async fn resolve(&self, ip: &Address) -> LookupOutcome {
        match self.fetch(ip).await {
            Ok(status) => {
                debug!(ip = %ip, source = self.name(), %status, "proxy check finished");
                LookupOutcome::success(EnrichmentRecord::with_proxy_status(status))
            }
            Err(e) => {
                warn!(ip = %ip, source = self.name(), error = %e, "proxy check failed");
                LookupOutcome::failure(PROXY_FAILURE)
            }
        }
    }
}
