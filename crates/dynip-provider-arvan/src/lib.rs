// # ArvanCloud DNS Provider
//
// This crate provides an ArvanCloud DNS provider implementation for the
// dynip system.
//
// ## Behavior
//
// - One logical API operation per invocation, full error propagation to the
//   engine (the engine owns retries, backoff and scheduling)
// - HTTP timeout configured (30 seconds)
// - Specific error handling for HTTP status codes (401/403, 404, 429, 5xx)
// - Idempotency checking (no PUT if the record already carries the address)
// - Both A and AAAA record support
// - NO retry/backoff logic, NO caching, NO background tasks
//
// ## Security
//
// - The API key NEVER appears in logs; the Debug impl redacts it
// - The factory rejects an empty key
//
// ## API Reference
//
// - ArvanCloud CDN API v4: https://www.arvancloud.ir/docs/api/cdn/4.0
// - Get domain:     GET `/domains/:domain`
// - List records:   GET `/domains/:domain/dns-records?search=...`
// - Update record:  PUT `/domains/:domain/dns-records/:id`

use async_trait::async_trait;
use dynip_core::config::ProviderConfig;
use dynip_core::traits::{DnsProvider, DnsProviderFactory, RecordType};
use dynip_core::{Error, Result};
use serde_json::{Value, json};
use std::net::IpAddr;
use std::time::Duration;

/// ArvanCloud API base URL
const ARVAN_API_BASE: &str = "https://napi.arvancloud.ir/cdn/4.0";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// TTL applied when the existing record does not carry one
const DEFAULT_TTL: u64 = 120;

/// ArvanCloud DNS provider
///
/// Isolated, stateless, single-shot: all coordination (retries, backoff,
/// scheduling) is owned by the `UpdateEngine`.
pub struct ArvanProvider {
    /// ArvanCloud API key. Never logged.
    api_key: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// The Debug implementation intentionally does NOT expose the API key
impl std::fmt::Debug for ArvanProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArvanProvider")
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

impl ArvanProvider {
    /// Create a new ArvanCloud provider
    ///
    /// # Parameters
    ///
    /// - `api_key`: ArvanCloud API key with DNS edit access
    ///
    /// # Errors
    ///
    /// Fails fast on an empty key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("ArvanCloud API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { api_key, client })
    }

    /// ArvanCloud authorization header value (`Apikey <key>`)
    fn auth_header(&self) -> String {
        format!("Apikey {}", self.api_key)
    }

    /// Map a non-success status to the error taxonomy
    fn status_error(status: reqwest::StatusCode, context: &str, body: &str) -> Error {
        match status.as_u16() {
            401 | 403 => Error::auth(format!(
                "Invalid API key or insufficient permissions ({})",
                context
            )),
            404 => Error::not_found(context.to_string()),
            429 => Error::rate_limited(format!("{} (retry later)", context)),
            500..=599 => Error::http(format!(
                "ArvanCloud server error (transient): {} - {} ({})",
                status, body, context
            )),
            _ => Error::provider(
                "arvan",
                format!("{}: {} - {}", context, status, body),
            ),
        }
    }

    /// Issue a GET and parse the JSON body, mapping failures to the taxonomy
    async fn get_json(&self, url: &str, context: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, context, &body));
        }

        response
            .json()
            .await
            .map_err(|e| Error::provider("arvan", format!("Failed to parse response: {}", e)))
    }

    /// Find the record entry for a name + type within the domain
    async fn find_record(
        &self,
        domain: &str,
        record: &str,
        record_type: RecordType,
    ) -> Result<Value> {
        let url = format!(
            "{}/domains/{}/dns-records?search={}",
            ARVAN_API_BASE, domain, record
        );
        let listing = self
            .get_json(&url, &format!("record lookup for {}.{}", record, domain))
            .await?;

        // Arvan reports record types in lowercase ("a" / "aaaa")
        let wanted_type = record_type.as_str().to_lowercase();

        let records = listing["data"]
            .as_array()
            .ok_or_else(|| Error::provider("arvan", "Invalid response format: data is not an array"))?;

        records
            .iter()
            .find(|r| {
                r["name"].as_str() == Some(record)
                    && r["type"].as_str() == Some(wanted_type.as_str())
            })
            .cloned()
            .ok_or_else(|| {
                Error::not_found(format!(
                    "DNS record not found: {}.{} (type: {})",
                    record, domain, record_type
                ))
            })
    }

    /// Current address carried by a record entry, if parseable.
    /// A/AAAA values are arrays of `{"ip": ...}` objects.
    fn record_ip(entry: &Value) -> Option<IpAddr> {
        entry["value"]
            .as_array()?
            .first()?
            .get("ip")?
            .as_str()?
            .parse()
            .ok()
    }
}

#[async_trait]
impl DnsProvider for ArvanProvider {
    /// Check that the domain exists under this ArvanCloud account
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /domains/:domain
    /// Authorization: Apikey <key>
    /// ```
    async fn validate_domain(&self, domain: &str) -> Result<()> {
        let url = format!("{}/domains/{}", ARVAN_API_BASE, domain);
        self.get_json(&url, &format!("domain validation for {}", domain))
            .await?;

        tracing::debug!(domain, "domain known to ArvanCloud");
        Ok(())
    }

    /// Update one address record with a new IP
    ///
    /// Finds the record id by name and type, short-circuits when the record
    /// already carries the address, otherwise PUTs the new value.
    ///
    /// # API Calls
    ///
    /// ```http
    /// GET /domains/:domain/dns-records?search=:record
    ///
    /// PUT /domains/:domain/dns-records/:id
    /// { "name": ..., "type": "a" | "aaaa", "value": [{ "ip": ... }], "ttl": ... }
    /// ```
    async fn update_record(
        &self,
        domain: &str,
        record: &str,
        record_type: RecordType,
        new_ip: IpAddr,
    ) -> Result<()> {
        tracing::info!(
            domain,
            record,
            %record_type,
            ip = %new_ip,
            "updating ArvanCloud DNS record"
        );

        let entry = self.find_record(domain, record, record_type).await?;

        if Self::record_ip(&entry) == Some(new_ip) {
            tracing::info!(record, ip = %new_ip, "record already has correct address");
            return Ok(());
        }

        let record_id = entry["id"]
            .as_str()
            .ok_or_else(|| Error::provider("arvan", "Invalid response format: record id is not a string"))?;
        let ttl = entry["ttl"].as_u64().unwrap_or(DEFAULT_TTL);

        let payload = json!({
            "name": record,
            "type": record_type.as_str().to_lowercase(),
            "value": [{ "ip": new_ip.to_string() }],
            "ttl": ttl,
        });

        let url = format!(
            "{}/domains/{}/dns-records/{}",
            ARVAN_API_BASE, domain, record_id
        );
        let response = self
            .client
            .put(&url)
            .header("Authorization", self.auth_header())
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(
                status,
                &format!("record update for {}.{}", record, domain),
                &body,
            ));
        }

        tracing::info!(record, ip = %new_ip, "DNS record updated");
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "arvan"
    }
}

/// Factory for creating ArvanCloud providers
pub struct ArvanFactory;

impl DnsProviderFactory for ArvanFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Arvan { api_key } => {
                Ok(Box::new(ArvanProvider::new(api_key.clone())?))
            }
            _ => Err(Error::config("Invalid config for ArvanCloud provider")),
        }
    }
}

/// Register the ArvanCloud provider with a registry
///
/// # Example
///
/// ```rust
/// use dynip_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// dynip_provider_arvan::register(&registry);
/// ```
pub fn register(registry: &dynip_core::ProviderRegistry) {
    registry.register_provider("arvan", Box::new(ArvanFactory));
}
