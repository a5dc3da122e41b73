use crate::config::GeoConfig;
use crate::storage::visits::UNKNOWN;
use moka::sync::Cache;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

/// Outcome of a geolocation lookup. Lookups never fail; they fall back to `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoLocation {
    Located { country: String, city: String },
    Unknown,
}

impl GeoLocation {
    /// Country and city, with `Unknown` filled in for anything missing.
    pub fn into_parts(self) -> (String, String) {
        match self {
            GeoLocation::Located { country, city } => (country, city),
            GeoLocation::Unknown => (UNKNOWN.to_string(), UNKNOWN.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum GeoLookupError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("provider rejected lookup: {0}")]
    Rejected(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// ip-api.com response body.
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    city: Option<String>,
}

/// Best-effort IP geolocation client with a per-address memo of located results.
pub struct GeoClient {
    client: reqwest::Client,
    base_url: String,
    enabled: bool,
    located: Cache<String, (String, String)>,
}

impl GeoClient {
    pub fn new(config: &GeoConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            enabled: config.enabled,
            located: Cache::builder()
                .time_to_live(Duration::from_secs(3600))
                .max_capacity(10_000)
                .build(),
        })
    }

    /// Resolve an address to a country and city. Loopback addresses are never
    /// sent upstream; any failure is logged and yields `Unknown`.
    pub async fn lookup(&self, ip: &str) -> GeoLocation {
        if !self.enabled || is_loopback(ip) {
            return GeoLocation::Unknown;
        }

        if let Some((country, city)) = self.located.get(ip) {
            return GeoLocation::Located { country, city };
        }

        match self.fetch(ip).await {
            Ok(location) => {
                if let GeoLocation::Located { ref country, ref city } = location {
                    self.located
                        .insert(ip.to_string(), (country.clone(), city.clone()));
                }
                location
            }
            Err(e) => {
                tracing::warn!(ip = ip, error = %e, "geolocation lookup failed");
                GeoLocation::Unknown
            }
        }
    }

    async fn fetch(&self, ip: &str) -> Result<GeoLocation, GeoLookupError> {
        let mut url = url::Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(["json", ip]);

        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(GeoLookupError::Status(resp.status()));
        }

        let body: IpApiResponse = resp.json().await?;
        if body.status != "success" {
            return Err(GeoLookupError::Rejected(
                body.message.unwrap_or_else(|| body.status.clone()),
            ));
        }

        Ok(GeoLocation::Located {
            country: non_empty_or_unknown(body.country),
            city: non_empty_or_unknown(body.city),
        })
    }
}

fn non_empty_or_unknown(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Whether the address refers to the local machine.
pub fn is_loopback(ip: &str) -> bool {
    let ip = ip.trim();
    if ip.eq_ignore_ascii_case("localhost") {
        return true;
    }
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4.is_loopback(),
        Ok(IpAddr::V6(v6)) => {
            v6.is_loopback() || v6.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback())
        }
        Err(_) => false,
    }
}
