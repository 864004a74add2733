//! IP geolocation client.

use async_trait::async_trait;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use telemetry::{health, metrics};
use tracing::{debug, warn};
use tracker_core::{normalize_ip, Error, GeoLocation, Result, UNKNOWN};

use crate::config::GeoConfig;

/// Resolves a network address to a coarse location.
#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn locate(&self, ip: IpAddr) -> Result<GeoLocation>;
}

/// Addresses that can never be geolocated.
pub fn is_non_routable(ip: IpAddr) -> bool {
    match normalize_ip(ip) {
        IpAddr::V4(v4) => {
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local, fe80::/10 link local
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    region_name: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    isp: Option<String>,
}

impl IpApiResponse {
    fn into_location(self) -> Result<GeoLocation> {
        if self.status != "success" {
            return Err(Error::geolocation(format!(
                "Lookup failed: {}",
                self.message.unwrap_or_else(|| self.status.clone())
            )));
        }

        let or_unknown = |v: Option<String>| v.filter(|s| !s.is_empty()).unwrap_or_else(|| UNKNOWN.to_string());
        Ok(GeoLocation {
            city: or_unknown(self.city),
            region: or_unknown(self.region_name),
            country: or_unknown(self.country),
            isp: or_unknown(self.isp),
        })
    }
}

/// ip-api.com client.
#[derive(Clone)]
pub struct IpApiClient {
    config: GeoConfig,
    http_client: reqwest::Client,
}

impl IpApiClient {
    pub fn new(config: GeoConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    async fn fetch(&self, ip: IpAddr) -> Result<GeoLocation> {
        let url = format!(
            "{}/{}?fields=status,message,country,regionName,city,isp",
            self.config.base_url.trim_end_matches('/'),
            ip
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::geolocation(format!("Geolocation request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::geolocation(format!(
                "Geolocation provider returned {}",
                response.status()
            )));
        }

        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| Error::geolocation(format!("Invalid geolocation response: {}", e)))?;

        body.into_location()
    }
}

#[async_trait]
impl GeoLocator for IpApiClient {
    async fn locate(&self, ip: IpAddr) -> Result<GeoLocation> {
        if !self.config.enabled || is_non_routable(ip) {
            return Ok(GeoLocation::unknown());
        }

        let start = Instant::now();
        let result = self.fetch(normalize_ip(ip)).await;
        metrics()
            .geolocation_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        match &result {
            Ok(geo) => {
                health().geolocation.set_healthy();
                debug!(ip = %ip, location = %geo.display(), "Resolved visitor location");
            }
            Err(e) => {
                metrics().geolocation_errors.inc();
                health().geolocation.set_unhealthy(e.to_string());
                warn!(ip = %ip, error = %e, "Geolocation lookup failed");
            }
        }

        result
    }
}
