//! Cloud platform detection through instance metadata endpoints
//!
//! Both endpoints are link-local and answer quickly on their own cloud.
//! Anywhere else the request fails or times out, which simply means
//! "not this platform".

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use autoshutdown_host_api::{HostError, HostResult, PlatformDetector, PlatformKind};

pub const GCE_METADATA_URL: &str = "http://metadata.google.internal/computeMetadata/v1";
pub const AZURE_METADATA_URL: &str =
    "http://169.254.169.254/metadata/instance?api-version=2021-01-01";

const GCE_FLAVOR_HEADER: &str = "Metadata-Flavor";
const GCE_FLAVOR_VALUE: &str = "Google";
const AZURE_METADATA_HEADER: &str = "Metadata";

/// Probes the GCE and Azure metadata services
pub struct MetadataDetector {
    client: Client,
    gce_url: String,
    azure_url: String,
}

impl MetadataDetector {
    pub fn new(timeout: Duration) -> HostResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| HostError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            gce_url: GCE_METADATA_URL.to_string(),
            azure_url: AZURE_METADATA_URL.to_string(),
        })
    }

    /// Point the probes at other endpoints
    pub fn with_urls(mut self, gce_url: impl Into<String>, azure_url: impl Into<String>) -> Self {
        self.gce_url = gce_url.into();
        self.azure_url = azure_url.into();
        self
    }

    async fn probe_gce(&self) -> bool {
        match self
            .client
            .get(&self.gce_url)
            .header(GCE_FLAVOR_HEADER, GCE_FLAVOR_VALUE)
            .send()
            .await
        {
            Ok(response) => {
                let flavor = response
                    .headers()
                    .get(GCE_FLAVOR_HEADER)
                    .and_then(|v| v.to_str().ok());
                let found = is_gce_flavor(flavor);
                debug!(status = %response.status(), found, "GCE metadata probe complete");
                found
            }
            Err(e) => {
                debug!(error = %e, "GCE metadata probe failed");
                false
            }
        }
    }

    async fn probe_azure(&self) -> bool {
        match self
            .client
            .get(&self.azure_url)
            .header(AZURE_METADATA_HEADER, "true")
            .send()
            .await
        {
            Ok(response) => {
                let found = is_azure_status(response.status().as_u16());
                debug!(status = %response.status(), found, "Azure metadata probe complete");
                found
            }
            Err(e) => {
                debug!(error = %e, "Azure metadata probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl PlatformDetector for MetadataDetector {
    async fn detect(&self) -> PlatformKind {
        let (gce, azure) = tokio::join!(self.probe_gce(), self.probe_azure());
        let platform = classify(gce, azure);
        info!(platform = %platform, "Detected platform");
        platform
    }
}

/// GCE identifies itself by echoing the flavor header
pub fn is_gce_flavor(header: Option<&str>) -> bool {
    header == Some(GCE_FLAVOR_VALUE)
}

pub fn is_azure_status(status: u16) -> bool {
    status == 200
}

/// Combine probe results. GCE wins if both answer.
pub fn classify(gce: bool, azure: bool) -> PlatformKind {
    if gce {
        PlatformKind::Gce
    } else if azure {
        PlatformKind::Azure
    } else {
        PlatformKind::Generic
    }
}
