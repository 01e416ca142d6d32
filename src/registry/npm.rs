//! npm registry checker for verifying package existence.

use crate::config::AnalysisConfig;
use crate::types::{RegistryVerdict, Result};
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// npm registry API response for package info.
#[derive(Debug, Deserialize)]
struct NpmPackageInfo {
    #[serde(rename = "dist-tags")]
    dist_tags: Option<DistTags>,
    versions: Option<BTreeMap<String, IgnoredAny>>,
}

#[derive(Debug, Deserialize)]
struct DistTags {
    latest: Option<String>,
}

impl NpmPackageInfo {
    /// `dist-tags.latest`, else the lexicographically last published version.
    fn latest_version(self) -> Option<String> {
        self.dist_tags
            .and_then(|tags| tags.latest)
            .filter(|latest| !latest.is_empty())
            .or_else(|| {
                self.versions
                    .and_then(|versions| versions.into_keys().next_back())
            })
    }
}

/// Checker for verifying packages against npm registry.
pub struct NpmChecker {
    client: Client,
    rate_limiter: Arc<RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>>,
    registry_url: String,
    max_retries: u32,
}

impl NpmChecker {
    /// Create a new npm checker.
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http.timeout)
            .user_agent(&config.http.user_agent)
            .http1_only()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        let quota = Quota::per_second(NonZeroU32::new(config.rate_limit).unwrap_or(NonZeroU32::MIN));
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            client,
            rate_limiter,
            registry_url: config.registry_url.clone(),
            max_retries: config.http.max_retries,
        })
    }

    /// Check if a package exists on npm.
    ///
    /// Only uncertain answers are retried; 200 and 404 are final.
    pub async fn check_package(&self, package_name: &str) -> RegistryVerdict {
        let mut attempt = 0;
        loop {
            self.rate_limiter.until_ready().await;

            let verdict = self.do_check(package_name).await;
            if !verdict.is_uncertain() || attempt >= self.max_retries {
                if let RegistryVerdict::Uncertain { ref reason, .. } = verdict {
                    warn!("Registry lookup for {} uncertain ({}), treating as present", package_name, reason);
                }
                return verdict;
            }

            attempt += 1;
            trace!("Retry {} for {}", attempt, package_name);
            tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
        }
    }

    /// Perform a single registry lookup.
    async fn do_check(&self, package_name: &str) -> RegistryVerdict {
        let url = format!("{}{}", self.registry_url, package_name);
        trace!("Checking npm: {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                return RegistryVerdict::Uncertain {
                    name: package_name.to_string(),
                    reason: e.to_string(),
                }
            }
        };

        match response.status() {
            StatusCode::OK => {
                let latest_version = match response.json::<NpmPackageInfo>().await {
                    Ok(info) => info.latest_version(),
                    Err(e) => {
                        debug!("Failed to parse npm response for {}: {}", package_name, e);
                        None
                    }
                };
                debug!("Package exists: {} (latest {:?})", package_name, latest_version);
                RegistryVerdict::Exists {
                    name: package_name.to_string(),
                    latest_version,
                }
            }
            StatusCode::NOT_FOUND => {
                // Package doesn't exist - potential vulnerability
                debug!("Package NOT FOUND: {}", package_name);
                RegistryVerdict::NotFound {
                    name: package_name.to_string(),
                }
            }
            status => RegistryVerdict::Uncertain {
                name: package_name.to_string(),
                reason: format!("HTTP {}", status),
            },
        }
    }
}
