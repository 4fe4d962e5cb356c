use crate::config::Config;
use crate::schema::stock::endpoints::redact;
use anyhow::Result;
use async_trait::async_trait;
use obliviate_util::{build_client, Util};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use tracing::{trace, warn};

/// API to the market-data provider; how is the data **extracted**?
///
/// Every call is allowed to fail. A failed call (transport error, timeout, unsuccessful
/// status, or a body of the wrong shape) is reported as `None`, so that the caller can drop
/// that endpoint's contribution and carry on with the rest.
#[async_trait]
pub trait Http: Send + Sync {
    /// GET `path`, relative to the provider's base URL, returning the raw body.
    async fn get(&self, path: &str) -> Option<String>;

    /// Pre-defined `get()` for when `serde::Deserialize` describes the shape of the response.
    async fn fetch_de<D>(&self, path: &str) -> Option<D>
    where
        D: DeserializeOwned + Send,
    {
        let body = self.get(path).await?;
        match serde_json::from_str::<D>(&body) {
            Ok(de) => Some(de),
            Err(e) => {
                warn!("failed deserializing {}: {e}", redact(path));
                None
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Financial Modeling Prep
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// One long-lived HTTP client, bound to the provider's base URL for the lifetime of a run.
#[derive(Clone, Debug)]
pub struct FmpClient {
    http_client: HttpClient,
    base_url: String,
}

impl FmpClient {
    pub fn new(http_client: HttpClient, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let http_client = build_client(&config.user_agent, config.timeout())?;
        Ok(Self::new(http_client, &config.base_url))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Http for FmpClient {
    async fn get(&self, path: &str) -> Option<String> {
        trace!("GET {}", redact(path));
        match self.http_client.get_text(&self.url(path)).await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("call failed for {}: {e}", redact(path));
                None
            }
        }
    }
}
