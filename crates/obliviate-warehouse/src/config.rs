use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STORE_DIR: &str = "./buffer/stocks";

/// Everything a run needs to know before the first call is made.
#[derive(Clone, Debug)]
pub struct Config {
    /// `FMP_API_KEY`, substituted into every request path.
    pub api_key: String,
    /// `FMP_API_URL`, e.g. `https://financialmodelingprep.com/api/`.
    pub base_url: String,
    /// `USER_AGENT`
    pub user_agent: String,
    /// `FMP_TIMEOUT_SECS`; bound on a single call.
    pub timeout_secs: u64,
    /// `STORE_DIR`; where the file store keeps one document per symbol.
    pub store_dir: PathBuf,
}

impl Config {
    /// Read the configuration from the environment (and `.env`, if present).
    ///
    /// Fails fast when the API key or base URL is missing, so that no batch is ever
    /// started against a provider it cannot reach.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(|key| dotenv::var(key).ok())
    }

    /// Build the configuration from any variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            match var(key) {
                Some(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
                Some(_) => Err(anyhow!("environment variable is empty: {key}")),
                None => Err(anyhow!("missing environment variable: {key}")),
            }
        };

        Ok(Self {
            api_key: required("FMP_API_KEY")?,
            base_url: required("FMP_API_URL")?,
            user_agent: var("USER_AGENT")
                .unwrap_or_else(|| format!("obliviate/{}", env!("CARGO_PKG_VERSION"))),
            timeout_secs: parse_or(var("FMP_TIMEOUT_SECS"), DEFAULT_TIMEOUT_SECS),
            store_dir: Self::store_dir_from_vars(&var),
        })
    }

    /// Only the store directory; commands that never call the provider need no key.
    pub fn store_dir_from_env() -> PathBuf {
        dotenv::dotenv().ok();
        Self::store_dir_from_vars(&|key: &str| dotenv::var(key).ok())
    }

    pub fn store_dir_from_vars<F>(var: &F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        var("STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// unparsable values fall back to the default
fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
