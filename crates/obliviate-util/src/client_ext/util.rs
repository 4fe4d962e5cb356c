use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tracing::trace;

/// Build the long-lived [`reqwest::Client`] shared by every call of a run.
///
/// Every request carries a JSON `Content-Type` and is bounded by `timeout`; a call
/// that overruns it fails like any other transport error.
///
/// [`reqwest::Client`]: https://docs.rs/reqwest/latest/reqwest/struct.Client.html
pub fn build_client(user_agent: &str, timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let client = reqwest::ClientBuilder::new()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

pub trait ClientUtilExt {
    /// GET `url` and return the body as text, but only for a successful status.
    fn get_text(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

impl ClientUtilExt for Client {
    async fn get_text(&self, url: &str) -> Result<String> {
        // urls carry api keys, so they are stripped from any error
        let response = self.get(url).send().await.map_err(|e| e.without_url())?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("unsuccessful response status: {status}"));
        }

        let body = response.text().await.map_err(|e| e.without_url())?;
        trace!("received {} bytes", body.len());
        Ok(body)
    }
}
