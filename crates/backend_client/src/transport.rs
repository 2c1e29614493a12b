//! Thin reqwest wrapper shared by the backend adapters.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{BackendError, Result};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub type Query<'a> = [(&'a str, String)];

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|e| BackendError::InvalidConfig(format!("base url {base_url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BackendError::InvalidConfig(format!(
                "base url {base_url:?} must start with http:// or https://"
            )));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::InvalidConfig(format!("http client: {e}")))?;

        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &Query<'_>) -> Result<T> {
        let endpoint = self.endpoint(path);
        let response = self
            .send(self.http.get(&endpoint).query(query), &endpoint)
            .await?;
        decode_json(response, &endpoint).await
    }

    pub async fn get_bytes(&self, path: &str, query: &Query<'_>) -> Result<Vec<u8>> {
        let endpoint = self.endpoint(path);
        let response = self
            .send(self.http.get(&endpoint).query(query), &endpoint)
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| BackendError::transport(&endpoint, source))?;
        Ok(bytes.to_vec())
    }

    /// GET whose response body carries nothing we need.
    pub async fn get(&self, path: &str) -> Result<()> {
        let endpoint = self.endpoint(path);
        self.send(self.http.get(&endpoint), &endpoint).await?;
        Ok(())
    }

    pub async fn post(&self, path: &str, query: &Query<'_>) -> Result<()> {
        let endpoint = self.endpoint(path);
        self.send(self.http.post(&endpoint).query(query), &endpoint)
            .await?;
        Ok(())
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let endpoint = self.endpoint(path);
        let response = self
            .send(self.http.post(&endpoint).json(body), &endpoint)
            .await?;
        decode_json(response, &endpoint).await
    }

    pub async fn post_json_ignore<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let endpoint = self.endpoint(path);
        self.send(self.http.post(&endpoint).json(body), &endpoint)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str, query: &Query<'_>) -> Result<()> {
        let endpoint = self.endpoint(path);
        self.send(self.http.delete(&endpoint).query(query), &endpoint)
            .await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<Response> {
        debug!(endpoint, "backend request");
        let response = request.send().await.map_err(|source| {
            warn!(endpoint, error = %source, "backend request failed");
            BackendError::transport(endpoint, source)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint, %status, "backend rejected request");
            return Err(BackendError::unexpected(
                endpoint,
                format!("HTTP {status}: {}", body.trim()),
            ));
        }
        Ok(response)
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|source| BackendError::transport(endpoint, source))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        warn!(endpoint, error = %e, "backend payload did not match expected shape");
        BackendError::unexpected(endpoint, format!("invalid payload: {e}"))
    })
}
