use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

use super::SchemeSource;
use super::error::NetworkError;
use super::types::{Scheme, SchemeDetail};
use crate::config::Config;

const SCHEMES_PATH: &str = "mf";

#[derive(Debug, Clone)]
pub struct MfApiClient {
    http_client: ClientWithMiddleware,
    base_url: Url, // Always ends with '/', so relative joins keep any path prefix
}

impl MfApiClient {
    pub fn new(config: &Config) -> eyre::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let reqwest_client = builder.build()?;

        let mut client_builder = ClientBuilder::new(reqwest_client);
        if config.max_retries > 0 {
            let retry_policy = ExponentialBackoff::builder()
                .retry_bounds(Duration::from_millis(500), Duration::from_millis(1000))
                .build_with_max_retries(config.max_retries);
            client_builder = client_builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
        }

        info!(
            base_url = %config.api_base_url,
            timeout = ?config.http_timeout,
            max_retries = config.max_retries,
            "mfapi client initialized"
        );

        Ok(Self {
            http_client: client_builder.build(),
            base_url: config.api_base_url.clone(),
        })
    }

    /// Fetch the whole scheme catalog in one response.
    #[instrument(skip(self))]
    pub async fn list_schemes(&self) -> Result<Vec<Scheme>, NetworkError> {
        let schemes: Vec<Scheme> = self.get_json(SCHEMES_PATH).await?;
        info!(scheme_count = schemes.len(), "Fetched scheme list from mfapi");
        Ok(schemes)
    }

    #[instrument(skip(self))]
    pub async fn get_scheme_detail(&self, scheme_code: u32) -> Result<SchemeDetail, NetworkError> {
        let detail: SchemeDetail = self.get_json(&format!("{}/{}", SCHEMES_PATH, scheme_code)).await?;
        info!(
            scheme_code,
            scheme_name = %detail.meta.scheme_name,
            nav_points = detail.data.len(),
            "Fetched scheme detail from mfapi"
        );
        Ok(detail)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, NetworkError> {
        let url = self.base_url.join(path)?;
        let url_str = url.to_string();
        debug!(url = %url_str, "Sending request to mfapi");

        let response = self.http_client.get(url).send().await.map_err(|source| NetworkError::Transport {
            url: url_str.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status { url: url_str, status });
        }

        let body = response.bytes().await.map_err(|source| NetworkError::Body {
            url: url_str.clone(),
            source,
        })?;
        debug!(url = %url_str, bytes = body.len(), "Received response from mfapi");

        serde_json::from_slice(&body).map_err(|source| NetworkError::Decode { url: url_str, source })
    }
}

#[async_trait]
impl SchemeSource for MfApiClient {
    async fn list_schemes(&self) -> Result<Vec<Scheme>, NetworkError> {
        MfApiClient::list_schemes(self).await
    }

    async fn get_scheme_detail(&self, scheme_code: u32) -> Result<SchemeDetail, NetworkError> {
        MfApiClient::get_scheme_detail(self, scheme_code).await
    }
}
