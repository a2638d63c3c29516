//! Minimal Consul HTTP API client: health queries, sessions and KV locks.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use url::Url;

use crate::error::ConsulError;
use targetsync_types::{ConsulConfig, Target};

const INDEX_HEADER: &str = "X-Consul-Index";
const TOKEN_HEADER: &str = "X-Consul-Token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceEntry {
    pub node: NodeInfo,
    pub service: ServiceInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeInfo {
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceInfo {
    #[serde(default)]
    pub address: String,
    pub port: u16,
}

impl ServiceEntry {
    /// Service address, or the node address when the service registered none.
    pub fn target(&self) -> Target {
        let address = if self.service.address.is_empty() {
            &self.node.address
        } else {
            &self.service.address
        };
        Target::new(address.clone(), self.service.port)
    }
}

#[derive(Debug, Deserialize)]
struct SessionCreated {
    #[serde(rename = "ID")]
    id: String,
}

#[derive(Debug, Clone)]
pub struct ConsulClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl ConsulClient {
    pub fn new(config: &ConsulConfig) -> Result<Self, ConsulError> {
        let base = Url::parse(&config.address)?;
        if base.cannot_be_a_base() {
            return Err(ConsulError::InvalidAddress(config.address.clone()));
        }
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, base, token: config.token.clone() })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Blocking query for passing instances of `service`.
    ///
    /// Returns once the catalog index moves past `index` or `wait` elapses,
    /// together with the new `X-Consul-Index`.
    pub async fn health_service(
        &self,
        service: &str,
        tag: Option<&str>,
        index: u64,
        wait: Duration,
    ) -> Result<(Vec<ServiceEntry>, u64), ConsulError> {
        let url = self.endpoint(["v1", "health", "service", service])?;
        let mut query: Vec<(&str, String)> = vec![("passing", "true".to_string())];
        if index > 0 {
            query.push(("index", index.to_string()));
            query.push(("wait", format!("{}s", wait.as_secs())));
        }
        if let Some(tag) = tag {
            query.push(("tag", tag.to_string()));
        }

        // Consul adds up to wait/16 of jitter to blocking queries
        let timeout = wait + wait / 16 + REQUEST_TIMEOUT;
        let resp = self.execute(self.http.get(url).query(&query).timeout(timeout)).await?;

        let new_index = resp
            .headers()
            .get(INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| ConsulError::InvalidResponse(format!("missing {}", INDEX_HEADER)))?;
        let entries = resp
            .json::<Vec<ServiceEntry>>()
            .await
            .map_err(|e| ConsulError::InvalidResponse(e.to_string()))?;
        Ok((entries, new_index))
    }

    /// Create a session that releases its locks when invalidated.
    pub async fn create_session(&self, name: &str, ttl: Duration) -> Result<String, ConsulError> {
        let url = self.endpoint(["v1", "session", "create"])?;
        let body = json!({
            "Name": name,
            "TTL": format!("{}s", ttl.as_secs()),
            "Behavior": "release",
        });
        let resp = self.execute(self.http.put(url).json(&body)).await?;
        let created = resp
            .json::<SessionCreated>()
            .await
            .map_err(|e| ConsulError::InvalidResponse(e.to_string()))?;
        Ok(created.id)
    }

    /// Renew a session. `Ok(false)` means Consul no longer knows it.
    pub async fn renew_session(&self, session: &str) -> Result<bool, ConsulError> {
        let url = self.endpoint(["v1", "session", "renew", session])?;
        match self.execute(self.http.put(url)).await {
            Ok(_) => Ok(true),
            Err(ConsulError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(false)
            },
            Err(e) => Err(e),
        }
    }

    pub async fn destroy_session(&self, session: &str) -> Result<(), ConsulError> {
        let url = self.endpoint(["v1", "session", "destroy", session])?;
        self.execute(self.http.put(url)).await?;
        Ok(())
    }

    /// Try to take `key` for `session`. Idempotent for the current holder.
    pub async fn acquire(&self, key: &str, session: &str) -> Result<bool, ConsulError> {
        self.kv_lock_op(key, "acquire", session).await
    }

    pub async fn release(&self, key: &str, session: &str) -> Result<bool, ConsulError> {
        self.kv_lock_op(key, "release", session).await
    }

    async fn kv_lock_op(&self, key: &str, op: &str, session: &str) -> Result<bool, ConsulError> {
        let mut url = self.endpoint(["v1", "kv"])?;
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(key.split('/').filter(|s| !s.is_empty()));
        }
        let resp = self.execute(self.http.put(url).query(&[(op, session)])).await?;
        resp.json::<bool>()
            .await
            .map_err(|e| ConsulError::InvalidResponse(e.to_string()))
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, ConsulError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ConsulError::InvalidAddress(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute(&self, req: RequestBuilder) -> Result<Response, ConsulError> {
        let req = match &self.token {
            Some(token) => req.header(TOKEN_HEADER, token),
            None => req,
        };
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ConsulError::Status { status: status.as_u16(), message });
        }
        Ok(resp)
    }
}
