use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::config::Config;
use crate::repo::{ApiRequest, Method, RemoteTaskRepo, RepoError, Transport};

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// [`Transport`] over HTTP with optional bearer-token auth
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, RepoError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RepoError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Option<Value>, RepoError> {
        let url = self.url(&request.path);
        let mut builder = self.client.request(request.method.into(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        log::debug!("{} {}", request.method.as_str(), url);
        let response = builder.send().await.map_err(|e| {
            log::warn!("[api] {} {} -> no response: {}", request.method.as_str(), url, e);
            RepoError::Network(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RepoError::Network(e.to_string()))?;

        if !status.is_success() {
            log::warn!("[api] {} {} -> {} {}", request.method.as_str(), url, status.as_u16(), text);
            return Err(RepoError::Remote {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| RepoError::Decode(format!("{} {}: {}", request.method.as_str(), url, e)))
    }
}

/// The task service as configured
pub fn connect(config: &Config) -> Result<RemoteTaskRepo<HttpTransport>, RepoError> {
    Ok(RemoteTaskRepo::new(HttpTransport::new(config)?))
}
