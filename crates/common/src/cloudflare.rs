use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::CloudflareConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::kv::KvStore;
use crate::model::{ModelOutput, ModelRequest, TextModel};

#[derive(Deserialize)]
struct ApiEnvelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct ResultInfo {
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Deserialize)]
struct KeyName {
    name: String,
}

impl<T> ApiEnvelope<T> {
    fn error_text(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{} ({})", e.message, e.code))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Authenticated client for the platform's REST API.
#[derive(Clone)]
pub struct CloudflareClient {
    client: Client,
    account_url: String,
    api_token: String,
}

impl CloudflareClient {
    pub fn new(config: &CloudflareConfig) -> Self {
        Self {
            client: Client::new(),
            account_url: format!(
                "{}/accounts/{}",
                config.api_base.trim_end_matches('/'),
                config.account_id
            ),
            api_token: config.api_token.clone(),
        }
    }

    pub fn kv(&self, namespace_id: &str) -> CloudflareKv {
        CloudflareKv {
            api: self.clone(),
            namespace_url: format!("{}/storage/kv/namespaces/{}", self.account_url, namespace_id),
        }
    }

    pub fn workers_ai(&self) -> WorkersAiClient {
        WorkersAiClient { api: self.clone() }
    }

    fn url(&self, base: &str, segments: &[&str]) -> ServiceResult<Url> {
        let mut url = Url::parse(base)
            .map_err(|e| ServiceError::Storage(format!("Invalid API url {}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| ServiceError::Storage(format!("API url {} cannot take a path", base)))?
            .extend(segments);
        Ok(url)
    }

    async fn fail(response: Response, what: &str) -> ServiceError {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        ServiceError::Storage(format!("{} failed ({}): {}", what, status, error_text))
    }
}

/// KV namespace accessed over REST.
#[derive(Clone)]
pub struct CloudflareKv {
    api: CloudflareClient,
    namespace_url: String,
}

#[async_trait]
impl KvStore for CloudflareKv {
    async fn get(&self, key: &str) -> ServiceResult<Option<String>> {
        let url = self.api.url(&self.namespace_url, &["values", key])?;
        debug!("KV get {}", key);

        let response = self
            .api
            .client
            .get(url)
            .bearer_auth(&self.api.api_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.text().await?)),
            _ => Err(CloudflareClient::fail(response, &format!("KV get {}", key)).await),
        }
    }

    async fn put(&self, key: &str, value: &str) -> ServiceResult<()> {
        let url = self.api.url(&self.namespace_url, &["values", key])?;
        info!("Writing KV entry {} ({} bytes)", key, value.len());

        let response = self
            .api
            .client
            .put(url)
            .bearer_auth(&self.api.api_token)
            .header("Content-Type", "text/plain")
            .body(value.to_string())
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CloudflareClient::fail(response, &format!("KV put {}", key)).await)
        }
    }

    async fn list(&self, prefix: &str) -> ServiceResult<Vec<String>> {
        let url = self.api.url(&self.namespace_url, &["keys"])?;
        let mut names = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self
                .api
                .client
                .get(url.clone())
                .bearer_auth(&self.api.api_token)
                .query(&[("prefix", prefix)]);
            if let Some(c) = &cursor {
                request = request.query(&[("cursor", c.as_str())]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(CloudflareClient::fail(response, "KV list").await);
            }

            let page: ApiEnvelope<Vec<KeyName>> = response.json().await?;
            if !page.success {
                return Err(ServiceError::Storage(format!("KV list rejected: {}", page.error_text())));
            }
            names.extend(page.result.unwrap_or_default().into_iter().map(|k| k.name));

            cursor = page
                .result_info
                .and_then(|info| info.cursor)
                .filter(|c| !c.is_empty());
            if cursor.is_none() {
                break;
            }
        }

        debug!("KV list {} -> {} keys", prefix, names.len());
        Ok(names)
    }
}

/// Text generation through the platform's hosted model runtime.
#[derive(Clone)]
pub struct WorkersAiClient {
    api: CloudflareClient,
}

#[async_trait]
impl TextModel for WorkersAiClient {
    async fn run(&self, model_id: &str, request: &ModelRequest) -> ServiceResult<ModelOutput> {
        // Model ids contain slashes ("@cf/meta/...") that belong in the path verbatim.
        let url = format!("{}/ai/run/{}", self.api.account_url, model_id.trim_start_matches('/'));
        info!("Running model {} (max_tokens={})", model_id, request.max_tokens);

        let response = self
            .api
            .client
            .post(&url)
            .bearer_auth(&self.api.api_token)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ServiceError::Model(format!("Request failed: {} - {}", status, text)));
        }

        let envelope: ApiEnvelope<ModelOutput> = response.json().await?;
        if !envelope.success {
            return Err(ServiceError::Model(envelope.error_text()));
        }
        Ok(envelope.result.unwrap_or_default())
    }
}
