// HTTP transport for the /responses endpoint (HTTP direct, no SDK)

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::request::ResponseRequest;
use crate::response::Response;
use crate::stream::ResponseStream;

/// Client surface for OpenAI-compatible Responses endpoints
///
/// Stateless by design: every call carries its full input, and the client
/// keeps no mutable state between calls, so one instance can serve
/// concurrent requests freely.
#[async_trait]
pub trait ResponseProvider: Send + Sync {
    /// One request, one complete response
    async fn respond(&self, request: ResponseRequest) -> Result<Response>;

    /// One request, a live event stream
    async fn respond_stream(&self, request: ResponseRequest) -> Result<ResponseStream>;
}

/// HTTP client for the /responses endpoint
pub struct Responder {
    http_client: reqwest::Client,
    base_url: String,
}

impl Responder {
    /// Create a client with an API key and default configuration
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(Config::new(api_key))
    }

    /// Create a client reading the API key from the environment
    pub fn from_env() -> Result<Self> {
        Self::with_config(Config::from_env()?)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|_| Error::InvalidRequest("Invalid API key format".to_string()))?,
        );
        if let Some(ref referer) = config.referer {
            headers.insert(
                "HTTP-Referer",
                HeaderValue::from_str(referer)
                    .map_err(|_| Error::InvalidRequest("Invalid referer header".to_string()))?,
            );
        }
        if let Some(ref title) = config.title {
            headers.insert(
                "X-Title",
                HeaderValue::from_str(title)
                    .map_err(|_| Error::InvalidRequest("Invalid title header".to_string()))?,
            );
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url().to_string(),
        })
    }

    /// Build the request payload
    fn build_payload(&self, request: &ResponseRequest, stream: bool) -> Result<Value> {
        let mut payload = serde_json::json!({
            "model": request.model,
            "input": request.input,
            "stream": stream,
        });

        let obj = payload.as_object_mut().unwrap();

        if let Some(ref instructions) = request.instructions {
            obj.insert("instructions".to_string(), serde_json::json!(instructions));
        }
        if let Some(max_tokens) = request.max_output_tokens {
            obj.insert(
                "max_output_tokens".to_string(),
                serde_json::json!(max_tokens),
            );
        }
        if let Some(temp) = request.temperature {
            obj.insert("temperature".to_string(), serde_json::json!(temp));
        }
        if let Some(tools) = &request.tools {
            obj.insert("tools".to_string(), serde_json::to_value(tools)?);
        }
        if let Some(tool_choice) = &request.tool_choice {
            obj.insert("tool_choice".to_string(), serde_json::to_value(tool_choice)?);
        }
        if let Some(reasoning) = &request.reasoning {
            obj.insert("reasoning".to_string(), serde_json::to_value(reasoning)?);
        }
        if let Some(plugins) = &request.plugins {
            obj.insert("plugins".to_string(), serde_json::to_value(plugins)?);
        }
        if let Some(text) = &request.text {
            obj.insert("text".to_string(), serde_json::to_value(text)?);
        }

        Ok(payload)
    }

    /// POST the payload; non-2xx becomes `Error::Http` with the raw body
    async fn post(&self, payload: &Value) -> Result<reqwest::Response> {
        let url = format!("{}/responses", self.base_url);
        debug!(url = %url, "sending responses request");

        let response = self.http_client.post(&url).json(payload).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http { status, body });
        }

        Ok(response)
    }
}

#[async_trait]
impl ResponseProvider for Responder {
    async fn respond(&self, request: ResponseRequest) -> Result<Response> {
        let payload = self.build_payload(&request, false)?;
        let response = self.post(&payload).await?;

        let parsed: Response = response.json().await?;
        Ok(parsed)
    }

    async fn respond_stream(&self, request: ResponseRequest) -> Result<ResponseStream> {
        let payload = self.build_payload(&request, true)?;
        let response = self.post(&payload).await?;

        Ok(ResponseStream::new(response.bytes_stream()))
    }
}
