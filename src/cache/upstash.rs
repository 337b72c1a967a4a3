/// Upstash Redis over its REST API
///
/// Commands are POSTed as JSON arrays (`["GET", key]`) and answered with
/// `{"result": ...}` or `{"error": "..."}`.
use super::{DurableStore, StoreError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct UpstashResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

pub struct UpstashStore {
    client: Client,
    url: String,
    token: String,
}

impl UpstashStore {
    pub fn new(url: String, token: String, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn command(&self, command: Value) -> Result<Option<Value>, StoreError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&command)
            .send()
            .await?;

        let status = response.status();
        let body: UpstashResponse = response.json().await?;

        if let Some(error) = body.error {
            return Err(StoreError::Backend(format!("upstash {}: {}", status, error)));
        }
        if !status.is_success() {
            return Err(StoreError::Backend(format!("upstash returned {}", status)));
        }

        Ok(body.result)
    }
}

/// Interpret the `result` of a GET
fn string_result(result: Option<Value>) -> Result<Option<String>, StoreError> {
    match result {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(other) => Err(StoreError::Backend(format!("unexpected GET result: {}", other))),
    }
}

#[async_trait]
impl DurableStore for UpstashStore {
    fn name(&self) -> &'static str {
        "upstash"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        debug!("Upstash GET {}", key);
        string_result(self.command(json!(["GET", key])).await?)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        debug!("Upstash SET {} (EX {})", key, ttl.as_secs());
        let ttl_seconds = ttl.as_secs().max(1);
        match self.command(json!(["SET", key, value, "EX", ttl_seconds])).await? {
            Some(Value::String(ok)) if ok == "OK" => Ok(()),
            other => Err(StoreError::Backend(format!("unexpected SET result: {:?}", other))),
        }
    }
}
