use std::future::Future;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("reply service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("reply service returned invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

/// Anything that can turn a query into a decoded JSON reply
pub trait ReplyService {
    fn send(&self, query: &str) -> impl Future<Output = Result<Value, ServiceError>> + Send;
}

/// Posts `{"query": ...}` to the root path of the configured server
#[derive(Clone)]
pub struct HttpReplyService {
    client: Client,
    url: String,
}

impl HttpReplyService {
    pub fn new(server: &str) -> Self {
        Self::with_client(Client::new(), server)
    }

    pub fn with_client(client: Client, server: &str) -> Self {
        Self {
            client,
            url: format!("{}/", server.trim_end_matches('/')),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ReplyService for HttpReplyService {
    async fn send(&self, query: &str) -> Result<Value, ServiceError> {
        // `json` also sets Content-Type: application/json
        let response = self
            .client
            .post(&self.url)
            .json(&QueryRequest { query })
            .send()
            .await?;

        // The body decides what gets rendered, not the status.
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, url = %self.url, "reply service returned non-success status");
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
