//! Thin reqwest wrapper shared by both adapters.
//!
//! Every request carries the client-level timeout; errors are classified
//! into [`SourceError`] so callers can tell timeouts from connection and
//! status failures.

use std::time::Duration;

use crate::SourceError;

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| SourceError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    pub async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, SourceError> {
        let resp = self.send(url, query).await?;
        resp.text().await.map_err(|e| classify(url, e))
    }

    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value, SourceError> {
        let resp = self.send(url, &[]).await?;
        resp.json()
            .await
            .map_err(|e| SourceError::Decode(format!("{url}: {e}")))
    }

    async fn send(&self, url: &str, query: &[(&str, &str)]) -> Result<reqwest::Response, SourceError> {
        let mut req = self.http.get(url);
        if !query.is_empty() {
            req = req.query(query);
        }
        let resp = req.send().await.map_err(|e| classify(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp)
    }
}

fn classify(url: &str, err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout {
            url: url.to_string(),
        }
    } else if err.is_connect() {
        SourceError::Connection {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else if let Some(status) = err.status() {
        SourceError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        }
    } else {
        SourceError::Transport(err.to_string())
    }
}
