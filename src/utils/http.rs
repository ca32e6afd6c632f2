//! HTTP client utilities.

use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP client with sensible defaults
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_user_agent(default_user_agent(), DEFAULT_TIMEOUT)
    }

    /// Create a new HTTP client with a custom user agent and request timeout
    pub fn with_user_agent(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        tracing::debug!("GET {}", url);
        self.client.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        tracing::debug!("POST {}", url);
        self.client.post(url)
    }
}

/// `lit-review/<version>`
pub fn default_user_agent() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
}

/// User agent for CrossRef's polite pool, which asks for a contact address
pub fn polite_user_agent(mailto: Option<&str>) -> String {
    match mailto {
        Some(mail) if !mail.trim().is_empty() => {
            format!("{} (mailto:{})", default_user_agent(), mail.trim())
        }
        _ => default_user_agent().to_string(),
    }
}
