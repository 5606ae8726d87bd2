// Shared transport configuration for building reqwest::Client instances.
//
// The mower cloud authenticates with two session cookies (`UserId` and
// `UserToken`). They are seeded into the client's cookie jar here so the
// endpoint code never handles credentials directly.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::Error;

/// Account credentials issued by the mower cloud.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: String,
    pub user_token: SecretString,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout applied by reqwest. Callers still wrap
    /// individual operations in tighter `tokio::time::timeout`s.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("mowlink/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` whose cookie jar carries the session cookies
    /// for `base_url`.
    pub fn build_client(
        &self,
        base_url: &Url,
        credentials: &Credentials,
    ) -> Result<reqwest::Client, Error> {
        let jar = Arc::new(Jar::default());
        jar.add_cookie_str(&format!("UserId={}", credentials.user_id), base_url);
        jar.add_cookie_str(
            &format!("UserToken={}", credentials.user_token.expose_secret()),
            base_url,
        );

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .cookie_provider(jar)
            .build()
            .map_err(Error::Transport)
    }
}
