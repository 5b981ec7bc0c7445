//! Hosted identity provider gateway.
//!
//! Speaks the provider's JSON account API: `v1/signup`, `v1/signin`, and
//! `v1/signout`. Provider diagnostics are wrapped into
//! [`mayday::Error::Identity`]; the UI shows them only as a generic
//! notice.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use mayday::config::IdentityConfig;
use mayday::session::{validate_credentials, IdentityGateway, User};
use mayday::{Error, Result};

use crate::join_url;

/// Header carrying the deployment API key, when configured.
const API_KEY_HEADER: &str = "x-api-key";

/// [`IdentityGateway`] backed by the hosted identity provider.
#[derive(Debug, Clone)]
pub struct HostedIdentity {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

/// The provider's account projection on the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    uid: String,
    email: Option<String>,
    display_name: Option<String>,
}

impl From<AccountResponse> for User {
    fn from(account: AccountResponse) -> Self {
        Self {
            uid: account.uid,
            email: account.email,
            display_name: account.display_name,
        }
    }
}

impl HostedIdentity {
    /// Create a gateway over the configured provider deployment.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(self.endpoint(path));
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder
    }

    async fn credential_call(&self, path: &str, email: &str, password: &str) -> Result<User> {
        validate_credentials(email, password)?;

        let body = serde_json::json!({ "email": email, "password": password });
        let response = self
            .request(path)
            .json(&body)
            .send()
            .await
            .map_err(|err| Error::identity(format!("provider unreachable: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let diagnostic = response.text().await.unwrap_or_default();
            return Err(Error::identity(format!("{status}: {diagnostic}")));
        }

        let account: AccountResponse = response
            .json()
            .await
            .map_err(|err| Error::identity(format!("malformed provider response: {err}")))?;
        debug!(uid = %account.uid, "identity call succeeded");
        Ok(account.into())
    }
}

#[async_trait]
impl IdentityGateway for HostedIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<User> {
        self.credential_call("v1/signup", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        self.credential_call("v1/signin", email, password).await
    }

    async fn sign_out(&self) -> Result<()> {
        let response = self
            .request("v1/signout")
            .send()
            .await
            .map_err(|err| Error::identity(format!("provider unreachable: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::identity(format!("sign-out failed: {status}")));
        }
        Ok(())
    }
}
