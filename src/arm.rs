use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::api::{StorageAccount, StorageAccountKey, StorageApi};

const STORAGE_API_VERSION: &str = "2023-01-01";

/// Operator-level settings for the ARM-backed client.
#[derive(Debug, Clone)]
pub struct ArmConfig {
    /// Azure tenant ID (GUID).
    pub tenant_id: String,
    /// Subscription whose storage accounts are visible to the client.
    pub subscription_id: String,
    /// Service principal client ID.
    pub client_id: String,
    /// Service principal client secret.
    pub client_secret: String,
    /// ARM endpoint. Defaults to the public cloud; override for sovereign
    /// clouds or tests.
    pub management_base: String,
    /// Token endpoint base. Defaults to the public cloud.
    pub login_base: String,
}

impl ArmConfig {
    pub fn new(
        tenant_id: impl Into<String>,
        subscription_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            subscription_id: subscription_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            management_base: "https://management.azure.com".to_string(),
            login_base: "https://login.microsoftonline.com".to_string(),
        }
    }

    /// Builds a config from the conventional `AZURE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| std::env::var(name).with_context(|| format!("{name} is not set"));
        Ok(Self::new(
            var("AZURE_TENANT_ID")?,
            var("AZURE_SUBSCRIPTION_ID")?,
            var("AZURE_CLIENT_ID")?,
            var("AZURE_CLIENT_SECRET")?,
        ))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Deserialize)]
struct AccountsPage {
    #[serde(default)]
    value: Vec<StorageAccount>,
    #[serde(rename = "nextLink")]
    next_link: Option<String>,
}

#[derive(Deserialize)]
struct KeyListing {
    #[serde(default)]
    keys: Vec<StorageAccountKey>,
}

/// [`StorageApi`] implementation against the ARM REST surface, authenticating
/// with OAuth2 client credentials. The bearer token is cached until shortly
/// before expiry; listings follow `nextLink` pagination to exhaustion.
pub struct ArmClient {
    config: ArmConfig,
    http: reqwest::Client,
    token: Mutex<Option<(String, Instant)>>,
}

impl ArmClient {
    pub fn new(config: ArmConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            token: Mutex::new(None),
        }
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.config.login_base.trim_end_matches('/'),
            self.config.tenant_id
        )
    }

    fn accounts_url(&self) -> String {
        format!(
            "{}/subscriptions/{}/providers/Microsoft.Storage/storageAccounts?api-version={}",
            self.config.management_base.trim_end_matches('/'),
            self.config.subscription_id,
            STORAGE_API_VERSION
        )
    }

    fn list_keys_url(&self, resource_group: &str, account_name: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Storage/storageAccounts/{}/listKeys?api-version={}",
            self.config.management_base.trim_end_matches('/'),
            self.config.subscription_id,
            resource_group,
            account_name,
            STORAGE_API_VERSION
        )
    }

    async fn token(&self) -> Result<String> {
        {
            let guard = self.token.lock().await;
            if let Some((token, expiry)) = guard.as_ref() {
                if Instant::now() < *expiry {
                    return Ok(token.clone());
                }
            }
        }

        let url = self.token_url();
        let scope = format!("{}/.default", self.config.management_base.trim_end_matches('/'));
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];

        debug!(url = %url, "requesting management token");
        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .context("token request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("token request: status {}: {}", status.as_u16(), body);
        }

        let token: TokenResponse = response.json().await.context("decoding token response")?;
        // Refresh a minute early so an in-flight request never carries a
        // token that expires mid-call.
        let expiry = Instant::now() + Duration::from_secs(token.expires_in.saturating_sub(60));

        *self.token.lock().await = Some((token.access_token.clone(), expiry));
        Ok(token.access_token)
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let token = self.token().await?;
        debug!(url = %url, "ARM GET");
        let response = self
            .http
            .get(url)
            .bearer_auth(&token)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        Self::success_body(url, response).await
    }

    async fn post_json(&self, url: &str) -> Result<Value> {
        let token = self.token().await?;
        debug!(url = %url, "ARM POST");
        let response = self
            .http
            .post(url)
            .bearer_auth(&token)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;
        Self::success_body(url, response).await
    }

    async fn success_body(url: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            bail!(
                "{url}: status {}: {}",
                status.as_u16(),
                arm_error(&body)
            );
        }
        Ok(body)
    }
}

/// Pulls the `code: message` pair out of an ARM error envelope, falling back
/// to the top-level body for non-enveloped responses.
fn arm_error(body: &Value) -> String {
    let err = body.get("error").unwrap_or(body);
    let code = err["code"].as_str().unwrap_or("Unknown");
    let message = err["message"].as_str().unwrap_or("unknown error");
    format!("{code}: {message}")
}

#[async_trait]
impl StorageApi for ArmClient {
    async fn list_accounts(&self) -> Result<Vec<StorageAccount>> {
        let mut accounts = Vec::new();
        let mut url = self.accounts_url();

        loop {
            let body = self.get_json(&url).await?;
            let page: AccountsPage = serde_json::from_value(body)
                .with_context(|| format!("decoding accounts page from {url}"))?;
            accounts.extend(page.value);
            match page.next_link {
                Some(next) => url = next,
                None => break,
            }
        }

        debug!(count = accounts.len(), "listed storage accounts");
        Ok(accounts)
    }

    async fn list_keys(
        &self,
        resource_group: &str,
        account_name: &str,
    ) -> Result<Vec<StorageAccountKey>> {
        let url = self.list_keys_url(resource_group, account_name);
        let body = self.post_json(&url).await?;
        let listing: KeyListing = serde_json::from_value(body)
            .with_context(|| format!("decoding key listing from {url}"))?;
        Ok(listing.keys)
    }
}
