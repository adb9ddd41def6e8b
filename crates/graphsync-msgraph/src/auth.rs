//! OAuth2 token acquisition for Microsoft Graph.
//!
//! Three grants are supported, one per tenant credential mode:
//!
//! - client credentials (app-only, non-interactive)
//! - resource owner password (scheduled collection through a service account)
//! - device code (interactive booking authorization; the user code is handed
//!   to the caller while a background poll waits for the user to sign in)

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::{GraphError, GraphResult};

/// Device-code grant type URN (RFC 8628).
const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Default polling interval when the provider does not advertise one.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Login and Graph endpoints for one cloud deployment.
///
/// Overridable so tests can point both at a local mock server.
#[derive(Debug, Clone)]
pub struct GraphEnvironment {
    pub login_base: String,
    pub graph_base: String,
}

impl Default for GraphEnvironment {
    fn default() -> Self {
        Self {
            login_base: "https://login.microsoftonline.com".to_string(),
            graph_base: "https://graph.microsoft.com".to_string(),
        }
    }
}

impl GraphEnvironment {
    /// Token endpoint for the given tenant.
    #[must_use]
    pub fn token_url(&self, tenant_id: &str) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.login_base, tenant_id)
    }

    /// Device-code issuance endpoint for the given tenant.
    #[must_use]
    pub fn device_code_url(&self, tenant_id: &str) -> String {
        format!("{}/{}/oauth2/v2.0/devicecode", self.login_base, tenant_id)
    }

    /// The `.default` scope covering all granted application permissions.
    #[must_use]
    pub fn default_scope(&self) -> String {
        format!("{}/.default", self.graph_base)
    }
}

/// Credential material for one tenant configuration.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// App-only access via client secret.
    ClientSecret {
        client_id: String,
        tenant_id: String,
        client_secret: SecretString,
    },
    /// Service-account access via the resource-owner-password grant.
    UsernamePassword {
        client_id: String,
        tenant_id: String,
        username: String,
        password: SecretString,
    },
    /// Interactive user access via the device-code grant.
    DeviceCode { client_id: String, tenant_id: String },
}

impl Credentials {
    /// OAuth2 client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        match self {
            Self::ClientSecret { client_id, .. }
            | Self::UsernamePassword { client_id, .. }
            | Self::DeviceCode { client_id, .. } => client_id,
        }
    }

    /// Directory tenant id.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        match self {
            Self::ClientSecret { tenant_id, .. }
            | Self::UsernamePassword { tenant_id, .. }
            | Self::DeviceCode { tenant_id, .. } => tenant_id,
        }
    }

    /// True for the interactive device-code mode, where calls run as the
    /// authorizing user (`/me`) rather than an enumerated principal.
    #[must_use]
    pub fn is_delegated(&self) -> bool {
        matches!(self, Self::DeviceCode { .. })
    }
}

/// Token endpoint success response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Token endpoint error response.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

/// Device-code issuance response handed to the authorizing user.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCodeGrant {
    /// Secret code used for token polling.
    pub device_code: String,
    /// Code the user enters at the verification URI.
    pub user_code: String,
    /// Where the user completes sign-in.
    pub verification_uri: String,
    /// Seconds until the device code expires.
    pub expires_in: i64,
    /// Minimum seconds between polling requests.
    pub interval: Option<u64>,
    /// Provider-supplied instruction text.
    pub message: Option<String>,
}

/// Cached access token with its expiry.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// True if the token is expired or expires within the grace period.
    fn is_expired(&self, grace: Duration) -> bool {
        Utc::now() + grace >= self.expires_at
    }
}

/// Acquires and caches access tokens for one credential set.
#[derive(Debug)]
pub struct TokenProvider {
    credentials: Credentials,
    env: GraphEnvironment,
    http: reqwest::Client,
    cached: RwLock<Option<CachedToken>>,
    /// Refresh this long before actual expiry.
    grace: Duration,
}

impl TokenProvider {
    /// Creates a provider sharing the caller's HTTP client.
    pub fn new(credentials: Credentials, env: GraphEnvironment, http: reqwest::Client) -> Self {
        Self {
            credentials,
            env,
            http,
            cached: RwLock::new(None),
            grace: Duration::minutes(5),
        }
    }

    /// The credential set this provider authenticates.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns a valid access token, refreshing when necessary.
    ///
    /// In device-code mode only the cached token is consulted; it is filled
    /// by [`Self::poll_device_token`], so calls made before the user signed
    /// in fail with [`GraphError::NotAuthorized`].
    #[instrument(skip(self), fields(tenant_id = %self.credentials.tenant_id()))]
    pub async fn get_token(&self) -> GraphResult<String> {
        {
            let cache = self.cached.read().await;
            if let Some(ref token) = *cache {
                if !token.is_expired(self.grace) {
                    debug!("using cached token");
                    return Ok(token.access_token.clone());
                }
            }
        }

        if self.credentials.is_delegated() {
            // No silent refresh exists for this grant; the session lives as
            // long as the token obtained by the poll.
            return Err(GraphError::NotAuthorized);
        }

        debug!("refreshing access token");
        let token = self.acquire().await?;
        let access_token = token.access_token.clone();
        *self.cached.write().await = Some(token);
        Ok(access_token)
    }

    /// Acquires a fresh token via the configured non-interactive grant.
    async fn acquire(&self) -> GraphResult<CachedToken> {
        let scope = self.env.default_scope();
        let mut params: Vec<(&str, String)> = vec![
            ("client_id", self.credentials.client_id().to_string()),
            ("scope", scope),
        ];
        match &self.credentials {
            Credentials::ClientSecret { client_secret, .. } => {
                params.push(("grant_type", "client_credentials".to_string()));
                params.push(("client_secret", client_secret.expose_secret().clone()));
            }
            Credentials::UsernamePassword {
                username, password, ..
            } => {
                params.push(("grant_type", "password".to_string()));
                params.push(("username", username.clone()));
                params.push(("password", password.expose_secret().clone()));
            }
            Credentials::DeviceCode { .. } => return Err(GraphError::NotAuthorized),
        }

        let token_url = self.env.token_url(self.credentials.tenant_id());
        let response = self
            .http
            .post(&token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| GraphError::AuthInit(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::AuthInit(format!(
                "token request failed with status {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GraphError::AuthInit(format!("failed to parse token response: {e}")))?;

        Ok(CachedToken {
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
            access_token: token.access_token,
        })
    }

    /// Starts a device-code flow and returns the grant including the
    /// user-facing code. Only valid for [`Credentials::DeviceCode`].
    #[instrument(skip(self), fields(tenant_id = %self.credentials.tenant_id()))]
    pub async fn begin_device_flow(&self) -> GraphResult<DeviceCodeGrant> {
        if !self.credentials.is_delegated() {
            return Err(GraphError::AuthInit(
                "device-code flow requires device-code credentials".to_string(),
            ));
        }

        let params = [
            ("client_id", self.credentials.client_id().to_string()),
            ("scope", self.env.default_scope()),
        ];
        let url = self.env.device_code_url(self.credentials.tenant_id());
        let response = self
            .http
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| GraphError::AuthInit(format!("device code request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::AuthInit(format!(
                "device code request failed with status {status}: {body}"
            )));
        }

        let grant: DeviceCodeGrant = response
            .json()
            .await
            .map_err(|e| GraphError::AuthInit(format!("failed to parse device code response: {e}")))?;
        debug!(user_code = %grant.user_code, "device code issued");
        Ok(grant)
    }

    /// Polls the token endpoint until the user completes (or declines) the
    /// device-code sign-in, then stores the delegated token in the cache.
    ///
    /// The call cannot be interrupted mid-flight; callers that race it
    /// against a deadline simply discard the result.
    #[instrument(skip(self, grant), fields(tenant_id = %self.credentials.tenant_id()))]
    pub async fn poll_device_token(&self, grant: &DeviceCodeGrant) -> GraphResult<()> {
        let deadline = Instant::now()
            + std::time::Duration::from_secs(grant.expires_in.max(0) as u64);
        let mut interval = grant.interval.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        let token_url = self.env.token_url(self.credentials.tenant_id());

        loop {
            tokio::time::sleep(std::time::Duration::from_secs(interval)).await;
            if Instant::now() >= deadline {
                return Err(GraphError::CodeExpired);
            }

            let params = [
                ("grant_type", DEVICE_CODE_GRANT_TYPE.to_string()),
                ("client_id", self.credentials.client_id().to_string()),
                ("device_code", grant.device_code.clone()),
            ];
            let response = self.http.post(&token_url).form(&params).send().await?;

            if response.status().is_success() {
                let token: TokenResponse = response.json().await.map_err(|e| {
                    GraphError::Token(format!("failed to parse token response: {e}"))
                })?;
                *self.cached.write().await = Some(CachedToken {
                    expires_at: Utc::now() + Duration::seconds(token.expires_in),
                    access_token: token.access_token,
                });
                debug!("device-code authorization completed");
                return Ok(());
            }

            let body = response.text().await.unwrap_or_default();
            let error: TokenErrorResponse = serde_json::from_str(&body)
                .map_err(|_| GraphError::Token(format!("unexpected token response: {body}")))?;
            match error.error.as_str() {
                "authorization_pending" => continue,
                // RFC 8628: back off by 5 seconds when asked to slow down.
                "slow_down" => interval += 5,
                "authorization_declined" => return Err(GraphError::AuthorizationDeclined),
                "expired_token" => return Err(GraphError::CodeExpired),
                other => {
                    return Err(GraphError::Token(
                        error.error_description.unwrap_or_else(|| other.to_string()),
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_token_expiry_honors_grace() {
        let token = CachedToken {
            access_token: "test".to_string(),
            expires_at: Utc::now() + Duration::minutes(10),
        };
        assert!(!token.is_expired(Duration::minutes(5)));
        assert!(token.is_expired(Duration::minutes(15)));
    }

    #[test]
    fn delegated_mode_is_device_code_only() {
        let device = Credentials::DeviceCode {
            client_id: "c".into(),
            tenant_id: "t".into(),
        };
        let ropc = Credentials::UsernamePassword {
            client_id: "c".into(),
            tenant_id: "t".into(),
            username: "u".into(),
            password: "p".to_string().into(),
        };
        assert!(device.is_delegated());
        assert!(!ropc.is_delegated());
    }

    #[test]
    fn environment_urls() {
        let env = GraphEnvironment::default();
        assert_eq!(
            env.token_url("tenant-a"),
            "https://login.microsoftonline.com/tenant-a/oauth2/v2.0/token"
        );
        assert_eq!(
            env.device_code_url("tenant-a"),
            "https://login.microsoftonline.com/tenant-a/oauth2/v2.0/devicecode"
        );
        assert_eq!(env.default_scope(), "https://graph.microsoft.com/.default");
    }
}
