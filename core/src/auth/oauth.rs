//! Microsoft identity platform client
//! Device-code sign-in for terminals plus refresh-token renewal, against the v2.0 endpoints.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::provider::IdentityClient;
use super::session::{Account, AuthSession};
use super::AuthError;
use crate::config::IdentityConfig;

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
const BASE_SCOPES: [&str; 3] = ["openid", "profile", "offline_access"];

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// What the user has to do to finish signing in
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCode {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub expires_in: u64,
    #[serde(default = "default_interval")]
    pub interval: u64,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_interval() -> u64 {
    5
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    oid: Option<String>,
    #[serde(default)]
    tid: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    preferred_username: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

pub type DevicePrompt = Arc<dyn Fn(&DeviceCode) + Send + Sync>;

pub struct EntraIdentityClient {
    http: reqwest::Client,
    authority: String,
    tenant_id: String,
    client_id: String,
    scopes: String,
    prompt: DevicePrompt,
}

impl EntraIdentityClient {
    pub fn new(config: &IdentityConfig) -> Result<Self, AuthError> {
        let client_id = config
            .client_id
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::NotConfigured("client_id"))?;
        let tenant_id = config
            .tenant_id
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::NotConfigured("tenant_id"))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            http,
            authority: config.authority.trim_end_matches('/').to_string(),
            tenant_id,
            client_id,
            scopes: scope_string(config.api_scope.as_deref()),
            prompt: Arc::new(|code: &DeviceCode| {
                tracing::info!(
                    "To sign in, open {} and enter the code {}",
                    code.verification_uri,
                    code.user_code
                );
            }),
        })
    }

    /// Replace how the device code is shown to the user
    pub fn with_prompt(mut self, prompt: DevicePrompt) -> Self {
        self.prompt = prompt;
        self
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}/oauth2/v2.0/{}", self.authority, self.tenant_id, name)
    }

    async fn request_device_code(&self) -> Result<DeviceCode, AuthError> {
        let params = [("client_id", self.client_id.as_str()), ("scope", self.scopes.as_str())];

        let response = self.http
            .post(self.endpoint("devicecode"))
            .form(&params)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json::<DeviceCode>().await?)
        } else {
            Err(rejection(response).await)
        }
    }

    async fn poll_device_code(&self, code: &DeviceCode) -> Result<TokenResponse, AuthError> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(code.expires_in);
        let mut interval = code.interval.max(1);

        loop {
            tokio::time::sleep(Duration::from_secs(interval)).await;
            if tokio::time::Instant::now() >= deadline {
                return Err(AuthError::Expired);
            }

            let params = [
                ("grant_type", DEVICE_CODE_GRANT),
                ("client_id", self.client_id.as_str()),
                ("device_code", code.device_code.as_str()),
            ];
            let response = self.http
                .post(self.endpoint("token"))
                .form(&params)
                .send()
                .await?;

            if response.status().is_success() {
                return Ok(response.json::<TokenResponse>().await?);
            }

            match rejection(response).await {
                AuthError::Rejected { error, .. } if error == "authorization_pending" => {
                    tracing::debug!("Waiting for device sign-in...");
                }
                AuthError::Rejected { error, .. } if error == "slow_down" => {
                    interval += 5;
                }
                AuthError::Rejected { error, .. } if error == "expired_token" => {
                    return Err(AuthError::Expired);
                }
                other => return Err(other),
            }
        }
    }

    /// Redeem a refresh token for a new access token
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("scope", self.scopes.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        tracing::debug!("Refreshing token...");

        let response = self.http
            .post(self.endpoint("token"))
            .form(&params)
            .send()
            .await?;

        if response.status().is_success() {
            let token_data = response.json::<TokenResponse>().await?;
            tracing::debug!("Token refresh successful, expires_in={}s", token_data.expires_in);
            Ok(token_data)
        } else {
            Err(rejection(response).await)
        }
    }
}

#[async_trait]
impl IdentityClient for EntraIdentityClient {
    async fn acquire_token_silent(&self, session: &AuthSession) -> Result<AuthSession, AuthError> {
        let refresh_token = session.refresh_token.as_deref().ok_or(AuthError::NoRefreshToken)?;
        let response = self.refresh_access_token(refresh_token).await?;

        let account = match response.id_token.as_deref() {
            Some(id_token) => account_from_id_token(id_token).unwrap_or_else(|_| session.account.clone()),
            None => session.account.clone(),
        };
        // the identity provider does not always rotate the refresh token
        let refresh = response.refresh_token.or_else(|| session.refresh_token.clone());

        Ok(AuthSession::new(account, response.access_token, refresh, response.expires_in))
    }

    async fn login_interactive(&self) -> Result<AuthSession, AuthError> {
        let code = self.request_device_code().await?;
        (self.prompt)(&code);

        let response = self.poll_device_code(&code).await?;
        let id_token = response.id_token.as_deref().ok_or_else(|| {
            AuthError::InvalidIdToken("sign-in response has no id_token".to_string())
        })?;
        let account = account_from_id_token(id_token)?;

        tracing::info!("Signed in as {}", account.username);
        Ok(AuthSession::new(account, response.access_token, response.refresh_token, response.expires_in))
    }
}

fn scope_string(api_scope: Option<&str>) -> String {
    let mut scopes: Vec<&str> = Vec::new();
    if let Some(scope) = api_scope.map(str::trim).filter(|s| !s.is_empty()) {
        scopes.push(scope);
    }
    scopes.extend(BASE_SCOPES);
    scopes.join(" ")
}

async fn rejection(response: reqwest::Response) -> AuthError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(err) => AuthError::Rejected {
            error: err.error,
            description: err.error_description.unwrap_or_default(),
        },
        Err(_) => AuthError::Rejected {
            error: format!("http_{}", status.as_u16()),
            description: body,
        },
    }
}

/// Read the account out of the id_token payload. The token came straight from the
/// token endpoint over TLS, so the signature is not checked here.
pub fn account_from_id_token(id_token: &str) -> Result<Account, AuthError> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| AuthError::InvalidIdToken("not a JWT".to_string()))?;

    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::InvalidIdToken(e.to_string()))?;
    let claims: IdTokenClaims =
        serde_json::from_slice(&bytes).map_err(|e| AuthError::InvalidIdToken(e.to_string()))?;

    let object_id = claims
        .oid
        .or(claims.sub)
        .ok_or_else(|| AuthError::InvalidIdToken("no subject claim".to_string()))?;
    let home_account_id = match claims.tid {
        Some(tid) => format!("{}.{}", object_id, tid),
        None => object_id.clone(),
    };

    Ok(Account {
        home_account_id,
        username: claims.preferred_username.unwrap_or(object_id),
        name: claims.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(claims: serde_json::Value) -> String {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        format!(
            "{}.{}.sig",
            engine.encode(br#"{"alg":"none"}"#),
            engine.encode(claims.to_string())
        )
    }

    #[test]
    fn account_from_full_claims() {
        let token = jwt(serde_json::json!({
            "oid": "1234",
            "tid": "tenant",
            "preferred_username": "ada@example.com",
            "name": "Ada Lovelace"
        }));
        let account = account_from_id_token(&token).unwrap();
        assert_eq!(account.home_account_id, "1234.tenant");
        assert_eq!(account.username, "ada@example.com");
        assert_eq!(account.name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn account_falls_back_to_subject() {
        let token = jwt(serde_json::json!({ "sub": "abc" }));
        let account = account_from_id_token(&token).unwrap();
        assert_eq!(account.home_account_id, "abc");
        assert_eq!(account.username, "abc");
    }

    #[test]
    fn garbage_id_token_is_rejected() {
        assert!(matches!(account_from_id_token("nodots"), Err(AuthError::InvalidIdToken(_))));
        assert!(matches!(account_from_id_token("a.!!!.c"), Err(AuthError::InvalidIdToken(_))));
        let no_subject = jwt(serde_json::json!({ "name": "x" }));
        assert!(account_from_id_token(&no_subject).is_err());
    }

    #[test]
    fn scopes_include_api_scope_first() {
        assert_eq!(scope_string(Some("api://chat/.default")), "api://chat/.default openid profile offline_access");
        assert_eq!(scope_string(Some(" ")), "openid profile offline_access");
        assert_eq!(scope_string(None), "openid profile offline_access");
    }

    #[test]
    fn client_requires_ids() {
        let mut config = IdentityConfig::default();
        assert!(matches!(EntraIdentityClient::new(&config), Err(AuthError::NotConfigured("client_id"))));
        config.client_id = Some("client".to_string());
        assert!(matches!(EntraIdentityClient::new(&config), Err(AuthError::NotConfigured("tenant_id"))));
        config.tenant_id = Some("tenant".to_string());
        let client = EntraIdentityClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("token"),
            "https://login.microsoftonline.com/tenant/oauth2/v2.0/token"
        );
    }
}
