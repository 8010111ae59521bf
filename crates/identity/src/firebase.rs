use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use societas_config::IdentityConfig;

use crate::{IdentityError, IdentityProvider, IdentitySession, RefreshedTokens, VerifiedUser};

const API_KEY_ENV: &str = "FIREBASE_API_KEY";
const EMULATOR_ENV: &str = "FIREBASE_AUTH_EMULATOR_HOST";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Firebase Authentication over the Identity Toolkit and Secure Token REST APIs.
#[derive(Clone)]
pub struct FirebaseIdentity {
    client: Client,
    api_key: Option<String>,
    identity_base_url: String,
    token_base_url: String,
}

impl FirebaseIdentity {
    pub fn new(config: &IdentityConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &IdentityConfig) -> Self {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty());

        let emulator_host = config
            .emulator_host
            .clone()
            .or_else(|| std::env::var(EMULATOR_ENV).ok())
            .filter(|host| !host.trim().is_empty());

        let (identity_base_url, token_base_url) = match emulator_host {
            Some(host) => (
                format!("http://{host}/identitytoolkit.googleapis.com/v1"),
                format!("http://{host}/securetoken.googleapis.com/v1"),
            ),
            None => (
                config.identity_base_url.trim_end_matches('/').to_string(),
                config.token_base_url.trim_end_matches('/').to_string(),
            ),
        };

        if api_key.is_none() {
            warn!("no firebase api key configured, identity calls will fail");
        }

        Self {
            client,
            api_key,
            identity_base_url,
            token_base_url,
        }
    }

    async fn post<B, T>(&self, url: String, body: &B) -> Result<T, IdentityError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let api_key = self.api_key.as_deref().ok_or(IdentityError::NotConfigured)?;

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(body)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorWrapper>(&body)
                .map(|wrapper| wrapper.error.message)
                .unwrap_or(body);
            debug!(%status, %message, "identity provider returned an error");
            return Err(IdentityError::from_provider_code(&message));
        }

        response.json().await.map_err(transport)
    }

    async fn password_session(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<IdentitySession, IdentityError> {
        let response: PasswordResponse = self
            .post(
                format!("{}/accounts:{endpoint}", self.identity_base_url),
                &json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;

        Ok(IdentitySession {
            uid: response.local_id,
            email: response.email,
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in.and_then(|value| value.parse().ok()),
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<IdentitySession, IdentityError> {
        self.password_session("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentitySession, IdentityError> {
        self.password_session("signInWithPassword", email, password)
            .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, IdentityError> {
        let response: TokenResponse = self
            .post(
                format!("{}/token", self.token_base_url),
                &json!({ "grant_type": "refresh_token", "refresh_token": refresh_token }),
            )
            .await?;

        Ok(RefreshedTokens {
            uid: response.user_id,
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in.and_then(|value| value.parse().ok()),
        })
    }

    async fn verify_token(&self, id_token: &str) -> Result<VerifiedUser, IdentityError> {
        let response: LookupResponse = self
            .post(
                format!("{}/accounts:lookup", self.identity_base_url),
                &json!({ "idToken": id_token }),
            )
            .await?;

        let account = response
            .users
            .into_iter()
            .next()
            .ok_or(IdentityError::UserNotFound)?;

        if account.disabled {
            return Err(IdentityError::UserDisabled);
        }

        Ok(VerifiedUser {
            uid: account.local_id,
            email: account.email,
            email_verified: account.email_verified,
            display_name: account.display_name,
            photo_url: account.photo_url,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    user_id: String,
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupAccount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupAccount {
    local_id: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    display_name: Option<String>,
    photo_url: Option<String>,
    #[serde(default)]
    disabled: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn transport(err: reqwest::Error) -> IdentityError {
    IdentityError::Transport(err.without_url())
}
