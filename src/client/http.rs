//! reqwest implementation of the backend calls

use super::{AuthBackend, BackendError};
use crate::assignments::{AttendantId, Pump, PumpAssignmentApi, PumpId};
use crate::models::{Credentials, UserProfile};
use crate::settings::ApiSettings;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttendantIdsBody<'a> {
    attendant_ids: &'a [AttendantId],
}

/// HTTP client for the Bidi REST backend
#[derive(Debug, Clone)]
pub struct HttpAuthBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpAuthBackend {
    /// Create a client for the backend at `base_url`
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Configuration` if the URL cannot serve as a base
    /// or the HTTP client cannot be built
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let mut parsed = Url::parse(base_url).map_err(|e| {
            BackendError::Configuration(format!("invalid base URL '{base_url}': {e}"))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(BackendError::Configuration(format!(
                "base URL '{base_url}' cannot be used as a base"
            )));
        }
        // Relative joins replace the last segment unless the path is a directory
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// Create a client from the `[api]` settings section
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL is invalid
    pub fn from_settings(settings: &ApiSettings) -> Result<Self, BackendError> {
        Self::new(&settings.base_url, settings.timeout())
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Client for authenticated data calls made with `token`
    #[must_use]
    pub fn with_token(&self, token: impl Into<String>) -> AuthorizedApi {
        AuthorizedApi {
            backend: self.clone(),
            token: token.into(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| BackendError::Configuration(format!("invalid endpoint '{path}': {e}")))
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::unexpected(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| BackendError::Network(format!("unreadable response body: {e}")))
    }

    async fn expect_success(response: reqwest::Response) -> Result<(), BackendError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::unexpected(response).await)
        }
    }

    async fn unexpected(response: reqwest::Response) -> BackendError {
        let status = response.status();
        let message = error_message(response)
            .await
            .or_else(|| status.canonical_reason().map(ToString::to_string))
            .unwrap_or_default();
        BackendError::UnexpectedResponse {
            status: status.as_u16(),
            message,
        }
    }
}

/// Extract the `message` field of an error body; arrays are joined
async fn error_message(response: reqwest::Response) -> Option<String> {
    let body: Value = response.json().await.ok()?;
    match body.get("message")? {
        Value::String(message) => Some(message.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, credentials: &Credentials) -> Result<String, BackendError> {
        let response = self
            .client
            .post(self.endpoint("auth/login")?)
            .json(credentials)
            .send()
            .await
            .map_err(|e| BackendError::network(&e))?;

        let status = response.status();
        if status.is_success() {
            let body: LoginResponse = response.json().await.map_err(|e| {
                BackendError::UnexpectedResponse {
                    status: status.as_u16(),
                    message: format!("login response without access_token: {e}"),
                }
            })?;
            return Ok(body.access_token);
        }

        if status.is_client_error() {
            let message = error_message(response)
                .await
                .unwrap_or_else(|| BackendError::INVALID_CREDENTIALS.to_string());
            Err(BackendError::InvalidCredentials(message))
        } else {
            Err(Self::unexpected(response).await)
        }
    }

    async fn validate(&self, token: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .get(self.endpoint("auth/validate")?)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BackendError::network(&e))?;

        if !response.status().is_success() {
            return Err(BackendError::TokenRejected);
        }

        let body: ValidateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Network(format!("unreadable validation response: {e}")))?;

        if body.success {
            Ok(())
        } else {
            Err(BackendError::TokenRejected)
        }
    }

    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, BackendError> {
        let response = self
            .client
            .get(self.endpoint("users/profile")?)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BackendError::network(&e))?;

        Self::read_json(response).await
    }

    async fn notify_logout(&self, token: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.endpoint("auth/logout")?)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BackendError::network(&e))?;

        Self::expect_success(response).await
    }
}

/// Backend client bound to a bearer token, for per-screen data calls
#[derive(Debug, Clone)]
pub struct AuthorizedApi {
    backend: HttpAuthBackend,
    token: String,
}

impl AuthorizedApi {
    /// GET a JSON resource relative to the backend base URL
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or an
    /// unreadable body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self
            .backend
            .client
            .get(self.backend.endpoint(path)?)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| BackendError::network(&e))?;

        HttpAuthBackend::read_json(response).await
    }

    async fn send_attendant_ids(
        &self,
        method: reqwest::Method,
        pump: PumpId,
        attendants: &[AttendantId],
    ) -> Result<(), BackendError> {
        let url = self.backend.endpoint(&format!("user/pump/{pump}/attendants"))?;
        let response = self
            .backend
            .client
            .request(method, url)
            .bearer_auth(&self.token)
            .json(&AttendantIdsBody {
                attendant_ids: attendants,
            })
            .send()
            .await
            .map_err(|e| BackendError::network(&e))?;

        HttpAuthBackend::expect_success(response).await
    }
}

#[async_trait]
impl PumpAssignmentApi for AuthorizedApi {
    async fn current_pumps(&self, attendant: AttendantId) -> Result<Vec<PumpId>, BackendError> {
        let pumps: Vec<Pump> = self
            .get_json(&format!("user/attendant/{attendant}/pumps"))
            .await?;
        Ok(pumps.into_iter().map(|pump| pump.id).collect())
    }

    async fn assign(&self, pump: PumpId, attendants: &[AttendantId]) -> Result<(), BackendError> {
        self.send_attendant_ids(reqwest::Method::POST, pump, attendants)
            .await
    }

    async fn unassign(&self, pump: PumpId, attendants: &[AttendantId]) -> Result<(), BackendError> {
        self.send_attendant_ids(reqwest::Method::DELETE, pump, attendants)
            .await
    }
}
