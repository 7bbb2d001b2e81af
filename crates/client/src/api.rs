//! REST client for the registration service endpoints.
//!
//! Wraps `GET /alunos/check-nome` (name-collision lookup) and
//! `POST /alunos` (enrollment submission) using [`reqwest`].

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use turmas_core::controller::{RegistrationService, SubmitReceipt};
use turmas_core::form::EnrollmentPayload;
use turmas_core::lookup::body_is_truthy;

use crate::config::ClientConfig;

/// Header carrying the per-form idempotency key on submissions.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// HTTP client for one registration service deployment.
#[derive(Debug, Clone)]
pub struct RegistrationApi {
    client: reqwest::Client,
    api_url: String,
}

/// Errors from the registration REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Registration API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl RegistrationApi {
    /// Create a client for the service at `api_url`, e.g.
    /// `http://localhost:8080`.
    pub fn new(api_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    /// Create a client from loaded configuration, applying its timeout.
    pub fn from_config(config: &ClientConfig) -> Result<Self, RegistrationApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, config.api_url.clone()))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Ask whether a child with `name` is already registered.
    ///
    /// Sends `GET /alunos/check-nome?nome=<name>`. Blank names are answered
    /// locally with `false` and no request is made.
    pub async fn check_name_exists(&self, name: &str) -> Result<bool, RegistrationApiError> {
        if name.trim().is_empty() {
            return Ok(false);
        }

        let response = self
            .client
            .get(format!("{}/alunos/check-nome", self.api_url))
            .query(&[("nome", name)])
            .send()
            .await?;

        let body = Self::ensure_success(response).await?.text().await?;
        let exists = body_is_truthy(&body);
        tracing::debug!(exists, "Name lookup answered");
        Ok(exists)
    }

    /// Register a child.
    ///
    /// Sends `POST /alunos` with the JSON payload and the idempotency key
    /// header. Any 2xx status is success; the body is returned as JSON when
    /// it parses, `null` otherwise.
    pub async fn submit(
        &self,
        payload: &EnrollmentPayload,
        idempotency_key: Uuid,
    ) -> Result<SubmitReceipt, RegistrationApiError> {
        let response = self
            .client
            .post(format!("{}/alunos", self.api_url))
            .header(IDEMPOTENCY_HEADER, idempotency_key.to_string())
            .json(payload)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::Null);

        tracing::info!(status, "Registration service accepted enrollment");
        Ok(SubmitReceipt {
            status,
            body,
            received_at: Utc::now(),
        })
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a
    /// [`RegistrationApiError::ApiError`] with the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, RegistrationApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RegistrationApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RegistrationService for RegistrationApi {
    type Error = RegistrationApiError;

    async fn check_name_exists(&self, name: &str) -> Result<bool, Self::Error> {
        RegistrationApi::check_name_exists(self, name).await
    }

    async fn submit(
        &self,
        payload: &EnrollmentPayload,
        idempotency_key: Uuid,
    ) -> Result<SubmitReceipt, Self::Error> {
        RegistrationApi::submit(self, payload, idempotency_key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = RegistrationApiError::ApiError {
            status: 409,
            body: "duplicate".into(),
        };
        assert_eq!(err.to_string(), "Registration API error (409): duplicate");
    }

    #[test]
    fn request_error_display() {
        let req_err = reqwest::Client::new().get("://bad").build().unwrap_err();
        let err = RegistrationApiError::Request(req_err);
        assert!(err.to_string().contains("HTTP request failed"));
    }

    #[tokio::test]
    async fn blank_name_makes_no_request() {
        // Nothing listens on this port; a request would fail.
        let api = RegistrationApi::new("http://127.0.0.1:9".into());
        assert!(!api.check_name_exists("   ").await.unwrap());
    }

    #[test]
    fn from_config_uses_configured_url() {
        let config = ClientConfig {
            api_url: "https://turmas.example.org".into(),
            request_timeout_secs: 5,
        };
        let api = RegistrationApi::from_config(&config).unwrap();
        assert_eq!(api.api_url(), "https://turmas.example.org");
    }
}
