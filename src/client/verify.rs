//! HTTP client for the verification endpoint.

use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::errors::{LicenseError, LicenseResult};
use crate::hardware::get_hardware_id;
use crate::protocol::{VerifyRequest, VerifyResponse};

/// Talks to a Keygate server's `POST /api/verify`.
#[derive(Debug, Clone)]
pub struct VerifyClient {
    base_url: String,
    http: Client,
}

impl VerifyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Reuse an existing `reqwest::Client` (timeouts, proxies, TLS settings).
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Verify `key` for an explicit hardware id.
    ///
    /// Business outcomes (valid or not) come back as `Ok`; `Err` means the
    /// request itself failed or was rejected.
    pub async fn verify(&self, key: &str, hwid: &str) -> LicenseResult<VerifyResponse> {
        let resp = self
            .http
            .post(format!("{}/api/verify", self.base_url))
            .json(&VerifyRequest::new(key, hwid))
            .send()
            .await?;

        let status = resp.status();
        debug!(%status, "verify response received");

        match status {
            StatusCode::OK => resp.json::<VerifyResponse>().await.map_err(|e| {
                LicenseError::ServerError(format!("failed to parse verify response: {e}"))
            }),
            StatusCode::BAD_REQUEST => {
                let body = resp.json::<VerifyResponse>().await.ok();
                Err(LicenseError::BadRequest(
                    body.map(|b| b.message)
                        .unwrap_or_else(|| "request rejected".to_string()),
                ))
            }
            other => Err(LicenseError::ServerError(format!(
                "verification failed with HTTP status {other}"
            ))),
        }
    }

    /// Verify `key` for this machine's fingerprint.
    pub async fn verify_this_device(&self, key: &str) -> LicenseResult<VerifyResponse> {
        self.verify(key, &get_hardware_id()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let client = VerifyClient::new("http://localhost:8080/");
        assert_eq!(client.base_url, "http://localhost:8080");
    }
}
