use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;

use crate::config::LokiConfig;
use crate::encode::EncodedPayload;
pub use crate::error::DeliveryError;

/// HTTP client for the Loki push endpoint.
///
/// `Content-Type: application/json` and the request timeout are part of the
/// transport configuration; per-request headers come from the payload.
#[derive(Clone)]
pub struct PushClient {
    client: Client,
    url: String,
    auth: Option<(String, String)>,
}

impl PushClient {
    pub fn new(config: &LokiConfig) -> Result<Self, DeliveryError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        let auth = config
            .has_auth()
            .then(|| (config.auth_user.clone(), config.auth_password.clone()));

        Ok(PushClient {
            client,
            url: config.push_url.clone(),
            auth,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST one encoded batch.
    ///
    /// **Returns**
    /// - `Ok(())` on any 2xx response.
    /// - `Err(DeliveryError::Status { .. })` with the status code and the
    ///   response body verbatim for any other status.
    /// - `Err(DeliveryError::Transport(..))` if the request never got an
    ///   answer (connection refused, DNS, timeout).
    pub async fn push(&self, payload: EncodedPayload) -> Result<(), DeliveryError> {
        let mut req = self
            .client
            .post(&self.url)
            .headers(payload.headers)
            .body(payload.body);

        if let Some((user, password)) = &self.auth {
            req = req.basic_auth(user, Some(password));
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            // A failed body read surfaces as `Transport`.
            let body = resp.bytes().await?;
            let body = String::from_utf8_lossy(&body).into_owned();
            Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}
