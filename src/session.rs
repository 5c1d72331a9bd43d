//! HTTP transport for one portal session.
//!
//! A [`Transport`] owns the cookie jar for the whole flow. This is not an
//! optimization: the portal ties its state tokens to a server-side session
//! keyed by cookie, so every request in a flow must go through the same
//! client. Dropping the transport releases the connection pool.

use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, StatusCode};

use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// A portal response: status, the content-disposition header if the server
/// returned a file, and the raw body.
#[derive(Debug, Clone)]
pub struct PortalResponse {
    status: StatusCode,
    content_disposition: Option<String>,
    body: Vec<u8>,
}

impl PortalResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Present when the server returned a downloadable file rather than an
    /// HTML page.
    pub fn content_disposition(&self) -> Option<&str> {
        self.content_disposition.as_deref()
    }

    /// Body decoded as UTF-8 (lossy). The portal's form pages are ASCII.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }
}

/// One authenticated HTTP session against the portal.
pub struct Transport {
    client: Client,
    base_url: String,
}

impl Transport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .timeout(config.request_timeout)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Result<PortalResponse> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::into_portal_response(path, response).await
    }

    /// POST `fields` as an urlencoded form, preserving field order. The
    /// portal rejects submissions whose sentinel fields are missing, so
    /// callers pass the complete ordered set every time.
    pub async fn post(&self, path: &str, fields: &[(String, String)]) -> Result<PortalResponse> {
        let response = self
            .client
            .post(self.url(path))
            .form(&fields)
            .send()
            .await?;
        Self::into_portal_response(path, response).await
    }

    async fn into_portal_response(
        path: &str,
        response: reqwest::Response,
    ) -> Result<PortalResponse> {
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await?.to_vec();

        Ok(PortalResponse {
            status,
            content_disposition,
            body,
        })
    }
}
