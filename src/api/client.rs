//! HTTP client for the generate, fetch-image, token-exchange and health routes.

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::endpoints;
use crate::config::Config;
use crate::images;
use crate::models::GenerationResult;

/// Message used when the backend gives no usable reason
const GENERATE_FAILED: &str = "Failed to generate look";

/// Internal failure of a backend call, normalized before it reaches callers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport or HTTP client failure
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("{0}")]
    Service(String),

    /// Image payload was not valid base64
    #[error("Invalid {0} image payload")]
    InvalidImage(&'static str),

    /// Success response without an image
    #[error("No image returned from server")]
    MissingImage,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Debug, Serialize)]
struct ExchangeTokenRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeTokenResponse {
    custom_token: Option<String>,
}

/// Extract the failure message from a non-success body
///
/// A JSON body contributes its `error` field; anything else is used verbatim.
pub fn error_message_from_body(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => parsed
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| GENERATE_FAILED.to_string()),
        Err(_) if body.trim().is_empty() => GENERATE_FAILED.to_string(),
        Err(_) => body.to_string(),
    }
}

fn image_part(base64: &str, which: &'static str, file_name: &'static str) -> Result<Part, ApiError> {
    let bytes = STANDARD
        .decode(images::strip_data_uri_prefix(base64).trim())
        .map_err(|_| ApiError::InvalidImage(which))?;
    Ok(Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("image/jpeg")?)
}

/// Try-on backend client
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the backend at `base_url`
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(format!("zyora/{}", crate::VERSION))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client for the configured backend
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url)
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a backend URL
    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Generate a try-on look from a subject and a garment image
    ///
    /// Both images are base64 payloads, with or without a `data:` prefix.
    pub async fn generate_look(
        &self,
        user_image_base64: &str,
        fit_image_base64: &str,
        auth_token: Option<&str>,
    ) -> GenerationResult {
        match self
            .try_generate_look(user_image_base64, fit_image_base64, auth_token)
            .await
        {
            Ok(image) => GenerationResult::success(images::to_data_uri("image/png", &image)),
            Err(e) => {
                tracing::error!("Generate look error: {e}");
                GenerationResult::failure(e.to_string())
            }
        }
    }

    async fn try_generate_look(
        &self,
        user_image_base64: &str,
        fit_image_base64: &str,
        auth_token: Option<&str>,
    ) -> Result<String, ApiError> {
        let form = Form::new()
            .part("userImgs", image_part(user_image_base64, "subject", "user.jpg")?)
            .part("fitImg", image_part(fit_image_base64, "garment", "fit.jpg")?);

        let mut request = self
            .client
            .post(self.url(endpoints::GENERATE_LOOK))
            .multipart(form);
        if let Some(token) = auth_token {
            request = request.bearer_auth(token);
        }

        tracing::debug!("POST {}", endpoints::GENERATE_LOOK);
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Generate look failed with {status}");
            return Err(ApiError::Service(error_message_from_body(&body)));
        }

        let data: GenerateResponse = response.json().await?;
        data.image
            .filter(|image| !image.is_empty())
            .ok_or(ApiError::MissingImage)
    }

    /// Fetch a remote image through the backend proxy, as a data URI
    pub async fn fetch_image_from_url(&self, image_url: &str) -> Option<String> {
        match self.try_fetch_image(image_url).await {
            Ok(uri) => Some(uri),
            Err(e) => {
                tracing::warn!("Fetch image error for {image_url}: {e:#}");
                None
            }
        }
    }

    async fn try_fetch_image(&self, image_url: &str) -> Result<String> {
        let url = format!(
            "{}?url={}",
            self.url(endpoints::FETCH_IMAGE),
            urlencoding::encode(image_url)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch image")?;

        if !response.status().is_success() {
            bail!("Failed to fetch image: HTTP {}", response.status());
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.context("Failed to read image body")?;

        let mime = images::resolve_mime(content_type.as_deref(), &bytes);
        Ok(images::encode_data_uri(&mime, &bytes))
    }

    /// Whether the backend reports itself healthy
    pub async fn check_health(&self) -> bool {
        let response = match self.client.get(self.url(endpoints::HEALTH)).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Health check failed: {e}");
                return false;
            }
        };

        response
            .json::<HealthResponse>()
            .await
            .is_ok_and(|health| health.status == "ok")
    }

    /// Exchange a provider access token for a backend custom token
    pub async fn exchange_token(&self, token: &str) -> Option<String> {
        match self.try_exchange_token(token).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Token exchange error: {e:#}");
                None
            }
        }
    }

    async fn try_exchange_token(&self, token: &str) -> Result<Option<String>> {
        let response = self
            .client
            .post(self.url(endpoints::EXCHANGE_TOKEN))
            .json(&ExchangeTokenRequest { token })
            .send()
            .await
            .context("Token exchange request failed")?;

        if !response.status().is_success() {
            bail!("Token exchange failed: HTTP {}", response.status());
        }

        let data: ExchangeTokenResponse = response
            .json()
            .await
            .context("Failed to parse token exchange response")?;
        Ok(data.custom_token)
    }

    /// Resolve an image reference to a bare base64 payload
    ///
    /// Accepts `data:` URIs, `file://` URIs or local paths, and `http(s)` URLs.
    pub async fn image_source_to_base64(&self, source: &str) -> Result<String> {
        if source.starts_with("data:") {
            return Ok(images::strip_data_uri_prefix(source).to_string());
        }

        if let Some(path) = source.strip_prefix("file://") {
            return read_file_base64(Path::new(path));
        }

        let lower = source.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let response = self
                .client
                .get(source)
                .send()
                .await
                .context("Failed to fetch image from URL")?;
            if !response.status().is_success() {
                bail!("Failed to fetch image from URL: HTTP {}", response.status());
            }
            let bytes = response
                .bytes()
                .await
                .context("Failed to fetch image from URL")?;
            return Ok(STANDARD.encode(bytes));
        }

        let path = Path::new(source);
        if path.exists() {
            return read_file_base64(path);
        }

        bail!("Unsupported image source: {source}")
    }
}

fn read_file_base64(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image file {}", path.display()))?;
    Ok(STANDARD.encode(bytes))
}
