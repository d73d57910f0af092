//! `data:` URI encoding used for generated and fetched images.

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Return the payload after the first comma, or the input unchanged
pub fn strip_data_uri_prefix(value: &str) -> &str {
    value.split_once(',').map_or(value, |(_, payload)| payload)
}

/// Wrap an already-encoded base64 payload in a data URI
pub fn to_data_uri(mime: &str, base64: &str) -> String {
    format!("data:{mime};base64,{base64}")
}

/// Encode raw bytes as a data URI
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    to_data_uri(mime, &STANDARD.encode(bytes))
}

/// Decode a base64 data URI into its MIME type and bytes
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let Some(rest) = uri.strip_prefix("data:") else {
        bail!("Not a data URI");
    };
    let (header, payload) = rest.split_once(',').context("Data URI has no payload")?;
    let Some(mime) = header.strip_suffix(";base64") else {
        bail!("Only base64 data URIs are supported");
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .context("Invalid base64 in data URI")?;
    Ok((mime.to_string(), bytes))
}
