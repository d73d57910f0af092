//! Normalized result of a generate-look call

use serde::{Deserialize, Serialize};

/// Outcome of a generation request; never an error value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Whether the backend produced an image
    pub success: bool,
    /// Composited image as a `data:image/png;base64,` URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Message describing the failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationResult {
    /// Successful result carrying a data URI
    pub fn success(image: impl Into<String>) -> Self {
        Self {
            success: true,
            image: Some(image.into()),
            error: None,
        }
    }

    /// Failed result carrying a message
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            image: None,
            error: Some(error.into()),
        }
    }
}
