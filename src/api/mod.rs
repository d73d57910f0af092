//! Client for the try-on backend
//!
//! Every operation is a single request/response cycle with no retry. Failures
//! never escape as errors: generation returns a [`GenerationResult`], image
//! fetches return `None`, health checks return `false`.
//!
//! [`GenerationResult`]: crate::models::GenerationResult

mod client;

pub use client::{ApiClient, ApiError, error_message_from_body};

/// Backend routes, relative to the configured base URL
pub mod endpoints {
    /// Multipart POST producing a composited look
    pub const GENERATE_LOOK: &str = "/generate-look";
    /// GET proxy for remote images (`?url=`)
    pub const FETCH_IMAGE: &str = "/fetch-image";
    /// POST exchanging a provider token for a backend token
    pub const EXCHANGE_TOKEN: &str = "/exchange-token";
    /// GET liveness probe
    pub const HEALTH: &str = "/health";
}
