//! Try-on generation workflow

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::api::ApiClient;
use crate::app::AppStore;
use crate::images;
use crate::models::{ImageAsset, SavedLook};

/// Why a generation did not produce a look
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Subject or garment image is not staged
    #[error("Both a subject and a garment image are required")]
    MissingImages,

    /// The free tier is used up
    #[error("Free quota exhausted ({used}/{max} looks used)")]
    QuotaExceeded {
        /// Generations already used
        used: u32,
        /// Generations allowed
        max: u32,
    },

    /// A staged image could not be read
    #[error("Failed to read image: {0}")]
    ImageSource(String),

    /// The backend rejected or failed the request
    #[error("{0}")]
    Service(String),
}

/// Generate a look from the staged images
///
/// On success the quota is incremented and the look is saved to the gallery.
/// Nothing changes on failure.
pub async fn run(store: &mut AppStore, api: &ApiClient) -> Result<SavedLook, GenerateError> {
    let state = store.state();
    let (Some(user_img), Some(fit_img)) = (state.user_img.clone(), state.fit_img.clone()) else {
        return Err(GenerateError::MissingImages);
    };

    if let Some(user) = &state.user {
        if !user.has_quota() {
            return Err(GenerateError::QuotaExceeded {
                used: user.quota,
                max: user.max_quota,
            });
        }
    }

    let (user_b64, fit_b64) =
        tokio::try_join!(resolve_base64(api, &user_img), resolve_base64(api, &fit_img))?;

    let token = store.access_token();
    let result = api
        .generate_look(&user_b64, &fit_b64, token.as_deref())
        .await;

    match result.image {
        Some(image) if result.success => {
            let look = SavedLook::new(image).with_sources(&user_img.uri, &fit_img.uri);
            store.increment_quota();
            store.add_saved_look(look.clone());
            tracing::info!("Generated look {}", look.id);
            Ok(look)
        }
        _ => {
            let message = result
                .error
                .unwrap_or_else(|| "Failed to generate look".to_string());
            tracing::error!("Generation failed: {message}");
            Err(GenerateError::Service(message))
        }
    }
}

async fn resolve_base64(api: &ApiClient, asset: &ImageAsset) -> Result<String, GenerateError> {
    if let Some(cached) = asset.cached_base64() {
        return Ok(cached.to_string());
    }
    api.image_source_to_base64(&asset.uri)
        .await
        .map_err(|e| GenerateError::ImageSource(format!("{e:#}")))
}

/// Write a look's image into `dir` as `zyora-look-<millis>.png`
pub fn save_look_image(image: &str, dir: &Path) -> Result<PathBuf> {
    let (_, bytes) = images::decode_data_uri(image).context("Look image is not a data URI")?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(format!(
        "zyora-look-{}.png",
        chrono::Utc::now().timestamp_millis()
    ));
    std::fs::write(&path, bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}
