//! Data models for Zyora

mod generation;
mod image;
mod look;
mod profile;

pub use generation::GenerationResult;
pub use image::{ImageAsset, ImageKind};
pub use look::{MAX_SAVED_LOOKS, SavedLook, prepend_capped};
pub use profile::{ProfileEdit, ProviderProfile, UserProfile};
