//! Recipe images: base64 data URLs in, files under the media root out

use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

const RECIPE_IMAGE_DIR: &str = "recipes";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("Upload a valid image as a base64 data URL.")]
    NotADataUrl,
    #[error("Unsupported image type: {0}.")]
    UnsupportedType(String),
    #[error("The image payload is not valid base64.")]
    InvalidBase64,
    #[error("The submitted image is empty.")]
    Empty,
}

/// Image bytes decoded from a request, not yet stored
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

/// Decode `data:image/<type>;base64,<payload>`
pub fn decode_data_url(value: &str) -> Result<DecodedImage, ImageError> {
    let rest = value.strip_prefix("data:").ok_or(ImageError::NotADataUrl)?;
    let (media_type, payload) = rest
        .split_once(";base64,")
        .ok_or(ImageError::NotADataUrl)?;

    let extension = match media_type.to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        other => return Err(ImageError::UnsupportedType(other.to_string())),
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| ImageError::InvalidBase64)?;
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }

    Ok(DecodedImage { extension, bytes })
}

/// Local media storage served under the media URL prefix
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        let mut url_prefix = url_prefix.to_string();
        if !url_prefix.ends_with('/') {
            url_prefix.push('/');
        }
        Self {
            root: root.into(),
            url_prefix,
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Write a recipe image and return its path relative to the media root
    pub async fn save_recipe_image(&self, image: &DecodedImage) -> Result<String> {
        let dir = self.root.join(RECIPE_IMAGE_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create media directory {}", dir.display()))?;

        let file_name = format!("{}.{}", Uuid::new_v4(), image.extension);
        let path = dir.join(&file_name);
        tokio::fs::write(&path, &image.bytes)
            .await
            .with_context(|| format!("Failed to write image {}", path.display()))?;

        info!("Stored recipe image {}", path.display());
        Ok(format!("{}/{}", RECIPE_IMAGE_DIR, file_name))
    }

    /// Remove a stored image; a missing file is only logged
    pub async fn remove(&self, relative_path: &str) {
        if relative_path.is_empty() || relative_path.contains("..") {
            return;
        }
        let path = self.root.join(relative_path);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("Failed to remove image {}: {}", path.display(), e);
        }
    }

    /// Router path media is served under, when the prefix is a local path
    pub fn mount_path(&self) -> Option<&str> {
        let path = self.url_prefix.trim_end_matches('/');
        (path.starts_with('/') && path.len() > 1).then_some(path)
    }

    /// Public URL of a stored file
    pub fn url(&self, relative_path: &str) -> String {
        format!("{}{}", self.url_prefix, relative_path)
    }
}
