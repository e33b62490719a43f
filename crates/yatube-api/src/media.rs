use std::path::{Path, PathBuf};

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

/// 5 MB limit for decoded post images
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Sub-directory of the media root that post images land in.
const POSTS_DIR: &str = "posts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Gif,
    Png,
    Jpeg,
    Webp,
    Bmp,
}

impl ImageKind {
    /// Sniffs the format from magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            [b'B', b'M', ..] => Some(Self::Bmp),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
        }
    }
}

/// A validated upload, ready to be written.
#[derive(Debug)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
}

/// Decodes and validates a base64 image field. The error is the message
/// shown next to the form field.
pub fn decode_image(encoded: &str) -> Result<ImageUpload, &'static str> {
    let bytes = B64
        .decode(encoded.trim())
        .map_err(|_| "The submitted data was not a file.")?;

    if bytes.is_empty() {
        return Err("The submitted file is empty.");
    }
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err("The submitted file is too large.");
    }

    let kind = ImageKind::detect(&bytes).ok_or(
        "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
    )?;

    Ok(ImageUpload { bytes, kind })
}

/// Writes post images below the media root.
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Saves the image under a fresh name and returns its media-relative path.
    pub async fn save_post_image(&self, upload: &ImageUpload) -> anyhow::Result<String> {
        let dir = self.root.join(POSTS_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create media directory {}", dir.display()))?;

        let name = format!("{}.{}", Uuid::new_v4(), upload.kind.extension());
        let file_path = dir.join(&name);
        let mut file = tokio::fs::File::create(&file_path)
            .await
            .with_context(|| format!("Failed to create file {}", file_path.display()))?;
        file.write_all(&upload.bytes)
            .await
            .with_context(|| format!("Failed to write file {}", file_path.display()))?;
        file.flush().await?;

        debug!("Stored post image {} ({} bytes)", file_path.display(), upload.bytes.len());
        Ok(format!("{POSTS_DIR}/{name}"))
    }
}
