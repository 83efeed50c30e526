use std::path::Path;

use crate::AssetError;

/// Decoded RGBA8 image ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl ImageData {
    /// A 1x1 image of a single color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: rgba.to_vec(),
        }
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }
}

/// Decode an image file (PNG or PNM) into RGBA8.
pub fn load_image(path: impl AsRef<Path>) -> Result<ImageData, AssetError> {
    let path = path.as_ref();
    let decoded = image::open(path)?.to_rgba8();
    let (width, height) = decoded.dimensions();
    tracing::debug!(path = %path.display(), width, height, "loaded texture image");
    Ok(ImageData {
        width,
        height,
        rgba: decoded.into_raw(),
    })
}
