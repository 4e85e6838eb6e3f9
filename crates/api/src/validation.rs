use crate::errors::ApiError;
use image::{DynamicImage, ImageError, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// An upload that decoded as a raster image.
pub struct ValidatedImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub image: DynamicImage,
}

/// Decode `bytes` to confirm they hold an image.
pub fn inspect(bytes: &[u8]) -> Result<ValidatedImage, ApiError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ApiError::InvalidImage(e.to_string()))?;

    let format = reader
        .format()
        .ok_or_else(|| ApiError::InvalidImage("cannot identify image file".to_string()))?;

    let image = reader
        .decode()
        .map_err(|e| ApiError::InvalidImage(e.to_string()))?;

    tracing::info!(
        format = ?format,
        width = image.width(),
        height = image.height(),
        "Verified uploaded image"
    );

    Ok(ValidatedImage {
        format,
        width: image.width(),
        height: image.height(),
        image,
    })
}

/// Overwrite `path` with a baseline RGB JPEG of the decoded image.
pub fn normalize(validated: &ValidatedImage, path: &Path) -> Result<(), ApiError> {
    DynamicImage::ImageRgb8(validated.image.to_rgb8())
        .save_with_format(path, ImageFormat::Jpeg)
        .map_err(|e| match e {
            ImageError::IoError(io) => {
                ApiError::Internal(format!("Failed to write normalized image: {io}"))
            }
            other => ApiError::InvalidImage(other.to_string()),
        })
}

/// Name the container hinted at by the leading magic bytes, for diagnostics.
pub fn sniff(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8]) {
        "jpeg"
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "png"
    } else {
        "unrecognized"
    }
}

pub fn log_rejected_upload(bytes: &[u8], err: &ApiError) {
    let head = &bytes[..bytes.len().min(20)];
    tracing::warn!(
        error = %err,
        leading_bytes = ?head,
        magic = sniff(bytes),
        "Rejected upload that does not decode as an image"
    );
}
