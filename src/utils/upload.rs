//! Multipart image uploads for school logos and class images.

use axum::extract::Multipart;
use axum::http::StatusCode;
use chrono::Utc;
use schoolhub_core::AppError;
use uuid::Uuid;

pub const FILE_FIELD: &str = "file";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Detects the format from the file's magic bytes; the client's
    /// content type is not trusted.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::WebP)
        } else {
            None
        }
    }
}

#[derive(Debug)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl ImageUpload {
    /// Storage key such as `schools/<id>-<millis>.png`.
    pub fn storage_key(&self, prefix: &str, owner_id: Uuid) -> String {
        format!(
            "{}/{}-{}.{}",
            prefix,
            owner_id,
            Utc::now().timestamp_millis(),
            self.format.extension()
        )
    }
}

fn too_large(max_bytes: usize) -> AppError {
    AppError::new(
        StatusCode::PAYLOAD_TOO_LARGE,
        anyhow::anyhow!("Image exceeds the maximum size of {} bytes", max_bytes),
    )
}

/// Reads the `file` field of a multipart body and validates it as an image.
pub async fn read_image(mut multipart: Multipart, max_bytes: usize) -> Result<ImageUpload, AppError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::bad_request(anyhow::anyhow!("Failed to read upload: {}", e)))?
        {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(too_large(max_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }

        return validate_image(bytes, max_bytes);
    }

    Err(AppError::bad_request(anyhow::anyhow!(
        "Multipart field '{}' is required",
        FILE_FIELD
    )))
}

pub fn validate_image(bytes: Vec<u8>, max_bytes: usize) -> Result<ImageUpload, AppError> {
    if bytes.is_empty() {
        return Err(AppError::bad_request(anyhow::anyhow!("Uploaded file is empty")));
    }
    if bytes.len() > max_bytes {
        return Err(too_large(max_bytes));
    }

    let format = ImageFormat::detect(&bytes).ok_or_else(|| {
        AppError::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            anyhow::anyhow!("Only PNG, JPEG and WebP images are accepted"),
        )
    })?;

    Ok(ImageUpload { bytes, format })
}
