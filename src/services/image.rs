use base64::{engine::general_purpose, Engine};
use std::io::ErrorKind;
use std::path::Path;

use crate::error::AnalysisError;
use crate::models::EncodedImage;

/// Every image is sent as JPEG; content is not sniffed.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Read a local image once and base64-encode it.
pub async fn load_image(path: &Path) -> Result<EncodedImage, AnalysisError> {
    if path.as_os_str().is_empty() {
        return Err(AnalysisError::Input("image path is empty".to_string()));
    }

    let display = path.display().to_string();
    log::debug!("📸 Loading image: {}", display);

    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(AnalysisError::NotFound(display));
        }
        Err(e) => {
            return Err(AnalysisError::Read {
                path: display,
                reason: e.to_string(),
            });
        }
    };

    if !metadata.is_file() {
        return Err(AnalysisError::Read {
            path: display,
            reason: "not a regular file".to_string(),
        });
    }

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => AnalysisError::NotFound(display.clone()),
        _ => AnalysisError::Read {
            path: display.clone(),
            reason: e.to_string(),
        },
    })?;

    if bytes.is_empty() {
        return Err(AnalysisError::Read {
            path: display,
            reason: "file is empty".to_string(),
        });
    }

    Ok(encode_image(&bytes))
}

/// Encode image bytes already held in memory.
pub fn encode_bytes(bytes: &[u8]) -> Result<EncodedImage, AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::Input("image data is empty".to_string()));
    }
    Ok(encode_image(bytes))
}

fn encode_image(bytes: &[u8]) -> EncodedImage {
    let data = general_purpose::STANDARD.encode(bytes);

    log::debug!("📊 Image size: {} bytes", bytes.len());
    log::debug!("🔄 Base64 encoded size: {} bytes", data.len());

    EncodedImage {
        data,
        mime_type: IMAGE_MIME_TYPE,
        byte_len: bytes.len(),
    }
}
