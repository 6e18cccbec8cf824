// src/services/uploads.rs

//! Profile photo and CV uploads.
//!
//! Extension and size are checked locally before any bytes leave the
//! process. Objects are stored under `{user_id}/{millis}.{ext}`.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::UploadConfig;
use crate::store::FileStore;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

const CV_TYPES: [(&str, &str); 3] = [
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
];

pub struct Uploader {
    files: Arc<dyn FileStore>,
    limits: UploadConfig,
}

impl Uploader {
    pub fn new(files: Arc<dyn FileStore>, limits: UploadConfig) -> Self {
        Self { files, limits }
    }

    /// Upload a profile photo, replacing any object at the same path.
    /// Returns its public URL.
    pub async fn upload_photo(&self, user_id: &str, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let ext = extension(file_name)
            .filter(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| {
                AppError::validation("Only image formats are allowed (jpg, jpeg, png, webp)")
            })?;
        if bytes.len() > self.limits.max_photo_bytes {
            return Err(AppError::validation(format!(
                "Photo must be smaller than {}",
                format_size(self.limits.max_photo_bytes)
            )));
        }

        let path = object_path(user_id, &ext);
        let content_type = format!("image/{}", ext);
        log::debug!("Uploading photo to {}/{}", self.limits.photo_bucket, path);
        let url = self
            .files
            .upload(&self.limits.photo_bucket, &path, bytes, &content_type, true)
            .await?;
        log::info!("Uploaded profile photo for {}", user_id);
        Ok(url)
    }

    /// Upload a CV. Returns its public URL.
    pub async fn upload_cv(&self, user_id: &str, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let (ext, content_type) = extension(file_name)
            .and_then(|ext| {
                CV_TYPES
                    .iter()
                    .find(|(allowed, _)| *allowed == ext)
                    .map(|(_, mime)| (ext, *mime))
            })
            .ok_or_else(|| AppError::validation("Only PDF, DOC or DOCX files are allowed"))?;
        if bytes.len() > self.limits.max_cv_bytes {
            return Err(AppError::validation(format!(
                "CV must be smaller than {}",
                format_size(self.limits.max_cv_bytes)
            )));
        }

        let path = object_path(user_id, &ext);
        log::debug!("Uploading CV to {}/{}", self.limits.cv_bucket, path);
        let url = self
            .files
            .upload(&self.limits.cv_bucket, &path, bytes, content_type, false)
            .await?;
        log::info!("Uploaded CV for {}", user_id);
        Ok(url)
    }

    /// Read a CV from disk and upload it.
    pub async fn upload_cv_file(&self, user_id: &str, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::validation("Only PDF, DOC or DOCX files are allowed"))?;
        // Reject by name and size before reading
        if extension(file_name).is_none_or(|ext| !CV_TYPES.iter().any(|(e, _)| *e == ext)) {
            return Err(AppError::validation("Only PDF, DOC or DOCX files are allowed"));
        }
        let size = tokio::fs::metadata(path).await?.len();
        if !usize::try_from(size).is_ok_and(|size| size <= self.limits.max_cv_bytes) {
            return Err(AppError::validation(format!(
                "CV must be smaller than {}",
                format_size(self.limits.max_cv_bytes)
            )));
        }
        let bytes = tokio::fs::read(path).await?;
        self.upload_cv(user_id, file_name, bytes).await
    }
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

fn object_path(user_id: &str, ext: &str) -> String {
    format!("{}/{}.{}", user_id, Utc::now().timestamp_millis(), ext)
}

fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 && bytes % (1024 * 1024) == 0 {
        format!("{}MB", bytes / (1024 * 1024))
    } else {
        format!("{}KB", bytes.div_ceil(1024))
    }
}
