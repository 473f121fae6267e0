use std::fmt;
use std::fs;
use std::path::Path;

use super::manager::{DataManager, StoreError};
use crate::constants::{IMAGES_DIR, MAX_IMAGE_SIZE, SUPPORTED_IMAGE_FORMATS};
use crate::quiz::Subject;

/// Which picture of a question an image file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Main,
    Option(usize),
    Passage,
}

impl fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSlot::Main => write!(f, "main"),
            ImageSlot::Option(index) => write!(f, "option_{index}"),
            ImageSlot::Passage => write!(f, "passage"),
        }
    }
}

/// `q<id>_<slot><ext>`, where `ext` keeps its leading dot.
pub fn image_file_name(question_id: u32, slot: ImageSlot, ext: &str) -> String {
    format!("q{question_id}_{slot}{ext}")
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|ext| SUPPORTED_IMAGE_FORMATS.contains(&ext.as_str()))
}

impl DataManager {
    /// Check that `path` is an image this tool accepts. Returns its size in bytes.
    pub fn validate_image_file(&self, path: &Path) -> Result<u64, StoreError> {
        if !path.is_file() {
            return Err(StoreError::FileNotFound(path.to_path_buf()));
        }
        if !is_supported(path) {
            return Err(StoreError::UnsupportedImageFormat {
                extension: extension(path).unwrap_or_default(),
            });
        }
        let size = fs::metadata(path)?.len();
        if size > MAX_IMAGE_SIZE {
            return Err(StoreError::ImageTooLarge {
                size_mb: size as f64 / (1024.0 * 1024.0),
            });
        }
        Ok(size)
    }

    /// Copy an image into the subject's folder under its canonical name.
    ///
    /// Returns the path to store in the question, relative to the data root
    /// and always written with forward slashes.
    pub fn copy_image_to_subject(
        &self,
        source: &Path,
        subject: &str,
        question_id: u32,
        slot: ImageSlot,
    ) -> Result<String, StoreError> {
        self.validate_image_file(source)?;

        let ext = source
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let file_name = image_file_name(question_id, slot, &ext);

        let dir = self.images_dir(subject);
        fs::create_dir_all(&dir)?;
        fs::copy(source, dir.join(&file_name))?;
        tracing::debug!(?source, subject, %file_name, "copied image");

        Ok(format!("{IMAGES_DIR}/{subject}/{file_name}"))
    }

    /// Delete an image by its stored relative path. Returns false if there was nothing to delete.
    pub fn delete_image(&self, image_path: &str) -> Result<bool, StoreError> {
        let path = self.sub_path(image_path);
        if !path.is_file() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        Ok(true)
    }

    /// Delete every `q<id>_*` file in the subject's images folder.
    pub fn delete_question_images(&self, subject: &str, question_id: u32) -> Result<usize, StoreError> {
        let dir = self.images_dir(subject);
        if !dir.is_dir() {
            return Ok(0);
        }

        let prefix = format!("q{question_id}_");
        let mut deleted = 0;
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                fs::remove_file(entry.path())?;
                tracing::debug!(path = ?entry.path(), "deleted image");
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Delete image files in the subject's folder that no question refers to.
    ///
    /// Only files with a supported image extension are considered.
    pub fn cleanup_unused_images(&self, subject: &Subject) -> Result<usize, StoreError> {
        let dir = self.images_dir(subject.name());
        if !dir.is_dir() {
            return Ok(0);
        }

        let used: Vec<String> = subject
            .image_paths()
            .iter()
            .map(|path| path.replace('\\', "/"))
            .collect();

        let mut deleted = 0;
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if !is_supported(&path) {
                continue;
            }
            let relative = format!(
                "{IMAGES_DIR}/{}/{}",
                subject.name(),
                entry.file_name().to_string_lossy()
            );
            if used.contains(&relative) {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => deleted += 1,
                Err(err) => tracing::warn!(?path, %err, "could not delete unused image"),
            }
        }
        if deleted > 0 {
            tracing::info!(subject = subject.name(), deleted, "removed unused images");
        }
        Ok(deleted)
    }
}
