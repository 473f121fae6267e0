use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;

use super::stats::SubjectStats;
use crate::constants::{
    BACKUP_MARKER, IMAGES_DIR, QUESTIONS_DIR, QUESTIONS_FILE_PREFIX, QUESTIONS_FILE_SUFFIX,
};
use crate::quiz::document::{self, LoadError, MigrationReport};
use crate::quiz::validate::{validate_subject_name, ValidationError};
use crate::quiz::Subject;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not read {}: {source}", .path.display())]
    Load { path: PathBuf, source: LoadError },

    #[error("Could not serialize subject: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("File does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Subject '{0}' already exists")]
    SubjectExists(String),

    #[error("Subject '{0}' not found")]
    SubjectNotFound(String),

    #[error(transparent)]
    InvalidName(#[from] ValidationError),

    #[error("Unsupported format '{extension}'. Use: {}", supported_formats())]
    UnsupportedImageFormat { extension: String },

    #[error("File too large ({size_mb:.1}MB). Max 5MB allowed")]
    ImageTooLarge { size_mb: f64 },
}

fn supported_formats() -> String {
    crate::constants::SUPPORTED_IMAGE_FORMATS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Subject files and their images under one data root.
///
/// ```text
/// <root>/questions/questions-<subject>.json
/// <root>/images/<subject>/q<id>_<slot>.<ext>
/// ```
#[derive(Clone, Debug)]
pub struct DataManager {
    root: PathBuf,
}

impl DataManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn sub_path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    pub fn questions_dir(&self) -> PathBuf {
        self.sub_path(QUESTIONS_DIR)
    }

    pub fn images_dir(&self, subject: &str) -> PathBuf {
        self.sub_path(IMAGES_DIR).join(subject)
    }

    pub fn subject_path(&self, subject: &str) -> PathBuf {
        self.questions_dir()
            .join(format!("{QUESTIONS_FILE_PREFIX}{subject}{QUESTIONS_FILE_SUFFIX}"))
    }

    /// Subject name to file path for every `questions-<name>.json` in the questions folder.
    ///
    /// The folder is created if it does not exist yet.
    pub fn discover_subjects(&self) -> Result<BTreeMap<String, PathBuf>, StoreError> {
        let dir = self.questions_dir();
        fs::create_dir_all(&dir)?;

        let mut subjects = BTreeMap::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name
                .to_str()
                .and_then(|f| f.strip_prefix(QUESTIONS_FILE_PREFIX))
                .and_then(|f| f.strip_suffix(QUESTIONS_FILE_SUFFIX))
            else {
                continue;
            };
            if entry.file_type()?.is_file() {
                subjects.insert(name.to_string(), entry.path());
            }
        }
        tracing::debug!(?dir, count = subjects.len(), "discovered subjects");
        Ok(subjects)
    }

    pub fn load_subject(&self, name: &str) -> Result<Subject, StoreError> {
        let path = self.subject_path(name);
        if !path.is_file() {
            return Err(StoreError::SubjectNotFound(name.to_string()));
        }
        self.load_subject_file(name, &path)
    }

    pub fn load_subject_file(&self, name: &str, path: &Path) -> Result<Subject, StoreError> {
        tracing::trace!(?path, "loading subject");
        let raw = fs::read_to_string(path)?;
        document::load(&raw, name, &path.to_string_lossy()).map_err(|source| StoreError::Load {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the whole subject to its file. The subject is serialized before the file is touched.
    pub fn save_subject(&self, subject: &Subject) -> Result<(), StoreError> {
        let content = document::save(subject)?;
        fs::write(subject.filename(), content)?;
        tracing::debug!(subject = subject.name(), file = subject.filename(), "saved subject");
        Ok(())
    }

    /// Create an empty subject file and its images folder.
    pub fn create_subject(&self, name: &str) -> Result<Subject, StoreError> {
        validate_subject_name(name)?;
        fs::create_dir_all(self.questions_dir())?;

        let path = self.subject_path(name);
        if path.exists() {
            return Err(StoreError::SubjectExists(name.to_string()));
        }

        let subject = Subject::new(name, path.to_string_lossy());
        self.save_subject(&subject)?;
        fs::create_dir_all(self.images_dir(name))?;
        tracing::info!(subject = name, "created subject");
        Ok(subject)
    }

    pub fn delete_subject(&self, subject: &Subject, delete_images: bool) -> Result<(), StoreError> {
        let path = Path::new(subject.filename());
        if path.exists() {
            fs::remove_file(path)?;
        }
        if delete_images {
            let images = self.images_dir(subject.name());
            if images.exists() {
                fs::remove_dir_all(&images)?;
            }
        }
        tracing::info!(subject = subject.name(), delete_images, "deleted subject");
        Ok(())
    }

    /// Copy the subject file to `<file>.backup_<YYYYmmdd_HHMMSS>` and return the copy's path.
    pub fn backup_subject(&self, subject: &Subject) -> Result<PathBuf, StoreError> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let backup = PathBuf::from(format!("{}{BACKUP_MARKER}{timestamp}", subject.filename()));
        fs::copy(subject.filename(), &backup)?;
        tracing::info!(subject = subject.name(), ?backup, "backed up subject");
        Ok(backup)
    }

    /// Check that a file is a subject document: a JSON object with a `questions` array.
    pub fn validate_json_file(&self, path: &Path) -> Result<(), StoreError> {
        if !path.exists() {
            return Err(StoreError::FileNotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        document::inspect(&raw).map_err(|source| StoreError::Load {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Copy the subject file to `export_path` and its images to `images/<subject>` beside it.
    ///
    /// An images folder already present at the destination is replaced.
    pub fn export_subject(&self, subject: &Subject, export_path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = export_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(subject.filename(), export_path)?;

        let images = self.images_dir(subject.name());
        if images.is_dir() {
            let target = export_path
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(IMAGES_DIR)
                .join(subject.name());
            if target.exists() {
                fs::remove_dir_all(&target)?;
            }
            copy_dir(&images, &target)?;
        }
        tracing::info!(subject = subject.name(), ?export_path, "exported subject");
        Ok(())
    }

    pub fn subject_statistics(&self, subject: &Subject) -> SubjectStats {
        SubjectStats::collect(subject)
    }

    /// Rewrite a subject file if it still lacks fields the current format requires.
    ///
    /// Returns what was filled in. The file is only rewritten when
    /// [`MigrationReport::needs_rewrite`] says so.
    pub fn migrate_subject_to_latest(&self, name: &str) -> Result<MigrationReport, StoreError> {
        let path = self.subject_path(name);
        if !path.is_file() {
            return Err(StoreError::SubjectNotFound(name.to_string()));
        }
        let raw = fs::read_to_string(&path)?;
        let load_error = |source| StoreError::Load {
            path: path.clone(),
            source,
        };

        let mut value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| load_error(LoadError::Json(e)))?;
        let report = document::migrate(&mut value).map_err(load_error)?;
        if !report.needs_rewrite() {
            tracing::info!(subject = name, "subject is already up-to-date");
            return Ok(report);
        }

        let subject = Subject::from_document(name, &path.to_string_lossy(), &value)
            .map_err(load_error)?;
        self.save_subject(&subject)?;
        tracing::info!(subject = name, "migrated subject to latest format");
        Ok(report)
    }
}

fn copy_dir(from: &Path, to: &Path) -> std::io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}
