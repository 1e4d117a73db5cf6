use std::fmt;
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::config::DirectoriesConfig;
use crate::error::StorageError;
use crate::sanitize::sanitize_filename;

/// Staged name for an attachment whose name sanitizes to nothing.
const UNNAMED_ATTACHMENT: &str = "attachment.bin";

/// Mode applied to files once they reach a terminal bucket.
#[cfg(unix)]
const TERMINAL_FILE_MODE: u32 = 0o777;

/// Move a file from `src` to `dst`, replacing `dst` if it exists. Uses
/// `rename` first (atomic on the same filesystem) and falls back to copy +
/// delete for cross-device moves.
fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    std::fs::copy(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    std::fs::remove_file(src).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Sanitizes `raw` into a name that always denotes a plain file inside the
/// bucket.
fn staged_name(raw: &str) -> String {
    let name = sanitize_filename(raw);
    match name.as_str() {
        "" => UNNAMED_ATTACHMENT.to_string(),
        "." | ".." => format!("_{}", name),
        _ => name,
    }
}

/// The pipeline stage a staged file is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Unprocessed,
    Success,
    Failed,
}

impl Bucket {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Bucket::Unprocessed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Unprocessed => "unprocessed",
            Bucket::Success => "success",
            Bucket::Failed => "failed",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file in one of the three buckets, identified by its on-disk name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub name: String,
    pub location: Bucket,
}

/// The three-directory area that holds every attachment between mail
/// ingestion and its final outcome.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    unprocessed: PathBuf,
    success: PathBuf,
    failed: PathBuf,
}

impl AttachmentStore {
    pub fn new(directories: &DirectoriesConfig) -> Self {
        Self {
            unprocessed: directories.unprocessed.clone(),
            success: directories.success.clone(),
            failed: directories.failed.clone(),
        }
    }

    pub fn directory(&self, bucket: Bucket) -> &Path {
        match bucket {
            Bucket::Unprocessed => &self.unprocessed,
            Bucket::Success => &self.success,
            Bucket::Failed => &self.failed,
        }
    }

    pub fn path_of(&self, file: &StagedFile) -> PathBuf {
        self.directory(file.location).join(&file.name)
    }

    /// Path the file would have in `bucket`.
    pub fn path_in(&self, bucket: Bucket, name: &str) -> PathBuf {
        self.directory(bucket).join(name)
    }

    /// Writes an attachment into `unprocessed` under its sanitized name.
    ///
    /// A pending file with the same sanitized name is overwritten.
    pub fn stage(&self, raw_name: &str, content: &[u8]) -> Result<StagedFile, StorageError> {
        let name = staged_name(raw_name);

        let path = self.unprocessed.join(&name);
        debug!("Staging {} into {}", raw_name, path.display());
        std::fs::write(&path, content).map_err(|e| StorageError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        Ok(StagedFile {
            name,
            location: Bucket::Unprocessed,
        })
    }

    /// Lists the pending files in `unprocessed`.
    ///
    /// Subdirectories are skipped. Dot-files are listed like any other file,
    /// since an attachment may legitimately be named `.something`.
    pub fn pending(&self) -> Result<Vec<StagedFile>, StorageError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.unprocessed).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| StorageError::ListDirectory {
                path: self.unprocessed.clone(),
                source: e,
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str() else {
                debug!("Skipping non UTF-8 name {:?}", entry.file_name());
                continue;
            };
            files.push(StagedFile {
                name: name.to_string(),
                location: Bucket::Unprocessed,
            });
        }

        Ok(files)
    }

    /// Moves a file into `target`, overwriting any file of the same name
    /// already there.
    pub fn transfer(&self, file: &StagedFile, target: Bucket) -> Result<StagedFile, StorageError> {
        let from = self.path_of(file);
        let to = self.path_in(target, &file.name);
        move_file(&from, &to)?;

        Ok(StagedFile {
            name: file.name.clone(),
            location: target,
        })
    }

    /// Opens a terminal-bucket file up to every user so downstream
    /// consumers can read it regardless of the daemon's umask.
    pub fn normalize_permissions(&self, file: &StagedFile) -> Result<(), StorageError> {
        let path = self.path_of(file);
        set_open_permissions(&path)
    }
}

#[cfg(unix)]
fn set_open_permissions(path: &Path) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(TERMINAL_FILE_MODE)).map_err(
        |e| StorageError::Permissions {
            path: path.to_path_buf(),
            source: e,
        },
    )
}

#[cfg(not(unix))]
fn set_open_permissions(path: &Path) -> Result<(), StorageError> {
    let mut permissions = std::fs::metadata(path)
        .map_err(|e| StorageError::Permissions {
            path: path.to_path_buf(),
            source: e,
        })?
        .permissions();
    permissions.set_readonly(false);
    std::fs::set_permissions(path, permissions).map_err(|e| StorageError::Permissions {
        path: path.to_path_buf(),
        source: e,
    })
}
