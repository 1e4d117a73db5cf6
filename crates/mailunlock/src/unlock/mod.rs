//! Password unlock protocol for encrypted documents.
//!
//! A document is opened with each candidate password in order until one
//! works. The first candidate is always the empty password, so documents
//! without protection succeed immediately.

pub mod pdf;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::sanitize::redact_path;

pub use pdf::PdfUnlocker;

/// Failure of a single unlock attempt.
#[derive(Error, Debug)]
pub enum UnlockError {
    /// The document parsed but rejected the password.
    #[error("Incorrect password")]
    WrongPassword,

    /// The file is not a readable document of this kind, whatever the password.
    #[error("Unreadable document: {0}")]
    Unreadable(String),

    /// The input could not be read or the output could not be written.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The decryption primitive: one attempt with one password.
///
/// On success the decrypted document has been written to `output`. The
/// input is left untouched either way.
pub trait DocumentUnlocker: Send + Sync {
    fn try_unlock(&self, input: &Path, output: &Path, password: &str) -> Result<(), UnlockError>;
}

/// Result of running the full candidate list against one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// Opened with `password`; an empty password means the document was not protected.
    Unlocked { password: String },
    /// No candidate opened the document.
    Unresolved,
}

impl UnlockOutcome {
    pub fn is_unlocked(&self) -> bool {
        matches!(self, UnlockOutcome::Unlocked { .. })
    }
}

/// Builds the attempt list: the empty password, then the configured ones.
pub fn candidate_passwords(configured: &[String]) -> Vec<String> {
    std::iter::once(String::new())
        .chain(configured.iter().cloned())
        .collect()
}

/// Tries each candidate once, in order, stopping at the first success.
///
/// On success the decrypted document is at `output` and `input` has been
/// removed. If `input` cannot be removed, `output` is deleted again so the
/// document exists in one place only. A document that cannot be parsed at all stops the search, since
/// no password will change that. Only I/O failures are returned as errors.
pub fn unlock_with_candidates(
    unlocker: &dyn DocumentUnlocker,
    input: &Path,
    output: &Path,
    candidates: &[String],
) -> Result<UnlockOutcome, UnlockError> {
    let name = redact_path(input);

    for (attempt, password) in candidates.iter().enumerate() {
        match unlocker.try_unlock(input, output, password) {
            Ok(()) => {
                if password.is_empty() {
                    info!("{} is not password protected. Success.", name);
                } else {
                    info!("{} unlocked with {}", name, password);
                }

                if let Err(e) = std::fs::remove_file(input) {
                    // The original stays pending, so the copy must not also
                    // sit in `success`.
                    if let Err(cleanup) = std::fs::remove_file(output) {
                        warn!("Failed to discard {}: {}", redact_path(output), cleanup);
                    }
                    return Err(UnlockError::Io {
                        path: input.to_path_buf(),
                        source: e,
                    });
                }

                return Ok(UnlockOutcome::Unlocked {
                    password: password.clone(),
                });
            }
            Err(UnlockError::WrongPassword) => {
                debug!("{}: candidate #{} rejected", name, attempt);
            }
            Err(UnlockError::Unreadable(reason)) => {
                debug!("{}: cannot be parsed ({}), giving up", name, reason);
                return Ok(UnlockOutcome::Unresolved);
            }
            Err(e @ UnlockError::Io { .. }) => return Err(e),
        }
    }

    Ok(UnlockOutcome::Unresolved)
}
