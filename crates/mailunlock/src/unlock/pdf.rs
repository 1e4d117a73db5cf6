use std::path::Path;

use crate::unlock::{DocumentUnlocker, UnlockError};

/// Unlocks PDFs with `lopdf` and re-saves them without encryption.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfUnlocker;

impl PdfUnlocker {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentUnlocker for PdfUnlocker {
    fn try_unlock(&self, input: &Path, output: &Path, password: &str) -> Result<(), UnlockError> {
        let _span = tracing::debug_span!("unlock.pdf").entered();

        let pdf_bytes = std::fs::read(input).map_err(|e| UnlockError::Io {
            path: input.to_path_buf(),
            source: e,
        })?;

        let mut doc = match lopdf::Document::load_mem_with_password(&pdf_bytes, password) {
            Ok(doc) => doc,
            Err(lopdf::Error::InvalidPassword | lopdf::Error::Decryption(_)) => {
                return Err(UnlockError::WrongPassword)
            }
            Err(e) => return Err(UnlockError::Unreadable(e.to_string())),
        };

        // The objects are already decrypted in memory; drop the handler so the
        // saved copy is plain.
        doc.trailer.remove(b"Encrypt");

        doc.save(output).map_err(|e| UnlockError::Io {
            path: output.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }
}
