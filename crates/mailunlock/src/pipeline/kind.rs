use std::path::Path;

/// Extension of the one document kind that may be password protected.
const PROTECTED_EXTENSION: &str = "pdf";

/// How the pipeline treats a pending file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// May be encrypted; goes through the unlock protocol.
    ProtectedDocument,
    /// Moved to `success` unchanged.
    PassThrough,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case(PROTECTED_EXTENSION) => {
                FileKind::ProtectedDocument
            }
            _ => FileKind::PassThrough,
        }
    }
}
