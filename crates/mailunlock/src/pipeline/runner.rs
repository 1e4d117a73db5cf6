use tracing::{debug, info, info_span, warn};

use crate::config::Config;
use crate::storage::{AttachmentStore, Bucket, StagedFile};
use crate::unlock::{
    candidate_passwords, unlock_with_candidates, DocumentUnlocker, PdfUnlocker, UnlockOutcome,
};

use super::error::PipelineError;
use super::kind::FileKind;

/// Where one pending file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Not a protected kind; moved to `success` as-is.
    PassedThrough,
    /// Opened and re-saved into `success`. Empty password means it was not protected.
    Unlocked { password: String },
    /// No candidate opened it; original moved to `failed`.
    Failed,
}

impl Resolution {
    pub fn bucket(&self) -> Bucket {
        match self {
            Resolution::PassedThrough | Resolution::Unlocked { .. } => Bucket::Success,
            Resolution::Failed => Bucket::Failed,
        }
    }
}

/// Counts for one drain of the `unprocessed` bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    pub passed_through: usize,
    pub unlocked: usize,
    pub failed: usize,
}

impl ResolveSummary {
    fn record(&mut self, resolution: &Resolution) {
        match resolution {
            Resolution::PassedThrough => self.passed_through += 1,
            Resolution::Unlocked { .. } => self.unlocked += 1,
            Resolution::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.passed_through + self.unlocked + self.failed
    }
}

/// Drains `unprocessed` into `success` and `failed`.
pub struct Pipeline {
    store: AttachmentStore,
    unlocker: Box<dyn DocumentUnlocker>,
    candidates: Vec<String>,
}

impl Pipeline {
    /// PDF unlocking against the configured buckets.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            AttachmentStore::new(&config.directories),
            Box::new(PdfUnlocker::new()),
            &config.passwords,
        )
    }

    /// Builds a pipeline around any decryption primitive.
    pub fn new(
        store: AttachmentStore,
        unlocker: Box<dyn DocumentUnlocker>,
        passwords: &[String],
    ) -> Self {
        Self {
            store,
            unlocker,
            candidates: candidate_passwords(passwords),
        }
    }

    pub fn store(&self) -> &AttachmentStore {
        &self.store
    }

    /// Resolves every file currently pending, each exactly once.
    ///
    /// The first storage failure aborts the pass; files already moved stay
    /// where they are and the rest wait for the next pass.
    pub fn resolve_pending(&self) -> Result<ResolveSummary, PipelineError> {
        let pending = self.store.pending()?;
        let mut summary = ResolveSummary::default();

        if pending.is_empty() {
            debug!("No pending attachments");
            return Ok(summary);
        }

        for file in &pending {
            let resolution = self.resolve(file)?;
            summary.record(&resolution);
        }

        info!(
            "Resolved {} attachments: {} passed through, {} unlocked, {} failed",
            summary.total(),
            summary.passed_through,
            summary.unlocked,
            summary.failed
        );
        Ok(summary)
    }

    /// Moves one pending file to its terminal bucket.
    pub fn resolve(&self, file: &StagedFile) -> Result<Resolution, PipelineError> {
        let _span = info_span!("resolve", filename = %file.name).entered();
        let input = self.store.path_of(file);

        let resolution = match FileKind::from_path(&input) {
            FileKind::PassThrough => {
                self.store.transfer(file, Bucket::Success)?;
                Resolution::PassedThrough
            }
            FileKind::ProtectedDocument => {
                let output = self.store.path_in(Bucket::Success, &file.name);
                match unlock_with_candidates(
                    self.unlocker.as_ref(),
                    &input,
                    &output,
                    &self.candidates,
                )? {
                    UnlockOutcome::Unlocked { password } => Resolution::Unlocked { password },
                    UnlockOutcome::Unresolved => {
                        warn!(
                            "File {} was not processed. Moving to {}",
                            file.name,
                            self.store.directory(Bucket::Failed).display()
                        );
                        self.store.transfer(file, Bucket::Failed)?;
                        Resolution::Failed
                    }
                }
            }
        };

        let placed = StagedFile {
            name: file.name.clone(),
            location: resolution.bucket(),
        };
        self.store.normalize_permissions(&placed)?;

        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectoriesConfig;
    use crate::unlock::UnlockError;
    use std::path::Path;
    use tempfile::TempDir;

    /// Treats file contents `locked:<password>` as a document protected by
    /// `<password>` and anything else as unreadable.
    struct ContentUnlocker;

    impl DocumentUnlocker for ContentUnlocker {
        fn try_unlock(
            &self,
            input: &Path,
            output: &Path,
            password: &str,
        ) -> Result<(), UnlockError> {
            let content = std::fs::read_to_string(input).map_err(|e| UnlockError::Io {
                path: input.to_path_buf(),
                source: e,
            })?;
            let Some(expected) = content.strip_prefix("locked:") else {
                return Err(UnlockError::Unreadable("no header".to_string()));
            };
            if expected != password {
                return Err(UnlockError::WrongPassword);
            }
            std::fs::write(output, format!("plain:{}", expected)).map_err(|e| UnlockError::Io {
                path: output.to_path_buf(),
                source: e,
            })
        }
    }

    fn pipeline_in(temp: &TempDir, passwords: &[&str]) -> Pipeline {
        let directories = DirectoriesConfig {
            unprocessed: temp.path().join("unprocessed"),
            success: temp.path().join("success"),
            failed: temp.path().join("failed"),
        };
        for dir in directories.all() {
            std::fs::create_dir_all(dir).unwrap();
        }
        let passwords: Vec<String> = passwords.iter().map(|p| p.to_string()).collect();
        Pipeline::new(
            AttachmentStore::new(&directories),
            Box::new(ContentUnlocker),
            &passwords,
        )
    }

    #[test]
    fn test_pass_through_moves_unchanged() {
        let temp = TempDir::new().unwrap();
        let pipeline = pipeline_in(&temp, &[]);
        let staged = pipeline.store().stage("photo.jpg", b"\xff\xd8jpeg").unwrap();

        let resolution = pipeline.resolve(&staged).unwrap();

        assert_eq!(resolution, Resolution::PassedThrough);
        assert_eq!(
            std::fs::read(pipeline.store().path_in(Bucket::Success, "photo.jpg")).unwrap(),
            b"\xff\xd8jpeg"
        );
        assert!(!pipeline.store().path_of(&staged).exists());
    }

    #[test]
    fn test_unlockable_document_lands_in_success() {
        let temp = TempDir::new().unwrap();
        let pipeline = pipeline_in(&temp, &["secretA", "secretB"]);
        let staged = pipeline.store().stage("bill.pdf", b"locked:secretB").unwrap();

        let resolution = pipeline.resolve(&staged).unwrap();

        assert_eq!(
            resolution,
            Resolution::Unlocked {
                password: "secretB".to_string()
            }
        );
        assert_eq!(
            std::fs::read_to_string(pipeline.store().path_in(Bucket::Success, "bill.pdf"))
                .unwrap(),
            "plain:secretB"
        );
        assert!(!pipeline.store().path_of(&staged).exists());
        assert!(!pipeline.store().path_in(Bucket::Failed, "bill.pdf").exists());
    }

    #[test]
    fn test_unknown_password_keeps_original_in_failed() {
        let temp = TempDir::new().unwrap();
        let pipeline = pipeline_in(&temp, &["secretA"]);
        let staged = pipeline.store().stage("bill.PDF", b"locked:other").unwrap();

        let resolution = pipeline.resolve(&staged).unwrap();

        assert_eq!(resolution, Resolution::Failed);
        assert_eq!(
            std::fs::read(pipeline.store().path_in(Bucket::Failed, "bill.PDF")).unwrap(),
            b"locked:other"
        );
        assert!(!pipeline.store().path_in(Bucket::Success, "bill.PDF").exists());
    }

    #[test]
    fn test_resolve_pending_counts_each_outcome() {
        let temp = TempDir::new().unwrap();
        let pipeline = pipeline_in(&temp, &["secretA"]);
        pipeline.store().stage("notes.txt", b"hello").unwrap();
        pipeline.store().stage("open.pdf", b"locked:").unwrap();
        pipeline.store().stage("known.pdf", b"locked:secretA").unwrap();
        pipeline.store().stage("unknown.pdf", b"locked:zzz").unwrap();
        pipeline.store().stage("corrupt.pdf", b"").unwrap();

        let summary = pipeline.resolve_pending().unwrap();

        assert_eq!(
            summary,
            ResolveSummary {
                passed_through: 1,
                unlocked: 2,
                failed: 2,
            }
        );
        assert!(pipeline.store().pending().unwrap().is_empty());
    }

    #[test]
    fn test_empty_bucket_is_noop() {
        let temp = TempDir::new().unwrap();
        let pipeline = pipeline_in(&temp, &[]);

        let summary = pipeline.resolve_pending().unwrap();

        assert_eq!(summary.total(), 0);
    }

    #[test]
    fn test_missing_unprocessed_directory_aborts() {
        let temp = TempDir::new().unwrap();
        let pipeline = pipeline_in(&temp, &[]);
        std::fs::remove_dir_all(pipeline.store().directory(Bucket::Unprocessed)).unwrap();

        assert!(matches!(
            pipeline.resolve_pending(),
            Err(PipelineError::Storage(_))
        ));
    }
}
