//! Test harness for isolated test execution.
//!
//! Each `TestHarness` owns a temporary directory holding the three buckets,
//! so tests never touch each other's files.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use mailunlock::config::DirectoriesConfig;
use mailunlock::{AttachmentStore, Bucket, DocumentUnlocker, Pipeline};

pub struct TestHarness {
    temp_dir: TempDir,
    pub directories: DirectoriesConfig,
    pub store: AttachmentStore,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let directories = DirectoriesConfig {
            unprocessed: temp_dir.path().join("unprocessed"),
            success: temp_dir.path().join("success"),
            failed: temp_dir.path().join("failed"),
        };
        for dir in directories.all() {
            std::fs::create_dir_all(dir).expect("Failed to create bucket");
        }
        let store = AttachmentStore::new(&directories);

        Self {
            temp_dir,
            directories,
            store,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Builds a pipeline over this harness's buckets.
    pub fn pipeline(&self, unlocker: Box<dyn DocumentUnlocker>, passwords: &[&str]) -> Pipeline {
        let passwords: Vec<String> = passwords.iter().map(|p| p.to_string()).collect();
        Pipeline::new(self.store.clone(), unlocker, &passwords)
    }

    /// Writes a file straight into a bucket, bypassing name sanitization.
    pub fn put(&self, bucket: Bucket, name: &str, content: &[u8]) -> PathBuf {
        let path = self.store.path_in(bucket, name);
        std::fs::write(&path, content).expect("Failed to write test file");
        path
    }

    pub fn read(&self, bucket: Bucket, name: &str) -> Option<Vec<u8>> {
        std::fs::read(self.store.path_in(bucket, name)).ok()
    }

    /// Sorted file names currently in a bucket.
    pub fn names_in(&self, bucket: Bucket) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.store.directory(bucket))
            .expect("Failed to list bucket")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Buckets that currently hold `name`.
    pub fn locations_of(&self, name: &str) -> Vec<Bucket> {
        [Bucket::Unprocessed, Bucket::Success, Bucket::Failed]
            .into_iter()
            .filter(|bucket| self.store.path_in(*bucket, name).exists())
            .collect()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
