use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub directories: DirectoriesConfig,

    /// Candidate passwords, tried in order after the empty password.
    #[serde(default)]
    pub passwords: Vec<String>,

    #[serde(rename = "loop")]
    pub loop_config: LoopConfig,

    #[serde(default)]
    pub log: LogConfig,

    pub imap: ImapConfig,

    #[serde(default)]
    pub uptime: UptimeConfig,
}

impl Config {
    /// Creates any missing bucket directory.
    pub fn ensure_directories(&self) -> Result<(), StorageError> {
        for dir in self.directories.all() {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| StorageError::CreateDirectory {
                    path: dir.to_path_buf(),
                    source: e,
                })?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoriesConfig {
    pub unprocessed: PathBuf,
    pub success: PathBuf,
    pub failed: PathBuf,
}

impl DirectoriesConfig {
    pub fn all(&self) -> [&Path; 3] {
        [&self.unprocessed, &self.success, &self.failed]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopConfig {
    /// Seconds slept between cycles.
    #[serde(default = "default_interval")]
    pub interval: u64,
}

impl LoopConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
        }
    }
}

fn default_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Connection settings for the mailbox attachments are pulled from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImapConfig {
    /// IMAP server hostname (e.g., "imap.gmail.com").
    #[serde(alias = "host")]
    pub url: String,

    /// IMAP server port (default: 993 for IMAPS).
    #[serde(default = "default_imap_port")]
    pub port: u16,

    pub username: String,

    /// Direct password value. Prefer `passwordFile` or `passwordEnvVar`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Path to a file containing the password (for Docker secrets).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_file: Option<String>,

    /// Environment variable containing the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env_var: Option<String>,

    #[serde(default)]
    pub folder: FolderConfig,

    /// Maximum number of messages pulled per cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

fn default_imap_port() -> u16 {
    993
}

fn default_batch_size() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderConfig {
    /// Folder scanned for messages with attachments.
    #[serde(default = "default_inbox")]
    pub attachments: String,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            attachments: default_inbox(),
        }
    }
}

fn default_inbox() -> String {
    "INBOX".to_string()
}

/// Push-monitor settings (Uptime Kuma style `?status=up|down`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeConfig {
    #[serde(default)]
    pub monitor: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}
