pub mod config;
pub mod daemon;
pub mod email;
pub mod error;
pub mod health;
pub mod logging;
pub mod pipeline;
pub mod sanitize;
pub mod secrets;
pub mod storage;
pub mod unlock;

pub use config::{load_config, Config};
pub use daemon::{CycleSummary, DaemonError, Orchestrator};
pub use error::{ConfigError, MailUnlockError, Result, StorageError};
pub use health::{HealthReporter, HealthStatus, UptimeReporter};
pub use pipeline::{Pipeline, PipelineError};
pub use storage::{AttachmentStore, Bucket, StagedFile};
pub use unlock::{DocumentUnlocker, PdfUnlocker, UnlockError, UnlockOutcome};
