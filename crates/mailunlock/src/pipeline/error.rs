use thiserror::Error;

use crate::unlock::UnlockError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Storage failed: {0}")]
    Storage(#[from] crate::error::StorageError),

    #[error("Unlock failed: {0}")]
    Unlock(#[from] UnlockError),
}
