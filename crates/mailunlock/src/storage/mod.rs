pub mod filesystem;

pub use filesystem::{AttachmentStore, Bucket, StagedFile};
