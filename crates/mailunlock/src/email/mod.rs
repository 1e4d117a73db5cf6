//! Mail ingestion.
//!
//! Pulls unseen messages from an IMAP folder, writes their attachments into
//! the `unprocessed` bucket and deletes each message once it is captured.

pub mod client;
pub mod error;
pub mod ingestor;
pub mod parser;

pub use client::ImapClient;
pub use error::EmailError;
pub use ingestor::{IngestSummary, MailIngestor, MailSource};
pub use parser::{MailAttachment, MailMessage, MailParser};
