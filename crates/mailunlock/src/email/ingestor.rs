//! Stages mail attachments into the `unprocessed` bucket.

use async_trait::async_trait;
use tracing::{info, info_span, warn, Instrument};

use crate::storage::AttachmentStore;

use super::error::Result;
use super::parser::MailMessage;

/// A mailbox that yields messages and can forget them once captured.
///
/// The daemon drives it from a single thread, so futures need not be `Send`.
#[async_trait(?Send)]
pub trait MailSource {
    /// Human readable location, used in logs.
    fn describe(&self) -> String;

    /// Returns the next batch of unread messages, oldest first.
    async fn fetch(&mut self) -> Result<Vec<MailMessage>>;

    /// Removes a message whose attachments are safely staged.
    async fn consume(&mut self, uid: u32) -> Result<()>;

    /// Ends the session opened by `fetch`.
    async fn close(&mut self) -> Result<()>;
}

/// Counts for one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub messages: usize,
    pub skipped: usize,
    pub attachments: usize,
}

/// Pulls messages from a [`MailSource`] and writes their attachments to disk.
pub struct MailIngestor {
    store: AttachmentStore,
}

impl MailIngestor {
    pub fn new(store: AttachmentStore) -> Self {
        Self { store }
    }

    /// Stages every attachment of every fetched message, deleting each
    /// message only after all of its attachments are on disk.
    ///
    /// Messages without attachments are left in the mailbox. The source is
    /// closed whether or not ingestion succeeded.
    pub async fn ingest(&self, source: &mut dyn MailSource) -> Result<IngestSummary> {
        let span = info_span!("ingest", source = %source.describe());
        async {
            info!("Starting to pull new messages from {}", source.describe());
            let result = self.ingest_messages(source).await;

            if let Err(e) = source.close().await {
                warn!("Failed to close mail source cleanly: {}", e);
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn ingest_messages(&self, source: &mut dyn MailSource) -> Result<IngestSummary> {
        let messages = source.fetch().await?;
        let mut summary = IngestSummary::default();

        for message in messages {
            info!("Processing {} from {}", message.subject, message.from);
            summary.messages += 1;

            if message.attachments.is_empty() {
                info!(
                    "Received message without attachment. Title: {}",
                    message.subject
                );
                summary.skipped += 1;
                continue;
            }

            for attachment in &message.attachments {
                let staged = self.store.stage(&attachment.filename, &attachment.payload)?;
                info!(
                    "Saved {} into {}",
                    attachment.filename,
                    self.store.path_of(&staged).display()
                );
                summary.attachments += 1;
            }

            source.consume(message.uid).await?;
        }

        Ok(summary)
    }
}
