//! The polling loop: ingest, resolve, report, sleep.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, info_span, Instrument};

use crate::config::Config;
use crate::email::{EmailError, ImapClient, IngestSummary, MailIngestor, MailSource};
use crate::health::{HealthReporter, HealthStatus, UptimeReporter};
use crate::pipeline::{Pipeline, PipelineError, ResolveSummary};
use crate::storage::AttachmentStore;

/// Why a cycle was aborted.
#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Ingest failed: {0}")]
    Ingest(#[from] EmailError),

    #[error("Resolve failed: {0}")]
    Resolve(#[from] PipelineError),
}

/// What one completed cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub ingested: IngestSummary,
    pub resolved: ResolveSummary,
}

/// Runs cycles until told to shut down.
pub struct Orchestrator {
    source: Box<dyn MailSource>,
    ingestor: MailIngestor,
    pipeline: Pipeline,
    reporter: Box<dyn HealthReporter>,
    interval: Duration,
    cycle: u64,
}

impl Orchestrator {
    /// Production wiring: IMAP in, PDF unlocking, push monitor out.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Box::new(ImapClient::new(config.imap.clone())),
            Pipeline::from_config(config),
            Box::new(UptimeReporter::from_config(&config.uptime)),
            config.loop_config.interval(),
        )
    }

    pub fn new(
        source: Box<dyn MailSource>,
        pipeline: Pipeline,
        reporter: Box<dyn HealthReporter>,
        interval: Duration,
    ) -> Self {
        let store: AttachmentStore = pipeline.store().clone();
        Self {
            source,
            ingestor: MailIngestor::new(store),
            pipeline,
            reporter,
            interval,
            cycle: 0,
        }
    }

    /// Ingest then resolve. A failure in either step ends the cycle there;
    /// files already moved are not rolled back.
    pub async fn run_cycle(&mut self) -> Result<CycleSummary, DaemonError> {
        let ingested = self.ingestor.ingest(self.source.as_mut()).await?;
        let resolved = self.pipeline.resolve_pending()?;
        Ok(CycleSummary { ingested, resolved })
    }

    /// Runs one cycle and reports its outcome. Never fails.
    pub async fn tick(&mut self) -> HealthStatus {
        self.cycle += 1;
        let span = info_span!("cycle", n = self.cycle);

        let result = self.run_cycle().instrument(span).await;
        let status = match result {
            Ok(summary) => {
                info!(
                    "Cycle {} complete: {} messages, {} attachments staged, {} resolved",
                    self.cycle,
                    summary.ingested.messages,
                    summary.ingested.attachments,
                    summary.resolved.total()
                );
                HealthStatus::Up
            }
            Err(e) => {
                error!("Failed to process: {}", e);
                HealthStatus::Down
            }
        };

        self.reporter.report(status).await;
        status
    }

    /// Loops forever with a fixed sleep between cycles.
    ///
    /// `shutdown` is only observed while sleeping, so a running cycle always
    /// finishes.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Polling every {}s", self.interval.as_secs());

        loop {
            self.tick().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // Sender gone: nobody can ask us to stop any more.
                        tokio::time::sleep(self.interval).await;
                    }
                }
            }

            if *shutdown.borrow() {
                info!("Shutdown requested, stopping after {} cycles", self.cycle);
                return;
            }
        }
    }

    pub fn cycles_run(&self) -> u64 {
        self.cycle
    }
}
