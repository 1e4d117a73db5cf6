//! In-memory stand-ins for the mailbox, the monitor and the decryptor.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use async_trait::async_trait;

use mailunlock::email::{EmailError, MailAttachment, MailMessage, MailSource};
use mailunlock::{DocumentUnlocker, HealthReporter, HealthStatus, UnlockError};

/// Serves queued batches, one per `fetch`. An empty queue yields no mail.
#[derive(Default)]
pub struct FakeMailSource {
    batches: Vec<Vec<MailMessage>>,
    fail_next_fetch: Rc<RefCell<bool>>,
    pub consumed: Rc<RefCell<Vec<u32>>>,
}

impl FakeMailSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch(mut self, batch: Vec<MailMessage>) -> Self {
        self.batches.push(batch);
        self
    }

    /// Handle that makes the next `fetch` fail with a connection error.
    pub fn failure_switch(&self) -> Rc<RefCell<bool>> {
        Rc::clone(&self.fail_next_fetch)
    }

    pub fn failing() -> Self {
        let source = Self::default();
        *source.fail_next_fetch.borrow_mut() = true;
        source
    }
}

#[async_trait(?Send)]
impl MailSource for FakeMailSource {
    fn describe(&self) -> String {
        "fake/INBOX".to_string()
    }

    async fn fetch(&mut self) -> Result<Vec<MailMessage>, EmailError> {
        if self.fail_next_fetch.replace(false) {
            return Err(EmailError::ConnectionFailed("mailbox unreachable".to_string()));
        }
        if self.batches.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.batches.remove(0))
    }

    async fn consume(&mut self, uid: u32) -> Result<(), EmailError> {
        self.consumed.borrow_mut().push(uid);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), EmailError> {
        Ok(())
    }
}

/// A message whose attachments are given as `(filename, text content)`.
pub fn message(uid: u32, attachments: &[(&str, &str)]) -> MailMessage {
    MailMessage {
        uid,
        subject: format!("Scan {}", uid),
        from: "scanner@example.com".to_string(),
        attachments: attachments
            .iter()
            .map(|(name, payload)| MailAttachment {
                filename: name.to_string(),
                payload: payload.as_bytes().to_vec(),
            })
            .collect(),
    }
}

/// Remembers every status it was given.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    pub reports: Rc<RefCell<Vec<HealthStatus>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<HealthStatus> {
        self.reports.borrow().clone()
    }
}

#[async_trait(?Send)]
impl HealthReporter for RecordingReporter {
    async fn report(&self, status: HealthStatus) {
        self.reports.borrow_mut().push(status);
    }
}

/// Treats file content `locked:<pw>` as protected by `<pw>`, `garbage` as
/// unreadable and anything else as unprotected. Unlocking writes the
/// content with an `unlocked:` prefix.
pub struct ScriptedUnlocker;

impl DocumentUnlocker for ScriptedUnlocker {
    fn try_unlock(&self, input: &Path, output: &Path, password: &str) -> Result<(), UnlockError> {
        let content = std::fs::read(input).map_err(|source| UnlockError::Io {
            path: input.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&content).into_owned();

        if text == "garbage" {
            return Err(UnlockError::Unreadable("not a document".to_string()));
        }
        if let Some(expected) = text.strip_prefix("locked:") {
            if expected != password {
                return Err(UnlockError::WrongPassword);
            }
        }

        std::fs::write(output, format!("unlocked:{}", text)).map_err(|source| UnlockError::Io {
            path: output.to_path_buf(),
            source,
        })
    }
}
