//! IMAP client for pulling attachment mail.

use async_imap::Session;
use async_native_tls::TlsConnector;
use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};

use crate::config::ImapConfig;

use super::error::{EmailError, Result};
use super::ingestor::MailSource;
use super::parser::{MailMessage, MailParser};

/// Type alias for the underlying async stream (using async-std compatible TcpStream).
type AsyncTcpStream = async_io::Async<std::net::TcpStream>;

/// Type alias for the TLS stream used by the IMAP session.
type TlsStream = async_native_tls::TlsStream<AsyncTcpStream>;

/// IMAP client for fetching unseen messages and deleting consumed ones.
pub struct ImapClient {
    session: Option<Session<TlsStream>>,
    config: ImapConfig,
    parser: MailParser,
}

impl ImapClient {
    /// Creates a new IMAP client with the given configuration.
    pub fn new(config: ImapConfig) -> Self {
        Self {
            session: None,
            config,
            parser: MailParser::new(),
        }
    }

    /// Connects to the IMAP server, authenticates and selects the attachments folder.
    pub async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            debug!("Already connected to IMAP server");
            return Ok(());
        }

        let password = self.password()?;

        let addr = format!("{}:{}", self.config.url, self.config.port);
        info!("Connecting to IMAP server at {}", addr);

        let std_stream = std::net::TcpStream::connect(&addr)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
        std_stream
            .set_nonblocking(true)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
        let tcp_stream = async_io::Async::new(std_stream)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;

        let tls_stream = TlsConnector::new()
            .connect(&self.config.url, tcp_stream)
            .await?;

        let client = async_imap::Client::new(tls_stream);
        let mut session = client
            .login(&self.config.username, password.expose_secret())
            .await
            .map_err(|(e, _)| EmailError::AuthenticationFailed(e.to_string()))?;

        let folder = &self.config.folder.attachments;
        session.select(folder).await.map_err(|e| {
            if e.to_string().contains("Mailbox doesn't exist") || e.to_string().contains("NO") {
                EmailError::FolderNotFound(folder.clone())
            } else {
                EmailError::ProtocolError(e.to_string())
            }
        })?;

        info!("Authenticated and selected folder '{}'", folder);
        self.session = Some(session);
        Ok(())
    }

    /// Resolves the password from the configured source (direct value, file, or env var).
    fn password(&self) -> Result<SecretString> {
        if self.config.password.is_some() {
            warn!(
                "Using a direct IMAP password is not recommended. \
                 Consider using passwordEnvVar or passwordFile instead."
            );
        }
        crate::secrets::imap_password(&self.config)
            .map_err(|e| EmailError::CredentialsNotFound(e.to_string()))
    }

    fn session(&mut self) -> Result<&mut Session<TlsStream>> {
        self.session
            .as_mut()
            .ok_or_else(|| EmailError::ConnectionFailed("Not connected".to_string()))
    }

    /// Returns the UIDs of unseen messages, oldest first.
    pub async fn search_unseen(&mut self) -> Result<Vec<u32>> {
        let session = self.session()?;

        let uids = session
            .uid_search("UNSEEN")
            .await
            .map_err(|e| EmailError::ProtocolError(e.to_string()))?;

        let mut uid_list: Vec<u32> = uids.into_iter().collect();
        uid_list.sort_unstable();
        debug!("Found {} unseen messages", uid_list.len());
        Ok(uid_list)
    }

    /// Fetches messages by UID using BODY.PEEK[] so they are not marked as read.
    pub async fn fetch_emails_peek(&mut self, uids: &[u32]) -> Result<Vec<(u32, Vec<u8>)>> {
        if uids.is_empty() {
            return Ok(Vec::new());
        }

        let session = self.session()?;

        let uid_set = uids
            .iter()
            .map(|u| u.to_string())
            .collect::<Vec<_>>()
            .join(",");

        debug!("Fetching {} emails with UIDs: {}", uids.len(), uid_set);

        let mut messages = session
            .uid_fetch(&uid_set, "(UID BODY.PEEK[])")
            .await
            .map_err(|e| EmailError::ProtocolError(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(message_result) = messages.next().await {
            let message = message_result.map_err(|e| EmailError::ProtocolError(e.to_string()))?;
            if let (Some(uid), Some(body)) = (message.uid, message.body()) {
                results.push((uid, body.to_vec()));
            } else {
                warn!("Message missing UID or body");
            }
        }

        results.sort_by_key(|(uid, _)| *uid);
        Ok(results)
    }

    /// Flags a message as deleted and expunges it.
    pub async fn delete(&mut self, uid: u32) -> Result<()> {
        let session = self.session()?;

        session
            .uid_store(uid.to_string(), "+FLAGS (\\Deleted)")
            .await
            .map_err(|e| EmailError::ProtocolError(e.to_string()))?
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| EmailError::ProtocolError(e.to_string()))?;

        session
            .expunge()
            .await
            .map_err(|e| EmailError::ProtocolError(e.to_string()))?
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| EmailError::ProtocolError(e.to_string()))?;

        debug!("Deleted message UID {}", uid);
        Ok(())
    }

    /// Disconnects from the IMAP server gracefully.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            info!("Disconnecting from IMAP server");
            session
                .logout()
                .await
                .map_err(|e| EmailError::ProtocolError(e.to_string()))?;
        }
        Ok(())
    }

    /// Checks if the client is currently connected.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }
}

#[async_trait(?Send)]
impl MailSource for ImapClient {
    fn describe(&self) -> String {
        format!("{}/{}", self.config.url, self.config.folder.attachments)
    }

    async fn fetch(&mut self) -> Result<Vec<MailMessage>> {
        self.connect().await?;

        let uids = self.search_unseen().await?;
        let batch: Vec<u32> = uids
            .into_iter()
            .take(self.config.batch_size as usize)
            .collect();

        let raw_messages = self.fetch_emails_peek(&batch).await?;

        let mut messages = Vec::with_capacity(raw_messages.len());
        for (uid, raw) in raw_messages {
            match self.parser.parse(uid, &raw) {
                Ok(message) => messages.push(message),
                Err(e) => warn!("Skipping UID {}: {}", uid, e),
            }
        }
        Ok(messages)
    }

    async fn consume(&mut self, uid: u32) -> Result<()> {
        self.delete(uid).await
    }

    async fn close(&mut self) -> Result<()> {
        self.disconnect().await
    }
}

impl Drop for ImapClient {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("ImapClient dropped without explicit disconnect - session will be closed");
        }
    }
}
