//! Email parsing and attachment extraction.

use log::debug;
use mail_parser::{MessageParser, MimeHeaders, PartType};

use super::error::{EmailError, Result};

/// A file attached to a message, exactly as sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAttachment {
    /// Filename from the message, not yet sanitized.
    pub filename: String,
    pub payload: Vec<u8>,
}

/// A fetched message reduced to what ingestion needs.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub uid: u32,
    pub subject: String,
    pub from: String,
    pub attachments: Vec<MailAttachment>,
}

/// Turns raw RFC 5322 messages into [`MailMessage`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct MailParser;

impl MailParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, uid: u32, raw_email: &[u8]) -> Result<MailMessage> {
        let message = MessageParser::default()
            .parse(raw_email)
            .ok_or_else(|| EmailError::ParseError(format!("UID {} is not a valid message", uid)))?;

        let subject = message.subject().unwrap_or_default().to_string();
        let from = message
            .from()
            .and_then(|addr| addr.first().map(format_address))
            .unwrap_or_default();

        let mut attachments = Vec::new();
        for part in message.attachments() {
            if matches!(part.body, PartType::Multipart(_)) {
                continue;
            }

            let mime_type = part
                .content_type()
                .map(|ct| match ct.subtype() {
                    Some(subtype) => format!("{}/{}", ct.ctype(), subtype),
                    None => ct.ctype().to_string(),
                })
                .unwrap_or_else(|| "application/octet-stream".to_string());

            let filename = match part.attachment_name() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => format!("attachment.{}", mime_to_extension(&mime_type)),
            };
            let payload = part.contents().to_vec();

            debug!(
                "Found attachment: {} ({}, {} bytes)",
                filename,
                mime_type,
                payload.len()
            );
            attachments.push(MailAttachment { filename, payload });
        }

        debug!(
            "Extracted {} attachments from email UID={}",
            attachments.len(),
            uid
        );

        Ok(MailMessage {
            uid,
            subject,
            from,
            attachments,
        })
    }
}

/// Formats an address as "Name <email@example.com>" or just the address.
fn format_address(addr: &mail_parser::Addr) -> String {
    if let Some(name) = addr.name() {
        format!("{} <{}>", name, addr.address().unwrap_or_default())
    } else {
        addr.address().unwrap_or_default().to_string()
    }
}

/// Converts a MIME type to a file extension for unnamed attachments.
fn mime_to_extension(mime_type: &str) -> &'static str {
    match mime_type.to_lowercase().as_str() {
        "application/pdf" => "pdf",
        "application/zip" => "zip",
        "application/xml" | "text/xml" => "xml",
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/tiff" => "tiff",
        "text/plain" => "txt",
        "text/html" => "html",
        "text/csv" => "csv",
        _ => "bin",
    }
}
