use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub type EmailId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub size: u64,
}

impl Attachment {
    /// Size in kilobytes with one decimal, e.g. `12.3 KB`.
    pub fn size_kb(&self) -> String {
        format!("{:.1} KB", self.size as f64 / 1024.0)
    }
}

/// One message as listed by the backend. Bodies are never sent to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub id: EmailId,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub subject: String,
    pub timestamp: String,
    #[serde(default)]
    pub has_attachments: bool,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Email {
    pub fn display_subject(&self) -> &str {
        if self.subject.trim().is_empty() {
            "(No Subject)"
        } else {
            &self.subject
        }
    }

    /// "1 attachment" / "3 attachments", only for emails flagged as having any.
    pub fn attachment_badge(&self) -> Option<String> {
        if !self.has_attachments {
            return None;
        }
        let n = self.attachments.len();
        Some(format!("{n} attachment{}", if n == 1 { "" } else { "s" }))
    }

    pub fn local_time(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}

/// Render a backend timestamp for display. Zoned timestamps are shown in local
/// time, naive ones as-is, anything unparsable verbatim.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}
