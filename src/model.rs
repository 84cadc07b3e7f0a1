//! Wire types shared by the proxy, the upstream client and the inbox
//!
//! Upstream speaks a JSON-LD ("hydra") dialect: collections wrap their
//! items in `hydra:member`. Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sender or recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub name: String,
    pub address: String,
}

impl Address {
    /// The display name, falling back to the bare address.
    #[must_use]
    pub fn display(&self) -> &str {
        if self.name.is_empty() {
            &self.address
        } else {
            &self.name
        }
    }
}

/// One entry of the inbox listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub intro: String,
    pub from: Address,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub seen: bool,
    #[serde(default)]
    pub has_attachments: bool,
}

/// A file attached to a message. Only metadata; bytes are fetched on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub size: u64,
}

/// A full message, fetched lazily per id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDetail {
    #[serde(flatten)]
    pub summary: MessageSummary,
    #[serde(default)]
    pub to: Vec<Address>,
    #[serde(default)]
    pub html: Vec<String>,
    #[serde(default, alias = "body")]
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl MessageDetail {
    /// Placeholder shown for a message without any renderable content.
    pub const EMPTY_BODY: &'static str = "No message content available";

    /// The content to render: first HTML part, then the text body,
    /// then the intro.
    #[must_use]
    pub fn display_body(&self) -> &str {
        [
            self.html.first().map(String::as_str),
            self.text.as_deref(),
            Some(self.summary.intro.as_str()),
        ]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or(Self::EMPTY_BODY)
    }

    #[must_use]
    pub fn attachment(&self, id: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.id == id)
    }
}

/// A `hydra:member` collection as returned by upstream list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection<T> {
    #[serde(rename = "hydra:member")]
    pub members: Vec<T>,
    #[serde(
        rename = "hydra:totalItems",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub total_items: Option<u64>,
}

/// A mail domain offered by upstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub domain: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// The account record returned by upstream on creation.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: String,
    pub address: String,
}

/// A bearer token issued by upstream for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub token: String,
}

/// Body of `GET /generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub status: String,
    pub message: String,
    pub email: String,
    pub data: TokenGrant,
    pub created_at: DateTime<Utc>,
}

/// Body of `PATCH /messages/{id}/read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkReadAck {
    pub seen: bool,
}

/// Body of `DELETE /messages/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAck {
    pub status: String,
    pub message: String,
    pub id: String,
}
