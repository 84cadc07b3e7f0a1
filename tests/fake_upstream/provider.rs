//! Test data model for the fake provider
//!
//! ```ignore
//! let provider = ProviderBuilder::new()
//!     .inactive_domain("retired.test")
//!     .domain("fake.test")
//!     .build();
//!
//! let message = TestMessage::new("m1", "alice@example.com", "Hello")
//!     .text("Hi there")
//!     .attachment("a1", "notes.txt", "text/plain", b"some notes");
//! ```
//!
//! Accounts and tokens are created by the proxy through the API;
//! messages arrive through [`super::FakeProvider::deliver`], the way
//! external mail would.

use serde_json::{Value, json};
use std::collections::HashMap;

/// Fixed creation time of every test message.
pub const CREATED_AT: &str = "2024-01-01T12:00:00+00:00";

#[derive(Debug, Clone)]
pub struct TestDomain {
    pub domain: String,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct TestAccount {
    pub id: String,
    pub address: String,
    pub password: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TestAttachment {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A message sitting in one account's inbox.
#[derive(Debug, Clone)]
pub struct TestMessage {
    pub id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
    pub seen: bool,
    pub attachments: Vec<TestAttachment>,
}

impl TestMessage {
    pub fn new(id: &str, from: &str, subject: &str) -> Self {
        Self {
            id: id.to_string(),
            from: from.to_string(),
            to: String::new(),
            subject: subject.to_string(),
            text: String::new(),
            html: None,
            seen: false,
            attachments: Vec::new(),
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn html(mut self, html: &str) -> Self {
        self.html = Some(html.to_string());
        self
    }

    pub fn attachment(mut self, id: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.attachments.push(TestAttachment {
            id: id.to_string(),
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            bytes: bytes.to_vec(),
        });
        self
    }

    /// The listing entry, as upstream renders it.
    pub fn summary_json(&self) -> Value {
        let intro: String = self.text.chars().take(20).collect();
        json!({
            "id": self.id,
            "from": { "name": "", "address": self.from },
            "to": [{ "name": "", "address": self.to }],
            "subject": self.subject,
            "intro": intro,
            "seen": self.seen,
            "hasAttachments": !self.attachments.is_empty(),
            "createdAt": CREATED_AT,
        })
    }

    /// The full message, as upstream renders it.
    pub fn detail_json(&self) -> Value {
        let mut body = self.summary_json();
        body["text"] = json!(self.text);
        body["html"] = json!(self.html.iter().collect::<Vec<_>>());
        body["attachments"] = self
            .attachments
            .iter()
            .map(|a| {
                json!({
                    "id": a.id,
                    "filename": a.filename,
                    "contentType": a.content_type,
                    "size": a.bytes.len(),
                })
            })
            .collect();
        body
    }
}

/// The provider's whole state.
#[derive(Debug, Default)]
pub struct Provider {
    pub domains: Vec<TestDomain>,
    pub accounts: Vec<TestAccount>,
    /// Messages keyed by recipient address.
    pub inboxes: HashMap<String, Vec<TestMessage>>,
    issued: usize,
}

impl Provider {
    pub fn account(&self, address: &str) -> Option<&TestAccount> {
        self.accounts.iter().find(|a| a.address == address)
    }

    /// The address a bearer token belongs to.
    pub fn address_for_token(&self, token: &str) -> Option<String> {
        self.accounts
            .iter()
            .find(|a| a.token.as_deref() == Some(token))
            .map(|a| a.address.clone())
    }

    pub fn create_account(&mut self, address: &str, password: &str) -> Option<TestAccount> {
        if self.account(address).is_some() {
            return None;
        }
        self.issued += 1;
        let account = TestAccount {
            id: format!("acc-{}", self.issued),
            address: address.to_string(),
            password: password.to_string(),
            token: None,
        };
        self.accounts.push(account.clone());
        Some(account)
    }

    /// Issue a fresh token when the password matches.
    pub fn issue_token(&mut self, address: &str, password: &str) -> Option<(String, String)> {
        self.issued += 1;
        let token = format!("tok-{}", self.issued);
        let account = self
            .accounts
            .iter_mut()
            .find(|a| a.address == address && a.password == password)?;
        account.token = Some(token.clone());
        Some((account.id.clone(), token))
    }

    pub fn inbox_mut(&mut self, address: &str) -> &mut Vec<TestMessage> {
        self.inboxes.entry(address.to_string()).or_default()
    }

    pub fn message(&self, address: &str, id: &str) -> Option<&TestMessage> {
        self.inboxes.get(address)?.iter().find(|m| m.id == id)
    }
}

/// Builder for the provider's starting state.
pub struct ProviderBuilder {
    domains: Vec<TestDomain>,
}

impl ProviderBuilder {
    pub fn new() -> Self {
        Self {
            domains: Vec::new(),
        }
    }

    /// Offer an active domain.
    pub fn domain(mut self, domain: &str) -> Self {
        self.domains.push(TestDomain {
            domain: domain.to_string(),
            active: true,
        });
        self
    }

    /// List a domain that cannot take new accounts.
    pub fn inactive_domain(mut self, domain: &str) -> Self {
        self.domains.push(TestDomain {
            domain: domain.to_string(),
            active: false,
        });
        self
    }

    pub fn build(self) -> Provider {
        Provider {
            domains: self.domains,
            ..Provider::default()
        }
    }
}
