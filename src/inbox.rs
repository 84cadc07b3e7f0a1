//! Client-side inbox controller
//!
//! Drives one mailbox session through its states:
//!
//! ```text
//!   NoSession -> Generating -> Active -> (Refreshing | Reading | Deleting) -> Active
//!                    ^                                                          |
//!                    +--------------------- generate ---------------------------+
//! ```
//!
//! Operations take `&mut self`, so one logical flow touches the session
//! at a time. Failures raise a short-lived [`Banner`] and never roll
//! back state that was already applied.

use crate::client::ProxyClient;
use crate::error::{Error, Result};
use crate::model::{MessageDetail, MessageSummary};
use crate::preview::{AttachmentAction, AttachmentOutcome, Preview, PreviewSlot};
use crate::session::{MailboxSession, SessionStore};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long a banner stays visible.
pub const BANNER_TTL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxState {
    NoSession,
    Generating,
    Active,
    Refreshing,
    Reading,
    Deleting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Error,
    Info,
}

/// A transient notice shown to the user.
#[derive(Debug, Clone)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
    raised_at: Instant,
}

impl Banner {
    #[must_use]
    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) < BANNER_TTL
    }
}

/// The inbox of the current mailbox session.
pub struct Inbox<S> {
    client: ProxyClient,
    store: S,
    session: Option<MailboxSession>,
    state: InboxState,
    messages: Vec<MessageSummary>,
    open: Option<MessageDetail>,
    preview: PreviewSlot,
    banner: Option<Banner>,
}

impl<S: SessionStore> Inbox<S> {
    /// Start from whatever session `store` holds.
    ///
    /// With a stored session the inbox is fetched once right away; a
    /// failed fetch only raises a banner.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn restore(client: ProxyClient, store: S) -> Result<Self> {
        let session = store.load()?;
        let mut inbox = Self {
            client,
            store,
            state: if session.is_some() {
                InboxState::Active
            } else {
                InboxState::NoSession
            },
            session,
            messages: Vec::new(),
            open: None,
            preview: PreviewSlot::new(),
            banner: None,
        };

        if inbox.session.is_some()
            && let Err(e) = inbox.refresh().await
        {
            debug!("Initial inbox fetch failed: {}", e);
        }
        Ok(inbox)
    }

    #[must_use]
    pub const fn state(&self) -> InboxState {
        self.state
    }

    #[must_use]
    pub const fn session(&self) -> Option<&MailboxSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn messages(&self) -> &[MessageSummary] {
        &self.messages
    }

    /// The message currently open in the detail view.
    #[must_use]
    pub const fn opened(&self) -> Option<&MessageDetail> {
        self.open.as_ref()
    }

    #[must_use]
    pub const fn preview(&self) -> Option<&Preview> {
        self.preview.current()
    }

    /// The banner still visible at `now`.
    #[must_use]
    pub fn banner_at(&self, now: Instant) -> Option<&Banner> {
        self.banner.as_ref().filter(|b| b.is_visible_at(now))
    }

    #[must_use]
    pub fn banner(&self) -> Option<&Banner> {
        self.banner_at(Instant::now())
    }

    /// Replace the session with a freshly generated mailbox.
    ///
    /// On success the message list, any open message and any banner
    /// about the previous mailbox are cleared. On failure the previous
    /// state is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy cannot generate a mailbox or the
    /// new session cannot be saved.
    pub async fn generate(&mut self) -> Result<&MailboxSession> {
        let prior = self.state;
        self.state = InboxState::Generating;

        match self.provision().await {
            Ok(session) => {
                info!("Now using mailbox {}", session.address);
                self.messages.clear();
                self.close_message();
                self.banner = None;
                self.state = InboxState::Active;
                Ok(&*self.session.insert(session))
            }
            Err(e) => {
                self.state = prior;
                Err(self.fail(e))
            }
        }
    }

    /// Replace the message list with the proxy's current listing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSession`] before the first generate, or the
    /// fetch error.
    pub async fn refresh(&mut self) -> Result<&[MessageSummary]> {
        let session = self.require_session()?;
        self.state = InboxState::Refreshing;
        let result = self.client.list_messages(&session).await;
        self.state = InboxState::Active;

        match result {
            Ok(messages) => {
                self.messages = messages;
                Ok(self.messages.as_slice())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Fetch a message, mark it read, then show it.
    ///
    /// The listing's `seen` flag only changes once upstream confirmed
    /// the mark. If marking fails the message is still shown, unread,
    /// and an error banner is raised.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSession`] or the fetch error.
    pub async fn open_message(&mut self, id: &str) -> Result<&MessageDetail> {
        let session = self.require_session()?;
        self.state = InboxState::Reading;

        let mut detail = match self.client.get_message(&session, id).await {
            Ok(detail) => detail,
            Err(e) => {
                self.state = InboxState::Active;
                return Err(self.fail(e));
            }
        };

        match self.client.mark_read(&session, id).await {
            Ok(_) => {
                detail.summary.seen = true;
                if let Some(summary) = self.messages.iter_mut().find(|m| m.id == id) {
                    summary.seen = true;
                }
            }
            Err(e) => {
                warn!("Failed to mark message {} as read: {}", id, e);
                self.raise(BannerKind::Error, e.to_string());
            }
        }

        self.preview.close();
        self.state = InboxState::Active;
        Ok(&*self.open.insert(detail))
    }

    /// Close the detail view and any attachment preview.
    pub fn close_message(&mut self) {
        self.preview.close();
        self.open = None;
    }

    /// Delete a message once `confirm` agrees.
    ///
    /// Returns `false` without contacting the proxy if the user
    /// declined.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSession`] or the delete error.
    pub async fn delete_message(
        &mut self,
        id: &str,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<bool> {
        let session = self.require_session()?;
        if !confirm(id) {
            return Ok(false);
        }

        self.state = InboxState::Deleting;
        let result = self.client.delete_message(&session, id).await;
        self.state = InboxState::Active;

        match result {
            Ok(_) => {
                self.messages.retain(|m| m.id != id);
                if self.open.as_ref().is_some_and(|m| m.summary.id == id) {
                    self.close_message();
                }
                self.raise(BannerKind::Info, "Message deleted successfully.".into());
                Ok(true)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Fetch an attachment of the open message and act on it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no open message has this
    /// attachment, or the download error.
    pub async fn view_attachment(
        &mut self,
        attachment_id: &str,
        action: AttachmentAction,
    ) -> Result<AttachmentOutcome> {
        let session = self.require_session()?;
        let found = self.open.as_ref().and_then(|m| {
            m.attachment(attachment_id)
                .map(|a| (m.summary.id.clone(), a.clone()))
        });
        let Some((message_id, attachment)) = found else {
            return Err(self.fail(Error::NotFound(format!("Attachment {attachment_id}"))));
        };

        let blob = match self
            .client
            .fetch_attachment(&session, &message_id, &attachment)
            .await
        {
            Ok(blob) => blob,
            Err(e) => return Err(self.fail(e)),
        };
        Ok(self.preview.show(blob, action))
    }

    pub fn close_preview(&mut self) {
        self.preview.close();
    }

    // -- private helpers --

    async fn provision(&self) -> Result<MailboxSession> {
        let response = self.client.generate().await?;
        if response.email.is_empty() {
            return Err(Error::Upstream("No address was generated".into()));
        }

        let session = MailboxSession::new(response.email, response.data.token);
        self.store.save(&session)?;
        Ok(session)
    }

    fn require_session(&mut self) -> Result<MailboxSession> {
        if let Some(session) = self.session.as_ref().filter(|s| !s.address.is_empty()) {
            return Ok(session.clone());
        }
        Err(self.fail(Error::NoSession))
    }

    fn raise(&mut self, kind: BannerKind, text: String) {
        self.banner = Some(Banner {
            kind,
            text,
            raised_at: Instant::now(),
        });
    }

    fn fail(&mut self, e: Error) -> Error {
        self.raise(BannerKind::Error, e.to_string());
        e
    }
}
