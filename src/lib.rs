//! Disposable mailbox proxy and client
//!
//! A thin HTTP proxy in front of a mail.tm-style disposable-mail
//! provider, plus the client side that talks to it. The provider owns
//! accounts, tokens and messages; the proxy forwards one request per
//! call and reshapes the answer.
//!
//! - [`proxy`] serves `/api/mail/*` and forwards to [`UpstreamClient`].
//! - [`ProxyClient`] and [`Inbox`] drive a [`MailboxSession`] against
//!   the proxy, persisting it through a [`SessionStore`].
//! - [`PreviewCategory`] decides how attachments are shown.

mod attachment;
mod client;
mod config;
mod credential;
mod error;
mod inbox;
mod model;
mod preview;
pub mod proxy;
mod session;
mod upstream;
mod username;

pub use attachment::{PreviewCategory, PreviewMode, format_size};
pub use client::ProxyClient;
pub use config::{API_PREFIX, ClientConfig, ProxyConfig};
pub use credential::{Credential, DEFAULT_SOURCES, SessionToken, TOKEN_COOKIE, TokenSource};
pub use error::{Error, Result};
pub use inbox::{BANNER_TTL, Banner, BannerKind, Inbox, InboxState};
pub use model::{
    Account, Address, Attachment, Collection, DeleteAck, Domain, GenerateResponse, MarkReadAck,
    MessageDetail, MessageSummary, TokenGrant,
};
pub use preview::{
    AttachmentAction, AttachmentBlob, AttachmentOutcome, Preview, PreviewContent, PreviewSlot,
};
pub use proxy::{AppState, ProxyServer};
pub use session::{FileSessionStore, MailboxSession, MemorySessionStore, SessionStore};
pub use upstream::{NewMailbox, UpstreamClient};
pub use username::UsernameGenerator;
