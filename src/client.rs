//! HTTP client for the tempmail proxy

use crate::error::{Error, Result};
use crate::model::{
    Attachment, Collection, DeleteAck, GenerateResponse, MarkReadAck, MessageDetail,
    MessageSummary,
};
use crate::preview::AttachmentBlob;
use crate::proxy::disposition_filename;
use crate::session::MailboxSession;
use crate::upstream::join_path;
use reqwest::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE, HeaderName};
use reqwest::{RequestBuilder, Response, Url};
use serde_json::Value;
use tracing::debug;

/// Client for the proxy's `/api/mail` routes
///
/// Every inbox call takes the session explicitly; the client itself
/// holds no credential.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ProxyClient {
    /// Create a client for the proxy mounted at `base_url`
    /// (e.g. `http://127.0.0.1:5000/api/mail`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid proxy URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("Invalid proxy URL: {base_url}")));
        }

        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url,
        })
    }

    /// Ask the proxy for a new mailbox
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the proxy reports a
    /// failure.
    pub async fn generate(&self) -> Result<GenerateResponse> {
        let response = self.http.get(self.endpoint(&["generate"])).send().await?;
        Ok(checked(response).await?.json().await?)
    }

    /// Fetch the inbox listing
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the token is rejected,
    /// or the body is not a message collection.
    pub async fn list_messages(&self, session: &MailboxSession) -> Result<Vec<MessageSummary>> {
        let request = self.http.get(self.endpoint(&["messages"]));
        let collection: Collection<MessageSummary> =
            self.send(request, session).await?.json().await?;
        debug!("Fetched {} messages", collection.members.len());
        Ok(collection.members)
    }

    /// Fetch one message in full
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a message.
    pub async fn get_message(&self, session: &MailboxSession, id: &str) -> Result<MessageDetail> {
        let request = self.http.get(self.endpoint(&["messages", id]));
        Ok(self.send(request, session).await?.json().await?)
    }

    /// Mark one message as read
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the proxy reports a
    /// failure.
    pub async fn mark_read(&self, session: &MailboxSession, id: &str) -> Result<MarkReadAck> {
        let request = self.http.patch(self.endpoint(&["messages", id, "read"]));
        Ok(self.send(request, session).await?.json().await?)
    }

    /// Delete one message
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the proxy reports a
    /// failure.
    pub async fn delete_message(&self, session: &MailboxSession, id: &str) -> Result<DeleteAck> {
        let request = self.http.delete(self.endpoint(&["messages", id]));
        Ok(self.send(request, session).await?.json().await?)
    }

    /// Download an attachment's bytes
    ///
    /// The attachment's own metadata wins over the response headers for
    /// the filename and content type.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the proxy reports a
    /// failure.
    pub async fn fetch_attachment(
        &self,
        session: &MailboxSession,
        message_id: &str,
        attachment: &Attachment,
    ) -> Result<AttachmentBlob> {
        let request = self.http.get(self.endpoint(&[
            "messages",
            message_id,
            "attachment",
            &attachment.id,
        ]));
        let response = self.send(request, session).await?;

        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = non_empty(&attachment.content_type)
            .or_else(|| header(CONTENT_TYPE))
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let filename = non_empty(&attachment.filename)
            .or_else(|| header(CONTENT_DISPOSITION).as_deref().and_then(disposition_filename))
            .unwrap_or_else(|| attachment.id.clone());

        Ok(AttachmentBlob {
            filename,
            content_type,
            bytes: response.bytes().await?,
        })
    }

    // -- private helpers --

    fn endpoint(&self, segments: &[&str]) -> Url {
        join_path(&self.base_url, segments)
    }

    async fn send(&self, request: RequestBuilder, session: &MailboxSession) -> Result<Response> {
        let response = request
            .header(AUTHORIZATION, session.credential().bearer())
            .send()
            .await?;
        checked(response).await
    }
}

/// Turn a non-success proxy answer into [`Error::Proxy`], using the
/// `message` (or `error`) field of its JSON body when present.
async fn checked(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| {
            body.get("message")
                .or_else(|| body.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    Err(Error::Proxy {
        status: status.as_u16(),
        message,
    })
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
