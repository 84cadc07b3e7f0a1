//! Client for the upstream disposable-mail provider
//!
//! Every call is a single request: no retries, no caching. Non-success
//! statuses become errors through `error_for_status`, so callers see
//! network failures, 4xx and 5xx the same way.

use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::model::{Account, Collection, Domain, TokenGrant};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Response, Url};
use serde_json::{Value, json};
use tracing::{debug, info};

const MERGE_PATCH: &str = "application/merge-patch+json";

/// A freshly provisioned mailbox.
#[derive(Debug, Clone)]
pub struct NewMailbox {
    pub address: String,
    pub token: TokenGrant,
}

/// HTTP client for the provider API
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: Url,
    password: String,
}

impl UpstreamClient {
    /// Create a client for the provider rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `base_url` is not an absolute URL,
    /// or an HTTP error if the client cannot be built.
    pub fn new(base_url: &str, password: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid BASE_URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("Invalid BASE_URL: {base_url}")));
        }

        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url,
            password: password.into(),
        })
    }

    /// The first active domain offered by the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails or contains no active domain.
    pub async fn first_domain(&self) -> Result<String> {
        let domains: Collection<Domain> = self
            .http
            .get(self.endpoint(&["domains"]))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        domains
            .members
            .into_iter()
            .find(|d| d.is_active)
            .map(|d| d.domain)
            .ok_or_else(|| Error::Upstream("Failed to fetch domain".into()))
    }

    /// Create an account for `address` with the configured password.
    ///
    /// # Errors
    ///
    /// Returns an error if upstream rejects the account.
    pub async fn create_account(&self, address: &str) -> Result<Account> {
        let account: Account = self
            .http
            .post(self.endpoint(&["accounts"]))
            .json(&self.credentials_body(address))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!("Created upstream account {}", account.id);
        Ok(account)
    }

    /// Request a bearer token for an existing account.
    ///
    /// # Errors
    ///
    /// Returns an error if upstream refuses to issue a token.
    pub async fn issue_token(&self, address: &str) -> Result<TokenGrant> {
        let grant = self
            .http
            .post(self.endpoint(&["token"]))
            .json(&self.credentials_body(address))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(grant)
    }

    /// Provision a mailbox: pick a domain, create the account, then
    /// obtain its token. One attempt per step.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error.
    pub async fn create_mailbox(&self, username: &str) -> Result<NewMailbox> {
        let domain = self.first_domain().await?;
        let account = self.create_account(&format!("{username}@{domain}")).await?;
        let token = self.issue_token(&account.address).await?;

        info!("Provisioned mailbox {}", account.address);
        Ok(NewMailbox {
            address: account.address,
            token,
        })
    }

    /// The raw message collection for the credential's mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON.
    pub async fn list_messages(&self, credential: &Credential) -> Result<Value> {
        debug!("Forwarding message listing");
        let body = self
            .http
            .get(self.endpoint(&["messages"]))
            .header(AUTHORIZATION, credential.bearer())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body)
    }

    /// The raw detail of one message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON.
    pub async fn get_message(&self, id: &str, credential: &Credential) -> Result<Value> {
        debug!("Forwarding fetch of message {}", id);
        let body = self
            .http
            .get(self.endpoint(&["messages", id]))
            .header(AUTHORIZATION, credential.bearer())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body)
    }

    /// Set `seen: true` on a message with a merge-patch.
    ///
    /// # Errors
    ///
    /// Returns an error if upstream rejects the update.
    pub async fn mark_seen(&self, id: &str, credential: &Credential) -> Result<()> {
        debug!("Forwarding mark-read of message {}", id);
        let body = serde_json::to_vec(&json!({ "seen": true }))?;
        self.http
            .patch(self.endpoint(&["messages", id]))
            .header(AUTHORIZATION, credential.bearer())
            .header(CONTENT_TYPE, MERGE_PATCH)
            .body(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Delete a message.
    ///
    /// # Errors
    ///
    /// Returns an error if upstream rejects the delete.
    pub async fn delete_message(&self, id: &str, credential: &Credential) -> Result<()> {
        debug!("Forwarding delete of message {}", id);
        self.http
            .delete(self.endpoint(&["messages", id]))
            .header(AUTHORIZATION, credential.bearer())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Start downloading an attachment. The body is left unread so the
    /// caller can stream it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or upstream answers with
    /// a non-success status.
    pub async fn fetch_attachment(
        &self,
        id: &str,
        attachment_id: &str,
        credential: &Credential,
    ) -> Result<Response> {
        debug!("Forwarding attachment {} of message {}", attachment_id, id);
        let response = self
            .http
            .get(self.endpoint(&["messages", id, "attachment", attachment_id]))
            .header(AUTHORIZATION, credential.bearer())
            .send()
            .await?
            .error_for_status()?;
        Ok(response)
    }

    // -- private helpers --

    fn endpoint(&self, segments: &[&str]) -> Url {
        join_path(&self.base_url, segments)
    }

    fn credentials_body(&self, address: &str) -> Value {
        json!({ "address": address, "password": self.password })
    }
}

/// Append percent-encoded path segments to `base`.
pub(crate) fn join_path(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}
