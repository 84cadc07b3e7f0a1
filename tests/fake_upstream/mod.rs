#![allow(dead_code)]

//! Fake disposable-mail provider for integration testing
//!
//! An in-process HTTP server speaking enough of the mail.tm-style API
//! to drive the proxy end-to-end:
//!
//! domains -> accounts -> token -> messages (list, read, mark, delete,
//! attachment)
//!
//! ## Module layout
//!
//! - `provider` -- test data model (domains, accounts, messages, builder)
//! - `server` -- axum routes, bearer checks and request counting
//!
//! [`start_proxy`] puts a real proxy in front of a running fake and
//! returns the proxy's `/api/mail` URL.

pub mod provider;
mod server;

pub use provider::{ProviderBuilder, TestMessage};
pub use server::FakeProvider;

use tempmail_proxy::{API_PREFIX, ProxyConfig, ProxyServer};

/// The password the proxy gives every account it creates.
pub const PASSWORD: &str = "test-password";

/// Start a proxy on an OS-assigned port in front of `provider`.
///
/// Returns the proxy's API base URL, e.g. `http://127.0.0.1:41234/api/mail`.
pub async fn start_proxy(provider: &FakeProvider) -> String {
    let config = ProxyConfig {
        base_url: provider.url(),
        password: PASSWORD.to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        frontend_url: Some("http://localhost:3000".to_string()),
    };

    let server = ProxyServer::bind(&config).await.expect("bind proxy");
    let addr = server.local_addr().expect("proxy address");
    tokio::spawn(async move {
        let _ = server.run().await;
    });

    format!("http://{addr}{API_PREFIX}")
}
