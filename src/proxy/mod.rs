//! HTTP proxy in front of the upstream provider
//!
//! Routes are mounted under [`API_PREFIX`]. Handlers share nothing but
//! an immutable [`AppState`]; each request is one forward to upstream.

mod handlers;
mod response;

pub use handlers::disposition_filename;
pub use response::Authorized;

use crate::config::{API_PREFIX, ProxyConfig};
use crate::error::{Error, Result};
use crate::upstream::UpstreamClient;
use crate::username::UsernameGenerator;
use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, patch};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    upstream: Arc<UpstreamClient>,
    usernames: Arc<UsernameGenerator>,
}

impl AppState {
    #[must_use]
    pub fn new(upstream: UpstreamClient) -> Self {
        Self {
            upstream: Arc::new(upstream),
            usernames: Arc::new(UsernameGenerator::new()),
        }
    }
}

/// Build the proxy router.
///
/// When `frontend_url` is given, cross-origin requests from that origin
/// are allowed.
///
/// # Errors
///
/// Returns [`Error::Config`] if `frontend_url` is not a valid header value.
pub fn router(state: AppState, frontend_url: Option<&str>) -> Result<Router> {
    let api = Router::new()
        .route("/", get(handlers::health))
        .route("/generate", get(handlers::generate))
        .route("/messages", get(handlers::list_messages))
        .route(
            "/messages/{id}",
            get(handlers::get_message).delete(handlers::delete_message),
        )
        .route("/messages/{id}/read", patch(handlers::mark_read))
        .route(
            "/messages/{id}/attachment/{attachment_id}",
            get(handlers::get_attachment),
        );

    let mut app = Router::new()
        .route("/", get(handlers::root))
        .nest(API_PREFIX, api)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if let Some(origin) = frontend_url {
        let origin = HeaderValue::from_str(origin)
            .map_err(|e| Error::Config(format!("Invalid FRONTEND_URL: {e}")))?;
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([
                    Method::GET,
                    Method::HEAD,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_headers(AllowHeaders::mirror_request()),
        );
    }

    Ok(app)
}

/// A bound, not yet running proxy.
pub struct ProxyServer {
    listener: TcpListener,
    app: Router,
}

impl ProxyServer {
    /// Build the upstream client and router, and bind the listener.
    ///
    /// A `port` of 0 lets the OS pick one; see [`Self::local_addr`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the address
    /// cannot be bound.
    pub async fn bind(config: &ProxyConfig) -> Result<Self> {
        let upstream = UpstreamClient::new(&config.base_url, config.password.clone())?;
        let app = router(AppState::new(upstream), config.frontend_url.as_deref())?;
        let listener = TcpListener::bind(config.bind_addr()).await?;

        Ok(Self { listener, app })
    }

    /// The address the proxy is listening on.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until the process stops.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the server fails.
    pub async fn run(self) -> Result<()> {
        info!("Proxy listening on {}", self.local_addr()?);
        axum::serve(self.listener, self.app).await?;
        Ok(())
    }
}
