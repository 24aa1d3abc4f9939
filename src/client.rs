//! High-level client: `DerivClient` with nested sub-client accessors.
//!
//! Each domain has its own sub-client in `domain/<name>/client.rs`.
//! This module keeps the builder, the shared session state, and accessor
//! methods.

use crate::auth::client::Auth;
use crate::auth::{Account, Credentials};
use crate::domain::candles::client::Candles;
use crate::domain::candles::convert::parse_page;
use crate::domain::candles::wire::TicksHistoryRequest;
use crate::domain::candles::{
    Candle, CandleSource, FetchRequest, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE,
};
use crate::error::{ConfigurationError, DerivError};
use crate::ws::native::WsClient;
use crate::ws::{MessageOut, ReadyState, WsConfig, WsEvent};

use async_lock::RwLock;
use futures_util::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

// Re-export sub-client types for convenience.
pub use crate::auth::client::Auth as AuthClient;
pub use crate::domain::candles::client::Candles as CandlesClient;

/// The primary entry point: one authorized provider session.
///
/// Provides nested sub-client accessors: `client.auth()`, `client.candles()`.
/// Requests are correlated by `req_id`, so several walks may share one
/// client concurrently.
pub struct DerivClient {
    pub(crate) ws: WsClient,
    pub(crate) credentials: Credentials,
    /// Account returned by the last successful `authorize`.
    pub(crate) account: Arc<RwLock<Option<Account>>>,
    pub(crate) page_size: u32,
    pub(crate) max_pages: Option<u32>,
}

impl DerivClient {
    pub fn builder() -> DerivClientBuilder {
        DerivClientBuilder::default()
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn auth(&self) -> Auth<'_> {
        Auth { client: self }
    }

    pub fn candles(&self) -> Candles<'_> {
        Candles { client: self }
    }

    // ── Connection ───────────────────────────────────────────────────────

    pub fn app_id(&self) -> &str {
        &self.credentials.app_id
    }

    pub fn is_connected(&self) -> bool {
        self.ws.is_connected()
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ws.ready_state()
    }

    /// Connection events and unsolicited messages.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = WsEvent> + Send + '_>> {
        self.ws.events()
    }

    /// Close the socket. In-flight requests fail with `WsError::Closed`.
    pub async fn disconnect(&mut self) -> Result<(), DerivError> {
        self.ws.disconnect().await?;
        *self.account.write().await = None;
        tracing::info!("Disconnected");
        Ok(())
    }

    pub(crate) async fn request_page(
        &self,
        request: &FetchRequest,
    ) -> Result<Vec<Candle>, DerivError> {
        let msg = MessageOut::TicksHistory(TicksHistoryRequest::from(request));
        let response = self.ws.request(msg).await?;
        parse_page(response)
    }
}

impl CandleSource for DerivClient {
    async fn fetch_page(&self, request: &FetchRequest) -> Result<Vec<Candle>, DerivError> {
        self.request_page(request).await
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct DerivClientBuilder {
    credentials: Option<Credentials>,
    ws_url: String,
    page_size: u32,
    max_pages: Option<u32>,
    request_timeout: Duration,
    reconnect: bool,
}

impl Default for DerivClientBuilder {
    fn default() -> Self {
        Self {
            credentials: None,
            ws_url: crate::network::DEFAULT_WS_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            request_timeout: Duration::from_secs(30),
            reconnect: true,
        }
    }
}

impl DerivClientBuilder {
    /// Explicit credentials. Without them `connect()` reads the environment.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Base WebSocket URL; `app_id` is appended on connect.
    pub fn ws_url(mut self, url: &str) -> Self {
        self.ws_url = url.to_string();
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Pages per walk before giving up. `None` removes the limit.
    pub fn max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn reconnect(mut self, reconnect: bool) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Open the socket and authorize.
    ///
    /// Fails before any request is sent if credentials are missing or the
    /// URL is not a WebSocket URL.
    pub async fn connect(self) -> Result<DerivClient, DerivError> {
        let credentials = match self.credentials {
            Some(credentials) => credentials,
            None => Credentials::from_env()?,
        };
        credentials.validate()?;

        if self.page_size == 0 {
            return Err(DerivError::Validation(
                "page_size must be greater than zero".into(),
            ));
        }
        if !(self.ws_url.starts_with("wss://") || self.ws_url.starts_with("ws://")) {
            return Err(ConfigurationError::InvalidUrl(self.ws_url).into());
        }

        let config = WsConfig {
            url: crate::network::ws_url_with_app_id(&self.ws_url, &credentials.app_id),
            reconnect: self.reconnect,
            request_timeout_ms: self.request_timeout.as_millis() as u64,
            ..WsConfig::default()
        };
        tracing::info!(url = %self.ws_url, app_id = %credentials.app_id, "Connecting");

        let mut ws = WsClient::new(config);
        ws.connect().await?;

        let client = DerivClient {
            ws,
            credentials,
            account: Arc::new(RwLock::new(None)),
            page_size: self.page_size,
            max_pages: self.max_pages,
        };
        client.auth().authorize().await?;
        Ok(client)
    }
}
