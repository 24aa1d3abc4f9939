//! # Deriv Candles
//!
//! Complete OHLC candle history from the Deriv WebSocket API, assembled from
//! bounded pages into one ascending, duplicate-free series.
//!
//! ## Architecture
//!
//! The crate is organized in layers:
//!
//! 1. **Core**: Shared newtypes, candle domain, history walker, CSV export
//!    (always available, no runtime required)
//! 2. **Auth**: Credentials from the environment / `.env`, `authorize`
//! 3. **WebSocket**: `tokio-tungstenite` transport with `req_id`
//!    correlation, keepalive, reconnect
//! 4. **High-Level Client**: `DerivClient` with nested sub-clients
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use deriv_candles::prelude::*;
//!
//! let client = DerivClient::builder()
//!     .credentials(Credentials::from_dotenv()?)
//!     .connect()
//!     .await?;
//!
//! let series = client
//!     .candles()
//!     .fetch_all("R_50", 1_600_000_000, Granularity::HOUR_1)
//!     .await?;
//! write_csv_file(&series, "data/R_50_3600.csv")?;
//! ```
//!
//! Any other page source can be walked by implementing [`CandleSource`]
//! and handing it to [`HistoryWalker`].
//!
//! [`CandleSource`]: domain::candles::CandleSource
//! [`HistoryWalker`]: domain::candles::HistoryWalker

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes used across all domains.
pub mod shared;

/// Domain modules (vertical slices): types, wire types, conversions, state.
pub mod domain;

/// Unified error types.
pub mod error;

/// Network URL constants.
pub mod network;

// ── Layer 2: Auth ────────────────────────────────────────────────────────────

/// Authentication: credentials, `authorize`, account profile.
pub mod auth;

// ── Layer 3: WebSocket ───────────────────────────────────────────────────────

/// WebSocket client: messages, events, configuration.
pub mod ws;

// ── Layer 4: High-Level Client ───────────────────────────────────────────────

/// `DerivClient`, the primary entry point.
#[cfg(feature = "ws-native")]
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared newtypes
    pub use crate::shared::{End, Granularity, Symbol};

    // Domain types: candles
    pub use crate::domain::candles::export::{read_csv, write_csv, write_csv_file};
    pub use crate::domain::candles::{
        Candle, CandleSeries, CandleSource, FetchRequest, HistoryWalker, DEFAULT_MAX_PAGES,
        DEFAULT_PAGE_SIZE,
    };

    // Errors
    pub use crate::error::{ConfigurationError, DerivError, ProviderError, WsError};

    // Network
    pub use crate::network::DEFAULT_WS_URL;

    // Auth
    pub use crate::auth::{Account, Credentials};

    // Client + sub-clients
    #[cfg(feature = "ws-native")]
    pub use crate::client::{AuthClient, CandlesClient, DerivClient, DerivClientBuilder};

    // WebSocket types
    pub use crate::ws::{MessageIn, MessageOut, ReadyState, WsConfig, WsEvent};
}
