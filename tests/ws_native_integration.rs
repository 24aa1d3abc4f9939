//! Integration tests for `DerivClient` over a real WebSocket.
//!
//! Most tests run against a local mock server that speaks the subset of the
//! Deriv protocol the client uses (`authorize`, `ticks_history`, `ping`).
//! The live tests at the bottom connect to the real endpoint and are
//! `#[ignore]` because they need network access and credentials.
//!
//! Run the live tests with:
//! ```bash
//! cargo test --features ws-native --test ws_native_integration -- --ignored
//! ```

#![cfg(feature = "ws-native")]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use deriv_candles::auth::Credentials;
use deriv_candles::client::DerivClient;
use deriv_candles::domain::candles::FetchRequest;
use deriv_candles::error::{DerivError, WsError};
use deriv_candles::shared::{End, Granularity};

const TEST_TIMEOUT: Duration = Duration::from_secs(15);
const GOOD_TOKEN: &str = "good-token";
const FIRST_EPOCH: i64 = 1_700_000_000;
const BAR_COUNT: i64 = 25;

// ─── Mock server ─────────────────────────────────────────────────────────────

fn mock_bars() -> Vec<Value> {
    (0..BAR_COUNT)
        .map(|i| {
            let px = 100.0 + i as f64;
            json!({
                "epoch": FIRST_EPOCH + i * 60,
                "open": px,
                "high": px + 1.0,
                "low": px - 1.0,
                // the provider sometimes quotes prices as strings
                "close": format!("{:.2}", px + 0.5),
            })
        })
        .collect()
}

fn respond(request: &Value) -> Option<Value> {
    let req_id = request.get("req_id").cloned().unwrap_or(Value::Null);

    if let Some(token) = request.get("authorize").and_then(Value::as_str) {
        if token != GOOD_TOKEN {
            return Some(json!({
                "msg_type": "authorize",
                "echo_req": request,
                "req_id": req_id,
                "error": {"code": "InvalidToken", "message": "The token is invalid."}
            }));
        }
        return Some(json!({
            "msg_type": "authorize",
            "echo_req": request,
            "req_id": req_id,
            "authorize": {
                "loginid": "VRTC1234",
                "currency": "USD",
                "is_virtual": 1,
                "scopes": ["read"]
            }
        }));
    }

    if let Some(symbol) = request.get("ticks_history").and_then(Value::as_str) {
        if symbol == "BOGUS" {
            return Some(json!({
                "msg_type": "candles",
                "echo_req": request,
                "req_id": req_id,
                "error": {"code": "InvalidSymbol", "message": "Symbol BOGUS is invalid."}
            }));
        }
        let start = request["start"].as_i64().unwrap_or(0);
        let end = request["end"].as_i64().unwrap_or(i64::MAX);
        let count = request["count"].as_u64().unwrap_or(5000) as usize;

        let in_range: Vec<Value> = mock_bars()
            .into_iter()
            .filter(|c| {
                let epoch = c["epoch"].as_i64().unwrap_or_default();
                epoch >= start && epoch <= end
            })
            .collect();
        let skip = in_range.len().saturating_sub(count);
        // newest first, so the client has to sort
        let page: Vec<Value> = in_range.into_iter().skip(skip).rev().collect();

        return Some(json!({
            "msg_type": "candles",
            "echo_req": request,
            "req_id": req_id,
            "pip_size": 2,
            "candles": page
        }));
    }

    if request.get("ping").is_some() {
        return Some(json!({
            "msg_type": "ping",
            "echo_req": request,
            "req_id": req_id,
            "ping": "pong"
        }));
    }

    None
}

/// Spawn a mock server and return its `ws://` base URL.
async fn spawn_mock_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                let (mut sink, mut source) = ws.split();
                while let Some(Ok(msg)) = source.next().await {
                    let Message::Text(text) = msg else {
                        continue;
                    };
                    let text_str: &str = text.as_ref();
                    let Ok(request) = serde_json::from_str::<Value>(text_str) else {
                        continue;
                    };
                    if let Some(reply) = respond(&request) {
                        if sink.send(Message::Text(reply.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                }
            });
        }
    });

    format!("ws://{}/websockets/v3", addr)
}

async fn connected_client(url: &str) -> DerivClient {
    timeout(
        TEST_TIMEOUT,
        DerivClient::builder()
            .credentials(Credentials::new("1089", GOOD_TOKEN))
            .ws_url(url)
            .page_size(10)
            .reconnect(false)
            .connect(),
    )
    .await
    .expect("timed out connecting")
    .expect("connect should succeed")
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn connect_authorizes_and_stores_account() {
    let url = spawn_mock_server().await;
    let mut client = connected_client(&url).await;

    assert!(client.is_connected());
    assert!(client.auth().is_authorized().await);
    let account = client.auth().account().await.expect("account");
    assert_eq!(account.loginid, "VRTC1234");
    assert!(account.is_virtual);

    client.disconnect().await.unwrap();
    assert!(!client.is_connected());
    assert!(!client.auth().is_authorized().await);
}

#[tokio::test]
async fn invalid_token_fails_connect() {
    let url = spawn_mock_server().await;
    let result = DerivClient::builder()
        .credentials(Credentials::new("1089", "wrong"))
        .ws_url(&url)
        .reconnect(false)
        .connect()
        .await;

    match result {
        Err(err) => {
            let provider = err.provider().expect("provider error");
            assert_eq!(provider.code, "InvalidToken");
        }
        Ok(_) => panic!("connect should fail with an invalid token"),
    }
}

#[tokio::test]
async fn unreachable_server_fails_connect() {
    let result = DerivClient::builder()
        .credentials(Credentials::new("1089", GOOD_TOKEN))
        .ws_url("ws://127.0.0.1:1/websockets/v3")
        .reconnect(false)
        .connect()
        .await;

    assert!(matches!(
        result,
        Err(DerivError::Ws(WsError::ConnectionFailed(_)))
    ));
}

#[tokio::test]
async fn fetch_page_returns_provider_order() {
    let url = spawn_mock_server().await;
    let client = connected_client(&url).await;

    let request = FetchRequest::new(
        "R_50",
        FIRST_EPOCH,
        End::Epoch(FIRST_EPOCH + 240),
        Granularity::MINUTE_1,
        3,
    )
    .unwrap();
    let page = client.candles().fetch_page(&request).await.unwrap();

    let epochs: Vec<i64> = page.iter().map(|c| c.epoch).collect();
    assert_eq!(
        epochs,
        vec![FIRST_EPOCH + 240, FIRST_EPOCH + 180, FIRST_EPOCH + 120]
    );
    assert_eq!(page[0].close, 104.5);
}

#[tokio::test]
async fn fetch_all_walks_every_page() {
    let url = spawn_mock_server().await;
    let client = connected_client(&url).await;

    let series = timeout(
        TEST_TIMEOUT,
        client
            .candles()
            .fetch_all("R_50", FIRST_EPOCH - 3600, Granularity::MINUTE_1),
    )
    .await
    .expect("timed out walking history")
    .unwrap();

    assert_eq!(series.len(), BAR_COUNT as usize);
    assert!(series.is_strictly_ascending());
    assert_eq!(series.oldest().map(|c| c.epoch), Some(FIRST_EPOCH));
    assert_eq!(
        series.latest().map(|c| c.epoch),
        Some(FIRST_EPOCH + (BAR_COUNT - 1) * 60)
    );
}

#[tokio::test]
async fn fetch_all_with_page_size_matches_default() {
    let url = spawn_mock_server().await;
    let client = connected_client(&url).await;

    let small = client
        .candles()
        .fetch_all_with_page_size("R_50", 0, Granularity::MINUTE_1, 4)
        .await
        .unwrap();
    let large = client
        .candles()
        .fetch_all_with_page_size("R_50", 0, Granularity::MINUTE_1, 1000)
        .await
        .unwrap();

    assert_eq!(small, large);
}

#[tokio::test]
async fn concurrent_walks_share_one_session() {
    let url = spawn_mock_server().await;
    let client = connected_client(&url).await;

    let (first, second) = (client.candles(), client.candles());
    let (a, b) = tokio::join!(
        first.fetch_all("R_50", 0, Granularity::MINUTE_1),
        second.fetch_all("R_50", 0, Granularity::MINUTE_1),
    );

    assert_eq!(a.unwrap(), b.unwrap());
}

#[tokio::test]
async fn provider_error_surfaces_payload() {
    let url = spawn_mock_server().await;
    let client = connected_client(&url).await;

    let err = client
        .candles()
        .fetch_all("BOGUS", 0, Granularity::MINUTE_1)
        .await
        .unwrap_err();

    let provider = err.provider().expect("provider error");
    assert_eq!(provider.code, "InvalidSymbol");
    assert_eq!(provider.payload["message"], "Symbol BOGUS is invalid.");
}

// ─── Live tests ──────────────────────────────────────────────────────────────

async fn live_client() -> DerivClient {
    let credentials = Credentials::from_dotenv().expect("DERIV_APP_ID and DERIV_TOKEN");
    DerivClient::builder()
        .credentials(credentials)
        .connect()
        .await
        .expect("connect should succeed")
}

#[tokio::test]
#[ignore]
async fn live_authorize() {
    let mut client = live_client().await;
    let account = client.auth().account().await.expect("account");
    assert!(!account.loginid.is_empty());
    client.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn live_fetch_recent_hourly_history() {
    let mut client = live_client().await;
    let start = chrono::Utc::now().timestamp() - 14 * 86_400;

    let series = client
        .candles()
        .fetch_all_with_page_size("R_50", start, Granularity::HOUR_1, 100)
        .await
        .unwrap();

    assert!(!series.is_empty());
    assert!(series.is_strictly_ascending());
    assert!(series.oldest().map(|c| c.epoch >= start).unwrap_or(false));

    client.disconnect().await.unwrap();
}
