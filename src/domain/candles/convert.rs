//! Conversions: wire candles → `Candle`, `FetchRequest` → `ticks_history`,
//! raw response → page.

use super::wire::{CandlesResponse, TicksHistoryRequest, WireCandle};
use super::{Candle, FetchRequest};
use crate::error::DerivError;
use crate::ws::MessageIn;

impl From<WireCandle> for Candle {
    fn from(w: WireCandle) -> Self {
        Self {
            epoch: w.epoch,
            open: w.open,
            high: w.high,
            low: w.low,
            close: w.close,
        }
    }
}

impl From<&FetchRequest> for TicksHistoryRequest {
    fn from(r: &FetchRequest) -> Self {
        Self {
            ticks_history: r.symbol.clone(),
            start: r.start,
            end: r.end,
            granularity: r.granularity,
            count: r.count,
            style: "candles".to_string(),
        }
    }
}

/// Turn a `ticks_history` response into one page, in provider order.
///
/// An embedded `error` object becomes [`DerivError::Provider`]. A response
/// without a `candles` key is an empty page.
pub(crate) fn parse_page(msg: MessageIn) -> Result<Vec<Candle>, DerivError> {
    let msg = msg.into_result()?;
    match msg.msg_type.as_str() {
        "candles" | "ticks_history" => {}
        other => {
            return Err(DerivError::UnexpectedResponse(format!(
                "expected candles, got msg_type '{}'",
                other
            )))
        }
    }
    let body: CandlesResponse = msg.decode()?;
    Ok(body.candles.into_iter().map(Candle::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{End, Granularity};
    use serde_json::json;

    fn msg(raw: serde_json::Value) -> MessageIn {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_ticks_history_from_fetch_request() {
        let req = FetchRequest::new("R_50", 10, End::Epoch(500), Granularity::MINUTE_5, 100).unwrap();
        let wire = TicksHistoryRequest::from(&req);
        assert_eq!(
            serde_json::to_value(&wire).unwrap(),
            json!({
                "ticks_history": "R_50",
                "start": 10,
                "end": 500,
                "granularity": 300,
                "count": 100,
                "style": "candles"
            })
        );
    }

    #[test]
    fn test_parse_page_keeps_provider_order() {
        let page = parse_page(msg(json!({
            "msg_type": "candles",
            "req_id": 2,
            "echo_req": {},
            "candles": [
                {"epoch": 120, "open": 1.5, "high": 2, "low": 1, "close": "1.75"},
                {"epoch": 60, "open": 1, "high": 1.5, "low": 0.5, "close": 1.5}
            ]
        })))
        .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].epoch, 120);
        assert_eq!(page[0].close, 1.75);
        assert_eq!(page[1].epoch, 60);
    }

    #[test]
    fn test_parse_page_missing_candles_is_empty() {
        let page = parse_page(msg(json!({"msg_type": "candles", "echo_req": {}}))).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_parse_page_provider_error() {
        let err = parse_page(msg(json!({
            "msg_type": "ticks_history",
            "echo_req": {},
            "error": {"code": "MarketIsClosed", "message": "This market is presently closed."}
        })))
        .unwrap_err();
        let provider = err.provider().unwrap();
        assert_eq!(provider.code, "MarketIsClosed");
        assert_eq!(provider.payload["message"], "This market is presently closed.");
    }

    #[test]
    fn test_parse_page_wrong_msg_type() {
        let err = parse_page(msg(json!({"msg_type": "history", "echo_req": {}}))).unwrap_err();
        assert!(matches!(err, DerivError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_parse_page_malformed_candle() {
        let err = parse_page(msg(json!({
            "msg_type": "candles",
            "echo_req": {},
            "candles": [{"epoch": 60, "open": "x", "high": 1, "low": 1, "close": 1}]
        })))
        .unwrap_err();
        assert!(matches!(err, DerivError::Serde(_)));
    }
}
