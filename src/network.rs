//! Network URL constants for the Deriv API.

/// Default WebSocket URL (the `app_id` query parameter is appended per client).
pub const DEFAULT_WS_URL: &str = "wss://ws.derivws.com/websockets/v3";

/// Build the connection URL for an application id.
pub fn ws_url_with_app_id(base: &str, app_id: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!(
        "{}{}app_id={}",
        base.trim_end_matches('/'),
        separator,
        urlencoding::encode(app_id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url_with_app_id() {
        assert_eq!(
            ws_url_with_app_id(DEFAULT_WS_URL, "1089"),
            "wss://ws.derivws.com/websockets/v3?app_id=1089"
        );
        assert_eq!(
            ws_url_with_app_id("wss://example.test/ws?l=EN", "1 2"),
            "wss://example.test/ws?l=EN&app_id=1%202"
        );
    }
}
