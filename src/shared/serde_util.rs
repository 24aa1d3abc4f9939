//! Custom serde helpers for provider wire formats.

/// Deserializes a price that may arrive as a JSON number or a numeric string.
pub mod number_or_string {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| serde::de::Error::custom(format!("Number out of range: {}", n))),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| serde::de::Error::custom(format!("Invalid number '{}': {}", s, e))),
            other => Err(serde::de::Error::custom(format!(
                "Expected number or numeric string, got {}",
                other
            ))),
        }
    }
}

/// Deserializes the provider's `0`/`1` flags into `bool`.
pub mod int_bool {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Bool(b) => Ok(b),
            Value::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
            Value::Null => Ok(false),
            other => Err(serde::de::Error::custom(format!("Invalid flag: {}", other))),
        }
    }
}
