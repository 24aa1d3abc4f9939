//! Shared newtypes and utilities used across all domain modules.
//!
//! These types are serialization-transparent: they serialize/deserialize identically
//! to the raw format the provider expects, so they can be used directly in wire types
//! without conversion overhead.

pub mod serde_util;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

// ─── Symbol ──────────────────────────────────────────────────────────────────

/// Newtype for instrument identifiers (e.g. `"R_50"`, `"CRASH500"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Symbol(s.to_string()))
    }
}

impl Serialize for Symbol {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Symbol(s))
    }
}

// ─── Granularity ─────────────────────────────────────────────────────────────

/// Candle bucket width in seconds. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Granularity(u32);

impl Granularity {
    pub const MINUTE_1: Self = Self(60);
    pub const MINUTE_2: Self = Self(120);
    pub const MINUTE_3: Self = Self(180);
    pub const MINUTE_5: Self = Self(300);
    pub const MINUTE_10: Self = Self(600);
    pub const MINUTE_15: Self = Self(900);
    pub const MINUTE_30: Self = Self(1800);
    pub const HOUR_1: Self = Self(3600);
    pub const HOUR_2: Self = Self(7200);
    pub const HOUR_4: Self = Self(14400);
    pub const HOUR_8: Self = Self(28800);
    pub const DAY_1: Self = Self(86400);

    /// Buckets the provider serves natively.
    pub const SUPPORTED: [Self; 12] = [
        Self::MINUTE_1,
        Self::MINUTE_2,
        Self::MINUTE_3,
        Self::MINUTE_5,
        Self::MINUTE_10,
        Self::MINUTE_15,
        Self::MINUTE_30,
        Self::HOUR_1,
        Self::HOUR_2,
        Self::HOUR_4,
        Self::HOUR_8,
        Self::DAY_1,
    ];

    /// `None` for a zero-width bucket.
    pub fn new(seconds: u32) -> Option<Self> {
        (seconds > 0).then_some(Self(seconds))
    }

    pub fn seconds(&self) -> u32 {
        self.0
    }

    pub fn is_supported(&self) -> bool {
        Self::SUPPORTED.contains(self)
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl<'de> Deserialize<'de> for Granularity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u32::deserialize(deserializer)?;
        Granularity::new(secs)
            .ok_or_else(|| serde::de::Error::custom("granularity must be greater than zero"))
    }
}

// ─── End ─────────────────────────────────────────────────────────────────────

/// Upper bound of a page request: a concrete epoch or the provider's newest bar.
///
/// Serializes as the integer epoch or the string `"latest"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum End {
    #[default]
    Latest,
    Epoch(i64),
}

impl End {
    pub fn epoch(&self) -> Option<i64> {
        match self {
            Self::Latest => None,
            Self::Epoch(e) => Some(*e),
        }
    }
}

impl std::fmt::Display for End {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Epoch(e) => write!(f, "{}", e),
        }
    }
}

impl Serialize for End {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Latest => serializer.serialize_str("latest"),
            Self::Epoch(e) => serializer.serialize_i64(*e),
        }
    }
}

impl<'de> Deserialize<'de> for End {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) if s == "latest" => Ok(End::Latest),
            serde_json::Value::String(s) => s
                .parse::<i64>()
                .map(End::Epoch)
                .map_err(|_| serde::de::Error::custom(format!("invalid end: {}", s))),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(End::Epoch)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid end: {}", n))),
            other => Err(serde::de::Error::custom(format!("invalid end: {}", other))),
        }
    }
}
