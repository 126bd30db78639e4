/// Wire types for the option chain analytics endpoint
///
/// These types match the JSON served by the analytics backend at
/// `GET /api/data/{symbol}`. The snapshot is replaced as a whole on every
/// successful fetch, so nothing here is mutable after decoding.

use serde::{Deserialize, Serialize};

/// Pre-computed option chain analytics for one underlying
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OptionChainSnapshot {
    /// Underlying spot price
    pub spot_price: f64,
    /// Put-call ratio summary
    pub pcr: PcrSummary,
    /// Strike with the least aggregate loss for option writers
    pub max_pain: f64,
    /// Chain-wide OI skew flags
    pub skew_patterns: SkewPatterns,
    /// Per-strike rows, in the order the backend returned them
    pub strike_data: Vec<StrikeRow>,
}

/// Put-call ratio and the open interest totals it was derived from
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PcrSummary {
    pub pcr_oi: f64,
    pub total_ce_oi: f64,
    pub total_pe_oi: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SkewPatterns {
    pub bullish_skew: bool,
    pub bearish_skew: bool,
}

/// One strike of the option chain
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StrikeRow {
    pub strike: f64,

    pub ce_oi: f64,
    pub ce_change_oi: f64,
    pub ce_volume: f64,
    #[serde(default)]
    pub ce_volume_oi_ratio: Option<f64>,
    #[serde(default)]
    pub ce_buildup: Option<Buildup>,

    pub pe_oi: f64,
    pub pe_change_oi: f64,
    pub pe_volume: f64,
    #[serde(default)]
    pub pe_volume_oi_ratio: Option<f64>,
    #[serde(default)]
    pub pe_buildup: Option<Buildup>,

    /// Call/put OI asymmetry at this strike (0.35 = 35%)
    pub oi_skew: f64,
}

/// Position buildup classification at a strike
///
/// The backend sends a free-form string. Only `LONG` and `SHORT` carry
/// meaning; anything else is kept verbatim for display.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Buildup {
    Long,
    Short,
    Other(String),
}

impl Buildup {
    /// Convert to display string
    pub fn as_str(&self) -> &str {
        match self {
            Buildup::Long => "LONG",
            Buildup::Short => "SHORT",
            Buildup::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for Buildup {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "LONG" => Buildup::Long,
            "SHORT" => Buildup::Short,
            _ => Buildup::Other(raw),
        }
    }
}

impl From<Buildup> for String {
    fn from(buildup: Buildup) -> Self {
        buildup.as_str().to_string()
    }
}

impl std::fmt::Display for Buildup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body of `GET /api/data/{symbol}`
///
/// The analytics backend wraps the snapshot in an envelope together with its
/// trading signals and a generation timestamp. A bare snapshot is accepted too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChainPayload {
    Envelope {
        analysis: OptionChainSnapshot,
        #[serde(default)]
        timestamp: Option<String>,
    },
    Bare(OptionChainSnapshot),
}

impl ChainPayload {
    pub fn into_update(self) -> ChainUpdate {
        match self {
            ChainPayload::Envelope { analysis, timestamp } => ChainUpdate {
                snapshot: analysis,
                as_of: timestamp,
            },
            ChainPayload::Bare(snapshot) => ChainUpdate {
                snapshot,
                as_of: None,
            },
        }
    }
}

/// Successful fetch result handed to the controller
#[derive(Debug, Clone, PartialEq)]
pub struct ChainUpdate {
    pub snapshot: OptionChainSnapshot,
    /// Backend generation timestamp, if the backend sent one
    pub as_of: Option<String>,
}

/// Error body sent by the backend with non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}
