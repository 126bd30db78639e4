/// Display formatting and signal classification rules
///
/// Scales follow the Indian market convention: 1 lakh (L) = 100,000 and
/// 1 thousand (K) = 1,000.

use rust_decimal::{Decimal, RoundingStrategy};

use super::types::{Buildup, SkewPatterns};

const LAKH: f64 = 100_000.0;
const THOUSAND: f64 = 1_000.0;

/// PCR-OI above this is bearish positioning
pub const PCR_DANGER_ABOVE: f64 = 1.2;
/// PCR-OI below this is bullish positioning
pub const PCR_SUCCESS_BELOW: f64 = 0.8;
/// Strike OI skew beyond +/- this gets highlighted
pub const OI_SKEW_HIGHLIGHT: f64 = 0.3;

/// Traffic-light level for a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Success,
    Warning,
    Danger,
}

/// Visual class of a table cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CellClass {
    #[default]
    None,
    /// Green text
    TextSuccess,
    /// Red text
    TextDanger,
    /// Green cell background
    FillSuccess,
    /// Red cell background
    FillDanger,
    /// Yellow cell background
    FillWarning,
    /// Blue cell background
    FillInfo,
}

/// Magnitude formatter for OI and volume figures
///
/// `>= 100000` renders in lakh, `>= 1000` in thousands, anything smaller
/// (including negatives) as the plain number.
pub fn format_number(num: f64) -> String {
    if num >= LAKH {
        format!("{}L", to_fixed(num / LAKH, 1))
    } else if num >= THOUSAND {
        format!("{}K", to_fixed(num / THOUSAND, 1))
    } else {
        format_plain(num)
    }
}

/// Always scale to lakh with one decimal (used for the OI total cards)
pub fn format_lakh(num: f64) -> String {
    format!("{}L", to_fixed(num / LAKH, 1))
}

/// Shortest round-trip rendering: `17000` not `17000.0`, `12.5` stays `12.5`
///
/// Never switches to exponent notation, so only matches JS number printing
/// for magnitudes between 1e-6 and 1e21.
pub fn format_plain(num: f64) -> String {
    if num == 0.0 {
        // avoid "-0"
        return "0".to_string();
    }
    num.to_string()
}

/// Fixed-point rendering rounding ties away from zero
///
/// `format!("{:.1}", 1.25)` yields `1.2` (ties to even); prices and OI are
/// displayed with ties rounded up, so `1.25` becomes `1.3`. Rounding works on
/// the exact binary value, so `1.005` rounds to `1.00`.
pub fn to_fixed(value: f64, digits: usize) -> String {
    let Some(decimal) = Decimal::from_f64_retain(value.abs()) else {
        return format!("{value:.digits$}");
    };

    let rounded =
        decimal.round_dp_with_strategy(digits as u32, RoundingStrategy::MidpointAwayFromZero);
    // Negative values keep their sign even when they round to zero
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{rounded:.digits$}")
}

/// PCR-OI signal: `> 1.2` danger, `< 0.8` success, otherwise warning
pub fn pcr_signal(pcr_oi: f64) -> Signal {
    if pcr_oi > PCR_DANGER_ABOVE {
        Signal::Danger
    } else if pcr_oi < PCR_SUCCESS_BELOW {
        Signal::Success
    } else {
        Signal::Warning
    }
}

/// Bullish skew wins over bearish when both flags are set
pub fn skew_signal(skew: &SkewPatterns) -> Signal {
    if skew.bullish_skew {
        Signal::Success
    } else if skew.bearish_skew {
        Signal::Danger
    } else {
        Signal::Warning
    }
}

pub fn skew_label(skew: &SkewPatterns) -> &'static str {
    if skew.bullish_skew {
        "Bullish"
    } else if skew.bearish_skew {
        "Bearish"
    } else {
        "Neutral"
    }
}

/// Change-in-OI cell: positive gets a `+` and green text, zero and below red
pub fn change_oi_cell(change: f64) -> (String, CellClass) {
    if change > 0.0 {
        (format!("+{}", format_number(change)), CellClass::TextSuccess)
    } else {
        (format_number(change), CellClass::TextDanger)
    }
}

/// OI skew cell as a percentage with one decimal
pub fn oi_skew_cell(oi_skew: f64) -> (String, CellClass) {
    let class = if oi_skew > OI_SKEW_HIGHLIGHT {
        CellClass::FillWarning
    } else if oi_skew < -OI_SKEW_HIGHLIGHT {
        CellClass::FillInfo
    } else {
        CellClass::None
    };
    (format!("{}%", to_fixed(oi_skew * 100.0, 1)), class)
}

/// Buildup cell; absent or empty shows a dash
pub fn buildup_cell(buildup: Option<&Buildup>) -> (String, CellClass) {
    match buildup {
        Some(Buildup::Long) => ("LONG".to_string(), CellClass::FillSuccess),
        Some(Buildup::Short) => ("SHORT".to_string(), CellClass::FillDanger),
        Some(Buildup::Other(raw)) if !raw.is_empty() => (raw.clone(), CellClass::None),
        _ => ("-".to_string(), CellClass::None),
    }
}

/// Volume/OI ratio with two decimals, missing treated as 0
pub fn ratio_text(ratio: Option<f64>) -> String {
    to_fixed(ratio.unwrap_or(0.0), 2)
}
