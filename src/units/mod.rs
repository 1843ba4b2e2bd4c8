use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_FONT_SIZE: f64 = 16.0;

const PX_PER_PT: f64 = 96.0 / 72.0;

static LENGTH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?(?:\d+(?:\.\d+)?|\.\d+))(px|rem|em|pt|%)$").expect("length pattern is valid")
});

pub type UnitResult<T> = std::result::Result<T, UnitError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("invalid CSS length format: {value:?}")]
    InvalidFormat { value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CssUnit {
    #[serde(rename = "px")]
    Px,
    #[serde(rename = "rem")]
    Rem,
    #[serde(rename = "em")]
    Em,
    #[serde(rename = "pt")]
    Pt,
    #[serde(rename = "%")]
    Percent,
}

impl CssUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Rem => "rem",
            Self::Em => "em",
            Self::Pt => "pt",
            Self::Percent => "%",
        }
    }

    fn parse(suffix: &str) -> Option<Self> {
        match suffix {
            "px" => Some(Self::Px),
            "rem" => Some(Self::Rem),
            "em" => Some(Self::Em),
            "pt" => Some(Self::Pt),
            "%" => Some(Self::Percent),
            _ => None,
        }
    }
}

impl fmt::Display for CssUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedValue {
    pub pixels: f64,
    pub original: String,
    pub unit: CssUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_font_size: Option<f64>,
}

impl NormalizedValue {
    /// `%` lengths are passed through unresolved, so their pixel value is a guess.
    pub fn is_approximate(&self) -> bool {
        self.unit == CssUnit::Percent
    }
}

/// Convert a CSS length such as `1.5rem` into pixels.
///
/// `em` resolves against `parent_font_size` when known, otherwise against
/// `base_font_size`. `%` is returned as-is.
pub fn normalize(
    value: &str,
    base_font_size: f64,
    parent_font_size: Option<f64>,
) -> UnitResult<NormalizedValue> {
    let invalid = || UnitError::InvalidFormat {
        value: value.to_string(),
    };
    let captures = LENGTH_PATTERN.captures(value).ok_or_else(invalid)?;
    let number: f64 = captures[1].parse().map_err(|_| invalid())?;
    if !number.is_finite() {
        return Err(invalid());
    }
    let unit = CssUnit::parse(&captures[2]).ok_or_else(invalid)?;

    let (pixels, base) = match unit {
        CssUnit::Px | CssUnit::Percent => (number, None),
        CssUnit::Pt => (number * PX_PER_PT, None),
        CssUnit::Rem => (number * base_font_size, Some(base_font_size)),
        CssUnit::Em => (
            number * parent_font_size.unwrap_or(base_font_size),
            Some(base_font_size),
        ),
    };

    Ok(NormalizedValue {
        pixels: round2(pixels),
        original: value.to_string(),
        unit,
        base_font_size: base,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
