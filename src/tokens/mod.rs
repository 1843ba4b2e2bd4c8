use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::evidence::{Evidence, HasEvidence};
use crate::units::NormalizedValue;

/// Per-page extraction output keyed by page URL.
pub type CrawlTokens = BTreeMap<String, PageTokens>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorToken {
    /// Color as extracted: hex, `rgb()`, `hsl()` or a named color.
    pub hex: String,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypographyToken {
    pub family: String,
    pub weight: u16,
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<String>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpacingToken {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadiusToken {
    pub value: String,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowToken {
    pub value: String,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionToken {
    pub duration: String,
    pub easing: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

/// Everything the extractor observed on one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageTokens {
    #[serde(default)]
    pub colors: Vec<ColorToken>,
    #[serde(default)]
    pub typography: Vec<TypographyToken>,
    #[serde(default)]
    pub spacing: Vec<SpacingToken>,
    #[serde(default)]
    pub radii: Vec<RadiusToken>,
    #[serde(default)]
    pub shadows: Vec<ShadowToken>,
    #[serde(default)]
    pub motion: Vec<MotionToken>,
}

/// A raw token with its length resolved to pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedToken<T> {
    #[serde(flatten)]
    pub token: T,
    pub normalized: NormalizedValue,
}

impl<T> NormalizedToken<T> {
    pub fn new(token: T, normalized: NormalizedValue) -> Self {
        Self { token, normalized }
    }
}

macro_rules! impl_has_evidence {
    ($($ty:ty),* $(,)?) => {
        $(
            impl HasEvidence for $ty {
                fn evidence(&self) -> &[Evidence] {
                    &self.evidence
                }
            }
        )*
    };
}

impl_has_evidence!(
    ColorToken,
    TypographyToken,
    SpacingToken,
    RadiusToken,
    ShadowToken,
    MotionToken,
);

impl<T: HasEvidence> HasEvidence for NormalizedToken<T> {
    fn evidence(&self) -> &[Evidence] {
        self.token.evidence()
    }

    fn is_approximate(&self) -> bool {
        self.normalized.is_approximate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_tokens_tolerate_missing_categories() {
        let json = r##"{
            "colors": [
                { "hex": "#1a73e8", "evidence": [] }
            ],
            "spacing": [
                { "value": "8px", "property": "padding" }
            ]
        }"##;

        let page: PageTokens = serde_json::from_str(json).expect("page tokens should parse");
        assert_eq!(page.colors.len(), 1);
        assert_eq!(page.spacing[0].property.as_deref(), Some("padding"));
        assert!(page.spacing[0].evidence.is_empty());
        assert!(page.typography.is_empty());
        assert!(page.motion.is_empty());
    }

    #[test]
    fn normalized_token_flattens_original_fields() {
        let token = SpacingToken {
            value: "1rem".into(),
            property: None,
            evidence: Vec::new(),
        };
        let normalized = crate::units::normalize("1rem", 16.0, None).expect("1rem is valid");
        let value = serde_json::to_value(NormalizedToken::new(token, normalized))
            .expect("normalized token should serialize");

        assert_eq!(value["value"], "1rem");
        assert_eq!(value["normalized"]["pixels"], 16.0);
        assert_eq!(value["normalized"]["unit"], "rem");
    }
}
