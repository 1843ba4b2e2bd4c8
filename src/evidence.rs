//! Provenance records shared by every token category.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Where and when a token was observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub page_url: String,
    pub selector: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub computed_styles: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

impl Evidence {
    pub fn new(
        page_url: impl Into<String>,
        selector: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            page_url: page_url.into(),
            selector: selector.into(),
            timestamp,
            computed_styles: BTreeMap::new(),
            screenshot_path: None,
            bounding_box: None,
        }
    }
}

/// Any record that carries an evidence list.
pub trait HasEvidence {
    fn evidence(&self) -> &[Evidence];

    /// Unique page URLs across the evidence list, sorted.
    fn page_urls(&self) -> BTreeSet<String> {
        self.evidence()
            .iter()
            .map(|entry| entry.page_url.clone())
            .collect()
    }

    /// Whether the value is known to be only an approximation of pixels.
    fn is_approximate(&self) -> bool {
        false
    }
}

#[cfg(test)]
pub(crate) fn evidence_on(page_url: &str) -> Evidence {
    let timestamp = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
        .expect("fixture timestamp should parse")
        .with_timezone(&Utc);
    Evidence::new(page_url, "body", timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample(Vec<Evidence>);

    impl HasEvidence for Sample {
        fn evidence(&self) -> &[Evidence] {
            &self.0
        }
    }

    #[test]
    fn page_urls_collapse_repeated_pages() {
        let sample = Sample(vec![
            evidence_on("https://a.test/"),
            evidence_on("https://b.test/"),
            evidence_on("https://a.test/"),
        ]);

        let urls = sample.page_urls();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains("https://a.test/"));
        assert!(!sample.is_approximate());
    }

    #[test]
    fn evidence_deserializes_camel_case_fields() {
        let json = r#"{
            "pageUrl": "https://a.test/",
            "selector": "button.primary",
            "timestamp": "2024-05-01T12:00:00Z",
            "computedStyles": { "color": "rgb(26, 115, 232)" },
            "boundingBox": { "x": 1.0, "y": 2.0, "width": 30.0, "height": 40.0 }
        }"#;

        let evidence: Evidence = serde_json::from_str(json).expect("evidence should parse");
        assert_eq!(evidence.page_url, "https://a.test/");
        assert_eq!(
            evidence.computed_styles.get("color").map(String::as_str),
            Some("rgb(26, 115, 232)")
        );
        assert_eq!(
            evidence.bounding_box,
            Some(BoundingBox::new(1.0, 2.0, 30.0, 40.0))
        );
        assert!(evidence.screenshot_path.is_none());
    }
}
