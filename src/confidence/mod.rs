use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

const LOW_CEILING: f64 = 0.3;
const MEDIUM_CEILING: f64 = 0.6;
const MAX_TOKEN_DENSITY_BONUS: f64 = 0.2;
const MAX_COMPONENT_DENSITY_BONUS: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// Bucket a score; too few pages always reads as low.
    pub fn classify(value: f64, page_count: usize, min_page_threshold: usize) -> Self {
        if page_count < min_page_threshold || value < LOW_CEILING {
            Self::Low
        } else if value < MEDIUM_CEILING {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn downgraded(self) -> Self {
        match self {
            Self::High => Self::Medium,
            Self::Medium | Self::Low => Self::Low,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub value: f64,
    pub level: ConfidenceLevel,
    pub reasoning: String,
}

impl ConfidenceScore {
    /// Drop one level and record why. The numeric value is left untouched.
    pub fn downgrade(mut self, reason: &str) -> Self {
        self.level = self.level.downgraded();
        self.reasoning = format!("{} Downgraded to {}: {reason}.", self.reasoning, self.level);
        self
    }
}

/// Score a token from its page coverage and how densely it shows up on those pages.
pub fn token_confidence(
    page_count: usize,
    occurrence_count: usize,
    total_pages: usize,
    min_page_threshold: usize,
) -> ConfidenceScore {
    let raw_confidence = ratio(page_count, total_pages);
    let avg_occurrences = ratio(occurrence_count, page_count);
    let density_bonus = if avg_occurrences > 1.0 {
        ((avg_occurrences - 1.0) / 5.0).min(MAX_TOKEN_DENSITY_BONUS)
    } else {
        0.0
    };
    let value = (raw_confidence + density_bonus).min(1.0);
    let level = ConfidenceLevel::classify(value, page_count, min_page_threshold);

    let reasoning = format!(
        "Seen on {page_count} of {total_pages} pages ({:.1}%) with {occurrence_count} \
         occurrences ({avg_occurrences:.2} per page, density bonus {density_bonus:.2}); \
         minimum page threshold is {min_page_threshold}.",
        raw_confidence * 100.0,
    );

    ConfidenceScore {
        value,
        level,
        reasoning,
    }
}

/// Shape of a component instance that distinguishes its variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantSignature {
    pub size: String,
    pub emphasis: String,
    pub shape: String,
}

impl VariantSignature {
    pub fn new(
        size: impl Into<String>,
        emphasis: impl Into<String>,
        shape: impl Into<String>,
    ) -> Self {
        Self {
            size: size.into(),
            emphasis: emphasis.into(),
            shape: shape.into(),
        }
    }

    /// Stable key used to count distinct variants.
    pub fn key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!("{}|{}|{}", self.size, self.emphasis, self.shape)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInstance {
    pub page_url: String,
    pub signature: VariantSignature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentStats {
    pub page_count: usize,
    pub instance_count: usize,
    pub unique_variants: usize,
}

impl ComponentStats {
    pub fn from_instances(instances: &[ComponentInstance]) -> Self {
        let pages: BTreeSet<&str> = instances
            .iter()
            .map(|instance| instance.page_url.as_str())
            .collect();
        let variants: HashSet<String> = instances
            .iter()
            .map(|instance| instance.signature.key())
            .collect();
        Self {
            page_count: pages.len(),
            instance_count: instances.len(),
            unique_variants: variants.len(),
        }
    }

    /// 1.0 when every instance shares one signature, tending to 0 as they diverge.
    pub fn variant_consistency(&self) -> f64 {
        if self.instance_count == 0 {
            return 0.0;
        }
        let extra_variants = self.unique_variants.saturating_sub(1);
        1.0 - extra_variants as f64 / self.instance_count as f64
    }
}

/// Score an inferred component.
///
/// Weighted 0.5 page frequency, 0.3 variant consistency and 0.2 instance density.
pub fn component_confidence(
    stats: ComponentStats,
    total_pages: usize,
    min_page_threshold: usize,
) -> ConfidenceScore {
    let page_frequency = ratio(stats.page_count, total_pages);
    let density_bonus =
        ratio(stats.instance_count, stats.page_count * 3).min(MAX_COMPONENT_DENSITY_BONUS);
    let variant_consistency = stats.variant_consistency();
    let value =
        (0.5 * page_frequency + 0.3 * variant_consistency + 0.2 * density_bonus).min(1.0);
    let level = ConfidenceLevel::classify(value, stats.page_count, min_page_threshold);

    let reasoning = format!(
        "Found {} instances on {} of {total_pages} pages ({:.1}%); {} distinct variants \
         (consistency {:.1}%), density bonus {density_bonus:.2}; minimum page threshold is \
         {min_page_threshold}.",
        stats.instance_count,
        stats.page_count,
        page_frequency * 100.0,
        stats.unique_variants,
        variant_consistency * 100.0,
    );

    ConfidenceScore {
        value,
        level,
        reasoning,
    }
}

pub fn score_component_instances(
    instances: &[ComponentInstance],
    total_pages: usize,
    min_page_threshold: usize,
) -> ConfidenceScore {
    component_confidence(
        ComponentStats::from_instances(instances),
        total_pages,
        min_page_threshold,
    )
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
