mod lab;
mod parse;

pub use lab::{delta_e, Lab};
pub use parse::parse_color;

use serde::{Deserialize, Serialize};

use crate::evidence::{Evidence, HasEvidence};
use crate::tokens::ColorToken;

/// Roughly one just-noticeable difference in LAB space.
pub const DEFAULT_COLOR_DISTANCE_THRESHOLD: f64 = 2.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self::with_alpha(r, g, b, u8::MAX)
    }

    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Lowercase `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(self) -> String {
        if self.a == u8::MAX {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_lab(self) -> Lab {
        Lab::from_rgb(self)
    }

    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorCluster {
    /// Hex of the color that founded the cluster.
    pub canonical: String,
    pub variants: Vec<String>,
    pub evidence: Vec<Evidence>,
    pub occurrences: usize,
}

impl HasEvidence for ColorCluster {
    fn evidence(&self) -> &[Evidence] {
        &self.evidence
    }
}

struct OpenCluster {
    alpha: u8,
    lab: Lab,
    cluster: ColorCluster,
}

/// Collapse perceptually indistinguishable colors into clusters.
///
/// Each color is compared against the founding color of every existing cluster in
/// creation order and joins the first one with the same alpha that is closer than
/// `threshold`. Unparseable and fully transparent colors are skipped. Clusters come
/// back most frequent first.
pub fn dedupe_colors(colors: &[ColorToken], threshold: f64) -> Vec<ColorCluster> {
    let mut open: Vec<OpenCluster> = Vec::new();
    let mut dropped = 0usize;

    for token in colors {
        let Some(rgb) = parse_color(&token.hex) else {
            tracing::warn!(value = %token.hex, "dropping unparseable color");
            dropped += 1;
            continue;
        };
        if rgb.is_transparent() {
            tracing::debug!(value = %token.hex, "dropping fully transparent color");
            dropped += 1;
            continue;
        }
        let hex = rgb.to_hex();
        let lab = rgb.to_lab();

        match open
            .iter_mut()
            .find(|candidate| candidate.alpha == rgb.a && delta_e(candidate.lab, lab) < threshold)
        {
            Some(candidate) => {
                let cluster = &mut candidate.cluster;
                cluster.variants.push(hex);
                cluster.evidence.extend(token.evidence.iter().cloned());
                cluster.occurrences += 1;
            }
            None => open.push(OpenCluster {
                alpha: rgb.a,
                lab,
                cluster: ColorCluster {
                    canonical: hex.clone(),
                    variants: vec![hex],
                    evidence: token.evidence.clone(),
                    occurrences: 1,
                },
            }),
        }
    }

    let mut clusters: Vec<ColorCluster> = open.into_iter().map(|open| open.cluster).collect();
    clusters.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));

    tracing::debug!(
        input = colors.len(),
        clusters = clusters.len(),
        dropped,
        threshold,
        "deduplicated colors"
    );
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::evidence_on;

    fn color(hex: &str, page: &str) -> ColorToken {
        ColorToken {
            hex: hex.to_string(),
            evidence: vec![evidence_on(page)],
        }
    }

    #[test]
    fn near_duplicates_merge_into_first_seen() {
        let clusters = dedupe_colors(
            &[color("#1a73e8", "https://a.test/"), color("#1a74e8", "https://b.test/")],
            DEFAULT_COLOR_DISTANCE_THRESHOLD,
        );

        assert_eq!(clusters.len(), 1);
        let cluster = &clusters[0];
        assert_eq!(cluster.canonical, "#1a73e8");
        assert_eq!(cluster.variants, vec!["#1a73e8", "#1a74e8"]);
        assert_eq!(cluster.occurrences, 2);
        assert_eq!(cluster.evidence.len(), 2);
        assert_eq!(cluster.evidence[1].page_url, "https://b.test/");
    }

    #[test]
    fn distinct_colors_stay_apart() {
        let clusters = dedupe_colors(
            &[color("#1a73e8", "https://a.test/"), color("#ff0000", "https://a.test/")],
            DEFAULT_COLOR_DISTANCE_THRESHOLD,
        );

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].canonical, "#1a73e8");
        assert_eq!(clusters[1].canonical, "#ff0000");
    }

    #[test]
    fn clusters_are_sorted_by_occurrences() {
        let clusters = dedupe_colors(
            &[
                color("#000000", "https://a.test/"),
                color("#ffffff", "https://a.test/"),
                color("#fefefe", "https://b.test/"),
                color("#ffffff", "https://c.test/"),
            ],
            DEFAULT_COLOR_DISTANCE_THRESHOLD,
        );

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].canonical, "#ffffff");
        assert_eq!(clusters[0].occurrences, 3);
        assert_eq!(clusters[1].canonical, "#000000");
    }

    #[test]
    fn unparseable_colors_are_dropped() {
        let clusters = dedupe_colors(
            &[
                color("var(--brand)", "https://a.test/"),
                color("#1a73e8", "https://a.test/"),
                color("not-a-color", "https://b.test/"),
            ],
            DEFAULT_COLOR_DISTANCE_THRESHOLD,
        );

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].occurrences, 1);
    }

    #[test]
    fn equivalent_notations_share_a_cluster() {
        let clusters = dedupe_colors(
            &[
                color("rgb(26, 115, 232)", "https://a.test/"),
                color("#1A73E8", "https://b.test/"),
            ],
            DEFAULT_COLOR_DISTANCE_THRESHOLD,
        );

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].canonical, "#1a73e8");
        assert_eq!(clusters[0].variants, vec!["#1a73e8", "#1a73e8"]);
    }

    #[test]
    fn zero_threshold_never_merges() {
        let clusters = dedupe_colors(
            &[color("#1a73e8", "https://a.test/"), color("#1a73e8", "https://b.test/")],
            0.0,
        );
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn transparent_colors_do_not_count_toward_black() {
        let clusters = dedupe_colors(
            &[
                color("#000000", "https://a.test/"),
                color("rgba(0, 0, 0, 0)", "https://b.test/"),
                color("transparent", "https://c.test/"),
            ],
            DEFAULT_COLOR_DISTANCE_THRESHOLD,
        );

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].canonical, "#000000");
        assert_eq!(clusters[0].variants, vec!["#000000"]);
        assert_eq!(clusters[0].occurrences, 1);
        assert_eq!(clusters[0].page_urls().len(), 1);
    }

    #[test]
    fn translucent_and_opaque_shades_stay_apart() {
        let clusters = dedupe_colors(
            &[
                color("#1a73e8", "https://a.test/"),
                color("rgba(26, 115, 232, 0.5)", "https://b.test/"),
                color("#1a73e880", "https://c.test/"),
            ],
            DEFAULT_COLOR_DISTANCE_THRESHOLD,
        );

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].canonical, "#1a73e880");
        assert_eq!(clusters[0].occurrences, 2);
        assert_eq!(clusters[1].canonical, "#1a73e8");
    }

    #[test]
    fn translucent_colors_keep_alpha_in_hex() {
        assert_eq!(Rgb::with_alpha(0, 0, 0, 128).to_hex(), "#00000080");
        assert_eq!(Rgb::new(26, 115, 232).to_hex(), "#1a73e8");
    }
}
