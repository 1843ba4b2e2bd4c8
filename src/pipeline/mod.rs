mod error;
mod stage;

pub use error::{PipelineError, PipelineResult};
pub use stage::{PipelineStage, StageMachine, StageTransition};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::color::{dedupe_colors, ColorCluster};
use crate::confidence::token_confidence;
use crate::config::NormalizationOptions;
use crate::consensus::{partition_standards, validate, CrossPageResult};
use crate::evidence::HasEvidence;
use crate::export::{validate_dtcg, DtcgExporter, TokenExporter};
use crate::spacing::{detect_scale, SpacingScale};
use crate::tokens::{
    ColorToken, CrawlTokens, MotionToken, NormalizedToken, RadiusToken, ShadowToken,
    SpacingToken, TypographyToken,
};
use crate::units::{normalize, UnitResult};

const APPROXIMATE_REASON: &str = "percentage length was not resolved against a parent size";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryResults<T> {
    pub standards: Vec<CrossPageResult<T>>,
    pub all: Vec<CrossPageResult<T>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorResults {
    pub clusters: Vec<ColorCluster>,
    pub standards: Vec<CrossPageResult<ColorCluster>>,
    pub all: Vec<CrossPageResult<ColorCluster>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedResults<T> {
    pub normalized: Vec<NormalizedToken<T>>,
    pub standards: Vec<CrossPageResult<NormalizedToken<T>>>,
    pub all: Vec<CrossPageResult<NormalizedToken<T>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpacingResults {
    pub normalized: Vec<NormalizedToken<SpacingToken>>,
    pub scale: SpacingScale,
    pub standards: Vec<CrossPageResult<NormalizedToken<SpacingToken>>>,
    pub all: Vec<CrossPageResult<NormalizedToken<SpacingToken>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub total_pages: usize,
    pub min_page_threshold: usize,
    pub base_font_size: f64,
    pub color_distance_threshold: f64,
    pub timestamp: DateTime<Utc>,
}

/// Canonical design values for one crawl.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationResult {
    pub colors: ColorResults,
    pub typography: NormalizedResults<TypographyToken>,
    pub spacing: SpacingResults,
    pub radii: CategoryResults<RadiusToken>,
    pub shadows: CategoryResults<ShadowToken>,
    pub motion: CategoryResults<MotionToken>,
    pub metadata: ResultMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtcg: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub export_warnings: Vec<String>,
}

#[derive(Debug, Default)]
struct AggregatedTokens {
    total_pages: usize,
    colors: Vec<ColorToken>,
    typography: Vec<TypographyToken>,
    spacing: Vec<SpacingToken>,
    radii: Vec<RadiusToken>,
    shadows: Vec<ShadowToken>,
    motion: Vec<MotionToken>,
}

fn aggregate(pages: &CrawlTokens) -> AggregatedTokens {
    let mut aggregated = AggregatedTokens {
        total_pages: pages.len(),
        ..AggregatedTokens::default()
    };
    for page in pages.values() {
        aggregated.colors.extend(page.colors.iter().cloned());
        aggregated.typography.extend(page.typography.iter().cloned());
        aggregated.spacing.extend(page.spacing.iter().cloned());
        aggregated.radii.extend(page.radii.iter().cloned());
        aggregated.shadows.extend(page.shadows.iter().cloned());
        aggregated.motion.extend(page.motion.iter().cloned());
    }
    aggregated
}

/// Run the whole pipeline with the built-in DTCG exporter, stamped with the current time.
pub fn normalize_tokens(
    pages: &CrawlTokens,
    options: &NormalizationOptions,
) -> PipelineResult<NormalizationResult> {
    normalize_tokens_at(pages, options, Utc::now())
}

pub fn normalize_tokens_at(
    pages: &CrawlTokens,
    options: &NormalizationOptions,
    timestamp: DateTime<Utc>,
) -> PipelineResult<NormalizationResult> {
    normalize_tokens_with(pages, options, timestamp, &DtcgExporter)
}

/// Collapse per-page observations into canonical tokens.
///
/// Any malformed typography size or spacing length aborts the run; unparseable colors
/// are dropped. Exporter failures only produce warnings.
pub fn normalize_tokens_with(
    pages: &CrawlTokens,
    options: &NormalizationOptions,
    timestamp: DateTime<Utc>,
    exporter: &dyn TokenExporter,
) -> PipelineResult<NormalizationResult> {
    let mut machine = StageMachine::new();
    let min_pages = options.min_page_threshold;

    machine.advance(PipelineStage::Aggregate)?;
    let aggregated = aggregate(pages);
    let total_pages = aggregated.total_pages;
    tracing::info!(
        total_pages,
        colors = aggregated.colors.len(),
        typography = aggregated.typography.len(),
        spacing = aggregated.spacing.len(),
        radii = aggregated.radii.len(),
        shadows = aggregated.shadows.len(),
        motion = aggregated.motion.len(),
        "aggregated crawl tokens"
    );

    machine.advance(PipelineStage::DedupeColors)?;
    let clusters = dedupe_colors(&aggregated.colors, options.color_distance_threshold);

    machine.advance(PipelineStage::NormalizeUnits)?;
    let typography = normalize_all(aggregated.typography, options.base_font_size, |token| {
        token.size.as_str()
    })?;
    let spacing = normalize_all(aggregated.spacing, options.base_font_size, |token| {
        token.value.as_str()
    })?;

    machine.advance(PipelineStage::DetectScale)?;
    let pixels: Vec<f64> = spacing
        .iter()
        .map(|token| token.normalized.pixels)
        .collect();
    let scale = detect_scale(&pixels);
    tracing::debug!(
        base_unit = scale.base_unit,
        coverage = scale.coverage,
        steps = scale.scale.len(),
        "detected spacing scale"
    );

    machine.advance(PipelineStage::ValidateEachCategory)?;
    let colors = consensus("colors", clusters.clone(), min_pages, total_pages);
    let typography_results = consensus("typography", typography.clone(), min_pages, total_pages);
    let spacing_results = consensus("spacing", spacing.clone(), min_pages, total_pages);
    let radii = consensus("radii", aggregated.radii, min_pages, total_pages);
    let shadows = consensus("shadows", aggregated.shadows, min_pages, total_pages);
    let motion = consensus("motion", aggregated.motion, min_pages, total_pages);

    let mut result = NormalizationResult {
        colors: ColorResults {
            clusters,
            standards: colors.standards,
            all: colors.all,
        },
        typography: NormalizedResults {
            normalized: typography,
            standards: typography_results.standards,
            all: typography_results.all,
        },
        spacing: SpacingResults {
            normalized: spacing,
            scale,
            standards: spacing_results.standards,
            all: spacing_results.all,
        },
        radii,
        shadows,
        motion,
        metadata: ResultMetadata {
            total_pages,
            min_page_threshold: min_pages,
            base_font_size: options.base_font_size,
            color_distance_threshold: options.color_distance_threshold,
            timestamp,
        },
        dtcg: None,
        export_warnings: Vec::new(),
    };

    machine.advance(PipelineStage::Export)?;
    attach_export(&mut result, exporter);

    machine.advance(PipelineStage::Complete)?;
    tracing::info!(
        total_pages,
        color_standards = result.colors.standards.len(),
        typography_standards = result.typography.standards.len(),
        spacing_standards = result.spacing.standards.len(),
        spacing_base_unit = result.spacing.scale.base_unit,
        "normalization complete"
    );
    Ok(result)
}

fn normalize_all<T, F>(
    tokens: Vec<T>,
    base_font_size: f64,
    length: F,
) -> UnitResult<Vec<NormalizedToken<T>>>
where
    F: Fn(&T) -> &str,
{
    tokens
        .into_iter()
        .map(|token| {
            let normalized = normalize(length(&token), base_font_size, None)?;
            Ok(NormalizedToken::new(token, normalized))
        })
        .collect()
}

fn consensus<T>(
    category: &'static str,
    tokens: Vec<T>,
    min_page_threshold: usize,
    total_pages: usize,
) -> CategoryResults<T>
where
    T: HasEvidence + Clone,
{
    let mut all = validate(tokens, min_page_threshold, total_pages);
    for result in &mut all {
        let score = token_confidence(
            result.page_count(),
            result.occurrence_count,
            total_pages,
            min_page_threshold,
        );
        result.score = Some(if result.token.is_approximate() {
            score.downgrade(APPROXIMATE_REASON)
        } else {
            score
        });
    }
    let standards = partition_standards(&all);
    tracing::debug!(
        category,
        observed = all.len(),
        standards = standards.len(),
        "validated category"
    );
    CategoryResults { standards, all }
}

fn attach_export(result: &mut NormalizationResult, exporter: &dyn TokenExporter) {
    match exporter.export(result) {
        Ok(document) => {
            let issues = validate_dtcg(&document);
            for issue in &issues {
                tracing::warn!(%issue, "exported document failed validation");
            }
            result
                .export_warnings
                .extend(issues.iter().map(ToString::to_string));
            result.dtcg = Some(document);
        }
        Err(err) => {
            tracing::warn!(?err, "token export failed; returning result without it");
            result.export_warnings.push(err.to_string());
        }
    }
}
