pub mod cluster;
pub mod color;
pub mod confidence;
mod config;
pub mod consensus;
pub mod error;
pub mod evidence;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod spacing;
pub mod tokens;
pub mod units;

use std::path::Path;

pub use config::{load_options, NormalizationOptions};
pub use error::{EngineError, EngineResult};
pub use pipeline::{normalize_tokens, NormalizationResult};
pub use tokens::{CrawlTokens, PageTokens};

/// Read a crawl's per-page tokens from JSON and normalize them with the configured options.
pub fn run(input: &Path) -> EngineResult<NormalizationResult> {
    logging::init();
    let options = load_options();
    tracing::info!(
        input = %input.display(),
        min_page_threshold = options.min_page_threshold,
        base_font_size = options.base_font_size,
        color_distance_threshold = options.color_distance_threshold,
        "starting token normalization"
    );

    let pages = read_crawl(input)?;
    let result = normalize_tokens(&pages, &options)?;
    Ok(result)
}

pub fn read_crawl(path: &Path) -> EngineResult<CrawlTokens> {
    let serialized = std::fs::read_to_string(path).map_err(|source| EngineError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&serialized).map_err(|source| EngineError::ParseInput {
        path: path.to_path_buf(),
        source,
    })
}
