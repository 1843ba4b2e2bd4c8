use std::io;
use std::path::PathBuf;

use crate::pipeline::PipelineError;
use thiserror::Error;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("failed to read crawl tokens: {path}")]
    ReadInput { path: PathBuf, source: io::Error },
    #[error("failed to parse crawl tokens: {path}")]
    ParseInput {
        path: PathBuf,
        source: serde_json::Error,
    },
}
