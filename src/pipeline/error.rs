use super::stage::PipelineStage;
use crate::units::UnitError;
use thiserror::Error;

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error("invalid pipeline stage transition: from {from:?} to {to:?}")]
    InvalidStageTransition {
        from: PipelineStage,
        to: PipelineStage,
    },
}
