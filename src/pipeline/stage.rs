use super::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineStage {
    #[default]
    Pending,
    Aggregate,
    DedupeColors,
    NormalizeUnits,
    DetectScale,
    ValidateEachCategory,
    Export,
    Complete,
}

impl PipelineStage {
    pub fn next(self) -> Option<Self> {
        use PipelineStage::*;
        match self {
            Pending => Some(Aggregate),
            Aggregate => Some(DedupeColors),
            DedupeColors => Some(NormalizeUnits),
            NormalizeUnits => Some(DetectScale),
            DetectScale => Some(ValidateEachCategory),
            ValidateEachCategory => Some(Export),
            Export => Some(Complete),
            Complete => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTransition {
    pub from: PipelineStage,
    pub to: PipelineStage,
}

/// Linear stage tracker for one pipeline run.
#[derive(Debug, Default)]
pub struct StageMachine {
    stage: PipelineStage,
    history: Vec<StageTransition>,
}

impl StageMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn history(&self) -> &[StageTransition] {
        &self.history
    }

    pub fn can_advance_to(&self, to: PipelineStage) -> bool {
        self.stage.next() == Some(to)
    }

    pub fn advance(&mut self, to: PipelineStage) -> PipelineResult<PipelineStage> {
        tracing::debug!(from = ?self.stage, to = ?to, "advance pipeline stage");
        if !self.can_advance_to(to) {
            let from = self.stage;
            tracing::warn!(from = ?from, to = ?to, "out-of-order pipeline stage requested");
            return Err(PipelineError::InvalidStageTransition { from, to });
        }

        self.history.push(StageTransition {
            from: self.stage,
            to,
        });
        self.stage = to;
        Ok(self.stage)
    }
}

impl std::fmt::Display for StageMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PipelineStage::{:?}", self.stage)
    }
}
