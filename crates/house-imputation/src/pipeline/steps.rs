//! Imputation steps and their ordering constraints.

use crate::error::{ImputationError, Result};
use serde::Serialize;

/// One step of the imputation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationStep {
    /// Structural-absence categorical columns get the "None" label.
    StructuralCategorical,
    /// Structural-absence numeric columns get zero.
    StructuralNumeric,
    /// Random-missing categorical columns get their mode.
    RandomMode,
    /// Group-dependent numeric columns get their group median.
    GroupedMedian,
    /// Multivariate columns are estimated from nearest neighbors.
    NeighborEstimate,
    /// Any residual missing cell gets the column median or mode.
    GenericFallback,
}

impl ImputationStep {
    /// All steps in canonical order.
    pub const CANONICAL: [ImputationStep; 6] = [
        Self::StructuralCategorical,
        Self::StructuralNumeric,
        Self::RandomMode,
        Self::GroupedMedian,
        Self::NeighborEstimate,
        Self::GenericFallback,
    ];

    /// Steps that must complete before this one runs.
    pub fn prerequisites(&self) -> &'static [ImputationStep] {
        match self {
            Self::StructuralCategorical | Self::RandomMode | Self::GroupedMedian => &[],
            // the conditional zero reads the filled MasVnrType
            Self::StructuralNumeric => &[Self::StructuralCategorical],
            Self::NeighborEstimate => &[
                Self::StructuralCategorical,
                Self::StructuralNumeric,
                Self::RandomMode,
                Self::GroupedMedian,
            ],
            Self::GenericFallback => &[
                Self::StructuralCategorical,
                Self::StructuralNumeric,
                Self::RandomMode,
                Self::GroupedMedian,
                Self::NeighborEstimate,
            ],
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::StructuralCategorical => "structural categorical",
            Self::StructuralNumeric => "structural numeric",
            Self::RandomMode => "random mode",
            Self::GroupedMedian => "grouped median",
            Self::NeighborEstimate => "neighbor estimate",
            Self::GenericFallback => "generic fallback",
        }
    }

    /// 1-based position in the canonical order.
    pub fn number(&self) -> usize {
        *self as usize + 1
    }
}

impl std::fmt::Display for ImputationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Check that every step appears after all of its prerequisites, and at most once.
///
/// A prerequisite that is absent from `order` altogether is also a violation:
/// the dependent step would see columns that were never filled.
pub fn validate_order(order: &[ImputationStep]) -> Result<()> {
    for (position, step) in order.iter().enumerate() {
        if order[..position].contains(step) {
            return Err(ImputationError::PipelineOrderingViolation(format!(
                "step '{}' is scheduled more than once",
                step
            )));
        }

        let completed = &order[..position];
        if let Some(missing) = step
            .prerequisites()
            .iter()
            .find(|prerequisite| !completed.contains(prerequisite))
        {
            return Err(ImputationError::PipelineOrderingViolation(format!(
                "step '{}' requires '{}' to run first",
                step, missing
            )));
        }
    }
    Ok(())
}
