use crate::pipeline::ImputationStep;
use serde::Serialize;

/// Declared type of a column for the lifetime of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer or floating point values.
    Numeric,
    /// String labels.
    Categorical,
}

impl ColumnKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
        }
    }
}

/// Why a column's cells are missing, as declared by the schema table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MechanismTag {
    /// The attribute does not apply to the row (no pool, no garage, ...).
    StructuralAbsence,
    /// Best estimated from a correlated grouping column.
    GroupDependent,
    /// Missing independently of other fields.
    RandomMissing,
    /// Not part of the declared schema.
    Unclassified,
}

impl MechanismTag {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::StructuralAbsence => "structural absence",
            Self::GroupDependent => "group dependent",
            Self::RandomMissing => "random",
            Self::Unclassified => "unclassified",
        }
    }
}

/// The filler that resolved a set of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillerKind {
    Constant,
    GroupedMedian,
    Mode,
    NearestNeighbors,
    Median,
}

impl FillerKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::GroupedMedian => "grouped median",
            Self::Mode => "mode",
            Self::NearestNeighbors => "k-nearest neighbors",
            Self::Median => "median",
        }
    }
}

/// The value or statistic a filler wrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillValue {
    /// A single category label.
    Label { value: String },
    /// A single number.
    Number { value: f64 },
    /// Per-group medians with the table-wide median as fallback.
    GroupMedians {
        group_column: String,
        groups: usize,
        fallback: Option<f64>,
    },
    /// Mean of the k nearest rows in feature space.
    NeighborMean { k: usize, features: usize },
    /// Nothing was written (no missing cells, or the rule could not apply).
    Unchanged,
}

impl std::fmt::Display for FillValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Label { value } => write!(f, "'{}'", value),
            Self::Number { value } => write!(f, "{:.2}", value),
            Self::GroupMedians {
                group_column,
                groups,
                fallback,
            } => match fallback {
                Some(v) => write!(
                    f,
                    "median per {} ({} groups, fallback {:.2})",
                    group_column, groups, v
                ),
                None => write!(f, "median per {} ({} groups)", group_column, groups),
            },
            Self::NeighborMean { k, features } => {
                write!(f, "mean of {} nearest rows over {} features", k, features)
            }
            Self::Unchanged => write!(f, "-"),
        }
    }
}

/// Result of a single filler invocation on one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillOutcome {
    /// Number of cells that went from missing to present.
    pub filled: usize,
    /// What was written.
    pub value: FillValue,
}

impl FillOutcome {
    pub fn new(filled: usize, value: FillValue) -> Self {
        Self { filled, value }
    }

    pub fn unchanged() -> Self {
        Self {
            filled: 0,
            value: FillValue::Unchanged,
        }
    }
}

/// One filler application on one column during a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnImputationRecord {
    pub column: String,
    pub mechanism: MechanismTag,
    pub step: ImputationStep,
    pub filler: FillerKind,
    /// Number of cells filled by this application.
    pub filled: usize,
    pub value: FillValue,
}

impl ColumnImputationRecord {
    pub fn new(
        column: impl Into<String>,
        mechanism: MechanismTag,
        step: ImputationStep,
        filler: FillerKind,
        outcome: FillOutcome,
    ) -> Self {
        Self {
            column: column.into(),
            mechanism,
            step,
            filler,
            filled: outcome.filled,
            value: outcome.value,
        }
    }
}

/// Everything one run did to one column, folded across steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnImputationSummary {
    pub column: String,
    pub mechanism: MechanismTag,
    /// Fillers that filled at least one cell, in step order.
    pub fillers: Vec<FillerKind>,
    /// Cells filled across all steps.
    pub filled: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_value_display() {
        assert_eq!(
            FillValue::Label {
                value: "None".to_string()
            }
            .to_string(),
            "'None'"
        );
        assert_eq!(FillValue::Number { value: 65.0 }.to_string(), "65.00");
        let grouped = FillValue::GroupMedians {
            group_column: "Neighborhood".to_string(),
            groups: 3,
            fallback: Some(70.0),
        };
        assert!(grouped.to_string().contains("Neighborhood"));
    }

    #[test]
    fn test_record_serializes_snake_case_tags() {
        let record = ColumnImputationRecord::new(
            "PoolQC",
            MechanismTag::StructuralAbsence,
            ImputationStep::StructuralCategorical,
            FillerKind::Constant,
            FillOutcome::new(
                3,
                FillValue::Label {
                    value: "None".to_string(),
                },
            ),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["mechanism"], "structural_absence");
        assert_eq!(json["filler"], "constant");
        assert_eq!(json["value"]["kind"], "label");
        assert_eq!(json["filled"], 3);
    }
}
