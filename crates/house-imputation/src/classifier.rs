//! Mechanism classification for the housing schema.
//!
//! The classifier is a static lookup table: each declared column maps to its
//! kind, its missingness mechanism and an ordered list of fill rules. Nothing
//! here is inferred from data.

use crate::pipeline::ImputationStep;
use crate::types::{ColumnKind, MechanismTag};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// Sentinel written by a constant fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Sentinel {
    /// A category label such as `"None"`.
    Label(&'static str),
    /// Numeric zero.
    Zero,
}

impl Sentinel {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Label(_) => ColumnKind::Categorical,
            Self::Zero => ColumnKind::Numeric,
        }
    }
}

/// Row predicate over a sibling column, evaluated before a constant fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillCondition {
    /// The sibling column holds exactly `value` in the same row.
    SiblingEquals {
        column: &'static str,
        value: &'static str,
    },
}

impl FillCondition {
    /// Name of the column the predicate reads.
    pub fn column(&self) -> &'static str {
        match self {
            Self::SiblingEquals { column, .. } => column,
        }
    }

    /// Evaluate the predicate against the sibling's value in one row.
    /// A missing sibling never satisfies the predicate.
    pub fn holds(&self, sibling: Option<&str>) -> bool {
        match self {
            Self::SiblingEquals { value, .. } => sibling == Some(*value),
        }
    }
}

/// A fill rule attached to a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FillRule {
    Constant {
        sentinel: Sentinel,
    },
    ConditionalConstant {
        sentinel: Sentinel,
        when: FillCondition,
    },
    Mode,
    GroupedMedian {
        group_by: &'static str,
    },
    NearestNeighbors,
}

impl FillRule {
    /// The pipeline step that owns this rule.
    pub fn step(&self) -> ImputationStep {
        match self {
            Self::Constant { sentinel } | Self::ConditionalConstant { sentinel, .. } => {
                match sentinel.kind() {
                    ColumnKind::Categorical => ImputationStep::StructuralCategorical,
                    ColumnKind::Numeric => ImputationStep::StructuralNumeric,
                }
            }
            Self::Mode => ImputationStep::RandomMode,
            Self::GroupedMedian { .. } => ImputationStep::GroupedMedian,
            Self::NearestNeighbors => ImputationStep::NeighborEstimate,
        }
    }
}

/// One row of the declarative schema table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub mechanism: MechanismTag,
    /// Applied in order; each rule only sees what earlier rules left missing.
    pub rules: &'static [FillRule],
}

const NONE_LABEL: &[FillRule] = &[FillRule::Constant {
    sentinel: Sentinel::Label("None"),
}];

const ZERO: &[FillRule] = &[FillRule::Constant {
    sentinel: Sentinel::Zero,
}];

const fn structural_label(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Categorical,
        mechanism: MechanismTag::StructuralAbsence,
        rules: NONE_LABEL,
    }
}

const fn structural_zero(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Numeric,
        mechanism: MechanismTag::StructuralAbsence,
        rules: ZERO,
    }
}

/// Declared columns of the housing dataset and how each is filled.
pub static SCHEMA: &[ColumnSpec] = &[
    // facility absent: category label
    structural_label("PoolQC"),
    structural_label("MiscFeature"),
    structural_label("Alley"),
    structural_label("Fence"),
    structural_label("FireplaceQu"),
    structural_label("GarageType"),
    structural_label("GarageFinish"),
    structural_label("GarageQual"),
    structural_label("GarageCond"),
    structural_label("BsmtQual"),
    structural_label("BsmtCond"),
    structural_label("BsmtExposure"),
    structural_label("BsmtFinType1"),
    structural_label("BsmtFinType2"),
    structural_label("MasVnrType"),
    // facility absent: zero
    structural_zero("GarageYrBlt"),
    structural_zero("GarageArea"),
    structural_zero("GarageCars"),
    structural_zero("BsmtFinSF1"),
    structural_zero("BsmtFinSF2"),
    structural_zero("BsmtUnfSF"),
    structural_zero("TotalBsmtSF"),
    structural_zero("BsmtFullBath"),
    structural_zero("BsmtHalfBath"),
    ColumnSpec {
        name: "MasVnrArea",
        kind: ColumnKind::Numeric,
        mechanism: MechanismTag::StructuralAbsence,
        rules: &[
            FillRule::ConditionalConstant {
                sentinel: Sentinel::Zero,
                when: FillCondition::SiblingEquals {
                    column: "MasVnrType",
                    value: "None",
                },
            },
            FillRule::NearestNeighbors,
        ],
    },
    ColumnSpec {
        name: "Electrical",
        kind: ColumnKind::Categorical,
        mechanism: MechanismTag::RandomMissing,
        rules: &[FillRule::Mode],
    },
    ColumnSpec {
        name: "LotFrontage",
        kind: ColumnKind::Numeric,
        mechanism: MechanismTag::GroupDependent,
        rules: &[FillRule::GroupedMedian {
            group_by: "Neighborhood",
        }],
    },
];

/// Feature columns used for nearest-neighbor distance.
pub static NEIGHBOR_FEATURES: &[&str] = &[
    "LotArea",
    "OverallQual",
    "OverallCond",
    "YearBuilt",
    "YearRemodAdd",
    "TotalBsmtSF",
    "1stFlrSF",
    "2ndFlrSF",
    "GrLivArea",
    "GarageArea",
    "WoodDeckSF",
    "OpenPorchSF",
];

static SCHEMA_INDEX: Lazy<HashMap<&'static str, &'static ColumnSpec>> =
    Lazy::new(|| SCHEMA.iter().map(|spec| (spec.name, spec)).collect());

/// Result of classifying a column name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub mechanism: MechanismTag,
    /// Declared kind, `None` for unclassified columns.
    pub kind: Option<ColumnKind>,
    pub rules: &'static [FillRule],
}

impl Classification {
    pub fn is_classified(&self) -> bool {
        self.mechanism != MechanismTag::Unclassified
    }
}

/// Static mapping from column name to mechanism and fill rules.
pub struct MechanismClassifier;

impl MechanismClassifier {
    /// Classify a column by name. Unknown names are `Unclassified` with no rules
    /// and fall through to the generic fallback.
    pub fn classify(column: &str) -> Classification {
        match Self::spec(column) {
            Some(spec) => Classification {
                mechanism: spec.mechanism,
                kind: Some(spec.kind),
                rules: spec.rules,
            },
            None => Classification {
                mechanism: MechanismTag::Unclassified,
                kind: None,
                rules: &[],
            },
        }
    }

    /// Look up the schema row for a column.
    pub fn spec(column: &str) -> Option<&'static ColumnSpec> {
        SCHEMA_INDEX.get(column).copied()
    }

    /// The whole schema table, in declaration order.
    pub fn schema() -> &'static [ColumnSpec] {
        SCHEMA
    }

    /// Declared (column, rule) pairs owned by a step, in declaration order.
    pub fn rules_for(step: ImputationStep) -> Vec<(&'static ColumnSpec, &'static FillRule)> {
        SCHEMA
            .iter()
            .flat_map(|spec| spec.rules.iter().map(move |rule| (spec, rule)))
            .filter(|(_, rule)| rule.step() == step)
            .collect()
    }

    /// Declared feature columns for nearest-neighbor estimation.
    pub fn neighbor_features() -> &'static [&'static str] {
        NEIGHBOR_FEATURES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_structural_label() {
        let classification = MechanismClassifier::classify("PoolQC");
        assert_eq!(classification.mechanism, MechanismTag::StructuralAbsence);
        assert_eq!(classification.kind, Some(ColumnKind::Categorical));
        assert_eq!(
            classification.rules,
            &[FillRule::Constant {
                sentinel: Sentinel::Label("None")
            }]
        );
    }

    #[test]
    fn test_classify_unknown_column() {
        let classification = MechanismClassifier::classify("Street");
        assert_eq!(classification.mechanism, MechanismTag::Unclassified);
        assert!(classification.rules.is_empty());
        assert!(!classification.is_classified());
    }

    #[test]
    fn test_masvnrarea_has_conditional_then_neighbor_rule() {
        let spec = MechanismClassifier::spec("MasVnrArea").unwrap();
        assert_eq!(spec.rules.len(), 2);
        assert_eq!(spec.rules[0].step(), ImputationStep::StructuralNumeric);
        assert_eq!(spec.rules[1].step(), ImputationStep::NeighborEstimate);
    }

    #[test]
    fn test_declared_groups() {
        assert_eq!(
            MechanismClassifier::rules_for(ImputationStep::StructuralCategorical).len(),
            15
        );
        // 9 unconditional zero columns plus the conditional MasVnrArea rule
        assert_eq!(
            MechanismClassifier::rules_for(ImputationStep::StructuralNumeric).len(),
            10
        );
        let mode: Vec<_> = MechanismClassifier::rules_for(ImputationStep::RandomMode)
            .into_iter()
            .map(|(spec, _)| spec.name)
            .collect();
        assert_eq!(mode, vec!["Electrical"]);
        assert!(MechanismClassifier::rules_for(ImputationStep::GenericFallback).is_empty());
    }

    #[test]
    fn test_schema_names_are_unique() {
        assert_eq!(SCHEMA_INDEX.len(), SCHEMA.len());
    }

    #[test]
    fn test_fill_condition_holds() {
        let condition = FillCondition::SiblingEquals {
            column: "MasVnrType",
            value: "None",
        };
        assert!(condition.holds(Some("None")));
        assert!(!condition.holds(Some("BrkFace")));
        assert!(!condition.holds(None));
        assert_eq!(condition.column(), "MasVnrType");
    }
}
