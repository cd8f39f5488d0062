//! Constant imputation for structural absence.

use crate::classifier::{FillCondition, Sentinel};
use crate::error::Result;
use crate::types::{FillOutcome, FillValue};
use crate::utils::{missing_count, numeric_values, replace_numeric, replace_text, text_values};
use polars::prelude::*;
use tracing::debug;

/// Writes a sentinel into missing cells.
pub struct ConstantImputer;

impl ConstantImputer {
    /// Fill the missing cells of `column` with `sentinel`.
    ///
    /// With a condition, only rows where the sibling column satisfies it are
    /// filled; the rest stay missing for later steps. A column with nothing
    /// missing is left untouched.
    pub fn fill(
        df: &mut DataFrame,
        column: &str,
        sentinel: &Sentinel,
        condition: Option<&FillCondition>,
    ) -> Result<FillOutcome> {
        let value = match sentinel {
            Sentinel::Label(label) => FillValue::Label {
                value: label.to_string(),
            },
            Sentinel::Zero => FillValue::Number { value: 0.0 },
        };

        if missing_count(df, column)? == 0 {
            return Ok(FillOutcome::new(0, value));
        }

        let eligible: Vec<bool> = match condition {
            Some(condition) => text_values(df, condition.column())?
                .iter()
                .map(|sibling| condition.holds(sibling.as_deref()))
                .collect(),
            None => vec![true; df.height()],
        };

        let filled = match sentinel {
            Sentinel::Label(label) => {
                let mut values = text_values(df, column)?;
                let filled = fill_where(&mut values, &eligible, || label.to_string());
                replace_text(df, column, values)?;
                filled
            }
            Sentinel::Zero => {
                let mut values = numeric_values(df, column)?;
                let filled = fill_where(&mut values, &eligible, || 0.0);
                replace_numeric(df, column, values)?;
                filled
            }
        };

        debug!("Filled {} cells of '{}' with {}", filled, column, value);
        Ok(FillOutcome::new(filled, value))
    }
}

fn fill_where<T>(values: &mut [Option<T>], eligible: &[bool], make: impl Fn() -> T) -> usize {
    let mut filled = 0;
    for (value, &ok) in values.iter_mut().zip(eligible) {
        if value.is_none() && ok {
            *value = Some(make());
            filled += 1;
        }
    }
    filled
}
