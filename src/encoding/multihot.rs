//! Multi-hot membership encoding for list-valued columns

use super::{
    ensure_columns_exist, ensure_no_nulls, resolve_columns, Encoder, FoldEncoder, HandleMissing,
    HandleUnknown,
};
use crate::error::{Result, TabencError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Encodes `List(String)` columns as a multi-hot membership matrix.
///
/// The label set is collected at fit time in first-appearance order across
/// all list elements; transform emits one boolean column `{col}_{value}` per
/// label, true when the row's list contains that label. Null rows and null
/// elements contribute no membership.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiHotEncoder {
    cols: Option<Vec<String>>,
    handle_unknown: HandleUnknown,
    handle_missing: HandleMissing,
    labels: Vec<(String, Vec<String>)>,
    fitted: bool,
}

impl MultiHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict encoding to the given columns (default: all columns)
    pub fn with_columns(mut self, cols: Vec<String>) -> Self {
        self.cols = Some(cols);
        self
    }

    pub fn with_unknown_policy(mut self, policy: HandleUnknown) -> Self {
        self.handle_unknown = policy;
        self
    }

    pub fn with_missing_policy(mut self, policy: HandleMissing) -> Self {
        self.handle_missing = policy;
        self
    }

    fn target_cols(&self) -> Vec<String> {
        self.labels.iter().map(|(col, _)| col.clone()).collect()
    }

    /// Per-row element sets of a list column; `None` for null rows
    fn row_sets(series: &Series, col: &str) -> Result<Vec<Option<HashSet<String>>>> {
        if !matches!(series.dtype(), DataType::List(_)) {
            return Err(TabencError::InvalidInput(format!(
                "column '{col}' must be a List column for multi-hot encoding"
            )));
        }

        let ca = series.list()?;
        let mut rows = Vec::with_capacity(ca.len());
        for entry in ca.into_iter() {
            match entry {
                None => rows.push(None),
                Some(inner) => {
                    let values = inner.cast(&DataType::String)?;
                    let set: HashSet<String> = values
                        .str()?
                        .into_iter()
                        .flatten()
                        .map(|v| v.to_string())
                        .collect();
                    rows.push(Some(set));
                }
            }
        }
        Ok(rows)
    }

    /// Null elements inside any list of the column
    fn has_null_elements(series: &Series) -> Result<bool> {
        let ca = series.list()?;
        for entry in ca.into_iter().flatten() {
            if entry.null_count() > 0 {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn check_missing(&self, frame: &DataFrame, cols: &[String]) -> Result<()> {
        if self.handle_missing != HandleMissing::Error {
            return Ok(());
        }
        ensure_no_nulls(frame, cols)?;
        for col in cols {
            let series = frame.column(col)?.as_materialized_series();
            if Self::has_null_elements(series)? {
                return Err(TabencError::InvalidInput(format!(
                    "column '{col}' contains null list elements"
                )));
            }
        }
        Ok(())
    }
}

impl Encoder for MultiHotEncoder {
    fn fit(&mut self, frame: &DataFrame, _labels: Option<&Series>) -> Result<&mut Self> {
        let cols = resolve_columns(self.cols.as_deref(), frame);
        ensure_columns_exist(frame, &cols)?;
        self.check_missing(frame, &cols)?;

        self.labels.clear();
        for col in &cols {
            let series = frame.column(col)?.as_materialized_series();
            if !matches!(series.dtype(), DataType::List(_)) {
                return Err(TabencError::InvalidInput(format!(
                    "column '{col}' must be a List column for multi-hot encoding"
                )));
            }

            let ca = series.list()?;
            let mut seen = HashSet::new();
            let mut ordered = Vec::new();
            for inner in ca.into_iter().flatten() {
                let values = inner.cast(&DataType::String)?;
                for value in values.str()?.into_iter().flatten() {
                    if seen.insert(value.to_string()) {
                        ordered.push(value.to_string());
                    }
                }
            }
            self.labels.push((col.clone(), ordered));
        }

        self.fitted = true;
        Ok(self)
    }

    fn transform(&self, frame: &DataFrame) -> Result<DataFrame> {
        if !self.fitted {
            return Err(TabencError::NotFitted);
        }
        let cols = self.target_cols();
        ensure_columns_exist(frame, &cols)?;
        self.check_missing(frame, &cols)?;

        let mut columns: Vec<Column> = Vec::new();
        for (col, labels) in &self.labels {
            let series = frame.column(col)?.as_materialized_series();
            let rows = Self::row_sets(series, col)?;

            if self.handle_unknown == HandleUnknown::Error {
                let known: HashSet<&str> = labels.iter().map(|l| l.as_str()).collect();
                for set in rows.iter().flatten() {
                    if set.iter().any(|value| !known.contains(value.as_str())) {
                        return Err(TabencError::InvalidInput(format!(
                            "column '{col}' contains list elements not seen during fit"
                        )));
                    }
                }
            }

            for label in labels {
                let indicator: BooleanChunked = rows
                    .iter()
                    .map(|set| {
                        Some(set.as_ref().is_some_and(|values| values.contains(label)))
                    })
                    .collect();
                let name = format!("{col}_{label}");
                columns.push(indicator.with_name(name.into()).into_series().into());
            }
        }

        Ok(DataFrame::new(columns)?)
    }
}

impl FoldEncoder for MultiHotEncoder {
    fn fresh(&self) -> Self {
        Self {
            cols: self.cols.clone(),
            handle_unknown: self.handle_unknown,
            handle_missing: self.handle_missing,
            ..Self::default()
        }
    }
}
