//! Category occurrence-count encoding

use super::{
    ensure_columns_exist, ensure_no_nulls, resolve_columns, string_categories, Encoder,
    FoldEncoder, HandleMissing, HandleUnknown, MISSING_VALUE, UNKNOWN_VALUE,
};
use crate::error::{Result, TabencError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Encodes each category as the number of rows it appeared in at fit time.
///
/// Output columns are Int64. Unseen categories map to [`UNKNOWN_VALUE`] and
/// nulls to [`MISSING_VALUE`] under the default value policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountEncoder {
    cols: Option<Vec<String>>,
    handle_unknown: HandleUnknown,
    handle_missing: HandleMissing,
    counts: HashMap<String, HashMap<String, i64>>,
    col_order: Vec<String>,
    fitted: bool,
}

impl CountEncoder {
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
}

impl Encoder for CountEncoder {
    fn fit(&mut self, frame: &DataFrame, _labels: Option<&Series>) -> Result<&mut Self> {
        let cols = resolve_columns(self.cols.as_deref(), frame);
        ensure_columns_exist(frame, &cols)?;
        if self.handle_missing == HandleMissing::Error {
            ensure_no_nulls(frame, &cols)?;
        }

        self.counts.clear();
        for col in &cols {
            let series = frame.column(col)?.as_materialized_series();
            let keys = string_categories(series)?;

            let mut table: HashMap<String, i64> = HashMap::new();
            for key in keys.into_iter().flatten() {
                *table.entry(key.to_string()).or_insert(0) += 1;
            }
            self.counts.insert(col.clone(), table);
        }

        self.col_order = cols;
        self.fitted = true;
        Ok(self)
    }

    fn transform(&self, frame: &DataFrame) -> Result<DataFrame> {
        if !self.fitted {
            return Err(TabencError::NotFitted);
        }
        ensure_columns_exist(frame, &self.col_order)?;
        if self.handle_missing == HandleMissing::Error {
            ensure_no_nulls(frame, &self.col_order)?;
        }

        let mut columns: Vec<Column> = Vec::with_capacity(self.col_order.len());
        for col in &self.col_order {
            let table = &self.counts[col];
            let series = frame.column(col)?.as_materialized_series();
            let keys = string_categories(series)?;

            let mut saw_unknown = false;
            let encoded: Int64Chunked = keys
                .into_iter()
                .map(|key| match key {
                    None => Some(MISSING_VALUE),
                    Some(category) => match table.get(category) {
                        Some(count) => Some(*count),
                        None => {
                            saw_unknown = true;
                            Some(UNKNOWN_VALUE)
                        }
                    },
                })
                .collect();

            if saw_unknown && self.handle_unknown == HandleUnknown::Error {
                return Err(TabencError::InvalidInput(format!(
                    "column '{col}' contains categories not seen during fit"
                )));
            }
            columns.push(encoded.with_name(col.as_str().into()).into_series().into());
        }

        Ok(DataFrame::new(columns)?)
    }
}

impl FoldEncoder for CountEncoder {
    fn fresh(&self) -> Self {
        Self {
            cols: self.cols.clone(),
            handle_unknown: self.handle_unknown,
            handle_missing: self.handle_missing,
            ..Self::default()
        }
    }
}
