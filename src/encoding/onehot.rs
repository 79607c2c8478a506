//! One-hot indicator encoding

use super::{
    ensure_columns_exist, ensure_no_nulls, resolve_columns, string_categories, Encoder,
    FoldEncoder, HandleMissing, HandleUnknown,
};
use crate::error::{Result, TabencError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Encodes each category as a boolean indicator column `{col}_{value}`.
///
/// The category set is captured at fit time in first-appearance order, one
/// output column per category; the original columns are dropped. Unknown and
/// null values produce an all-false row under the default value policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneHotEncoder {
    cols: Option<Vec<String>>,
    handle_unknown: HandleUnknown,
    handle_missing: HandleMissing,
    categories: Vec<(String, Vec<String>)>,
    fitted: bool,
}

impl OneHotEncoder {
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
        self.categories.iter().map(|(col, _)| col.clone()).collect()
    }
}

impl Encoder for OneHotEncoder {
    fn fit(&mut self, frame: &DataFrame, _labels: Option<&Series>) -> Result<&mut Self> {
        let cols = resolve_columns(self.cols.as_deref(), frame);
        ensure_columns_exist(frame, &cols)?;
        if self.handle_missing == HandleMissing::Error {
            ensure_no_nulls(frame, &cols)?;
        }

        self.categories.clear();
        for col in &cols {
            let series = frame.column(col)?.as_materialized_series();
            let keys = string_categories(series)?;

            let mut seen = HashSet::new();
            let mut ordered = Vec::new();
            for key in keys.into_iter().flatten() {
                if seen.insert(key.to_string()) {
                    ordered.push(key.to_string());
                }
            }
            self.categories.push((col.clone(), ordered));
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
        if self.handle_missing == HandleMissing::Error {
            ensure_no_nulls(frame, &cols)?;
        }

        let mut columns: Vec<Column> = Vec::new();
        for (col, categories) in &self.categories {
            let series = frame.column(col)?.as_materialized_series();
            let keys = string_categories(series)?;

            if self.handle_unknown == HandleUnknown::Error {
                let known: HashSet<&str> = categories.iter().map(|c| c.as_str()).collect();
                for key in keys.into_iter().flatten() {
                    if !known.contains(key) {
                        return Err(TabencError::InvalidInput(format!(
                            "column '{col}' contains categories not seen during fit"
                        )));
                    }
                }
            }

            for category in categories {
                let indicator: BooleanChunked = keys
                    .into_iter()
                    .map(|key| Some(key == Some(category.as_str())))
                    .collect();
                let name = format!("{col}_{category}");
                columns.push(indicator.with_name(name.into()).into_series().into());
            }
        }

        Ok(DataFrame::new(columns)?)
    }
}

impl FoldEncoder for OneHotEncoder {
    fn fresh(&self) -> Self {
        Self {
            cols: self.cols.clone(),
            handle_unknown: self.handle_unknown,
            handle_missing: self.handle_missing,
            ..Self::default()
        }
    }
}
