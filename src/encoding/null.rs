//! Null-indicator encoding

use super::{ensure_columns_exist, resolve_columns, Encoder, FoldEncoder};
use crate::error::{Result, TabencError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Encodes whether each value is null as a boolean column.
///
/// There is nothing to learn beyond the column set, and no unknown/missing
/// policy applies: a null is the signal, not a problem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NullEncoder {
    cols: Option<Vec<String>>,
    col_order: Vec<String>,
    fitted: bool,
}

impl NullEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict encoding to the given columns (default: all columns)
    pub fn with_columns(mut self, cols: Vec<String>) -> Self {
        self.cols = Some(cols);
        self
    }
}

impl Encoder for NullEncoder {
    fn fit(&mut self, frame: &DataFrame, _labels: Option<&Series>) -> Result<&mut Self> {
        let cols = resolve_columns(self.cols.as_deref(), frame);
        ensure_columns_exist(frame, &cols)?;
        self.col_order = cols;
        self.fitted = true;
        Ok(self)
    }

    fn transform(&self, frame: &DataFrame) -> Result<DataFrame> {
        if !self.fitted {
            return Err(TabencError::NotFitted);
        }
        ensure_columns_exist(frame, &self.col_order)?;

        let mut columns: Vec<Column> = Vec::with_capacity(self.col_order.len());
        for col in &self.col_order {
            let series = frame.column(col)?.as_materialized_series();
            let indicator = series.is_null();
            columns.push(
                indicator
                    .with_name(col.as_str().into())
                    .into_series()
                    .into(),
            );
        }

        Ok(DataFrame::new(columns)?)
    }
}

impl FoldEncoder for NullEncoder {
    fn fresh(&self) -> Self {
        Self {
            cols: self.cols.clone(),
            ..Self::default()
        }
    }
}
