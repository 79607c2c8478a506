//! Per-category aggregate encoding

use super::{
    ensure_columns_exist, ensure_no_nulls, label_values, string_categories, Encoder, FoldEncoder,
    HandleMissing, HandleUnknown, MISSING_VALUE, UNKNOWN_VALUE,
};
use crate::error::{Result, TabencError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Aggregate statistic computed over a value column within each category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateStat {
    Mean,
    Sum,
    Min,
    Max,
    /// Sample standard deviation (ddof = 1); 0.0 for groups of fewer than 2 values
    Std,
    Median,
    Count,
}

impl AggregateStat {
    fn apply(&self, values: &[f64]) -> f64 {
        let n = values.len();
        match self {
            AggregateStat::Count => n as f64,
            AggregateStat::Sum => values.iter().sum(),
            AggregateStat::Mean => {
                if n == 0 {
                    0.0
                } else {
                    values.iter().sum::<f64>() / n as f64
                }
            }
            AggregateStat::Min => values.iter().cloned().fold(f64::INFINITY, f64::min),
            AggregateStat::Max => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            AggregateStat::Std => {
                if n < 2 {
                    return 0.0;
                }
                let mean = values.iter().sum::<f64>() / n as f64;
                let variance = values
                    .iter()
                    .map(|v| (v - mean) * (v - mean))
                    .sum::<f64>()
                    / (n - 1) as f64;
                variance.sqrt()
            }
            AggregateStat::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                match sorted.len() {
                    0 => 0.0,
                    len if len % 2 == 1 => sorted[len / 2],
                    len => (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0,
                }
            }
        }
    }
}

/// One aggregate to compute: `{group_col}_{name}` = `stat` of `column`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSpec {
    pub name: String,
    pub column: String,
    pub stat: AggregateStat,
}

impl AggregateSpec {
    pub fn new(name: impl Into<String>, column: impl Into<String>, stat: AggregateStat) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            stat,
        }
    }
}

/// Encodes each category as aggregate statistics of other columns.
///
/// For every group column and every spec, transform emits one Float64 column
/// `{col}_{name}`. Unseen categories map to [`UNKNOWN_VALUE`] and nulls to
/// [`MISSING_VALUE`] (as floats) under the default value policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateEncoder {
    specs: Vec<AggregateSpec>,
    cols: Vec<String>,
    handle_unknown: HandleUnknown,
    handle_missing: HandleMissing,
    /// group column -> category -> one statistic per spec, in spec order
    tables: HashMap<String, HashMap<String, Vec<f64>>>,
    fitted: bool,
}

impl AggregateEncoder {
    /// `cols` are the categorical group columns; `specs` the aggregates to
    /// compute within each group
    pub fn new(specs: Vec<AggregateSpec>, cols: Vec<String>) -> Self {
        Self {
            specs,
            cols,
            handle_unknown: HandleUnknown::default(),
            handle_missing: HandleMissing::default(),
            tables: HashMap::new(),
            fitted: false,
        }
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

impl Encoder for AggregateEncoder {
    fn fit(&mut self, frame: &DataFrame, _labels: Option<&Series>) -> Result<&mut Self> {
        ensure_columns_exist(frame, &self.cols)?;
        if self.handle_missing == HandleMissing::Error {
            ensure_no_nulls(frame, &self.cols)?;
        }

        // materialize each spec's value column once
        let mut value_columns: Vec<Float64Chunked> = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            let series = frame
                .column(&spec.column)
                .map_err(|_| TabencError::ColumnNotFound(spec.column.clone()))?
                .as_materialized_series();
            value_columns.push(label_values(series)?);
        }

        self.tables.clear();
        for col in &self.cols {
            let series = frame.column(col)?.as_materialized_series();
            let keys = string_categories(series)?;

            // rows per category, skipping nulls
            let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
            for (row, key) in keys.into_iter().enumerate() {
                if let Some(category) = key {
                    groups.entry(category.to_string()).or_default().push(row);
                }
            }

            let mut table: HashMap<String, Vec<f64>> = HashMap::new();
            for (category, rows) in groups {
                let stats = self
                    .specs
                    .iter()
                    .zip(&value_columns)
                    .map(|(spec, values)| {
                        let group: Vec<f64> = rows
                            .iter()
                            .filter_map(|row| values.get(*row))
                            .collect();
                        spec.stat.apply(&group)
                    })
                    .collect();
                table.insert(category, stats);
            }
            self.tables.insert(col.clone(), table);
        }

        self.fitted = true;
        Ok(self)
    }

    fn transform(&self, frame: &DataFrame) -> Result<DataFrame> {
        if !self.fitted {
            return Err(TabencError::NotFitted);
        }
        ensure_columns_exist(frame, &self.cols)?;
        if self.handle_missing == HandleMissing::Error {
            ensure_no_nulls(frame, &self.cols)?;
        }

        let mut columns: Vec<Column> = Vec::with_capacity(self.cols.len() * self.specs.len());
        for col in &self.cols {
            let table = &self.tables[col];
            let series = frame.column(col)?.as_materialized_series();
            let keys = string_categories(series)?;

            let mut saw_unknown = false;
            for (position, spec) in self.specs.iter().enumerate() {
                let encoded: Float64Chunked = keys
                    .into_iter()
                    .map(|key| match key {
                        None => Some(MISSING_VALUE as f64),
                        Some(category) => match table.get(category) {
                            Some(stats) => Some(stats[position]),
                            None => {
                                saw_unknown = true;
                                Some(UNKNOWN_VALUE as f64)
                            }
                        },
                    })
                    .collect();
                let name = format!("{col}_{}", spec.name);
                columns.push(encoded.with_name(name.into()).into_series().into());
            }

            if saw_unknown && self.handle_unknown == HandleUnknown::Error {
                return Err(TabencError::InvalidInput(format!(
                    "column '{col}' contains categories not seen during fit"
                )));
            }
        }

        Ok(DataFrame::new(columns)?)
    }
}

impl FoldEncoder for AggregateEncoder {
    fn fresh(&self) -> Self {
        Self::new(self.specs.clone(), self.cols.clone())
            .with_unknown_policy(self.handle_unknown)
            .with_missing_policy(self.handle_missing)
    }
}
