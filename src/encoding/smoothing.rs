//! Smoothing strategies for target-statistic encoding
//!
//! A strategy turns raw per-category label statistics into a target estimate,
//! optionally shrinking toward the global label mean to keep rare categories
//! from overfitting. The three variants are a closed union selected once at
//! construction; there is no runtime strategy registry.

use super::{string_categories, EncodedCell};
use crate::error::{Result, TabencError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Smoothing method for per-category target estimates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum Smoothing {
    /// Unsmoothed per-category label mean
    #[default]
    None,
    /// M-probability estimate: `(sum + m * global_mean) / (count + m)`.
    /// `m = 0` degenerates to the unsmoothed mean.
    MEstimate { m: f64 },
    /// Empirical-Bayes shrinkage: `shrink * local_mean + (1 - shrink) * global_mean`
    /// with `shrink = sigmoid((count - k) / f)`
    EmpiricalBayes { k: f64, f: f64 },
}

impl Smoothing {
    /// M-estimate with the default `m = 1.0`
    pub fn m_estimate() -> Self {
        Smoothing::MEstimate { m: 1.0 }
    }

    /// Empirical-Bayes with the defaults `k = 20`, `f = 10`
    pub fn empirical_bayes() -> Self {
        Smoothing::EmpiricalBayes { k: 20.0, f: 10.0 }
    }

    /// Resolve a method key and parameter mapping, for config-driven callers.
    /// Unrecognized keys fail here, at construction, not at fit time.
    pub fn parse(method: &str, params: &HashMap<String, f64>) -> Result<Self> {
        match method {
            "none" => Ok(Smoothing::None),
            "m-estimate" => Ok(Smoothing::MEstimate {
                m: params.get("m").copied().unwrap_or(1.0),
            }),
            "eb" => Ok(Smoothing::EmpiricalBayes {
                k: params.get("k").copied().unwrap_or(20.0),
                f: params.get("f").copied().unwrap_or(10.0),
            }),
            other => Err(TabencError::ConfigError(format!(
                "unknown smoothing method '{other}', expected one of: none, m-estimate, eb"
            ))),
        }
    }
}

/// Per-category label statistics collected at fit time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct CategoryStats {
    count: u64,
    sum: f64,
    mean: f64,
    /// Empirical-Bayes shrinkage weight; 1.0 for the other methods
    shrink: f64,
}

/// A fitted smoothing strategy: one per-category statistic table per column.
///
/// Tables are built once by `fit` and never mutated afterwards. `transform`
/// produces tri-state [`EncodedCell`]s; the numeric output representation is
/// the wrapping encoder's concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmoothingStrategy {
    method: Smoothing,
    global_mean: f64,
    tables: HashMap<String, HashMap<String, CategoryStats>>,
}

impl SmoothingStrategy {
    pub fn new(method: Smoothing) -> Self {
        Self {
            method,
            global_mean: 0.0,
            tables: HashMap::new(),
        }
    }

    pub fn method(&self) -> Smoothing {
        self.method
    }

    /// Build the per-category tables for every column of `frame`
    pub fn fit(&mut self, frame: &DataFrame, labels: &Series) -> Result<()> {
        if labels.len() != frame.height() {
            return Err(TabencError::InvalidInput(format!(
                "label series has {} values but frame has {} rows",
                labels.len(),
                frame.height()
            )));
        }

        let label_values = super::label_values(labels)?;
        self.global_mean = label_values.mean().ok_or_else(|| {
            TabencError::InvalidInput("label series contains no usable values".to_string())
        })?;

        self.tables.clear();
        for column in frame.get_columns() {
            let keys = string_categories(column.as_materialized_series())?;

            let mut sums: HashMap<String, (u64, f64)> = HashMap::new();
            for (key, label) in keys.into_iter().zip(label_values.into_iter()) {
                let (Some(category), Some(label)) = (key, label) else {
                    continue;
                };
                let entry = sums.entry(category.to_string()).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += label;
            }

            let table = sums
                .into_iter()
                .map(|(category, (count, sum))| {
                    let mean = sum / count as f64;
                    let shrink = match self.method {
                        Smoothing::EmpiricalBayes { k, f } => sigmoid((count as f64 - k) / f),
                        _ => 1.0,
                    };
                    (
                        category,
                        CategoryStats {
                            count,
                            sum,
                            mean,
                            shrink,
                        },
                    )
                })
                .collect();
            self.tables
                .insert(column.name().as_str().to_string(), table);
        }
        Ok(())
    }

    /// Map every cell of `frame` to its estimate, in frame column order
    pub fn transform(&self, frame: &DataFrame) -> Result<Vec<(String, Vec<EncodedCell>)>> {
        let mut encoded = Vec::with_capacity(frame.width());
        for column in frame.get_columns() {
            let name = column.name().as_str();
            let table = self
                .tables
                .get(name)
                .ok_or_else(|| TabencError::ColumnNotFound(name.to_string()))?;
            let keys = string_categories(column.as_materialized_series())?;

            let cells = keys
                .into_iter()
                .map(|key| match key {
                    None => EncodedCell::Missing,
                    Some(category) => match table.get(category) {
                        Some(stats) => EncodedCell::Known(self.estimate(stats)),
                        None => EncodedCell::Unknown,
                    },
                })
                .collect();
            encoded.push((name.to_string(), cells));
        }
        Ok(encoded)
    }

    fn estimate(&self, stats: &CategoryStats) -> f64 {
        match self.method {
            Smoothing::None => stats.mean,
            Smoothing::MEstimate { m } => {
                (stats.sum + m * self.global_mean) / (stats.count as f64 + m)
            }
            Smoothing::EmpiricalBayes { .. } => {
                stats.shrink * stats.mean + (1.0 - stats.shrink) * self.global_mean
            }
        }
    }
}

/// Standard logistic function
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
