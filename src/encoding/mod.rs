//! Categorical feature encoders
//!
//! Converts string/categorical columns into numeric features:
//! - Occurrence counts ([`CountEncoder`])
//! - Null indicators ([`NullEncoder`])
//! - Ordinal indices ([`OrdinalEncoder`])
//! - One-hot / multi-hot indicator matrices ([`OneHotEncoder`], [`MultiHotEncoder`])
//! - Per-category aggregates of other columns ([`AggregateEncoder`])
//! - Leakage-safe target statistics ([`TargetEncoder`])
//!
//! Every encoder follows the same fit/transform lifecycle expressed by the
//! [`Encoder`] trait: `fit` builds immutable per-category statistics,
//! `transform` produces a new frame with the target columns replaced by their
//! encoded form, and `fit_transform` composes the two. Transforming before
//! fitting fails with [`TabencError::NotFitted`].

mod aggregate;
mod count;
mod multihot;
mod null;
mod onehot;
mod oof;
mod ordinal;
mod smoothing;
mod target;

pub use aggregate::{AggregateEncoder, AggregateSpec, AggregateStat};
pub use count::CountEncoder;
pub use multihot::MultiHotEncoder;
pub use null::NullEncoder;
pub use onehot::OneHotEncoder;
pub use oof::{OutOfFoldWrapper, TrainFingerprint};
pub use ordinal::OrdinalEncoder;
pub use smoothing::{Smoothing, SmoothingStrategy};
pub use target::{GreedyTargetEncoder, TargetEncoder, TargetEncoderConfig};

use crate::error::{Result, TabencError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Caller-facing sentinel for categories unseen at fit time
pub const UNKNOWN_VALUE: i64 = -1;

/// Caller-facing sentinel for null category values
pub const MISSING_VALUE: i64 = -2;

/// Policy for category values absent from the fitted statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleUnknown {
    /// Substitute a sentinel (or the global mean for target encoding)
    #[default]
    Value,
    /// Fail the transform call
    Error,
}

/// Policy for null category values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleMissing {
    /// Substitute a sentinel (or the global mean for target encoding)
    #[default]
    Value,
    /// Fail the fit or transform call
    Error,
}

/// Per-cell outcome of a statistic lookup.
///
/// The target-encoding core keeps this tri-state internally and converts to a
/// numeric representation only at the output boundary, so sentinel values can
/// never collide with a legitimately produced statistic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EncodedCell {
    /// The category was seen at fit time; carries its statistic
    Known(f64),
    /// The input value was null
    Missing,
    /// The category was not seen at fit time
    Unknown,
}

impl EncodedCell {
    pub fn is_unknown(self) -> bool {
        matches!(self, EncodedCell::Unknown)
    }

    /// The known statistic, or `fallback` for missing/unknown cells
    pub fn or_substitute(self, fallback: f64) -> f64 {
        match self {
            EncodedCell::Known(value) => value,
            EncodedCell::Missing | EncodedCell::Unknown => fallback,
        }
    }
}

/// The fit/transform lifecycle shared by every encoder.
///
/// `labels` is optional at the trait level; encoders that require a label
/// series (target encoding) fail with [`TabencError::MissingLabel`] when it
/// is absent, the rest ignore it.
pub trait Encoder {
    fn fit(&mut self, frame: &DataFrame, labels: Option<&Series>) -> Result<&mut Self>;

    fn transform(&self, frame: &DataFrame) -> Result<DataFrame>;

    fn fit_transform(&mut self, frame: &DataFrame, labels: Option<&Series>) -> Result<DataFrame>
    where
        Self: Sized,
    {
        self.fit(frame, labels)?;
        self.transform(frame)
    }
}

/// An encoder the out-of-fold wrapper can train one independent copy of per
/// fold.
///
/// `fresh` is the clone-and-refit factory: it returns a statistic-free copy
/// sharing only the immutable construction parameters, never fitted state.
pub trait FoldEncoder: Encoder + Sized {
    fn fresh(&self) -> Self;
}

/// Resolve the target column set: the explicit list, or all frame columns
pub(crate) fn resolve_columns(requested: Option<&[String]>, frame: &DataFrame) -> Vec<String> {
    match requested {
        Some(cols) => cols.to_vec(),
        None => frame
            .get_column_names()
            .iter()
            .map(|name| name.as_str().to_string())
            .collect(),
    }
}

/// Fail with `ColumnNotFound` if any target column is absent from the frame
pub(crate) fn ensure_columns_exist(frame: &DataFrame, cols: &[String]) -> Result<()> {
    for col in cols {
        if frame.column(col).is_err() {
            return Err(TabencError::ColumnNotFound(col.clone()));
        }
    }
    Ok(())
}

/// Fail with `InvalidInput` if any target column contains nulls
pub(crate) fn ensure_no_nulls(frame: &DataFrame, cols: &[String]) -> Result<()> {
    for col in cols {
        let column = frame
            .column(col)
            .map_err(|_| TabencError::ColumnNotFound(col.clone()))?;
        if column.null_count() > 0 {
            return Err(TabencError::InvalidInput(format!(
                "column '{col}' contains null values"
            )));
        }
    }
    Ok(())
}

/// View a column's values as string category keys; nulls are preserved
pub(crate) fn string_categories(series: &Series) -> Result<StringChunked> {
    let cast = series.cast(&DataType::String)?;
    Ok(cast.str()?.clone())
}

/// View a label series as nullable floats
pub(crate) fn label_values(labels: &Series) -> Result<Float64Chunked> {
    let cast = labels.cast(&DataType::Float64)?;
    Ok(cast.f64()?.clone())
}

/// Arithmetic mean of the label series over all non-null values
pub(crate) fn label_mean(labels: &Series) -> Result<f64> {
    label_values(labels)?.mean().ok_or_else(|| {
        TabencError::InvalidInput("label series contains no usable values".to_string())
    })
}
