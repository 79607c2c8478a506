//! Fold-splitting policies for out-of-fold encoding
//!
//! The out-of-fold wrapper consumes an externally supplied splitting policy.
//! Any type implementing [`FoldPolicy`] can drive it; a pre-computed
//! `Vec<FoldIndices>` satisfies the trait directly, and [`KFold`] provides
//! plain sequential splits for the common case. Fold selection and tuning are
//! the caller's business, not this crate's.

use crate::error::{Result, TabencError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Free-form parameters forwarded to a policy's `split` call
pub type FoldParams = HashMap<String, serde_json::Value>;

/// One (train, eval) partition of the rows of a training frame.
///
/// Indices are positional row numbers. Train and eval indices of one fold are
/// expected to be disjoint, and eval sets across folds are expected to cover
/// every row exactly once; the policy producing the folds is responsible for
/// these properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldIndices {
    pub train: Vec<IdxSize>,
    pub eval: Vec<IdxSize>,
}

impl FoldIndices {
    pub fn new(train: Vec<IdxSize>, eval: Vec<IdxSize>) -> Self {
        Self { train, eval }
    }
}

/// A cross-validation splitting policy
pub trait FoldPolicy {
    /// Produce the fold partitions for the given training data
    fn split(
        &self,
        frame: &DataFrame,
        labels: Option<&Series>,
        params: Option<&FoldParams>,
    ) -> Result<Vec<FoldIndices>>;
}

/// A pre-computed list of index pairs is itself a valid policy
impl FoldPolicy for Vec<FoldIndices> {
    fn split(
        &self,
        _frame: &DataFrame,
        _labels: Option<&Series>,
        _params: Option<&FoldParams>,
    ) -> Result<Vec<FoldIndices>> {
        Ok(self.clone())
    }
}

/// Sequential K-fold splitter.
///
/// Rows are partitioned into `n_splits` contiguous eval blocks in row order,
/// no shuffling. The first `n_rows % n_splits` folds receive one extra row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KFold {
    n_splits: usize,
}

impl KFold {
    pub fn new(n_splits: usize) -> Result<Self> {
        if n_splits < 2 {
            return Err(TabencError::ConfigError(format!(
                "n_splits must be at least 2, got {n_splits}"
            )));
        }
        Ok(Self { n_splits })
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }
}

impl FoldPolicy for KFold {
    fn split(
        &self,
        frame: &DataFrame,
        _labels: Option<&Series>,
        _params: Option<&FoldParams>,
    ) -> Result<Vec<FoldIndices>> {
        let n_rows = frame.height();
        if n_rows < self.n_splits {
            return Err(TabencError::InvalidInput(format!(
                "cannot split {n_rows} rows into {} folds",
                self.n_splits
            )));
        }

        let base = n_rows / self.n_splits;
        let remainder = n_rows % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0usize;
        for fold in 0..self.n_splits {
            let size = base + usize::from(fold < remainder);
            let stop = start + size;
            let eval: Vec<IdxSize> = (start..stop).map(|i| i as IdxSize).collect();
            let train: Vec<IdxSize> = (0..n_rows)
                .filter(|i| *i < start || *i >= stop)
                .map(|i| i as IdxSize)
                .collect();
            folds.push(FoldIndices::new(train, eval));
            start = stop;
        }
        Ok(folds)
    }
}
