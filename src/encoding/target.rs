//! Target-statistic encoding
//!
//! [`GreedyTargetEncoder`] encodes each category as a (smoothed) estimate of
//! the label, using everything it is fitted on, including each training
//! row's own label. That is exactly the leakage the out-of-fold wrapper
//! exists to prevent, so [`TargetEncoder`] composes the greedy encoder with
//! [`OutOfFoldWrapper`](super::OutOfFoldWrapper) for leakage-safe use.

use super::{
    ensure_columns_exist, ensure_no_nulls, label_mean, resolve_columns, Encoder, FoldEncoder,
    HandleMissing, HandleUnknown, OutOfFoldWrapper, Smoothing, SmoothingStrategy,
};
use crate::error::{Result, TabencError};
use crate::folds::{FoldParams, FoldPolicy};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for [`TargetEncoder`] (and its inner greedy encoder)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetEncoderConfig {
    /// Smoothing method applied to per-category statistics
    pub smoothing: Smoothing,

    /// Columns to encode; `None` means all columns
    pub cols: Option<Vec<String>>,

    /// Policy for categories unseen at fit time
    pub handle_unknown: HandleUnknown,

    /// Policy for null category values
    pub handle_missing: HandleMissing,

    /// Parameters forwarded to the fold policy's split call
    pub folds_params: Option<FoldParams>,
}

impl TargetEncoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_smoothing(mut self, smoothing: Smoothing) -> Self {
        self.smoothing = smoothing;
        self
    }

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

    pub fn with_folds_params(mut self, params: FoldParams) -> Self {
        self.folds_params = Some(params);
        self
    }
}

/// Greedy (full-information) target encoder.
///
/// Records the global label mean at fit time, delegates per-category math to
/// its [`SmoothingStrategy`], and substitutes the global mean for missing and
/// unknown categories at the output boundary. Output columns are Float64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreedyTargetEncoder {
    smoothing: Smoothing,
    cols: Option<Vec<String>>,
    handle_unknown: HandleUnknown,
    handle_missing: HandleMissing,
    strategy: SmoothingStrategy,
    global_mean: f64,
    col_order: Vec<String>,
    fitted: bool,
}

impl GreedyTargetEncoder {
    pub fn new(smoothing: Smoothing) -> Self {
        Self {
            smoothing,
            cols: None,
            handle_unknown: HandleUnknown::default(),
            handle_missing: HandleMissing::default(),
            strategy: SmoothingStrategy::new(smoothing),
            global_mean: 0.0,
            col_order: Vec::new(),
            fitted: false,
        }
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

    /// Global label mean recorded at fit time
    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }
}

impl Encoder for GreedyTargetEncoder {
    fn fit(&mut self, frame: &DataFrame, labels: Option<&Series>) -> Result<&mut Self> {
        let labels = labels.ok_or(TabencError::MissingLabel)?;

        let cols = resolve_columns(self.cols.as_deref(), frame);
        ensure_columns_exist(frame, &cols)?;
        if self.handle_missing == HandleMissing::Error {
            ensure_no_nulls(frame, &cols)?;
        }

        self.global_mean = label_mean(labels)?;

        let restricted = frame.select(cols.iter().cloned())?;
        let mut strategy = SmoothingStrategy::new(self.smoothing);
        strategy.fit(&restricted, labels)?;

        self.strategy = strategy;
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

        let restricted = frame.select(self.col_order.iter().cloned())?;
        let encoded = self.strategy.transform(&restricted)?;

        if self.handle_unknown == HandleUnknown::Error {
            for (name, cells) in &encoded {
                if cells.iter().any(|cell| cell.is_unknown()) {
                    return Err(TabencError::InvalidInput(format!(
                        "column '{name}' contains categories not seen during fit"
                    )));
                }
            }
        }

        let columns: Vec<Column> = encoded
            .into_iter()
            .map(|(name, cells)| {
                let values: Float64Chunked = cells
                    .into_iter()
                    .map(|cell| Some(cell.or_substitute(self.global_mean)))
                    .collect();
                values.with_name(name.into()).into_series().into()
            })
            .collect();

        Ok(DataFrame::new(columns)?)
    }
}

impl FoldEncoder for GreedyTargetEncoder {
    fn fresh(&self) -> Self {
        Self {
            cols: self.cols.clone(),
            handle_unknown: self.handle_unknown,
            handle_missing: self.handle_missing,
            ..Self::new(self.smoothing)
        }
    }
}

/// Leakage-safe target encoder.
///
/// Composes a [`GreedyTargetEncoder`] with the out-of-fold wrapper: rows of
/// the original training frame are encoded by a fold encoder that never saw
/// their labels, any other frame by an encoder trained on all the data.
#[derive(Debug, Serialize, Deserialize)]
pub struct TargetEncoder {
    wrapper: OutOfFoldWrapper<GreedyTargetEncoder>,
}

impl TargetEncoder {
    /// Target encoder with default configuration: no smoothing, all columns,
    /// value policies
    pub fn new(folds: impl FoldPolicy + Send + Sync + 'static) -> Self {
        Self::with_config(folds, TargetEncoderConfig::default())
    }

    pub fn with_config(
        folds: impl FoldPolicy + Send + Sync + 'static,
        config: TargetEncoderConfig,
    ) -> Self {
        let mut inner = GreedyTargetEncoder::new(config.smoothing)
            .with_unknown_policy(config.handle_unknown)
            .with_missing_policy(config.handle_missing);
        if let Some(cols) = config.cols {
            inner = inner.with_columns(cols);
        }

        let mut wrapper = OutOfFoldWrapper::new(inner, folds);
        if let Some(params) = config.folds_params {
            wrapper = wrapper.with_folds_params(params);
        }
        Self { wrapper }
    }
}

impl Encoder for TargetEncoder {
    fn fit(&mut self, frame: &DataFrame, labels: Option<&Series>) -> Result<&mut Self> {
        self.wrapper.fit(frame, labels)?;
        Ok(self)
    }

    fn transform(&self, frame: &DataFrame) -> Result<DataFrame> {
        self.wrapper.transform(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fruits_users_frame() -> DataFrame {
        df!(
            "fruits" => &["apple", "apple", "banana", "banana", "cherry", "cherry"],
            "users" => &["alice", "alice", "alice", "alice", "bob", "bob"],
        )
        .unwrap()
    }

    fn fruits_users_labels() -> Series {
        Series::new("target".into(), &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
    }

    #[test]
    fn test_greedy_unsmoothed() {
        let mut encoder = GreedyTargetEncoder::new(Smoothing::None);
        encoder
            .fit(&fruits_users_frame(), Some(&fruits_users_labels()))
            .unwrap();
        let encoded = encoder.transform(&fruits_users_frame()).unwrap();

        let expected = df!(
            "fruits" => &[0.0, 0.0, 0.5, 0.5, 1.0, 1.0],
            "users" => &[0.25, 0.25, 0.25, 0.25, 1.0, 1.0],
        )
        .unwrap();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_greedy_unknown_and_missing_get_global_mean() {
        let mut encoder = GreedyTargetEncoder::new(Smoothing::None);
        encoder
            .fit(&fruits_users_frame(), Some(&fruits_users_labels()))
            .unwrap();

        let test_df = df!(
            "fruits" => &[Some("unseen"), None, Some("apple")],
            "users" => &[Some("alice"), Some("bob"), Some("bob")],
        )
        .unwrap();
        let encoded = encoder.transform(&test_df).unwrap();

        // unknown and missing both substitute the global mean (0.5)
        let expected = df!(
            "fruits" => &[0.5, 0.5, 0.0],
            "users" => &[0.25, 1.0, 1.0],
        )
        .unwrap();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_greedy_restricted_columns() {
        let mut encoder =
            GreedyTargetEncoder::new(Smoothing::None).with_columns(vec!["fruits".to_string()]);
        encoder
            .fit(&fruits_users_frame(), Some(&fruits_users_labels()))
            .unwrap();
        let encoded = encoder.transform(&fruits_users_frame()).unwrap();

        let expected = df!("fruits" => &[0.0, 0.0, 0.5, 0.5, 1.0, 1.0]).unwrap();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_greedy_requires_labels() {
        let mut encoder = GreedyTargetEncoder::new(Smoothing::None);
        assert!(matches!(
            encoder.fit(&fruits_users_frame(), None),
            Err(TabencError::MissingLabel)
        ));
    }

    #[test]
    fn test_greedy_not_fitted() {
        let encoder = GreedyTargetEncoder::new(Smoothing::None);
        assert!(matches!(
            encoder.transform(&fruits_users_frame()),
            Err(TabencError::NotFitted)
        ));
    }

    #[test]
    fn test_greedy_missing_error_policy() {
        let with_nulls = df!("fruits" => &[Some("apple"), None]).unwrap();
        let labels = Series::new("target".into(), &[0.0, 0.0]);

        let mut encoder =
            GreedyTargetEncoder::new(Smoothing::None).with_missing_policy(HandleMissing::Error);
        assert!(matches!(
            encoder.fit(&with_nulls, Some(&labels)),
            Err(TabencError::InvalidInput(_))
        ));

        let clean = df!("fruits" => &["apple", "apple"]).unwrap();
        let mut encoder =
            GreedyTargetEncoder::new(Smoothing::None).with_missing_policy(HandleMissing::Error);
        encoder.fit(&clean, Some(&labels)).unwrap();
        assert!(matches!(
            encoder.transform(&with_nulls),
            Err(TabencError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_greedy_unknown_error_policy() {
        let train_df = df!("fruits" => &["apple", "banana"]).unwrap();
        let labels = Series::new("target".into(), &[0.0, 1.0]);

        let mut encoder =
            GreedyTargetEncoder::new(Smoothing::None).with_unknown_policy(HandleUnknown::Error);
        encoder.fit(&train_df, Some(&labels)).unwrap();

        assert!(encoder
            .transform(&df!("fruits" => &["banana", "apple"]).unwrap())
            .is_ok());
        assert!(matches!(
            encoder.transform(&df!("fruits" => &["apple", "cherry"]).unwrap()),
            Err(TabencError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_fresh_copy_shares_config_not_state() {
        let mut encoder =
            GreedyTargetEncoder::new(Smoothing::m_estimate()).with_columns(vec!["fruits".into()]);
        encoder
            .fit(&fruits_users_frame(), Some(&fruits_users_labels()))
            .unwrap();

        let copy = encoder.fresh();
        assert_eq!(copy.smoothing, encoder.smoothing);
        assert_eq!(copy.cols, encoder.cols);
        assert!(matches!(
            copy.transform(&fruits_users_frame()),
            Err(TabencError::NotFitted)
        ));
    }
}
