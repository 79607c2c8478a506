//! Out-of-fold encoding wrapper
//!
//! Statistics built from a row's own label must never be used to encode that
//! row. The wrapper achieves this for the training set by fitting one
//! independent copy of its inner encoder per fold (each on that fold's train
//! slice) and encoding each fold's eval slice with the copy that never saw
//! it. Genuinely new data is encoded by a single global copy fitted on all
//! the training signal.

use super::{Encoder, FoldEncoder};
use crate::error::{Result, TabencError};
use crate::folds::{FoldIndices, FoldParams, FoldPolicy};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use xxhash_rust::xxh3::Xxh3;

/// Value identity of the training frame, recorded at fit time.
///
/// Two frames are considered the same training data when their ordered
/// column-name lists match and a stable content hash over all cells matches.
/// This is a best-effort check: a hash collision between distinct frames with
/// identical columns would be misclassified as training data. Callers needing
/// a hard guarantee should keep train and serve pipelines separate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainFingerprint {
    columns: Vec<String>,
    content_hash: u64,
}

impl TrainFingerprint {
    pub fn of(frame: &DataFrame) -> Self {
        Self {
            columns: frame_columns(frame),
            content_hash: hash_frame_content(frame),
        }
    }

    /// Whether `frame` is, by value, the frame this fingerprint was taken of
    pub fn matches(&self, frame: &DataFrame) -> bool {
        self.columns == frame_columns(frame) && self.content_hash == hash_frame_content(frame)
    }
}

fn frame_columns(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .iter()
        .map(|name| name.as_str().to_string())
        .collect()
}

/// Stable positional hash over every cell of the frame.
///
/// Column-major with name separators and explicit null markers; equal content
/// in equal column order always hashes equally across calls.
fn hash_frame_content(frame: &DataFrame) -> u64 {
    let mut hasher = Xxh3::with_seed(42);
    for column in frame.get_columns() {
        hasher.update(column.name().as_bytes());
        hasher.update(&[0x1f]);

        let series = column.as_materialized_series();
        for idx in 0..series.len() {
            let value = series.get(idx).unwrap_or(AnyValue::Null);
            match value {
                AnyValue::Null => hasher.update(&[0x00]),
                value => {
                    let repr = format!("{value:?}");
                    hasher.update(&[0x01]);
                    hasher.update(&(repr.len() as u64).to_le_bytes());
                    hasher.update(repr.as_bytes());
                }
            }
        }
    }
    hasher.digest()
}

/// Trains one inner-encoder copy per fold plus a global copy, and routes
/// transforms by training-data identity.
///
/// On the training path the per-fold outputs are concatenated in fold order.
/// Row order therefore equals input order only when the fold policy produces
/// increasing, order-preserving eval blocks (as sequential K-fold does);
/// shuffled policies yield fold-ordered rows.
#[derive(Serialize, Deserialize)]
pub struct OutOfFoldWrapper<E> {
    inner: E,
    #[serde(skip, default = "unresolvable_folds")]
    folds: Box<dyn FoldPolicy + Send + Sync>,
    folds_params: Option<FoldParams>,
    fold_encoders: Vec<E>,
    global_encoder: Option<E>,
    splits: Vec<FoldIndices>,
    fingerprint: Option<TrainFingerprint>,
    fitted: bool,
}

/// Serde placeholder: a deserialized wrapper can transform with its restored
/// fold and global encoders but must be rebuilt with a real policy to refit.
fn unresolvable_folds() -> Box<dyn FoldPolicy + Send + Sync> {
    Box::new(Vec::<FoldIndices>::new())
}

impl<E: std::fmt::Debug> std::fmt::Debug for OutOfFoldWrapper<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutOfFoldWrapper")
            .field("inner", &self.inner)
            .field("n_folds", &self.splits.len())
            .field("fingerprint", &self.fingerprint)
            .field("fitted", &self.fitted)
            .finish()
    }
}

impl<E> OutOfFoldWrapper<E>
where
    E: FoldEncoder + Send + Sync,
{
    pub fn new(inner: E, folds: impl FoldPolicy + Send + Sync + 'static) -> Self {
        Self {
            inner,
            folds: Box::new(folds),
            folds_params: None,
            fold_encoders: Vec::new(),
            global_encoder: None,
            splits: Vec::new(),
            fingerprint: None,
            fitted: false,
        }
    }

    pub fn with_folds_params(mut self, params: FoldParams) -> Self {
        self.folds_params = Some(params);
        self
    }

    /// The resolved fold split of the last fit
    pub fn splits(&self) -> &[FoldIndices] {
        &self.splits
    }

    fn take_frame(frame: &DataFrame, indices: &[IdxSize]) -> Result<DataFrame> {
        let idx = IdxCa::from_vec("idx".into(), indices.to_vec());
        Ok(frame.take(&idx)?)
    }

    fn take_series(series: &Series, indices: &[IdxSize]) -> Result<Series> {
        let idx = IdxCa::from_vec("idx".into(), indices.to_vec());
        Ok(series.take(&idx)?)
    }

    /// Reconstruct a leakage-free encoding of the training frame: each fold's
    /// eval slice goes through the encoder that was fitted without it.
    fn transform_train(&self, frame: &DataFrame) -> Result<DataFrame> {
        let mut result: Option<DataFrame> = None;
        for (encoder, fold) in self.fold_encoders.iter().zip(&self.splits) {
            let eval_frame = Self::take_frame(frame, &fold.eval)?;
            let encoded = encoder.transform(&eval_frame)?;
            result = Some(match result {
                None => encoded,
                Some(acc) => acc.vstack(&encoded)?,
            });
        }
        result.ok_or_else(|| TabencError::InvalidInput("fold split is empty".to_string()))
    }

    fn transform_new(&self, frame: &DataFrame) -> Result<DataFrame> {
        let global = self.global_encoder.as_ref().ok_or(TabencError::NotFitted)?;
        global.transform(frame)
    }
}

impl<E> Encoder for OutOfFoldWrapper<E>
where
    E: FoldEncoder + Send + Sync,
{
    fn fit(&mut self, frame: &DataFrame, labels: Option<&Series>) -> Result<&mut Self> {
        let labels = labels.ok_or(TabencError::MissingLabel)?;

        let splits = self
            .folds
            .split(frame, Some(labels), self.folds_params.as_ref())?;
        if splits.is_empty() {
            return Err(TabencError::InvalidInput(
                "fold policy produced no splits".to_string(),
            ));
        }

        // the per-fold fits touch disjoint state and disjoint data slices
        let fold_encoders = splits
            .par_iter()
            .map(|fold| {
                let train_frame = Self::take_frame(frame, &fold.train)?;
                let train_labels = Self::take_series(labels, &fold.train)?;
                let mut encoder = self.inner.fresh();
                encoder.fit(&train_frame, Some(&train_labels))?;
                Ok(encoder)
            })
            .collect::<Result<Vec<E>>>()?;

        let mut global_encoder = self.inner.fresh();
        global_encoder.fit(frame, Some(labels))?;

        debug!(
            folds = splits.len(),
            rows = frame.height(),
            "fitted out-of-fold encoders"
        );

        self.fold_encoders = fold_encoders;
        self.global_encoder = Some(global_encoder);
        self.splits = splits;
        self.fingerprint = Some(TrainFingerprint::of(frame));
        self.fitted = true;
        Ok(self)
    }

    fn transform(&self, frame: &DataFrame) -> Result<DataFrame> {
        if !self.fitted {
            return Err(TabencError::NotFitted);
        }
        let fingerprint = self.fingerprint.as_ref().ok_or(TabencError::NotFitted)?;

        if fingerprint.matches(frame) {
            self.transform_train(frame)
        } else {
            self.transform_new(frame)
        }
    }
}
