//! tabenc - Leakage-safe categorical feature encoding
//!
//! This crate converts string/categorical columns of polars DataFrames into
//! numeric features:
//! - [`encoding::TargetEncoder`] - out-of-fold target statistics with
//!   smoothing, built so that statistics used to encode a training row never
//!   depend on that row's own label
//! - [`encoding::CountEncoder`] - category occurrence counts
//! - [`encoding::OrdinalEncoder`] - ordinal indices
//! - [`encoding::OneHotEncoder`] / [`encoding::MultiHotEncoder`] - indicator
//!   matrices
//! - [`encoding::AggregateEncoder`] - per-category aggregates of other columns
//! - [`encoding::NullEncoder`] - null indicators
//!
//! All encoders share the [`encoding::Encoder`] fit/transform lifecycle. The
//! fold policies driving the out-of-fold wrapper live in [`folds`].
//!
//! # Example
//!
//! ```no_run
//! use polars::prelude::*;
//! use tabenc::prelude::*;
//!
//! # fn main() -> tabenc::Result<()> {
//! let train_df = df!("fruits" => &["apple", "banana", "banana", "apple"]).unwrap();
//! let train_y = Series::new("target".into(), &[1.0, 0.0, 1.0, 1.0]);
//!
//! let mut encoder = TargetEncoder::new(KFold::new(4)?);
//! let encoded = encoder.fit_transform(&train_df, Some(&train_y))?;
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Encoders
pub mod encoding;

// Fold-splitting policies
pub mod folds;

pub use error::{Result, TabencError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, TabencError};

    // Encoder lifecycle
    pub use crate::encoding::{Encoder, FoldEncoder, HandleMissing, HandleUnknown};

    // Encoders
    pub use crate::encoding::{
        AggregateEncoder, AggregateSpec, AggregateStat, CountEncoder, MultiHotEncoder,
        NullEncoder, OneHotEncoder, OrdinalEncoder, TargetEncoder, TargetEncoderConfig,
    };

    // Target-encoding core
    pub use crate::encoding::{GreedyTargetEncoder, OutOfFoldWrapper, Smoothing};

    // Fold policies
    pub use crate::folds::{FoldIndices, FoldParams, FoldPolicy, KFold};
}
