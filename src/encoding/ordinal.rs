//! Ordinal index encoding

use super::{
    ensure_columns_exist, ensure_no_nulls, resolve_columns, string_categories, Encoder,
    FoldEncoder, HandleMissing, HandleUnknown, MISSING_VALUE, UNKNOWN_VALUE,
};
use crate::error::{Result, TabencError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Encodes each category as an ordinal index.
///
/// Indices are assigned by first appearance in the fit data, starting at 1,
/// unless explicit mappings are supplied with [`OrdinalEncoder::with_mappings`]
/// (in which case fit learns nothing). Output columns are Int64; unseen
/// categories map to [`UNKNOWN_VALUE`] and nulls to [`MISSING_VALUE`] under
/// the default value policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrdinalEncoder {
    cols: Option<Vec<String>>,
    handle_unknown: HandleUnknown,
    handle_missing: HandleMissing,
    mappings: Option<HashMap<String, HashMap<String, i64>>>,
    mappings_supplied: bool,
    col_order: Vec<String>,
    fitted: bool,
}

impl OrdinalEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict encoding to the given columns (default: all columns)
    pub fn with_columns(mut self, cols: Vec<String>) -> Self {
        self.cols = Some(cols);
        self
    }

    /// Supply explicit category-to-index mappings instead of learning them.
    /// Mappings for columns absent from the fit frame are ignored.
    pub fn with_mappings(mut self, mappings: HashMap<String, HashMap<String, i64>>) -> Self {
        self.mappings = Some(mappings);
        self.mappings_supplied = true;
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

    /// The learned (or supplied) category-to-index mapping for a column
    pub fn mapping(&self, col: &str) -> Option<&HashMap<String, i64>> {
        self.mappings.as_ref().and_then(|m| m.get(col))
    }
}

impl Encoder for OrdinalEncoder {
    fn fit(&mut self, frame: &DataFrame, _labels: Option<&Series>) -> Result<&mut Self> {
        let cols = resolve_columns(self.cols.as_deref(), frame);
        ensure_columns_exist(frame, &cols)?;
        if self.handle_missing == HandleMissing::Error {
            ensure_no_nulls(frame, &cols)?;
        }

        if self.mappings_supplied {
            // keep the supplied tables; only pin down which columns to encode
            let supplied = self.mappings.as_ref().expect("mappings supplied");
            self.col_order = cols
                .into_iter()
                .filter(|col| supplied.contains_key(col))
                .collect();
            self.fitted = true;
            return Ok(self);
        }

        let mut mappings = HashMap::new();
        for col in &cols {
            let series = frame.column(col)?.as_materialized_series();
            let keys = string_categories(series)?;

            let mut table: HashMap<String, i64> = HashMap::new();
            let mut next_index = 1i64;
            for key in keys.into_iter().flatten() {
                table.entry(key.to_string()).or_insert_with(|| {
                    let index = next_index;
                    next_index += 1;
                    index
                });
            }
            mappings.insert(col.clone(), table);
        }

        self.mappings = Some(mappings);
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

        let no_mappings = HashMap::new();
        let mappings = match &self.mappings {
            Some(mappings) => mappings,
            None => {
                warn!("no ordinal mappings exist, treating every value as unknown");
                &no_mappings
            }
        };

        let empty_table = HashMap::new();
        let mut columns: Vec<Column> = Vec::with_capacity(self.col_order.len());
        for col in &self.col_order {
            let table = mappings.get(col).unwrap_or(&empty_table);
            let series = frame.column(col)?.as_materialized_series();
            let keys = string_categories(series)?;

            let mut saw_unknown = false;
            let encoded: Int64Chunked = keys
                .into_iter()
                .map(|key| match key {
                    None => Some(MISSING_VALUE),
                    Some(category) => match table.get(category) {
                        Some(index) => Some(*index),
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

impl FoldEncoder for OrdinalEncoder {
    fn fresh(&self) -> Self {
        Self {
            cols: self.cols.clone(),
            handle_unknown: self.handle_unknown,
            handle_missing: self.handle_missing,
            mappings: self.mappings_supplied.then(|| self.mappings.clone()).flatten(),
            mappings_supplied: self.mappings_supplied,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train_frame() -> DataFrame {
        df!(
            "fruits" => &["apple", "banana", "banana"],
            "users" => &["alice", "bob", "carol"],
        )
        .unwrap()
    }

    #[test]
    fn test_first_appearance_indices() {
        let mut encoder = OrdinalEncoder::new();
        let encoded = encoder.fit_transform(&train_frame(), None).unwrap();

        let expected = df!(
            "fruits" => &[1i64, 2, 2],
            "users" => &[1i64, 2, 3],
        )
        .unwrap();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_unknown_and_missing_sentinels() {
        let mut encoder = OrdinalEncoder::new();
        encoder.fit(&train_frame(), None).unwrap();

        let test_df = df!(
            "fruits" => &[Some("unseen"), None, Some("apple")],
            "users" => &[Some("alice"), Some("unseen"), None],
        )
        .unwrap();
        let encoded = encoder.transform(&test_df).unwrap();

        let expected = df!(
            "fruits" => &[UNKNOWN_VALUE, MISSING_VALUE, 1],
            "users" => &[1i64, UNKNOWN_VALUE, MISSING_VALUE],
        )
        .unwrap();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_supplied_mappings() {
        let mut mappings = HashMap::new();
        mappings.insert(
            "fruits".to_string(),
            HashMap::from([
                ("apple".to_string(), 10i64),
                ("banana".to_string(), 20),
                ("cherry".to_string(), 30),
            ]),
        );

        let train_df = df!("fruits" => &["apple", "banana", "cherry"]).unwrap();
        let mut encoder = OrdinalEncoder::new().with_mappings(mappings);
        let encoded = encoder.fit_transform(&train_df, None).unwrap();

        let expected = df!("fruits" => &[10i64, 20, 30]).unwrap();
        assert_eq!(encoded, expected);

        let test_df = df!("fruits" => &[Some("unseen"), None, Some("apple")]).unwrap();
        let encoded = encoder.transform(&test_df).unwrap();
        let expected = df!("fruits" => &[UNKNOWN_VALUE, MISSING_VALUE, 10]).unwrap();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_not_fitted() {
        let encoder = OrdinalEncoder::new();
        assert!(matches!(
            encoder.transform(&train_frame()),
            Err(TabencError::NotFitted)
        ));
    }

    #[test]
    fn test_missing_error_policy() {
        let with_nulls = df!("fruits" => &[Some("apple"), None]).unwrap();
        let mut encoder = OrdinalEncoder::new().with_missing_policy(HandleMissing::Error);
        assert!(matches!(
            encoder.fit(&with_nulls, None),
            Err(TabencError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unknown_error_policy() {
        let mut encoder = OrdinalEncoder::new().with_unknown_policy(HandleUnknown::Error);
        encoder
            .fit(&df!("fruits" => &["apple", "banana"]).unwrap(), None)
            .unwrap();

        assert!(encoder
            .transform(&df!("fruits" => &["banana", "apple"]).unwrap())
            .is_ok());
        assert!(matches!(
            encoder.transform(&df!("fruits" => &["apple", "cherry"]).unwrap()),
            Err(TabencError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_mapping_accessor() {
        let mut encoder = OrdinalEncoder::new();
        encoder.fit(&train_frame(), None).unwrap();

        let fruits = encoder.mapping("fruits").unwrap();
        assert_eq!(fruits["apple"], 1);
        assert_eq!(fruits["banana"], 2);
    }
}
