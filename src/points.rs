//! Columnar batches of live points.
//!
//! A [`LivePoints`] batch holds one `f64` column per named field. Models
//! read the columns named by their parameters and ignore the rest, so a
//! sampler can keep bookkeeping fields (log-likelihood, iteration, ...)
//! in the same batch.

use std::sync::Arc;

use arrow::{
    array::{Array, ArrayRef, Float64Array},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use tracing::debug;

use crate::error::{ModelError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct LivePoints {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    len: usize,
}

impl LivePoints {
    /// Build a batch from named columns of equal length.
    pub fn new(names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(ModelError::DimensionMismatch {
                expected: names.len(),
                found: columns.len(),
            });
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(ModelError::InvalidArgument(format!(
                    "duplicate column `{name}`"
                )));
            }
        }
        let len = columns.first().map_or(0, Vec::len);
        if let Some(bad) = columns.iter().find(|col| col.len() != len) {
            return Err(ModelError::DimensionMismatch {
                expected: len,
                found: bad.len(),
            });
        }
        Ok(Self {
            names,
            columns,
            len,
        })
    }

    /// Caller guarantees unique names and columns of length `len`.
    pub(crate) fn from_parts(names: Vec<String>, columns: Vec<Vec<f64>>, len: usize) -> Self {
        debug_assert!(columns.iter().all(|col| col.len() == len));
        Self {
            names,
            columns,
            len,
        }
    }

    /// Build a batch from rows whose entries follow the order of `names`.
    pub fn from_rows<S: AsRef<str>>(names: &[S], rows: &[Vec<f64>]) -> Result<Self> {
        let mut columns = vec![Vec::with_capacity(rows.len()); names.len()];
        for row in rows {
            if row.len() != names.len() {
                return Err(ModelError::DimensionMismatch {
                    expected: names.len(),
                    found: row.len(),
                });
            }
            for (col, &val) in columns.iter_mut().zip(row) {
                col.push(val);
            }
        }
        let names = names.iter().map(|n| n.as_ref().to_string()).collect();
        let mut points = Self::new(names, columns)?;
        points.len = rows.len();
        Ok(points)
    }

    /// A single live point.
    pub fn from_point<S: AsRef<str>>(names: &[S], values: &[f64]) -> Result<Self> {
        Self::from_rows(names, &[values.to_vec()])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.position(name)
            .map(|idx| self.columns[idx].as_slice())
            .ok_or_else(|| ModelError::MissingParameter(name.to_string()))
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut [f64]> {
        match self.position(name) {
            Some(idx) => Ok(self.columns[idx].as_mut_slice()),
            None => Err(ModelError::MissingParameter(name.to_string())),
        }
    }

    /// Add a column, or replace it if the name already exists.
    pub fn set_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if !self.columns.is_empty() && values.len() != self.len {
            return Err(ModelError::DimensionMismatch {
                expected: self.len,
                found: values.len(),
            });
        }
        self.len = values.len();
        match self.position(name) {
            Some(idx) => self.columns[idx] = values,
            None => {
                self.names.push(name.to_string());
                self.columns.push(values);
            }
        }
        Ok(())
    }

    /// Columns for `names`, in that order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&[f64]>> {
        names.iter().map(|n| self.column(n.as_ref())).collect()
    }

    /// Row-major copy of the columns in `names`, one `Vec` per sample.
    pub fn to_rows<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Vec<f64>>> {
        let columns = self.select(names)?;
        Ok((0..self.len)
            .map(|i| columns.iter().map(|col| col[i]).collect())
            .collect())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let fields: Vec<Field> = self
            .names
            .iter()
            .map(|name| Field::new(name, DataType::Float64, false))
            .collect();
        let arrays: Vec<ArrayRef> = self
            .columns
            .iter()
            .map(|col| Arc::new(Float64Array::from(col.clone())) as ArrayRef)
            .collect();
        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }
}

impl TryFrom<&RecordBatch> for LivePoints {
    type Error = ModelError;

    /// Only `Float64` columns are kept; anything else is auxiliary data.
    fn try_from(batch: &RecordBatch) -> Result<Self> {
        let schema = batch.schema();
        let mut names = Vec::new();
        let mut columns = Vec::new();
        for (field, array) in schema.fields().iter().zip(batch.columns()) {
            let Some(values) = array.as_any().downcast_ref::<Float64Array>() else {
                debug!(column = %field.name(), "skipping non-float column");
                continue;
            };
            if values.null_count() > 0 {
                return Err(ModelError::InvalidArgument(format!(
                    "column `{}` contains nulls",
                    field.name()
                )));
            }
            names.push(field.name().clone());
            columns.push(values.values().to_vec());
        }
        let mut points = LivePoints::new(names, columns)?;
        points.len = batch.num_rows();
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int32Array;
    use pretty_assertions::assert_eq;

    fn points() -> LivePoints {
        LivePoints::from_rows(&["x_0", "x_1"], &[vec![1., 2.], vec![3., 4.], vec![5., 6.]])
            .unwrap()
    }

    #[test]
    fn rows_become_columns() {
        let points = points();
        assert_eq!(points.len(), 3);
        assert_eq!(points.column("x_0").unwrap(), &[1., 3., 5.]);
        assert_eq!(points.column("x_1").unwrap(), &[2., 4., 6.]);
        assert_eq!(points.to_rows(&["x_1", "x_0"]).unwrap()[1], vec![4., 3.]);
    }

    #[test]
    fn missing_column() {
        let err = points().column("x_2").unwrap_err();
        assert!(matches!(err, ModelError::MissingParameter(ref name) if name == "x_2"));
    }

    #[test]
    fn ragged_columns_rejected() {
        let err = LivePoints::new(vec!["a".into(), "b".into()], vec![vec![1.], vec![1., 2.]])
            .unwrap_err();
        assert!(matches!(err, ModelError::DimensionMismatch { .. }));
        let err = LivePoints::from_rows(&["a", "b"], &[vec![1.]]).unwrap_err();
        assert!(matches!(err, ModelError::DimensionMismatch { .. }));
    }

    #[test]
    fn set_column_checks_length() {
        let mut points = points();
        points.set_column("logL", vec![0.; 3]).unwrap();
        assert_eq!(points.names().len(), 3);
        assert!(points.set_column("logP", vec![0.; 2]).is_err());
    }

    #[test]
    fn record_batch_round_trip() {
        let points = points();
        let batch = points.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 3);
        let back = LivePoints::try_from(&batch).unwrap();
        assert_eq!(back, points);
    }

    #[test]
    fn record_batch_skips_non_float_columns() {
        let schema = Schema::new(vec![
            Field::new("x_0", DataType::Float64, false),
            Field::new("it", DataType::Int32, false),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Float64Array::from(vec![0.5, 1.5])),
                Arc::new(Int32Array::from(vec![1, 2])),
            ],
        )
        .unwrap();
        let points = LivePoints::try_from(&batch).unwrap();
        assert_eq!(points.names(), &["x_0".to_string()]);
        assert_eq!(points.len(), 2);
    }
}
