//! Measurement grid model

use crate::error::ParseError;

/// Row-major grid of temperature samples with equal-length rows
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementGrid {
    cols: usize,
    cells: Vec<f64>,
}

impl MeasurementGrid {
    /// Build a grid from rows, rejecting empty input and ragged rows
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, ParseError> {
        let mut builder = GridBuilder::default();
        for (index, row) in rows.into_iter().enumerate() {
            builder.push_row(index as u64 + 1, row)?;
        }
        builder.finish()
    }

    pub fn rows(&self) -> usize {
        if self.cols == 0 {
            0
        } else {
            self.cells.len() / self.cols
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols)
    }

    /// All samples in row-major order
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check the shape against an expected `(rows, cols)`
    pub fn ensure_shape(&self, expected_rows: usize, expected_cols: usize) -> Result<(), ParseError> {
        let (rows, cols) = self.shape();
        if rows == expected_rows && cols == expected_cols {
            Ok(())
        } else {
            Err(ParseError::DimensionMismatch {
                expected_rows,
                expected_cols,
                found_rows: rows,
                found_cols: cols,
            })
        }
    }
}

/// Accumulates rows while enforcing the equal-length invariant
#[derive(Debug, Default)]
pub(crate) struct GridBuilder {
    cols: Option<usize>,
    cells: Vec<f64>,
}

impl GridBuilder {
    /// `line` is only used for error reporting
    pub(crate) fn push_row(&mut self, line: u64, row: Vec<f64>) -> Result<(), ParseError> {
        match self.cols {
            None => self.cols = Some(row.len()),
            Some(expected) if expected != row.len() => {
                return Err(ParseError::MalformedGrid {
                    line,
                    expected,
                    found: row.len(),
                });
            }
            Some(_) => {}
        }
        self.cells.extend(row);
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<MeasurementGrid, ParseError> {
        match self.cols {
            Some(cols) if cols > 0 => Ok(MeasurementGrid {
                cols,
                cells: self.cells,
            }),
            _ => Err(ParseError::EmptyGrid),
        }
    }
}
