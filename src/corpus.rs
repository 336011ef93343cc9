use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::error::{LshError, Result};

/// A fixed, ordered set of points sharing one dimensionality.
///
/// Points are addressed by their row index `0..len()`. An index built over a
/// corpus stores only these indices, so the corpus must outlive the index and
/// must not be swapped for a different one while the index is in use.
#[derive(Debug, Clone)]
pub struct Corpus {
    points: Array2<f32>,
}

impl Corpus {
    /// Wrap a matrix whose rows are the points.
    pub fn new(points: Array2<f32>) -> Self {
        Self { points }
    }

    /// Build a corpus from row vectors. All rows must have the length of the first.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let dim = rows.first().map_or(0, Vec::len);
        if dim == 0 && !rows.is_empty() {
            return Err(LshError::ZeroDimension);
        }
        let mut flat = Vec::with_capacity(rows.len() * dim);
        for row in rows {
            if row.len() != dim {
                return Err(LshError::DimensionMismatch {
                    expected: dim,
                    got: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        Self::from_flat(flat, dim)
    }

    /// Build a corpus from row-major data with `dim` coordinates per point.
    pub fn from_flat(data: Vec<f32>, dim: usize) -> Result<Self> {
        if dim == 0 {
            if !data.is_empty() {
                return Err(LshError::ZeroDimension);
            }
            return Ok(Self::new(Array2::zeros((0, 0))));
        }
        let len = data.len();
        if len % dim != 0 {
            return Err(LshError::PartialRow { len, dim });
        }
        let points = Array2::from_shape_vec((len / dim, dim), data)
            .map_err(|_| LshError::PartialRow { len, dim })?;
        Ok(Self::new(points))
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.points.nrows() == 0
    }

    /// Coordinates per point.
    pub fn dim(&self) -> usize {
        self.points.ncols()
    }

    /// The point at `index`, or `None` when out of range.
    pub fn point(&self, index: usize) -> Option<ArrayView1<'_, f32>> {
        (index < self.len()).then(|| self.points.row(index))
    }

    /// Iterate over points in index order.
    pub fn iter(&self) -> impl Iterator<Item = ArrayView1<'_, f32>> {
        self.points.rows().into_iter()
    }

    pub fn as_array(&self) -> ArrayView2<'_, f32> {
        self.points.view()
    }
}

impl From<Array2<f32>> for Corpus {
    fn from(points: Array2<f32>) -> Self {
        Self::new(points)
    }
}
