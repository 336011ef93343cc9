use std::hash::Hasher;

use ndarray::{Array1, ArrayView1};
use rand::distributions::Uniform;
use rand::Rng;
use rand_distr::StandardNormal;
use rustc_hash::FxHasher;

use crate::error::{LshError, Result};

/// Maps a point to the key of the bucket it falls into.
pub trait LocalityHash {
    fn hash_key(&self, vector: &ArrayView1<f32>) -> u64;
}

/// One random projection with its offset.
///
/// Maps `v` to `floor((v . projection + offset) / bandwidth)`.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ProjectionAtom {
    projection: Array1<f32>,
    offset: f32,
}

impl ProjectionAtom {
    pub fn projection(&self) -> ArrayView1<'_, f32> {
        self.projection.view()
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    #[inline]
    fn bucket_coord(&self, vector: &ArrayView1<f32>, bandwidth: f32) -> i64 {
        ((vector.dot(&self.projection) + self.offset) / bandwidth).floor() as i64
    }
}

/// A p-stable (Gaussian) projection hash function for one hash table.
///
/// Concatenates `num_projections` quantized random projections. Two points
/// share a bucket only when every projection puts them in the same slot.
/// All randomness is drawn in [`ProjectionHasher::new`]; hashing is
/// deterministic afterwards.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ProjectionHasher {
    atoms: Vec<ProjectionAtom>,
    bandwidth: f32,
}

impl ProjectionHasher {
    /// Sample `num_projections` atoms of dimension `dim` with bucket width `bandwidth`.
    ///
    /// Each atom draws `dim` standard-normal components followed by one offset
    /// from `[0, bandwidth)`, so a seeded `rng` always yields the same hasher.
    pub fn new(
        dim: usize,
        bandwidth: f32,
        num_projections: usize,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        if dim == 0 {
            return Err(LshError::ZeroDimension);
        }
        if num_projections == 0 {
            return Err(LshError::InvalidNumProjections(num_projections));
        }
        if !bandwidth.is_finite() || bandwidth <= 0.0 {
            return Err(LshError::InvalidBandwidth(bandwidth));
        }

        let offsets = Uniform::new(0.0f32, bandwidth);
        let atoms = (0..num_projections)
            .map(|_| {
                let v: Vec<f32> = (0..dim).map(|_| rng.sample(StandardNormal)).collect();
                ProjectionAtom {
                    projection: Array1::from_vec(v),
                    offset: rng.sample(&offsets),
                }
            })
            .collect();

        Ok(Self { atoms, bandwidth })
    }

    /// Per-projection integer bucket coordinates, in atom order.
    pub fn bucket_coords(&self, vector: &ArrayView1<f32>) -> Vec<i64> {
        self.atoms
            .iter()
            .map(|a| a.bucket_coord(vector, self.bandwidth))
            .collect()
    }

    /// Compute the composite bucket key for a vector.
    ///
    /// `FxHasher` is unseeded, so keys are stable across processes and can be
    /// persisted alongside the tables.
    pub fn hash_vector(&self, vector: &ArrayView1<f32>) -> u64 {
        let mut hasher = FxHasher::default();
        for atom in &self.atoms {
            hasher.write_i64(atom.bucket_coord(vector, self.bandwidth));
        }
        hasher.finish()
    }

    /// Number of projections (coordinates in the composite key).
    pub fn num_projections(&self) -> usize {
        self.atoms.len()
    }

    pub fn bandwidth(&self) -> f32 {
        self.bandwidth
    }

    /// Dimensionality this hasher accepts, taken from the first projection.
    /// A hasher with no projections reports 0; loading an index rejects one.
    pub fn dim(&self) -> usize {
        self.atoms.first().map_or(0, |a| a.projection.len())
    }

    pub fn atoms(&self) -> &[ProjectionAtom] {
        &self.atoms
    }
}

impl LocalityHash for ProjectionHasher {
    fn hash_key(&self, vector: &ArrayView1<f32>) -> u64 {
        self.hash_vector(vector)
    }
}
