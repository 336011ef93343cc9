//! Save and load a built index to/from disk.
//!
//! Requires the `persistence` feature flag. Only the hash functions and
//! tables are stored; the corpus is saved separately by the caller and must
//! be supplied again when querying a loaded index.

use std::path::Path;

use crate::error::{LshError, Result};
use crate::index::LshIndex;

fn corrupt(msg: String) -> LshError {
    LshError::Serialization(format!("inconsistent index data: {msg}"))
}

impl LshIndex {
    /// Serialize the index to a JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LshError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Deserialize an index from a JSON file. Metrics start disabled.
    pub fn load_json(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let index: Self =
            serde_json::from_str(&data).map_err(|e| LshError::Serialization(e.to_string()))?;
        index.validate_loaded()?;
        Ok(index)
    }

    /// Serialize the index to a compact bincode file.
    pub fn save_bincode(&self, path: &Path) -> Result<()> {
        let bytes =
            bincode::serialize(self).map_err(|e| LshError::Serialization(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Deserialize an index from a bincode file. Metrics start disabled.
    pub fn load_bincode(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let index: Self =
            bincode::deserialize(&data).map_err(|e| LshError::Serialization(e.to_string()))?;
        index.validate_loaded()?;
        Ok(index)
    }

    /// Check that a deserialized index is one `build` could have produced.
    ///
    /// Hashing a point of the wrong length panics inside `ndarray`, so every
    /// projection must match `dim` before the index is handed out.
    fn validate_loaded(&self) -> Result<()> {
        self.config.validate()?;
        if self.dim == 0 {
            return Err(LshError::ZeroDimension);
        }
        if self.num_points == 0 {
            return Err(LshError::EmptyCorpus);
        }
        let num_tables = self.config.num_tables;
        if self.hashers.len() != num_tables || self.tables.len() != num_tables {
            return Err(corrupt(format!(
                "{} hashers and {} tables for num_tables = {}",
                self.hashers.len(),
                self.tables.len(),
                num_tables
            )));
        }

        for (t, hasher) in self.hashers.iter().enumerate() {
            if hasher.num_projections() != self.config.num_projections {
                return Err(corrupt(format!(
                    "table {t} has {} projections, expected {}",
                    hasher.num_projections(),
                    self.config.num_projections
                )));
            }
            if hasher.bandwidth() != self.config.bandwidth {
                return Err(corrupt(format!(
                    "table {t} has bandwidth {}, expected {}",
                    hasher.bandwidth(),
                    self.config.bandwidth
                )));
            }
            if let Some(atom) = hasher
                .atoms()
                .iter()
                .find(|a| a.projection().len() != self.dim)
            {
                return Err(corrupt(format!(
                    "table {t} has a projection of length {}, expected {}",
                    atom.projection().len(),
                    self.dim
                )));
            }
        }

        for (t, table) in self.tables.iter().enumerate() {
            for (_, bucket) in table.buckets() {
                if let Some(id) = bucket.iter().find(|&id| id >= self.num_points) {
                    return Err(corrupt(format!(
                        "table {t} references point {id}, index has {} points",
                        self.num_points
                    )));
                }
            }
        }

        Ok(())
    }
}
