//! # pstable_lsh
//!
//! Approximate nearest-neighbor search over a fixed point set using
//! p-stable Locality-Sensitive Hashing (LSH).
//!
//! Each of the `L` hash tables is keyed by a hash function that concatenates
//! `k` quantized Gaussian projections of bucket width `w`. Points that are
//! close under the Euclidean distance tend to share buckets, so a query only
//! measures exact distances to the points it collides with.
//!
//! ## Quick start
//!
//! ```rust
//! use ndarray::array;
//! use pstable_lsh::{Corpus, DistanceMetric, LshIndex, QueryOptions};
//!
//! let corpus = Corpus::new(array![[0.0, 0.0], [0.1, 0.0], [5.0, 5.0], [5.1, 5.0]]);
//!
//! let index = LshIndex::builder()
//!     .num_tables(10)
//!     .bandwidth(1.0)
//!     .num_projections(1)
//!     .seed(42)
//!     .build(&corpus)
//!     .unwrap();
//!
//! let options = QueryOptions::new().max_neighbors(10).max_distance(1.0);
//! let neighbors = index
//!     .query(&corpus, &DistanceMetric::Euclidean, 0, &options)
//!     .unwrap();
//! for n in &neighbors {
//!     println!("index={} dist={:.4}", n.index, n.distance);
//! }
//! assert!(neighbors.iter().all(|n| n.index == 1));
//! ```
//!
//! ## Feature flags
//!
//! | Flag          | Effect                                        |
//! |---------------|-----------------------------------------------|
//! | `parallel`    | Parallel build and batch query via rayon      |
//! | `persistence` | Save/load index to disk (serde + bincode)     |
//! | `full`        | Enables `parallel` + `persistence`            |

pub mod baseline;
pub mod corpus;
pub mod distance;
pub mod error;
pub mod hash;
pub mod index;
pub mod metrics;
pub mod table;

#[cfg(feature = "persistence")]
pub mod persistence;

// Re-exports for convenience.
pub use baseline::{brute_force_knn, brute_force_query};
pub use corpus::Corpus;
pub use distance::{DistanceMetric, Metric};
pub use error::{LshError, Result};
pub use hash::{LocalityHash, ProjectionAtom, ProjectionHasher};
pub use index::{IndexConfig, IndexStats, LshIndex, LshIndexBuilder, Neighbor, QueryOptions};
pub use metrics::{MetricsCollector, MetricsSnapshot, QueryStats};
pub use table::{Bucket, HashTable};
