use std::sync::Arc;

use hashbrown::HashSet;
use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

use crate::corpus::Corpus;
use crate::distance::Metric;
use crate::error::{LshError, Result};
use crate::hash::{LocalityHash, ProjectionHasher};
use crate::metrics::{MetricsCollector, MetricsSnapshot, OpTimer, QueryStats};
use crate::table::HashTable;

/// Configuration for building an LSH index.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct IndexConfig {
    /// Number of independent hash tables (L).
    pub num_tables: usize,
    /// Width of each projection bucket (w).
    pub bandwidth: f32,
    /// Projections concatenated per hash function (k).
    pub num_projections: usize,
    /// Optional RNG seed for reproducible projections.
    pub seed: Option<u64>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            num_tables: 10,
            bandwidth: 4.0,
            num_projections: 4,
            seed: None,
        }
    }
}

impl IndexConfig {
    /// Reject configurations that cannot produce a meaningful index.
    pub fn validate(&self) -> Result<()> {
        if self.num_tables == 0 {
            return Err(LshError::InvalidNumTables(self.num_tables));
        }
        if self.num_projections == 0 {
            return Err(LshError::InvalidNumProjections(self.num_projections));
        }
        if !self.bandwidth.is_finite() || self.bandwidth <= 0.0 {
            return Err(LshError::InvalidBandwidth(self.bandwidth));
        }
        Ok(())
    }
}

/// Limits applied to a neighbor query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryOptions {
    /// Stop once this many neighbors are found. `None` means no cap.
    pub max_neighbors: Option<usize>,
    /// Only points strictly closer than this are returned. `f32::INFINITY` disables the radius.
    pub max_distance: f32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_neighbors: None,
            max_distance: f32::INFINITY,
        }
    }
}

impl QueryOptions {
    /// No cap and no radius: every colliding point is returned.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_neighbors(mut self, n: usize) -> Self {
        self.max_neighbors = Some(n);
        self
    }

    pub fn max_distance(mut self, r: f32) -> Self {
        self.max_distance = r;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_neighbors == Some(0) {
            return Err(LshError::InvalidConfig("max_neighbors must be > 0".into()));
        }
        if self.max_distance.is_nan() || self.max_distance < 0.0 {
            return Err(LshError::InvalidConfig(format!(
                "max_distance must be >= 0, got {}",
                self.max_distance
            )));
        }
        Ok(())
    }
}

/// A single neighbor found by a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Corpus index of the neighbor.
    pub index: usize,
    /// Metric distance to the query point.
    pub distance: f32,
}

/// Aggregate statistics about the index.
#[derive(Debug, Clone)]
pub struct IndexStats {
    pub num_points: usize,
    pub num_tables: usize,
    pub num_projections: usize,
    pub bandwidth: f32,
    pub dimension: usize,
    pub total_buckets: usize,
    pub avg_bucket_size: f64,
    pub max_bucket_size: usize,
    pub memory_estimate_bytes: usize,
}

impl std::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LshIndex {{ points: {}, tables: {}, projections/table: {}, bandwidth: {}, dim: {}, \
             buckets: {}, avg_bucket: {:.1}, max_bucket: {}, mem: ~{:.1}MB }}",
            self.num_points,
            self.num_tables,
            self.num_projections,
            self.bandwidth,
            self.dimension,
            self.total_buckets,
            self.avg_bucket_size,
            self.max_bucket_size,
            self.memory_estimate_bytes as f64 / (1024.0 * 1024.0),
        )
    }
}

// ---------------------------------------------------------------------------
// LshIndex
// ---------------------------------------------------------------------------

/// A multi-table LSH index over a fixed [`Corpus`].
///
/// Built once and read-only afterwards, so a shared `&LshIndex` can serve
/// queries from many threads. Tables hold corpus indices only; every query
/// takes the corpus the index was built over.
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct LshIndex {
    pub(crate) config: IndexConfig,
    pub(crate) dim: usize,
    pub(crate) num_points: usize,
    pub(crate) hashers: Vec<ProjectionHasher>,
    pub(crate) tables: Vec<HashTable>,
    #[cfg_attr(feature = "persistence", serde(skip))]
    pub(crate) metrics: Option<Arc<MetricsCollector>>,
}

impl std::fmt::Debug for LshIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LshIndex")
            .field("num_points", &self.num_points)
            .field("dim", &self.dim)
            .field("config", &self.config)
            .field("has_metrics", &self.metrics.is_some())
            .finish()
    }
}

impl LshIndex {
    /// Start building an index with the builder pattern.
    pub fn builder() -> LshIndexBuilder {
        LshIndexBuilder::new()
    }

    /// Build an index over `corpus` from an [`IndexConfig`].
    pub fn build(corpus: &Corpus, config: IndexConfig) -> Result<Self> {
        Self::build_with_metrics(corpus, config, false)
    }

    fn build_with_metrics(corpus: &Corpus, config: IndexConfig, enable_metrics: bool) -> Result<Self> {
        let timer = OpTimer::new();
        let hashers = sample_hashers(corpus, &config)?;
        let tables = hashers.iter().map(|h| fill_table(h, corpus)).collect();
        Ok(Self::assemble(corpus, config, hashers, tables, enable_metrics, &timer))
    }

    fn assemble(
        corpus: &Corpus,
        config: IndexConfig,
        hashers: Vec<ProjectionHasher>,
        tables: Vec<HashTable>,
        enable_metrics: bool,
        timer: &OpTimer,
    ) -> Self {
        let metrics = if enable_metrics {
            let m = Arc::new(MetricsCollector::new());
            m.record_build(timer.elapsed_ns());
            Some(m)
        } else {
            None
        };

        let index = Self {
            config,
            dim: corpus.dim(),
            num_points: corpus.len(),
            hashers,
            tables,
            metrics,
        };

        debug!(
            num_points = index.num_points,
            dim = index.dim,
            num_tables = index.config.num_tables,
            num_projections = index.config.num_projections,
            bandwidth = index.config.bandwidth,
            total_buckets = index.tables.iter().map(HashTable::len).sum::<usize>(),
            "built LSH index"
        );

        index
    }

    // ------------------------------------------------------------------
    // Query
    // ------------------------------------------------------------------

    /// Find approximate neighbors of the corpus point at `query_index`.
    ///
    /// Tables are scanned in order. A candidate is kept when its distance to
    /// the query is strictly below `options.max_distance`; the query point
    /// itself is never returned. The scan stops as soon as
    /// `options.max_neighbors` neighbors are found. Fewer results (or none)
    /// is a normal outcome, not an error.
    ///
    /// Results are in discovery order, not sorted by distance.
    pub fn query<M: Metric + ?Sized>(
        &self,
        corpus: &Corpus,
        metric: &M,
        query_index: usize,
        options: &QueryOptions,
    ) -> Result<Vec<Neighbor>> {
        options.validate()?;
        self.check_corpus(corpus)?;
        let point = corpus.point(query_index).ok_or(LshError::QueryOutOfRange {
            index: query_index,
            len: corpus.len(),
        })?;
        Ok(self.search(corpus, metric, &point, Some(query_index), options))
    }

    /// Find approximate corpus neighbors of an arbitrary vector.
    ///
    /// Same policy as [`LshIndex::query`], without self-exclusion.
    pub fn query_vector<M: Metric + ?Sized>(
        &self,
        corpus: &Corpus,
        metric: &M,
        vector: &[f32],
        options: &QueryOptions,
    ) -> Result<Vec<Neighbor>> {
        options.validate()?;
        self.check_corpus(corpus)?;
        if vector.len() != self.dim {
            return Err(LshError::DimensionMismatch {
                expected: self.dim,
                got: vector.len(),
            });
        }
        let point = ArrayView1::from(vector);
        Ok(self.search(corpus, metric, &point, None, options))
    }

    /// Every point sharing at least one bucket with `query_index`, excluding
    /// itself, in discovery order. No distance filtering.
    pub fn candidates(&self, corpus: &Corpus, query_index: usize) -> Result<Vec<usize>> {
        self.check_corpus(corpus)?;
        let point = corpus.point(query_index).ok_or(LshError::QueryOutOfRange {
            index: query_index,
            len: corpus.len(),
        })?;

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (table, key) in self.tables.iter().zip(self.hash_keys(&point)) {
            if let Some(bucket) = table.get(key) {
                for c in bucket.iter() {
                    if c != query_index && seen.insert(c) {
                        out.push(c);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Bucket key of `point` in each table, in table order.
    pub fn hash_keys(&self, point: &ArrayView1<f32>) -> Vec<u64> {
        self.hashers.iter().map(|h| h.hash_key(point)).collect()
    }

    fn search<M: Metric + ?Sized>(
        &self,
        corpus: &Corpus,
        metric: &M,
        query: &ArrayView1<f32>,
        exclude: Option<usize>,
        options: &QueryOptions,
    ) -> Vec<Neighbor> {
        let timer = self.metrics.as_ref().map(|_| OpTimer::new());
        let (results, stats) = self.scan_tables(corpus, metric, query, exclude, options);

        if let Some(cap) = options.max_neighbors {
            if results.len() < cap {
                trace!(found = results.len(), requested = cap, "query shortfall");
            }
        }
        if let (Some(m), Some(t)) = (self.metrics.as_ref(), timer) {
            m.record_query(&stats, t.elapsed_ns());
        }

        results
    }

    fn scan_tables<M: Metric + ?Sized>(
        &self,
        corpus: &Corpus,
        metric: &M,
        query: &ArrayView1<f32>,
        exclude: Option<usize>,
        options: &QueryOptions,
    ) -> (Vec<Neighbor>, QueryStats) {
        let keys = self.hash_keys(query);
        let mut stats = QueryStats::default();
        let mut results = Vec::new();
        // Points whose distance is already known; rejected ones stay rejected.
        let mut visited = HashSet::new();

        for (j, (table, key)) in self.tables.iter().zip(keys).enumerate() {
            let Some(bucket) = table.get(key) else {
                stats.bucket_misses += 1;
                continue;
            };
            stats.bucket_hits += 1;

            for c in bucket.iter() {
                stats.candidates_examined += 1;
                if Some(c) == exclude || !visited.insert(c) {
                    continue;
                }
                let Some(candidate) = corpus.point(c) else {
                    continue;
                };

                let distance = metric.distance(&candidate, query);
                stats.distance_evaluations += 1;
                if distance < options.max_distance {
                    results.push(Neighbor { index: c, distance });
                    if options.max_neighbors.is_some_and(|cap| results.len() >= cap) {
                        stats.terminated_early = true;
                        trace!(table = j, found = results.len(), "neighbor cap reached");
                        return (results, stats);
                    }
                }
            }
        }

        (results, stats)
    }

    /// The corpus must be the one the index was built over.
    fn check_corpus(&self, corpus: &Corpus) -> Result<()> {
        if corpus.dim() != self.dim {
            return Err(LshError::DimensionMismatch {
                expected: self.dim,
                got: corpus.dim(),
            });
        }
        if corpus.len() != self.num_points {
            return Err(LshError::CorpusMismatch {
                expected: self.num_points,
                got: corpus.len(),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stats / metrics
    // ------------------------------------------------------------------

    /// Number of corpus points indexed.
    pub fn len(&self) -> usize {
        self.num_points
    }

    /// Always false for a successfully built index.
    pub fn is_empty(&self) -> bool {
        self.num_points == 0
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    pub fn hashers(&self) -> &[ProjectionHasher] {
        &self.hashers
    }

    pub fn tables(&self) -> &[HashTable] {
        &self.tables
    }

    /// Compute aggregate statistics about the index.
    pub fn stats(&self) -> IndexStats {
        let total_buckets: usize = self.tables.iter().map(HashTable::len).sum();
        let total_entries: usize = self.tables.iter().map(HashTable::num_entries).sum();
        let max_bucket_size = self
            .tables
            .iter()
            .map(HashTable::max_bucket_len)
            .max()
            .unwrap_or(0);

        let avg_bucket_size = if total_buckets > 0 {
            total_entries as f64 / total_buckets as f64
        } else {
            0.0
        };

        let table_mem = total_buckets * (std::mem::size_of::<u64>() + 24);
        let entry_mem = total_entries * std::mem::size_of::<usize>();
        let proj_mem = self.config.num_tables * self.config.num_projections * (self.dim + 1) * 4;

        IndexStats {
            num_points: self.num_points,
            num_tables: self.config.num_tables,
            num_projections: self.config.num_projections,
            bandwidth: self.config.bandwidth,
            dimension: self.dim,
            total_buckets,
            avg_bucket_size,
            max_bucket_size,
            memory_estimate_bytes: table_mem + entry_mem + proj_mem,
        }
    }

    /// Snapshot of runtime metrics (`None` if metrics were not enabled).
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.metrics.as_ref().map(|m| m.snapshot())
    }

    /// Reset metrics counters.
    pub fn reset_metrics(&self) {
        if let Some(ref m) = self.metrics {
            m.reset();
        }
    }

    /// Return a clone of the build configuration.
    pub fn config(&self) -> IndexConfig {
        self.config.clone()
    }
}

/// Validate `config` against `corpus` and draw the `L` hash functions.
///
/// Hashers are always drawn sequentially from one generator, so a seeded
/// build with more tables extends, rather than replaces, a smaller one.
fn sample_hashers(corpus: &Corpus, config: &IndexConfig) -> Result<Vec<ProjectionHasher>> {
    config.validate()?;
    if corpus.is_empty() {
        return Err(LshError::EmptyCorpus);
    }
    if corpus.dim() == 0 {
        return Err(LshError::ZeroDimension);
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    (0..config.num_tables)
        .map(|_| {
            ProjectionHasher::new(
                corpus.dim(),
                config.bandwidth,
                config.num_projections,
                &mut rng,
            )
        })
        .collect()
}

fn fill_table<H: LocalityHash>(hasher: &H, corpus: &Corpus) -> HashTable {
    let mut table = HashTable::new();
    for (i, point) in corpus.iter().enumerate() {
        table.insert(hasher.hash_key(&point), i);
    }
    table
}

// ---------------------------------------------------------------------------
// Parallel ops (behind `parallel` feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "parallel")]
impl LshIndex {
    /// Like [`LshIndex::build`], filling the tables in parallel with rayon.
    ///
    /// Produces the same index as the sequential build for a given seed.
    pub fn par_build(corpus: &Corpus, config: IndexConfig) -> Result<Self> {
        Self::par_build_with_metrics(corpus, config, false)
    }

    fn par_build_with_metrics(
        corpus: &Corpus,
        config: IndexConfig,
        enable_metrics: bool,
    ) -> Result<Self> {
        use rayon::prelude::*;

        let timer = OpTimer::new();
        let hashers = sample_hashers(corpus, &config)?;
        let tables = hashers.par_iter().map(|h| fill_table(h, corpus)).collect();
        Ok(Self::assemble(corpus, config, hashers, tables, enable_metrics, &timer))
    }

    /// Query many corpus points in parallel. Fails on the first invalid query.
    pub fn par_query_batch<M: Metric + Sync + ?Sized>(
        &self,
        corpus: &Corpus,
        metric: &M,
        query_indices: &[usize],
        options: &QueryOptions,
    ) -> Result<Vec<Vec<Neighbor>>> {
        use rayon::prelude::*;

        query_indices
            .par_iter()
            .map(|&q| self.query(corpus, metric, q, options))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Fluent builder for [`LshIndex`].
#[derive(Default)]
pub struct LshIndexBuilder {
    config: IndexConfig,
    enable_metrics: bool,
}

impl LshIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_tables(mut self, n: usize) -> Self {
        self.config.num_tables = n;
        self
    }

    pub fn bandwidth(mut self, w: f32) -> Self {
        self.config.bandwidth = w;
        self
    }

    pub fn num_projections(mut self, k: usize) -> Self {
        self.config.num_projections = k;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn enable_metrics(mut self) -> Self {
        self.enable_metrics = true;
        self
    }

    /// Build the index over `corpus`, returning an error on invalid configuration.
    pub fn build(self, corpus: &Corpus) -> Result<LshIndex> {
        LshIndex::build_with_metrics(corpus, self.config, self.enable_metrics)
    }

    /// Build with the tables filled in parallel.
    #[cfg(feature = "parallel")]
    pub fn par_build(self, corpus: &Corpus) -> Result<LshIndex> {
        LshIndex::par_build_with_metrics(corpus, self.config, self.enable_metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceMetric;
    use ndarray::array;

    fn two_clusters() -> Corpus {
        Corpus::new(array![[0.0, 0.0], [0.1, 0.0], [5.0, 5.0], [5.1, 5.0]])
    }

    #[test]
    fn test_every_point_lands_in_every_table() {
        let corpus = two_clusters();
        let index = LshIndex::builder()
            .num_tables(5)
            .bandwidth(1.0)
            .num_projections(2)
            .seed(1)
            .build(&corpus)
            .unwrap();

        assert_eq!(index.num_tables(), 5);
        for (table, hasher) in index.tables().iter().zip(index.hashers()) {
            assert_eq!(table.num_entries(), corpus.len());
            for (i, p) in corpus.iter().enumerate() {
                let bucket = table.get(hasher.hash_vector(&p)).unwrap();
                assert!(bucket.contains(i));
            }
        }
    }

    #[test]
    fn test_query_stats_counts_early_termination() {
        let corpus = two_clusters();
        let index = LshIndex::builder()
            .num_tables(3)
            .bandwidth(1e6)
            .num_projections(1)
            .seed(5)
            .build(&corpus)
            .unwrap();
        let point = corpus.point(0).unwrap();

        let (results, stats) = index.scan_tables(
            &corpus,
            &DistanceMetric::Euclidean,
            &point,
            Some(0),
            &QueryOptions::new().max_neighbors(2),
        );
        assert_eq!(results.len(), 2);
        assert!(stats.terminated_early);
        assert_eq!(stats.bucket_hits, 1, "cap should be hit inside the first table");
        assert_eq!(stats.distance_evaluations, 2);
    }

    #[test]
    fn test_rejected_candidates_are_not_reevaluated() {
        let corpus = two_clusters();
        let index = LshIndex::builder()
            .num_tables(4)
            .bandwidth(1e6)
            .num_projections(1)
            .seed(5)
            .build(&corpus)
            .unwrap();
        let point = corpus.point(0).unwrap();

        let (results, stats) = index.scan_tables(
            &corpus,
            &DistanceMetric::Euclidean,
            &point,
            Some(0),
            &QueryOptions::new().max_distance(0.0),
        );
        assert!(results.is_empty());
        assert_eq!(stats.distance_evaluations, 3);
        assert!(!stats.terminated_early);
    }

    #[test]
    fn test_config_validation_order() {
        let bad = IndexConfig {
            num_tables: 0,
            bandwidth: -1.0,
            num_projections: 0,
            seed: None,
        };
        assert!(matches!(bad.validate(), Err(LshError::InvalidNumTables(0))));
        assert!(IndexConfig::default().validate().is_ok());
    }

    #[test]
    fn test_query_options_validation() {
        assert!(QueryOptions::new().validate().is_ok());
        assert!(QueryOptions::new().max_neighbors(0).validate().is_err());
        assert!(QueryOptions::new().max_distance(-0.5).validate().is_err());
        assert!(QueryOptions::new().max_distance(f32::NAN).validate().is_err());
        assert!(QueryOptions::new().max_distance(0.0).validate().is_ok());
    }
}
