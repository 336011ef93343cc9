use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Collects runtime statistics about index operations using lock-free atomic counters.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    build_count: AtomicU64,
    total_build_time_ns: AtomicU64,
    query_count: AtomicU64,
    total_candidates_examined: AtomicU64,
    total_distance_evaluations: AtomicU64,
    total_query_time_ns: AtomicU64,
    early_terminations: AtomicU64,
    bucket_hits: AtomicU64,
    bucket_misses: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_build(&self, duration_ns: u64) {
        self.build_count.fetch_add(1, Ordering::Relaxed);
        self.total_build_time_ns
            .fetch_add(duration_ns, Ordering::Relaxed);
    }

    pub fn record_query(&self, stats: &QueryStats, duration_ns: u64) {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        self.total_candidates_examined
            .fetch_add(stats.candidates_examined, Ordering::Relaxed);
        self.total_distance_evaluations
            .fetch_add(stats.distance_evaluations, Ordering::Relaxed);
        self.total_query_time_ns
            .fetch_add(duration_ns, Ordering::Relaxed);
        self.bucket_hits
            .fetch_add(stats.bucket_hits, Ordering::Relaxed);
        self.bucket_misses
            .fetch_add(stats.bucket_misses, Ordering::Relaxed);
        if stats.terminated_early {
            self.early_terminations.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Take a point-in-time snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let query_count = self.query_count.load(Ordering::Relaxed);
        let total_query_time_ns = self.total_query_time_ns.load(Ordering::Relaxed);
        let total_candidates = self.total_candidates_examined.load(Ordering::Relaxed);
        let total_distances = self.total_distance_evaluations.load(Ordering::Relaxed);
        let hits = self.bucket_hits.load(Ordering::Relaxed);
        let misses = self.bucket_misses.load(Ordering::Relaxed);

        let per_query = |total: u64| {
            if query_count > 0 {
                total as f64 / query_count as f64
            } else {
                0.0
            }
        };

        MetricsSnapshot {
            build_count: self.build_count.load(Ordering::Relaxed),
            build_time_ms: self.total_build_time_ns.load(Ordering::Relaxed) as f64 / 1e6,
            query_count,
            early_terminations: self.early_terminations.load(Ordering::Relaxed),
            avg_query_time_us: per_query(total_query_time_ns) / 1000.0,
            avg_candidates_per_query: per_query(total_candidates),
            avg_distance_evaluations_per_query: per_query(total_distances),
            hit_rate: if hits + misses > 0 {
                hits as f64 / (hits + misses) as f64
            } else {
                0.0
            },
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.build_count.store(0, Ordering::Relaxed);
        self.total_build_time_ns.store(0, Ordering::Relaxed);
        self.query_count.store(0, Ordering::Relaxed);
        self.total_candidates_examined.store(0, Ordering::Relaxed);
        self.total_distance_evaluations.store(0, Ordering::Relaxed);
        self.total_query_time_ns.store(0, Ordering::Relaxed);
        self.early_terminations.store(0, Ordering::Relaxed);
        self.bucket_hits.store(0, Ordering::Relaxed);
        self.bucket_misses.store(0, Ordering::Relaxed);
    }
}

/// Work done by a single query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Bucket entries visited, including the query point and repeats across tables.
    pub candidates_examined: u64,
    pub distance_evaluations: u64,
    pub bucket_hits: u64,
    pub bucket_misses: u64,
    /// The neighbor cap was reached before every table was scanned.
    pub terminated_early: bool,
}

/// A point-in-time snapshot of index metrics.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub build_count: u64,
    pub build_time_ms: f64,
    pub query_count: u64,
    pub early_terminations: u64,
    pub avg_query_time_us: f64,
    pub avg_candidates_per_query: f64,
    pub avg_distance_evaluations_per_query: f64,
    /// Fraction of table lookups that found a bucket.
    pub hit_rate: f64,
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Builds: {} ({:.2}ms), Queries: {}, Early stops: {}, Avg query: {:.2}us, \
             Avg candidates: {:.1}, Avg distances: {:.1}, Hit rate: {:.1}%",
            self.build_count,
            self.build_time_ms,
            self.query_count,
            self.early_terminations,
            self.avg_query_time_us,
            self.avg_candidates_per_query,
            self.avg_distance_evaluations_per_query,
            self.hit_rate * 100.0,
        )
    }
}

/// RAII timer for measuring operation durations.
pub(crate) struct OpTimer {
    start: Instant,
}

impl OpTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ns(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
}
