//! Basic usage of `pstable_lsh`.
//!
//! Demonstrates the builder pattern, indexing a random corpus, radius and
//! capped queries, comparing against brute force, and inspecting stats and
//! metrics.
//!
//! Run with:
//!   cargo run --example basic_usage

use pstable_lsh::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::collections::HashSet;

const DIM: usize = 32;
const NUM_POINTS: usize = 10_000;

fn main() {
    // ---------------------------------------------------------------
    // 1. Generate a random corpus.
    // ---------------------------------------------------------------
    println!("=== Step 1: Generate {} random {}-d points ===", NUM_POINTS, DIM);

    let mut rng = StdRng::seed_from_u64(123);
    let normal = Normal::new(0.0_f32, 1.0).unwrap();
    let data: Vec<f32> = (0..NUM_POINTS * DIM).map(|_| normal.sample(&mut rng)).collect();
    let corpus = Corpus::from_flat(data, DIM).expect("failed to build corpus");

    println!("Corpus: {} points, dim={}\n", corpus.len(), corpus.dim());

    // ---------------------------------------------------------------
    // 2. Build an LSH index using the builder pattern.
    // ---------------------------------------------------------------
    println!("=== Step 2: Build the index ===");
    let index = LshIndex::builder()
        .num_tables(16)
        .bandwidth(4.0)
        .num_projections(6)
        .seed(42)
        .enable_metrics()
        .build(&corpus)
        .expect("failed to build index");

    println!("Built index: tables=16, bandwidth=4.0, projections=6, seed=42, metrics=on\n");

    // ---------------------------------------------------------------
    // 3. Radius query around point #0.
    // ---------------------------------------------------------------
    println!("=== Step 3: Neighbors of point #0 within distance 5.0 ===");
    let options = QueryOptions::new().max_distance(5.0);
    let mut results = index
        .query(&corpus, &DistanceMetric::Euclidean, 0, &options)
        .expect("query failed");

    // Results come back in discovery order; sort for display.
    results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    for r in results.iter().take(5) {
        println!("  index={:<6} distance={:.6}", r.index, r.distance);
    }
    println!("  ({} neighbors found)\n", results.len());

    // ---------------------------------------------------------------
    // 4. Recall against brute force.
    // ---------------------------------------------------------------
    println!("=== Step 4: Recall vs brute force ===");
    let exact: HashSet<usize> = brute_force_query(&corpus, &DistanceMetric::Euclidean, 0, &options)
        .expect("brute force failed")
        .iter()
        .map(|n| n.index)
        .collect();
    let found: HashSet<usize> = results.iter().map(|n| n.index).collect();
    let recall = if exact.is_empty() {
        1.0
    } else {
        found.intersection(&exact).count() as f64 / exact.len() as f64
    };
    println!("  Exact neighbors: {}", exact.len());
    println!("  Recall:          {:.3}\n", recall);

    // ---------------------------------------------------------------
    // 5. Capped query: stop after 3 neighbors.
    // ---------------------------------------------------------------
    println!("=== Step 5: First 3 neighbors of point #1 ===");
    let capped = index
        .query(
            &corpus,
            &DistanceMetric::Euclidean,
            1,
            &QueryOptions::new().max_neighbors(3).max_distance(6.0),
        )
        .expect("query failed");
    for r in &capped {
        println!("  index={:<6} distance={:.6}", r.index, r.distance);
    }
    println!();

    // ---------------------------------------------------------------
    // 6. Show index stats.
    // ---------------------------------------------------------------
    println!("=== Step 6: Index statistics ===");
    let stats = index.stats();
    println!("  {}", stats);
    println!("  Points:           {}", stats.num_points);
    println!("  Tables:           {}", stats.num_tables);
    println!("  Projections:      {}", stats.num_projections);
    println!("  Bandwidth:        {}", stats.bandwidth);
    println!("  Total buckets:    {}", stats.total_buckets);
    println!("  Avg bucket size:  {:.2}", stats.avg_bucket_size);
    println!("  Max bucket size:  {}", stats.max_bucket_size);
    println!();

    // ---------------------------------------------------------------
    // 7. Show metrics snapshot.
    // ---------------------------------------------------------------
    println!("=== Step 7: Metrics snapshot ===");
    if let Some(m) = index.metrics() {
        println!("  {}", m);
    } else {
        println!("  Metrics not enabled.");
    }
    println!();

    println!("Done.");
}
