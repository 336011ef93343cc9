//! Property-based tests for the LSH query policy.
//!
//! Randomized corpora and parameters; every answer must respect the
//! self-exclusion, radius and cap rules regardless of what the hash
//! functions happen to group together.

use proptest::prelude::*;
use pstable_lsh::*;
use std::collections::HashSet;

// ============================================================================
// Strategies
// ============================================================================

/// A corpus of 2..40 points with 1..6 coordinates in [-10, 10].
fn corpus_strategy() -> impl Strategy<Value = Corpus> {
    (2usize..40, 1usize..6).prop_flat_map(|(n, dim)| {
        prop::collection::vec(-10.0f32..10.0, n * dim)
            .prop_map(move |data| Corpus::from_flat(data, dim).unwrap())
    })
}

fn config_strategy() -> impl Strategy<Value = IndexConfig> {
    (1usize..8, 0.1f32..20.0, 1usize..5, any::<u64>()).prop_map(
        |(num_tables, bandwidth, num_projections, seed)| IndexConfig {
            num_tables,
            bandwidth,
            num_projections,
            seed: Some(seed),
        },
    )
}

fn options_strategy() -> impl Strategy<Value = QueryOptions> {
    (
        prop::option::of(1usize..10),
        prop_oneof![Just(f32::INFINITY), 0.0f32..15.0],
    )
        .prop_map(|(max_neighbors, max_distance)| QueryOptions {
            max_neighbors,
            max_distance,
        })
}

// ============================================================================
// Query invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_results_respect_query_policy(
        corpus in corpus_strategy(),
        config in config_strategy(),
        options in options_strategy(),
        q_seed in any::<prop::sample::Index>(),
    ) {
        let index = LshIndex::build(&corpus, config).unwrap();
        let q = q_seed.index(corpus.len());
        let results = index.query(&corpus, &DistanceMetric::Euclidean, q, &options).unwrap();

        let unique: HashSet<usize> = results.iter().map(|n| n.index).collect();
        prop_assert_eq!(unique.len(), results.len(), "duplicate neighbors");
        prop_assert!(!unique.contains(&q), "query point returned");
        prop_assert!(results.len() <= corpus.len() - 1);
        if let Some(cap) = options.max_neighbors {
            prop_assert!(results.len() <= cap);
        }

        let qp = corpus.point(q).unwrap();
        for n in &results {
            let d = distance::euclidean_distance(&corpus.point(n.index).unwrap(), &qp);
            prop_assert!(d < options.max_distance, "neighbor {} at {} >= {}", n.index, d, options.max_distance);
        }
    }

    #[test]
    fn prop_results_are_candidates(
        corpus in corpus_strategy(),
        config in config_strategy(),
        options in options_strategy(),
        q_seed in any::<prop::sample::Index>(),
    ) {
        let index = LshIndex::build(&corpus, config).unwrap();
        let q = q_seed.index(corpus.len());
        let candidates: HashSet<usize> = index.candidates(&corpus, q).unwrap().into_iter().collect();
        let results = index.query(&corpus, &DistanceMetric::Euclidean, q, &options).unwrap();
        for n in &results {
            prop_assert!(candidates.contains(&n.index));
        }
    }

    #[test]
    fn prop_lsh_is_subset_of_brute_force(
        corpus in corpus_strategy(),
        config in config_strategy(),
        radius in 0.0f32..15.0,
        q_seed in any::<prop::sample::Index>(),
    ) {
        let index = LshIndex::build(&corpus, config).unwrap();
        let q = q_seed.index(corpus.len());
        let options = QueryOptions::new().max_distance(radius);

        let lsh: HashSet<usize> = index
            .query(&corpus, &DistanceMetric::Euclidean, q, &options)
            .unwrap()
            .iter()
            .map(|n| n.index)
            .collect();
        let exact: HashSet<usize> = brute_force_query(&corpus, &DistanceMetric::Euclidean, q, &options)
            .unwrap()
            .iter()
            .map(|n| n.index)
            .collect();
        prop_assert!(lsh.is_subset(&exact));
    }
}

// ============================================================================
// Hash function invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_hashing_is_deterministic(
        corpus in corpus_strategy(),
        config in config_strategy(),
    ) {
        let index = LshIndex::build(&corpus, config).unwrap();
        for p in corpus.iter() {
            prop_assert_eq!(index.hash_keys(&p), index.hash_keys(&p));
        }
    }

    #[test]
    fn prop_build_inserts_every_point_once_per_table(
        corpus in corpus_strategy(),
        config in config_strategy(),
    ) {
        let index = LshIndex::build(&corpus, config.clone()).unwrap();
        prop_assert_eq!(index.num_tables(), config.num_tables);
        for table in index.tables() {
            prop_assert_eq!(table.num_entries(), corpus.len());
        }
    }
}
