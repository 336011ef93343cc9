//! Exact brute-force search, the reference the LSH results are checked against.

use crate::corpus::Corpus;
use crate::distance::Metric;
use crate::error::{LshError, Result};
use crate::index::{Neighbor, QueryOptions};

/// Scan the whole corpus in index order with the same rules as
/// [`LshIndex::query`](crate::LshIndex::query): the query point is excluded,
/// only points strictly inside `max_distance` are kept, and the scan stops at
/// `max_neighbors`.
pub fn brute_force_query<M: Metric + ?Sized>(
    corpus: &Corpus,
    metric: &M,
    query_index: usize,
    options: &QueryOptions,
) -> Result<Vec<Neighbor>> {
    options.validate()?;
    let query = corpus.point(query_index).ok_or(LshError::QueryOutOfRange {
        index: query_index,
        len: corpus.len(),
    })?;

    let mut results = Vec::new();
    for (i, point) in corpus.iter().enumerate() {
        if i == query_index {
            continue;
        }
        let distance = metric.distance(&point, &query);
        if distance < options.max_distance {
            results.push(Neighbor { index: i, distance });
            if options.max_neighbors.is_some_and(|cap| results.len() >= cap) {
                break;
            }
        }
    }
    Ok(results)
}

/// The `k` exact nearest neighbors of `query_index`, closest first.
pub fn brute_force_knn<M: Metric + ?Sized>(
    corpus: &Corpus,
    metric: &M,
    query_index: usize,
    k: usize,
) -> Result<Vec<Neighbor>> {
    let mut all = brute_force_query(corpus, metric, query_index, &QueryOptions::new())?;
    all.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    all.truncate(k);
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceMetric;
    use ndarray::array;

    #[test]
    fn test_radius_and_self_exclusion() {
        let corpus = Corpus::new(array![[0.0, 0.0], [0.1, 0.0], [5.0, 5.0], [5.1, 5.0]]);
        let found = brute_force_query(
            &corpus,
            &DistanceMetric::Euclidean,
            0,
            &QueryOptions::new().max_distance(1.0),
        )
        .unwrap();
        let ids: Vec<usize> = found.iter().map(|n| n.index).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_knn_sorted() {
        let corpus = Corpus::new(array![[0.0], [3.0], [1.0], [2.0]]);
        let found = brute_force_knn(&corpus, &DistanceMetric::Euclidean, 0, 2).unwrap();
        let ids: Vec<usize> = found.iter().map(|n| n.index).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_out_of_range() {
        let corpus = Corpus::new(array![[0.0], [1.0]]);
        let err = brute_force_query(&corpus, &DistanceMetric::Euclidean, 2, &QueryOptions::new())
            .unwrap_err();
        assert!(matches!(err, LshError::QueryOutOfRange { index: 2, len: 2 }));
    }
}
