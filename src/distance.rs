use ndarray::ArrayView1;

/// Exact distance used to filter LSH candidates.
///
/// Implementations are expected to be symmetric, non-negative and zero for
/// identical points. The index does not check any of this.
pub trait Metric {
    fn distance(&self, a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32;
}

impl<F> Metric for F
where
    F: Fn(&ArrayView1<f32>, &ArrayView1<f32>) -> f32,
{
    fn distance(&self, a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
        self(a, b)
    }
}

/// Built-in distance metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum DistanceMetric {
    /// Euclidean (L2) distance. Range [0, inf).
    Euclidean,
    /// Cosine distance: 1 - cos(a, b). Range [0, 2]. 0 = identical direction.
    Cosine,
}

impl DistanceMetric {
    /// Compute the distance between two vectors using this metric.
    pub fn compute(&self, a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
        match self {
            DistanceMetric::Euclidean => euclidean_distance(a, b),
            DistanceMetric::Cosine => cosine_distance(a, b),
        }
    }
}

impl Metric for DistanceMetric {
    fn distance(&self, a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
        self.compute(a, b)
    }
}

/// Euclidean (L2) distance between two vectors.
pub fn euclidean_distance(a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// Cosine distance: 1 - cos(a, b). Zero vectors are at distance 1 from everything.
pub fn cosine_distance(a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
    let dot = a.dot(b);
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();
    let denom = norm_a * norm_b;
    if denom < f32::EPSILON {
        return 1.0;
    }
    // Rounding can push cos slightly past 1.
    (1.0 - dot / denom).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cosine_identical() {
        let a = array![1.0, 0.0, 0.0];
        let b = array![1.0, 0.0, 0.0];
        let d = cosine_distance(&a.view(), &b.view());
        assert!((d - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = array![1.0, 0.0];
        let b = array![0.0, 1.0];
        let d = cosine_distance(&a.view(), &b.view());
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector() {
        let a = array![0.0, 0.0];
        let b = array![3.0, 4.0];
        assert_eq!(cosine_distance(&a.view(), &b.view()), 1.0);
    }

    #[test]
    fn test_euclidean() {
        let a = array![0.0, 0.0];
        let b = array![3.0, 4.0];
        let d = euclidean_distance(&a.view(), &b.view());
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_euclidean_symmetric() {
        let a = array![1.5, -2.0, 0.25];
        let b = array![-0.5, 4.0, 1.0];
        assert_eq!(
            euclidean_distance(&a.view(), &b.view()),
            euclidean_distance(&b.view(), &a.view())
        );
    }

    fn manhattan(a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
    }

    #[test]
    fn test_function_metric() {
        let a = array![0.0, 0.0];
        let b = array![3.0, 4.0];
        assert!((manhattan.distance(&a.view(), &b.view()) - 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_enum_dispatch_matches_free_functions() {
        let a = array![1.0, 2.0, 3.0];
        let b = array![3.0, 2.0, 1.0];
        assert_eq!(
            DistanceMetric::Euclidean.distance(&a.view(), &b.view()),
            euclidean_distance(&a.view(), &b.view())
        );
        assert_eq!(
            DistanceMetric::Cosine.distance(&a.view(), &b.view()),
            cosine_distance(&a.view(), &b.view())
        );
    }
}
