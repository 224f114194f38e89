// K-means over sentence embeddings.
//
// Lloyd's algorithm with k-means++ seeding, restarted `n_init` times from a
// single seeded RNG stream. The restart with the lowest inertia (sum of
// squared distances to the assigned centroid) wins, so the same input and
// seed always produce the same labels.
//
// Cluster ids are an arbitrary labeling. Nothing about id 0 makes it more
// central or larger than id 1.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::ClusterError;

/// Seed used by the pipeline unless overridden.
pub const DEFAULT_SEED: u64 = 42;

/// Independent initializations per fit.
pub const DEFAULT_N_INIT: usize = 10;

/// Iteration cap for a single Lloyd run.
pub const DEFAULT_MAX_ITER: usize = 300;

/// K-means configuration. Use [`KMeans::new`] and the `with_*` setters.
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    max_iter: usize,
    n_init: usize,
    seed: u64,
}

/// Outcome of the best restart.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// One cluster id per input vector, aligned by position.
    pub labels: Vec<usize>,
    /// Final centroids, indexed by cluster id.
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances from each vector to its centroid.
    pub inertia: f64,
    /// Lloyd iterations used by the winning restart.
    pub iterations: usize,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: DEFAULT_MAX_ITER,
            n_init: DEFAULT_N_INIT,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Partition `data` into exactly `k` groups.
    ///
    /// Fails with `InvalidClusterCount` before any numeric work when
    /// `k == 0` or `k > data.len()`, and with `Numeric` for ragged or
    /// non-finite input.
    pub fn fit(&self, data: &[Vec<f32>]) -> Result<KMeansFit, ClusterError> {
        let n = data.len();
        if self.k == 0 || self.k > n {
            return Err(ClusterError::InvalidClusterCount { k: self.k, n });
        }
        validate_vectors(data)?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<KMeansFit> = None;

        for run in 0..self.n_init {
            let centroids = init_plus_plus(data, self.k, &mut rng);
            let fit = lloyd(data, centroids, self.max_iter);

            if !fit.inertia.is_finite() {
                return Err(ClusterError::Numeric(format!(
                    "inertia became {} in restart {run}",
                    fit.inertia
                )));
            }

            debug!(
                run,
                inertia = fit.inertia,
                iterations = fit.iterations,
                "k-means restart finished"
            );

            let better = match &best {
                Some(current) => fit.inertia < current.inertia,
                None => true,
            };
            if better {
                best = Some(fit);
            }
        }

        best.ok_or_else(|| ClusterError::Numeric("no k-means restart ran".to_string()))
    }
}

/// Cluster `vectors` into `k` groups with the default restart count and
/// iteration cap. Returns one id per vector.
pub fn cluster(vectors: &[Vec<f32>], k: usize, seed: u64) -> Result<Vec<usize>, ClusterError> {
    KMeans::new(k)
        .with_seed(seed)
        .fit(vectors)
        .map(|fit| fit.labels)
}

fn validate_vectors(data: &[Vec<f32>]) -> Result<(), ClusterError> {
    let dim = data[0].len();
    if dim == 0 {
        return Err(ClusterError::Numeric("embeddings have zero dimensions".to_string()));
    }
    for (i, v) in data.iter().enumerate() {
        if v.len() != dim {
            return Err(ClusterError::Numeric(format!(
                "embedding {i} has {} dimensions, expected {dim}",
                v.len()
            )));
        }
        if v.iter().any(|x| !x.is_finite()) {
            return Err(ClusterError::Numeric(format!(
                "embedding {i} contains a non-finite value"
            )));
        }
    }
    Ok(())
}

/// Squared Euclidean distance between a data point and a centroid.
fn squared_distance(point: &[f32], centroid: &[f64]) -> f64 {
    point
        .iter()
        .zip(centroid)
        .map(|(&x, &c)| {
            let d = x as f64 - c;
            d * d
        })
        .sum()
}

/// Index and squared distance of the nearest centroid. Ties go to the
/// lowest index.
fn nearest_centroid(point: &[f32], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (c, centroid) in centroids.iter().enumerate() {
        let dist = squared_distance(point, centroid);
        if dist < best_dist {
            best = c;
            best_dist = dist;
        }
    }
    (best, best_dist)
}

fn to_centroid(point: &[f32]) -> Vec<f64> {
    point.iter().map(|&x| x as f64).collect()
}

/// k-means++ seeding: first centroid uniform, each next one sampled with
/// probability proportional to its squared distance from the nearest
/// centroid chosen so far.
fn init_plus_plus(data: &[Vec<f32>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = data.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(to_centroid(&data[rng.random_range(0..n)]));

    let mut min_dist: Vec<f64> = data
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = min_dist.iter().sum();

        let selected = if total > 0.0 {
            let threshold = rng.random::<f64>() * total;
            let mut cumsum = 0.0;
            let mut selected = None;
            for (j, &d) in min_dist.iter().enumerate() {
                if d <= 0.0 {
                    continue;
                }
                cumsum += d;
                selected = Some(j);
                if cumsum >= threshold {
                    break;
                }
            }
            selected.unwrap_or_else(|| rng.random_range(0..n))
        } else {
            // Every point coincides with a centroid already.
            rng.random_range(0..n)
        };

        let centroid = to_centroid(&data[selected]);
        for (d, p) in min_dist.iter_mut().zip(data) {
            *d = d.min(squared_distance(p, &centroid));
        }
        centroids.push(centroid);
    }

    centroids
}

/// Move every non-empty centroid to the mean of its members. Returns the
/// member count per cluster; empty clusters keep their centroid.
fn update_centroids(data: &[Vec<f32>], labels: &[usize], centroids: &mut [Vec<f64>]) -> Vec<usize> {
    let k = centroids.len();
    let dim = data[0].len();
    let mut sums = vec![vec![0.0_f64; dim]; k];
    let mut counts = vec![0usize; k];
    for (point, &label) in data.iter().zip(labels) {
        counts[label] += 1;
        for (s, &x) in sums[label].iter_mut().zip(point) {
            *s += x as f64;
        }
    }

    for c in 0..k {
        if counts[c] > 0 {
            let count = counts[c] as f64;
            centroids[c] = sums[c].iter().map(|s| s / count).collect();
        }
    }

    counts
}

/// One Lloyd run from the given starting centroids.
fn lloyd(data: &[Vec<f32>], mut centroids: Vec<Vec<f64>>, max_iter: usize) -> KMeansFit {
    let n = data.len();
    let k = centroids.len();

    let mut labels = vec![usize::MAX; n];
    let mut iterations = 0;

    loop {
        iterations += 1;

        let mut changed = false;
        for (i, point) in data.iter().enumerate() {
            let (c, _) = nearest_centroid(point, &centroids);
            if labels[i] != c {
                labels[i] = c;
                changed = true;
            }
        }

        if !changed || iterations >= max_iter {
            break;
        }

        let mut counts = update_centroids(data, &labels, &mut centroids);

        // An empty cluster takes over the point that fits its own cluster
        // worst, as long as that leaves the donor non-empty. Points sitting
        // exactly on their centroid are never donated, so with fewer
        // distinct points than clusters the extra clusters stay empty.
        for c in 0..k {
            if counts[c] > 0 {
                continue;
            }
            let donor = (0..n)
                .filter(|&i| counts[labels[i]] > 1)
                .map(|i| (i, squared_distance(&data[i], &centroids[labels[i]])))
                .filter(|&(_, dist)| dist > 0.0)
                .fold(None, |acc: Option<(usize, f64)>, (i, dist)| match acc {
                    Some((j, best)) if best >= dist => Some((j, best)),
                    _ => Some((i, dist)),
                });
            if let Some((i, _)) = donor {
                counts[labels[i]] -= 1;
                counts[c] = 1;
                labels[i] = c;
                centroids[c] = to_centroid(&data[i]);
            }
        }
    }

    // Centroids are means of the final labels, including any donor that
    // gave up a point in the last pass.
    update_centroids(data, &labels, &mut centroids);

    let inertia = data
        .iter()
        .zip(&labels)
        .map(|(p, &c)| squared_distance(p, &centroids[c]))
        .sum();

    KMeansFit {
        labels,
        centroids,
        inertia,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![0.2, 0.0],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
            vec![9.9, 10.0],
        ]
    }

    #[test]
    fn test_separates_two_blobs() {
        let labels = cluster(&blobs(), 2, DEFAULT_SEED).unwrap();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_k_equals_n_gives_distinct_ids() {
        let data = vec![vec![0.0, 0.0], vec![5.0, 0.0], vec![0.0, 5.0]];
        let mut labels = cluster(&data, 3, 7).unwrap();
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1, 2]);
    }

    #[test]
    fn test_same_seed_same_labels() {
        let data: Vec<Vec<f32>> = (0..40)
            .map(|i| vec![(i % 7) as f32, (i % 3) as f32 * 2.5, i as f32 * 0.05])
            .collect();
        let a = KMeans::new(4).with_seed(99).fit(&data).unwrap();
        let b = KMeans::new(4).with_seed(99).fit(&data).unwrap();
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.inertia, b.inertia);
    }

    #[test]
    fn test_labels_in_range() {
        let data: Vec<Vec<f32>> = (0..25).map(|i| vec![i as f32, (i * i % 11) as f32]).collect();
        let labels = cluster(&data, 5, DEFAULT_SEED).unwrap();
        assert_eq!(labels.len(), data.len());
        assert!(labels.iter().all(|&l| l < 5));
    }

    #[test]
    fn test_rejects_k_above_n() {
        let data = vec![vec![0.0], vec![1.0]];
        let err = cluster(&data, 3, DEFAULT_SEED).unwrap_err();
        assert_eq!(err, ClusterError::InvalidClusterCount { k: 3, n: 2 });
    }

    #[test]
    fn test_rejects_zero_k() {
        let data = vec![vec![0.0], vec![1.0]];
        assert!(matches!(
            cluster(&data, 0, DEFAULT_SEED),
            Err(ClusterError::InvalidClusterCount { k: 0, n: 2 })
        ));
    }

    #[test]
    fn test_rejects_empty_input() {
        let data: Vec<Vec<f32>> = Vec::new();
        assert!(matches!(
            cluster(&data, 1, DEFAULT_SEED),
            Err(ClusterError::InvalidClusterCount { .. })
        ));
    }

    #[test]
    fn test_rejects_ragged_vectors() {
        let data = vec![vec![0.0, 1.0], vec![1.0]];
        assert!(matches!(
            cluster(&data, 2, DEFAULT_SEED),
            Err(ClusterError::Numeric(_))
        ));
    }

    #[test]
    fn test_rejects_nan() {
        let data = vec![vec![0.0, 1.0], vec![f32::NAN, 1.0]];
        assert!(matches!(
            cluster(&data, 2, DEFAULT_SEED),
            Err(ClusterError::Numeric(_))
        ));
    }

    #[test]
    fn test_nearest_centroid_tie_goes_to_lowest_index() {
        let centroids = vec![vec![-1.0, 0.0], vec![1.0, 0.0]];
        let (c, dist) = nearest_centroid(&[0.0, 0.0], &centroids);
        assert_eq!(c, 0);
        assert!((dist - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_identical_points_still_terminate() {
        let data = vec![vec![1.0, 1.0]; 4];
        let fit = KMeans::new(2).with_max_iter(20).fit(&data).unwrap();
        assert_eq!(fit.labels.len(), 4);
        assert!(fit.labels.iter().all(|&l| l < 2));
        assert!(fit.inertia.abs() < 1e-12);
    }

    #[test]
    fn test_fewer_distinct_points_than_k_converges_quickly() {
        let data = vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        let fit = KMeans::new(3).fit(&data).unwrap();

        assert!(fit.iterations < 10, "took {} iterations", fit.iterations);
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[1], fit.labels[2]);
        assert_ne!(fit.labels[0], fit.labels[3]);
        assert!(fit.inertia.abs() < 1e-12);
    }

    #[test]
    fn test_centroids_and_inertia_match_final_labels() {
        let datasets = [
            blobs(),
            vec![vec![0.0, 0.0], vec![0.0, 0.1], vec![5.0, 5.0], vec![5.0, 5.1], vec![9.0, 0.0]],
            vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![2.0, 0.0], vec![7.0, 1.0]],
        ];
        for data in &datasets {
            for k in 2..=data.len() {
                let fit = KMeans::new(k).fit(data).unwrap();
                let mut expected_inertia = 0.0;
                for c in 0..k {
                    let members: Vec<&Vec<f32>> = data
                        .iter()
                        .zip(&fit.labels)
                        .filter(|(_, &l)| l == c)
                        .map(|(p, _)| p)
                        .collect();
                    if members.is_empty() {
                        continue;
                    }
                    for d in 0..data[0].len() {
                        let mean = members.iter().map(|p| p[d] as f64).sum::<f64>()
                            / members.len() as f64;
                        assert!((fit.centroids[c][d] - mean).abs() < 1e-9);
                    }
                    expected_inertia += members
                        .iter()
                        .map(|p| squared_distance(p, &fit.centroids[c]))
                        .sum::<f64>();
                }
                assert!((fit.inertia - expected_inertia).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_inertia_is_minimal_for_obvious_split() {
        let fit = KMeans::new(2).fit(&blobs()).unwrap();
        // Each blob's spread is tiny compared to the gap between them.
        assert!(fit.inertia < 0.1, "inertia was {}", fit.inertia);
        assert_eq!(fit.centroids.len(), 2);
    }
}
