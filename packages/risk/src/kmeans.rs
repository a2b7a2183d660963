//! One-dimensional k-means (Lloyd's algorithm).
//!
//! Initialization is deterministic: centroids start at evenly spaced
//! quantiles of the sorted distinct values, so the same input always
//! produces the same clustering.

use barangay_risk_models::RiskLevel;

/// Why a clustering run could not produce `k` clusters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClusterError {
    /// `k` was zero.
    #[error("cluster count must be at least 1")]
    ZeroClusters,

    /// Fewer points than clusters.
    #[error("{points} point(s) cannot form {k} clusters")]
    TooFewPoints {
        /// Number of input values.
        points: usize,
        /// Requested cluster count.
        k: usize,
    },

    /// Fewer distinct values than clusters.
    #[error("{distinct} distinct value(s) cannot form {k} clusters")]
    TooFewDistinctValues {
        /// Number of distinct input values.
        distinct: usize,
        /// Requested cluster count.
        k: usize,
    },

    /// An input value was NaN or infinite.
    #[error("value at index {index} is not finite: {value}")]
    NonFinite {
        /// Position of the offending value.
        index: usize,
        /// The offending value.
        value: f64,
    },
}

/// Output of [`kmeans_1d`].
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Centroid of each cluster, indexed by cluster id.
    pub centroids: Vec<f64>,
    /// Cluster id of each input value, in input order.
    pub assignments: Vec<usize>,
    /// Number of assignment passes performed.
    pub iterations: usize,
}

/// Clusters `values` into `k` groups.
///
/// Stops when an assignment pass changes nothing or after
/// `max_iterations` passes. Returned centroids are the means of the final
/// assignment; a cluster that ends up empty keeps its previous centroid.
///
/// # Errors
///
/// Returns [`ClusterError`] if `k` is zero, any value is non-finite, or
/// there are fewer points (or distinct values) than clusters.
pub fn kmeans_1d(
    values: &[f64],
    k: usize,
    max_iterations: usize,
) -> Result<KMeansResult, ClusterError> {
    if k == 0 {
        return Err(ClusterError::ZeroClusters);
    }
    if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(ClusterError::NonFinite { index, value });
    }
    if values.len() < k {
        return Err(ClusterError::TooFewPoints {
            points: values.len(),
            k,
        });
    }

    let mut distinct = values.to_vec();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();
    if distinct.len() < k {
        return Err(ClusterError::TooFewDistinctValues {
            distinct: distinct.len(),
            k,
        });
    }

    let mut centroids = initial_centroids(&distinct, k);
    let mut assignments = vec![usize::MAX; values.len()];
    let mut iterations = 0;

    while iterations < max_iterations.max(1) {
        iterations += 1;

        let mut changed = false;
        for (slot, &value) in assignments.iter_mut().zip(values) {
            let nearest = nearest_centroid(&centroids, value);
            if *slot != nearest {
                *slot = nearest;
                changed = true;
            }
        }

        centroids = recompute_centroids(values, &assignments, &centroids);

        if !changed {
            break;
        }
    }

    log::trace!("kmeans_1d: k={k} converged in {iterations} iteration(s)");

    Ok(KMeansResult {
        centroids,
        assignments,
        iterations,
    })
}

/// Picks `k` starting centroids at evenly spaced positions of the sorted,
/// deduplicated values. Requires `distinct.len() >= k`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn initial_centroids(distinct: &[f64], k: usize) -> Vec<f64> {
    if k == 1 {
        return vec![distinct[distinct.len() / 2]];
    }
    let last = (distinct.len() - 1) as f64;
    let step = (k - 1) as f64;
    (0..k)
        .map(|i| {
            let position = (i as f64 * last / step).round() as usize;
            distinct[position.min(distinct.len() - 1)]
        })
        .collect()
}

fn nearest_centroid(centroids: &[f64], value: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (idx, centroid) in centroids.iter().enumerate() {
        let distance = (value - centroid).abs();
        if distance < best_distance {
            best = idx;
            best_distance = distance;
        }
    }
    best
}

#[allow(clippy::cast_precision_loss)]
fn recompute_centroids(values: &[f64], assignments: &[usize], previous: &[f64]) -> Vec<f64> {
    let mut sums = vec![0.0; previous.len()];
    let mut counts = vec![0usize; previous.len()];
    for (&value, &cluster) in values.iter().zip(assignments) {
        sums[cluster] += value;
        counts[cluster] += 1;
    }
    previous
        .iter()
        .enumerate()
        .map(|(idx, &old)| {
            if counts[idx] == 0 {
                old
            } else {
                sums[idx] / counts[idx] as f64
            }
        })
        .collect()
}

/// Maps each cluster id to an ordinal [`RiskLevel`] by centroid rank.
///
/// A centroid's rank is the number of centroids strictly smaller than it,
/// so equal centroids share a label.
#[must_use]
pub fn rank_labels(centroids: &[f64]) -> Vec<RiskLevel> {
    centroids
        .iter()
        .map(|c| {
            let rank = centroids.iter().filter(|other| *other < c).count();
            RiskLevel::from_rank(rank)
        })
        .collect()
}
