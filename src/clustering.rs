// Temporal clustering
// Groups posts into events by timestamp proximity (1-D k-means on elapsed seconds)

use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::metrics::CLUSTER_ITERATIONS;
use crate::schema::{EventCluster, Post};

/// Centroids plus one cluster index per input point.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub centroids: Vec<f64>,
    pub assignments: Vec<usize>,
}

/// Any centroid-based partitioner of scalars.
pub trait CentroidFit {
    fn fit(&self, points: &[f64], k: usize) -> Result<Partition>;
}

/// Lloyd's algorithm with seeded k-means++ initialisation.
#[derive(Debug, Clone)]
pub struct LloydKMeans {
    pub max_iter: usize,
    pub seed: u64,
}

impl Default for LloydKMeans {
    fn default() -> Self {
        Self {
            max_iter: 300,
            seed: 42,
        }
    }
}

impl LloydKMeans {
    pub fn new(max_iter: usize, seed: u64) -> Self {
        Self { max_iter, seed }
    }

    fn init_centroids(&self, points: &[f64], k: usize, rng: &mut StdRng) -> Vec<f64> {
        let mut centroids = Vec::with_capacity(k);
        centroids.push(points[rng.gen_range(0..points.len())]);

        while centroids.len() < k {
            let weights: Vec<f64> = points
                .iter()
                .map(|&p| {
                    centroids
                        .iter()
                        .map(|&c| (p - c) * (p - c))
                        .fold(f64::INFINITY, f64::min)
                })
                .collect();
            let total: f64 = weights.iter().sum();

            // Fewer distinct points than k: reuse a point, the duplicate stays empty.
            if total <= 0.0 {
                centroids.push(points[rng.gen_range(0..points.len())]);
                continue;
            }

            let mut target = rng.gen::<f64>() * total;
            let mut chosen = points.len() - 1;
            for (i, w) in weights.iter().enumerate() {
                if target < *w {
                    chosen = i;
                    break;
                }
                target -= w;
            }
            centroids.push(points[chosen]);
        }
        centroids
    }
}

/// Nearest centroid; ties go to the lowest index.
fn nearest(point: f64, centroids: &[f64]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let dist = (point - c).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

impl CentroidFit for LloydKMeans {
    fn fit(&self, points: &[f64], k: usize) -> Result<Partition> {
        if k == 0 {
            return Err(Error::InvalidArgument("event count must be at least 1".into()));
        }
        if points.is_empty() {
            return Err(Error::InvalidArgument("no points to cluster".into()));
        }
        let lo = points.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = points.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = self.init_centroids(points, k, &mut rng);
        let mut assignments: Vec<usize> = Vec::new();

        for iteration in 0..self.max_iter.max(1) {
            CLUSTER_ITERATIONS.inc();
            let next: Vec<usize> = points.iter().map(|&p| nearest(p, &centroids)).collect();
            if next == assignments {
                debug!(iteration, "k-means converged");
                break;
            }
            assignments = next;

            let mut sums = vec![0.0; k];
            let mut counts = vec![0usize; k];
            for (&p, &a) in points.iter().zip(&assignments) {
                sums[a] += p;
                counts[a] += 1;
            }
            for (c, (sum, count)) in centroids.iter_mut().zip(sums.into_iter().zip(counts)) {
                // Empty clusters keep their previous centroid.
                if count > 0 {
                    // Clamp absorbs summation rounding at the extremes.
                    *c = (sum / count as f64).clamp(lo, hi);
                }
            }
        }

        Ok(Partition {
            centroids,
            assignments,
        })
    }
}

pub struct TemporalClusterer<F = LloydKMeans> {
    fitter: F,
}

impl<F: CentroidFit> TemporalClusterer<F> {
    pub fn new(fitter: F) -> Self {
        Self { fitter }
    }

    /// Partitions `posts` into exactly `k` events; a cluster may end up empty.
    pub fn cluster(&self, posts: &[Post], k: usize) -> Result<Vec<EventCluster>> {
        let earliest = posts
            .iter()
            .map(|p| p.timestamp)
            .min()
            .ok_or_else(|| Error::InvalidArgument("no posts to cluster".into()))?;

        let deltas: Vec<f64> = posts
            .iter()
            .map(|p| (p.timestamp - earliest).num_seconds() as f64)
            .collect();

        let partition = self.fitter.fit(&deltas, k)?;

        let mut clusters: Vec<EventCluster> = partition
            .centroids
            .iter()
            .enumerate()
            .map(|(id, &seconds)| EventCluster {
                id,
                centroid: earliest + Duration::seconds(seconds.floor() as i64),
                posts: Vec::new(),
            })
            .collect();

        for (post, &cluster) in posts.iter().zip(&partition.assignments) {
            clusters[cluster].posts.push(post.clone());
        }

        for c in &clusters {
            debug!(event = c.id, centroid = %c.centroid, posts = c.posts.len(), "Clustered event");
        }
        info!(events = clusters.len(), posts = posts.len(), "Temporal clustering done");
        Ok(clusters)
    }
}

impl Default for TemporalClusterer<LloydKMeans> {
    fn default() -> Self {
        Self::new(LloydKMeans::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Utc};

    fn post_at(day: u32, hour: u32) -> Post {
        Post {
            timestamp: Utc.with_ymd_and_hms(2017, 9, day, hour, 0, 0).unwrap(),
            title: format!("post {day}-{hour}"),
            question: String::new(),
            answer: String::new(),
            tags: Vec::new(),
        }
    }

    fn bursty_posts() -> Vec<Post> {
        // Three well separated bursts, deliberately interleaved in input order.
        vec![
            post_at(2, 10),
            post_at(15, 9),
            post_at(28, 12),
            post_at(2, 14),
            post_at(15, 11),
            post_at(3, 8),
            post_at(29, 1),
            post_at(16, 2),
        ]
    }

    #[test]
    fn recovers_separated_bursts() {
        let partition = LloydKMeans::default()
            .fit(&[0.0, 1.0, 2.0, 100.0, 101.0, 102.0], 2)
            .unwrap();
        assert_eq!(partition.assignments[0], partition.assignments[2]);
        assert_eq!(partition.assignments[3], partition.assignments[5]);
        assert_ne!(partition.assignments[0], partition.assignments[3]);
        let mut centroids = partition.centroids.clone();
        centroids.sort_by(f64::total_cmp);
        assert_eq!(centroids, vec![1.0, 101.0]);
    }

    #[test]
    fn clusters_partition_all_posts() {
        let posts = bursty_posts();
        let clusters = TemporalClusterer::default().cluster(&posts, 3).unwrap();
        assert_eq!(clusters.len(), 3);

        let total: usize = clusters.iter().map(|c| c.posts.len()).sum();
        assert_eq!(total, posts.len());
        for post in &posts {
            let homes = clusters.iter().filter(|c| c.posts.contains(post)).count();
            assert_eq!(homes, 1);
        }
        for c in &clusters {
            assert!(c.posts.len() >= 2);
            let days: Vec<u32> = c.posts.iter().map(|p| p.timestamp.day()).collect();
            let spread = days.iter().max().unwrap() - days.iter().min().unwrap();
            assert!(spread <= 1, "cluster mixes bursts: {days:?}");
        }
    }

    #[test]
    fn centroids_lie_within_post_range() {
        let posts = bursty_posts();
        let lo = posts.iter().map(|p| p.timestamp).min().unwrap();
        let hi = posts.iter().map(|p| p.timestamp).max().unwrap();
        for k in 1..=6 {
            let clusters = TemporalClusterer::default().cluster(&posts, k).unwrap();
            assert_eq!(clusters.len(), k);
            for c in &clusters {
                assert!(c.centroid >= lo && c.centroid <= hi);
            }
        }
    }

    #[test]
    fn cluster_keeps_input_order() {
        let posts = bursty_posts();
        let clusters = TemporalClusterer::default().cluster(&posts, 3).unwrap();
        for c in &clusters {
            let positions: Vec<usize> = c
                .posts
                .iter()
                .map(|p| posts.iter().position(|q| q == p).unwrap())
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn more_events_than_distinct_times_leaves_empty_clusters() {
        let posts = vec![post_at(5, 10), post_at(5, 10)];
        let clusters = TemporalClusterer::default().cluster(&posts, 3).unwrap();
        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters.iter().map(|c| c.posts.len()).sum::<usize>(), 2);
        assert!(clusters.iter().any(|c| c.posts.is_empty()));
    }

    #[test]
    fn seeded_fit_is_deterministic() {
        let points: Vec<f64> = (0..40).map(|i| ((i * 37) % 101) as f64).collect();
        let a = LloydKMeans::new(100, 7).fit(&points, 4).unwrap();
        let b = LloydKMeans::new(100, 7).fit(&points, 4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_degenerate_requests() {
        assert!(matches!(
            LloydKMeans::default().fit(&[1.0], 0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            TemporalClusterer::default().cluster(&[], 2),
            Err(Error::InvalidArgument(_))
        ));
    }
}
