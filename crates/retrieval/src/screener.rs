//! Out-of-topic query screening with an isolation forest.
//!
//! The screener fits an ensemble of random partitioning trees over the
//! corpus's embedding set, treating the corpus as "normal". Points
//! that are isolated by relatively few random partitions sit far from
//! the corpus distribution and are classified out-of-topic before any
//! generation cost is spent on them.
//!
//! Scoring follows the familiar decision-function convention: the raw
//! anomaly score `s(x) = 2^(-E[h(x)]/c(ψ))` lies in (0, 1] with higher
//! values more anomalous; the decision score is `0.5 - s(x)`, a signed
//! value where lower means more anomalous. A query scoring strictly
//! below the configured threshold is rejected as out-of-topic.
//!
//! A screener is fitted once at construction and never refitted: when
//! the index's embedding set changes, callers must build a new
//! screener against the refreshed export.

use crate::types::Embedding;
use voyager_core::{AppError, AppResult, ScreenerSettings};

/// Euler-Mascheroni constant, for the harmonic-number approximation.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Classification outcome for a query embedding.
///
/// Out-of-topic is a normal outcome, not an error: it short-circuits
/// the pipeline with a fixed user-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topicality {
    InTopic,
    OutOfTopic,
}

/// A fitted isolation-forest screener.
///
/// Classification is a pure function of the fitted state and the query
/// embedding: same query against the same fit always yields the same
/// score.
#[derive(Debug)]
pub struct AnomalyScreener {
    trees: Vec<Node>,
    /// c(ψ): expected path length of an unsuccessful search in a tree
    /// built from ψ points; normalizes raw path lengths.
    expected_path: f64,
    dimensions: usize,
    threshold: f64,
}

/// One node of an isolation tree.
#[derive(Debug)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

impl AnomalyScreener {
    /// Fit a screener over the full corpus embedding set.
    ///
    /// # Errors
    /// - `InsufficientTrainingData` when the set is empty
    /// - `EmbeddingModelMismatch` when the set mixes dimensionalities
    pub fn fit(embeddings: &[Embedding], settings: &ScreenerSettings) -> AppResult<Self> {
        if embeddings.is_empty() {
            return Err(AppError::InsufficientTrainingData(
                "Cannot fit the anomaly screener on an empty embedding set".to_string(),
            ));
        }

        let dimensions = embeddings[0].len();
        for embedding in embeddings {
            if embedding.len() != dimensions {
                return Err(AppError::EmbeddingModelMismatch {
                    expected: dimensions,
                    actual: embedding.len(),
                });
            }
        }

        let mut rng = fastrand::Rng::with_seed(settings.seed);
        let sample_size = settings.subsample.max(1).min(embeddings.len());
        let height_limit = (sample_size as f64).log2().ceil().max(1.0) as usize;

        let mut indices: Vec<usize> = (0..embeddings.len()).collect();
        let mut trees = Vec::with_capacity(settings.trees);

        for _ in 0..settings.trees.max(1) {
            rng.shuffle(&mut indices);
            let mut sample: Vec<usize> = indices[..sample_size].to_vec();
            trees.push(build_tree(
                embeddings,
                &mut sample,
                0,
                height_limit,
                dimensions,
                &mut rng,
            ));
        }

        tracing::debug!(
            "Fitted isolation forest: {} trees, subsample {}, {} dims over {} embeddings",
            trees.len(),
            sample_size,
            dimensions,
            embeddings.len()
        );

        Ok(Self {
            trees,
            expected_path: average_path_length(sample_size),
            dimensions,
            threshold: settings.threshold,
        })
    }

    /// Dimensionality the screener was fitted against.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The configured decision threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Signed decision score for a query embedding; lower values are
    /// more anomalous. Bounded in (-0.5, 0.5].
    ///
    /// A query vectorized by a different model than the corpus is a
    /// configuration error, detected here via dimensionality before
    /// any tree traversal.
    pub fn decision_score(&self, embedding: &[f32]) -> AppResult<f64> {
        if embedding.len() != self.dimensions {
            return Err(AppError::EmbeddingModelMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }

        let mean_path: f64 = self
            .trees
            .iter()
            .map(|tree| path_length(tree, embedding, 0))
            .sum::<f64>()
            / self.trees.len() as f64;

        // Degenerate single-point fit: every path has length zero and
        // every query is maximally anomalous.
        let anomaly_score = if self.expected_path > 0.0 {
            2f64.powf(-mean_path / self.expected_path)
        } else {
            1.0
        };

        Ok(0.5 - anomaly_score)
    }

    /// Classify a query embedding against the fitted corpus boundary.
    ///
    /// A score strictly below the threshold is out-of-topic; everything
    /// else, including a score exactly at the threshold, is in-topic.
    pub fn classify(&self, embedding: &[f32]) -> AppResult<Topicality> {
        let score = self.decision_score(embedding)?;

        tracing::debug!(
            "Anomaly decision score: {:.4} (threshold: {:.4})",
            score,
            self.threshold
        );

        if score < self.threshold {
            Ok(Topicality::OutOfTopic)
        } else {
            Ok(Topicality::InTopic)
        }
    }
}

/// Recursively build an isolation tree over `points` (indices into
/// `data`), splitting on a random feature at a random value until the
/// height limit or a single point is reached.
fn build_tree(
    data: &[Embedding],
    points: &mut Vec<usize>,
    depth: usize,
    height_limit: usize,
    dimensions: usize,
    rng: &mut fastrand::Rng,
) -> Node {
    if depth >= height_limit || points.len() <= 1 {
        return Node::Leaf { size: points.len() };
    }

    // Pick a random feature with actual spread. Bounded attempts keep
    // node construction O(points) instead of scanning every dimension.
    let mut split = None;
    for _ in 0..dimensions.min(32) {
        let feature = rng.usize(0..dimensions);
        let (min, max) = feature_range(data, points, feature);
        if max > min {
            let threshold = min + rng.f64() * (max - min);
            split = Some((feature, threshold));
            break;
        }
    }

    let Some((feature, threshold)) = split else {
        // All sampled features constant: the points are (near-)identical
        return Node::Leaf { size: points.len() };
    };

    let mut left: Vec<usize> = Vec::new();
    let mut right: Vec<usize> = Vec::new();
    for &idx in points.iter() {
        if (data[idx][feature] as f64) < threshold {
            left.push(idx);
        } else {
            right.push(idx);
        }
    }

    if left.is_empty() || right.is_empty() {
        return Node::Leaf { size: points.len() };
    }

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_tree(
            data,
            &mut left,
            depth + 1,
            height_limit,
            dimensions,
            rng,
        )),
        right: Box::new(build_tree(
            data,
            &mut right,
            depth + 1,
            height_limit,
            dimensions,
            rng,
        )),
    }
}

fn feature_range(data: &[Embedding], points: &[usize], feature: usize) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &idx in points {
        let value = data[idx][feature] as f64;
        if value < min {
            min = value;
        }
        if value > max {
            max = value;
        }
    }
    (min, max)
}

/// Traverse a tree with a query point, returning its path length
/// adjusted by the expected depth of the terminating leaf.
fn path_length(node: &Node, embedding: &[f32], depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if (embedding[*feature] as f64) < *threshold {
                path_length(left, embedding, depth + 1)
            } else {
                path_length(right, embedding, depth + 1)
            }
        }
    }
}

/// c(n): average path length of an unsuccessful search in a binary
/// search tree over n points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        n => {
            let nf = n as f64;
            2.0 * (((nf - 1.0).ln()) + EULER_GAMMA) - 2.0 * (nf - 1.0) / nf
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ScreenerSettings {
        ScreenerSettings::default()
    }

    /// Deterministic cluster of points near `center` with small jitter.
    fn clustered_embeddings(count: usize, dims: usize, center: f32) -> Vec<Embedding> {
        let mut rng = fastrand::Rng::with_seed(7);
        (0..count)
            .map(|_| {
                (0..dims)
                    .map(|_| center + (rng.f32() - 0.5) * 0.1)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_empty_fit_is_insufficient_training_data() {
        let err = AnomalyScreener::fit(&[], &settings()).unwrap_err();
        assert!(matches!(err, AppError::InsufficientTrainingData(_)));
    }

    #[test]
    fn test_mixed_dimensions_rejected() {
        let embeddings = vec![vec![0.0f32; 8], vec![0.0f32; 4]];
        let err = AnomalyScreener::fit(&embeddings, &settings()).unwrap_err();
        assert!(matches!(err, AppError::EmbeddingModelMismatch { .. }));
    }

    #[test]
    fn test_query_dimension_mismatch_surfaces_immediately() {
        let embeddings = clustered_embeddings(50, 8, 0.5);
        let screener = AnomalyScreener::fit(&embeddings, &settings()).unwrap();

        let err = screener.decision_score(&vec![0.5f32; 4]).unwrap_err();
        assert!(matches!(
            err,
            AppError::EmbeddingModelMismatch {
                expected: 8,
                actual: 4
            }
        ));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let embeddings = clustered_embeddings(100, 8, 0.5);
        let query = vec![0.5f32; 8];

        let screener_a = AnomalyScreener::fit(&embeddings, &settings()).unwrap();
        let screener_b = AnomalyScreener::fit(&embeddings, &settings()).unwrap();

        let score_a = screener_a.decision_score(&query).unwrap();
        let score_b = screener_b.decision_score(&query).unwrap();
        assert_eq!(score_a, score_b);

        // Repeated scoring against the same fit is pure
        assert_eq!(score_a, screener_a.decision_score(&query).unwrap());
    }

    #[test]
    fn test_scores_are_bounded() {
        let embeddings = clustered_embeddings(100, 8, 0.5);
        let screener = AnomalyScreener::fit(&embeddings, &settings()).unwrap();

        for query in [vec![0.5f32; 8], vec![100.0f32; 8], vec![-100.0f32; 8]] {
            let score = screener.decision_score(&query).unwrap();
            assert!(score > -0.5 && score <= 0.5, "score out of range: {}", score);
        }
    }

    #[test]
    fn test_corpus_member_is_in_topic_at_default_threshold() {
        let embeddings = clustered_embeddings(100, 8, 0.5);
        let member = embeddings[0].clone();
        let screener = AnomalyScreener::fit(&embeddings, &settings()).unwrap();

        assert_eq!(screener.classify(&member).unwrap(), Topicality::InTopic);
    }

    #[test]
    fn test_far_outlier_scores_below_cluster_member() {
        let embeddings = clustered_embeddings(200, 8, 0.5);
        let screener = AnomalyScreener::fit(&embeddings, &settings()).unwrap();

        let inlier_score = screener.decision_score(&embeddings[0]).unwrap();
        let outlier_score = screener.decision_score(&vec![10.0f32; 8]).unwrap();

        assert!(
            outlier_score < inlier_score,
            "outlier {} should score below inlier {}",
            outlier_score,
            inlier_score
        );
    }

    #[test]
    fn test_tuned_threshold_separates_outlier() {
        let embeddings = clustered_embeddings(200, 8, 0.5);
        let screener_scores = AnomalyScreener::fit(&embeddings, &settings()).unwrap();

        let inlier_score = screener_scores.decision_score(&embeddings[0]).unwrap();
        let outlier_score = screener_scores.decision_score(&vec![10.0f32; 8]).unwrap();

        // Calibrate the threshold between the two observed scores, the
        // way a deployment would tune it against its corpus.
        let tuned = ScreenerSettings {
            threshold: (inlier_score + outlier_score) / 2.0,
            ..settings()
        };
        let screener = AnomalyScreener::fit(&embeddings, &tuned).unwrap();

        assert_eq!(
            screener.classify(&embeddings[0]).unwrap(),
            Topicality::InTopic
        );
        assert_eq!(
            screener.classify(&vec![10.0f32; 8]).unwrap(),
            Topicality::OutOfTopic
        );
    }

    #[test]
    fn test_single_point_fit_is_degenerate_but_defined() {
        let embeddings = vec![vec![0.5f32; 8]];
        let screener = AnomalyScreener::fit(&embeddings, &settings()).unwrap();

        let score = screener.decision_score(&vec![0.5f32; 8]).unwrap();
        assert!((score - (-0.5)).abs() < 1e-9);
        // Still in-topic at the default threshold: rejection requires
        // a score strictly below it.
        assert_eq!(
            screener.classify(&vec![0.5f32; 8]).unwrap(),
            Topicality::InTopic
        );
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        // c(256) ≈ 10.24 per the standard formula
        let c256 = average_path_length(256);
        assert!(c256 > 10.0 && c256 < 10.5, "c(256) = {}", c256);
    }
}
