//! Random forest of CART trees
//!
//! Each tree is grown to purity on a bootstrap sample, examining a random
//! subset of features at every node and splitting on the threshold with the
//! lowest weighted Gini impurity. Prediction averages the leaf class
//! distributions of all trees.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::MaxFeatures;
use crate::error::{PipelineError, Result};

/// Tree node stored in a flat arena; index 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Internal node: go left when `row[feature] <= threshold`
    Split {
        /// Feature column
        feature: usize,
        /// Decision threshold
        threshold: f64,
        /// Arena index of the left child
        left: usize,
        /// Arena index of the right child
        right: usize,
    },
    /// Terminal node with class probabilities aligned to the forest's classes
    Leaf {
        /// Probability per class
        distribution: Vec<f64>,
    },
}

/// One fitted decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn leaf_distribution(&self, row: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
                Node::Leaf { distribution } => return distribution,
            }
        }
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True for a tree without nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Bagged ensemble of decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    classes: Vec<u8>,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Grow `n_trees` trees in parallel
    ///
    /// Per-tree seeds are drawn from `seed` up front, so the forest is the
    /// same regardless of thread scheduling.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for empty training data or zero trees.
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[u8],
        n_trees: usize,
        max_features: MaxFeatures,
        seed: u64,
    ) -> Result<Self> {
        if rows.is_empty() || rows.len() != labels.len() {
            return Err(PipelineError::InvalidInput(
                "random forest needs one label per non-empty training row".to_string(),
            ));
        }
        if n_trees == 0 {
            return Err(PipelineError::InvalidInput(
                "random forest needs at least one tree".to_string(),
            ));
        }

        let n_features = rows[0].len();
        let mut classes: Vec<u8> = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();

        let targets: Vec<usize> = labels
            .iter()
            .map(|l| classes.binary_search(l).unwrap_or(0))
            .collect();

        let per_split = match max_features {
            MaxFeatures::Sqrt => ((n_features as f64).sqrt().floor() as usize).max(1),
            MaxFeatures::All => n_features.max(1),
        };

        let mut seeder = StdRng::seed_from_u64(seed);
        let tree_seeds: Vec<u64> = (0..n_trees).map(|_| seeder.gen()).collect();

        let grower = TreeGrower {
            rows,
            targets: &targets,
            n_classes: classes.len(),
            per_split,
        };

        let trees = tree_seeds
            .par_iter()
            .map(|&s| {
                let mut rng = StdRng::seed_from_u64(s);
                let sample: Vec<usize> = (0..rows.len()).map(|_| rng.gen_range(0..rows.len())).collect();
                grower.grow(sample, &mut rng)
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Random forest: {} trees, {} nodes total",
            trees.len(),
            trees.iter().map(DecisionTree::len).sum::<usize>()
        );

        Ok(Self {
            classes,
            n_features,
            trees,
        })
    }

    /// Expected row length
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Class probabilities averaged over all trees, aligned to sorted labels
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (p, &d) in proba.iter_mut().zip(tree.leaf_distribution(row)) {
                *p += d;
            }
        }
        let n = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        proba
    }

    /// Most probable label; ties go to the smallest label
    pub fn predict(&self, row: &[f64]) -> u8 {
        let proba = self.predict_proba(row);
        let mut best = 0;
        for (i, &p) in proba.iter().enumerate() {
            if p > proba[best] {
                best = i;
            }
        }
        self.classes[best]
    }
}

struct TreeGrower<'a> {
    rows: &'a [Vec<f64>],
    targets: &'a [usize],
    n_classes: usize,
    per_split: usize,
}

impl TreeGrower<'_> {
    fn counts(&self, sample: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &s in sample {
            counts[self.targets[s]] += 1;
        }
        counts
    }

    fn leaf(counts: &[usize]) -> Node {
        let total = counts.iter().sum::<usize>().max(1) as f64;
        Node::Leaf {
            distribution: counts.iter().map(|&c| c as f64 / total).collect(),
        }
    }

    fn grow(&self, sample: Vec<usize>, rng: &mut StdRng) -> DecisionTree {
        let mut nodes = vec![Node::Leaf {
            distribution: Vec::new(),
        }];
        let mut stack = vec![(0usize, sample)];

        while let Some((node, sample)) = stack.pop() {
            let counts = self.counts(&sample);
            let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

            let split = if pure || sample.len() < 2 {
                None
            } else {
                self.best_split(&sample, &counts, rng)
            };

            match split {
                None => nodes[node] = Self::leaf(&counts),
                Some((feature, threshold)) => {
                    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = sample
                        .iter()
                        .partition(|&&s| self.rows[s][feature] <= threshold);
                    let left = nodes.len();
                    let right = left + 1;
                    nodes.push(Node::Leaf {
                        distribution: Vec::new(),
                    });
                    nodes.push(Node::Leaf {
                        distribution: Vec::new(),
                    });
                    nodes[node] = Node::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    };
                    stack.push((right, right_rows));
                    stack.push((left, left_rows));
                }
            }
        }

        DecisionTree { nodes }
    }

    /// Lowest weighted Gini split over a random feature subset
    ///
    /// Constant features do not count towards the subset size, so the search
    /// keeps drawing until `per_split` varying features were examined.
    fn best_split(&self, sample: &[usize], counts: &[usize], rng: &mut StdRng) -> Option<(usize, f64)> {
        let n_features = self.rows[0].len();
        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(rng);

        let n = sample.len() as f64;
        let mut best: Option<(f64, usize, f64)> = None;
        let mut examined = 0;
        let mut pairs: Vec<(f64, usize)> = Vec::with_capacity(sample.len());

        for feature in features {
            if examined >= self.per_split {
                break;
            }

            pairs.clear();
            pairs.extend(sample.iter().map(|&s| (self.rows[s][feature], self.targets[s])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let (first, last) = (pairs[0].0, pairs[pairs.len() - 1].0);
            if !(last > first) {
                continue;
            }
            examined += 1;

            let mut left = vec![0usize; self.n_classes];
            let mut right = counts.to_vec();

            for k in 0..pairs.len() - 1 {
                let class = pairs[k].1;
                left[class] += 1;
                right[class] -= 1;

                let (v, next) = (pairs[k].0, pairs[k + 1].0);
                if !(next > v) {
                    continue;
                }

                let n_left = (k + 1) as f64;
                let n_right = n - n_left;
                let impurity = (n_left * gini(&left, n_left) + n_right * gini(&right, n_right)) / n;

                if best.map_or(true, |(b, _, _)| impurity < b) {
                    let mut threshold = v + (next - v) / 2.0;
                    if threshold >= next {
                        threshold = v;
                    }
                    best = Some((impurity, feature, threshold));
                }
            }
        }

        best.map(|(_, feature, threshold)| (feature, threshold))
    }
}

fn gini(counts: &[usize], total: f64) -> f64 {
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stripes() -> (Vec<Vec<f64>>, Vec<u8>) {
        // Label depends on the first feature only; the second is noise
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..60 {
            let x = i as f64 / 10.0;
            let noise = ((i * 37) % 11) as f64;
            rows.push(vec![x, noise]);
            labels.push(if x < 2.0 { 0 } else if x < 4.0 { 1 } else { 2 });
        }
        (rows, labels)
    }

    #[test]
    fn test_learns_thresholds() {
        let (rows, labels) = stripes();
        let forest = RandomForest::fit(&rows, &labels, 25, MaxFeatures::All, 42).unwrap();
        assert_eq!(forest.n_trees(), 25);
        assert_eq!(forest.predict(&[0.5, 3.0]), 0);
        assert_eq!(forest.predict(&[3.0, 3.0]), 1);
        assert_eq!(forest.predict(&[5.5, 3.0]), 2);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (rows, labels) = stripes();
        let forest = RandomForest::fit(&rows, &labels, 10, MaxFeatures::Sqrt, 1).unwrap();
        let p = forest.predict_proba(&[1.9, 0.0]);
        assert_eq!(p.len(), 3);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (rows, labels) = stripes();
        let a = RandomForest::fit(&rows, &labels, 8, MaxFeatures::Sqrt, 9).unwrap();
        let b = RandomForest::fit(&rows, &labels, 8, MaxFeatures::Sqrt, 9).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(&[4, 0], 4.0), 0.0);
        assert!((gini(&[2, 2], 4.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_empty() {
        assert!(RandomForest::fit(&[], &[], 10, MaxFeatures::Sqrt, 0).is_err());
    }
}
