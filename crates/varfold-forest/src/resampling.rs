//! Partitioned forest ensemble with minority over-sampling.
//!
//! The majority classes are split into disjoint partitions; each partition
//! is paired with the whole minority class, over-sampled by random
//! duplication, and gets its own forest. Predictions average the partition
//! forests. This keeps every member trained on a roughly balanced sample.

use rand::Rng;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::config::RandomForestConfig;
use crate::error::ForestError;
use crate::forest::{RandomForest, validate};
use crate::predict::ClassDistribution;

/// Configuration for a [`ResamplingForest`].
///
/// # Defaults
///
/// | Parameter            | Default |
/// |----------------------|---------|
/// | `minority_class`     | 0       |
/// | `oversample_percent` | 100.0   |
/// | `seed`               | 42      |
/// | `workers`            | `None` (global rayon pool) |
#[derive(Debug, Clone)]
pub struct ResamplingConfig {
    n_partitions: usize,
    oversample_percent: f64,
    minority_class: usize,
    forest: RandomForestConfig,
    seed: u64,
    workers: Option<usize>,
}

impl ResamplingConfig {
    /// Create a config with `n_partitions` majority partitions, each
    /// trained with a copy of `forest`.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidPartitionCount`] if `n_partitions` is zero.
    pub fn new(n_partitions: usize, forest: RandomForestConfig) -> Result<Self, ForestError> {
        if n_partitions == 0 {
            return Err(ForestError::InvalidPartitionCount { n_partitions });
        }
        Ok(Self {
            n_partitions,
            oversample_percent: 100.0,
            minority_class: 0,
            forest,
            seed: 42,
            workers: None,
        })
    }

    /// Set how many extra minority copies to draw, as a percentage of the
    /// minority count. `0.0` disables over-sampling.
    #[must_use]
    pub fn with_oversample_percent(mut self, percent: f64) -> Self {
        self.oversample_percent = percent.max(0.0);
        self
    }

    /// Set the minority class index.
    #[must_use]
    pub fn with_minority_class(mut self, class: usize) -> Self {
        self.minority_class = class;
        self
    }

    /// Set the random seed for partitioning, over-sampling, and member forests.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Train on a dedicated pool of `workers` threads instead of the global pool.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.max(1));
        self
    }

    /// Return the number of majority partitions.
    #[must_use]
    pub fn n_partitions(&self) -> usize {
        self.n_partitions
    }

    /// Return the over-sampling percentage.
    #[must_use]
    pub fn oversample_percent(&self) -> f64 {
        self.oversample_percent
    }

    /// Return the member forest configuration.
    #[must_use]
    pub fn forest(&self) -> &RandomForestConfig {
        &self.forest
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train the ensemble.
    ///
    /// # Errors
    ///
    /// Same conditions as [`RandomForestConfig::fit`], plus
    /// [`ForestError::WorkerPool`] when a dedicated pool was requested and
    /// could not be built.
    #[instrument(skip_all, fields(n_partitions = self.n_partitions, n_samples = features.len()))]
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<ResamplingForest, ForestError> {
        match self.workers {
            Some(workers) => rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|source| ForestError::WorkerPool { workers, source })?
                .install(|| self.fit_members(features, labels, n_classes)),
            None => self.fit_members(features, labels, n_classes),
        }
    }

    fn fit_members(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<ResamplingForest, ForestError> {
        validate(features, labels, n_classes)?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let (minority, mut majority): (Vec<usize>, Vec<usize>) =
            (0..labels.len()).partition(|&i| labels[i] == self.minority_class);
        majority.shuffle(&mut rng);

        let mut partitions: Vec<Vec<usize>> = vec![Vec::new(); self.n_partitions];
        for (j, &index) in majority.iter().enumerate() {
            partitions[j % self.n_partitions].push(index);
        }
        partitions.retain(|p| !p.is_empty());
        if partitions.is_empty() {
            partitions.push(Vec::new());
        }

        let n_extra = (minority.len() as f64 * self.oversample_percent / 100.0).round() as usize;
        info!(
            n_minority = minority.len(),
            n_majority = majority.len(),
            n_extra,
            n_members = partitions.len(),
            "training resampling ensemble"
        );

        let mut members = Vec::with_capacity(partitions.len());
        for (p, partition) in partitions.into_iter().enumerate() {
            let mut sample = partition;
            sample.extend_from_slice(&minority);
            if !minority.is_empty() {
                sample.extend((0..n_extra).map(|_| minority[rng.gen_range(0..minority.len())]));
            }
            let member_features: Vec<Vec<f64>> = sample.iter().map(|&i| features[i].clone()).collect();
            let member_labels: Vec<usize> = sample.iter().map(|&i| labels[i]).collect();
            let forest = self
                .forest
                .clone()
                .with_seed(rng.r#gen())
                .fit(&member_features, &member_labels, n_classes)?;
            debug!(member = p, n_samples = sample.len(), "member forest trained");
            members.push(forest);
        }

        Ok(ResamplingForest { members, n_classes })
    }
}

/// A fitted partitioned ensemble.
#[derive(Debug, Clone)]
pub struct ResamplingForest {
    members: Vec<RandomForest>,
    n_classes: usize,
}

impl ResamplingForest {
    /// Return the class distribution for a sample, averaged over all member forests.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] when the sample has the wrong width.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<ClassDistribution, ForestError> {
        let mut avg = vec![0.0f64; self.n_classes];
        for member in &self.members {
            let dist = member.predict_proba(sample)?;
            for (acc, p) in avg.iter_mut().zip(dist.as_slice()) {
                *acc += p;
            }
        }
        let n = self.members.len() as f64;
        avg.iter_mut().for_each(|v| *v /= n);
        Ok(ClassDistribution::new(avg))
    }

    /// Return distributions for a batch of samples.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] if any sample has the wrong width.
    pub fn predict_proba_batch(
        &self,
        features: &[Vec<f64>],
    ) -> Result<Vec<ClassDistribution>, ForestError> {
        features.iter().map(|s| self.predict_proba(s)).collect()
    }

    /// Return the number of member forests.
    #[must_use]
    pub fn n_members(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 10 minority samples near 0, 90 majority samples near 10.
    fn imbalanced() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..10 {
            features.push(vec![i as f64 * 0.1]);
            labels.push(0);
        }
        for i in 0..90 {
            features.push(vec![10.0 + i as f64 * 0.01]);
            labels.push(1);
        }
        (features, labels)
    }

    #[test]
    fn one_member_per_partition() {
        let (features, labels) = imbalanced();
        let config = ResamplingConfig::new(3, RandomForestConfig::new(5).unwrap()).unwrap();
        let model = config.fit(&features, &labels, 2).unwrap();
        assert_eq!(model.n_members(), 3);
    }

    #[test]
    fn partitions_capped_by_majority_size() {
        let features = vec![vec![0.0], vec![1.0], vec![2.0]];
        let labels = vec![0, 1, 1];
        let config = ResamplingConfig::new(5, RandomForestConfig::new(2).unwrap()).unwrap();
        assert_eq!(config.fit(&features, &labels, 2).unwrap().n_members(), 2);
    }

    #[test]
    fn separates_classes() {
        let (features, labels) = imbalanced();
        let config = ResamplingConfig::new(2, RandomForestConfig::new(10).unwrap())
            .unwrap()
            .with_oversample_percent(200.0);
        let model = config.fit(&features, &labels, 2).unwrap();
        assert_eq!(model.predict_proba(&[0.2]).unwrap().predicted_class(), 0);
        assert_eq!(model.predict_proba(&[10.5]).unwrap().predicted_class(), 1);
    }

    #[test]
    fn deterministic_for_seed() {
        let (features, labels) = imbalanced();
        let config = ResamplingConfig::new(2, RandomForestConfig::new(4).unwrap()).unwrap().with_seed(3);
        let a = config.fit(&features, &labels, 2).unwrap().predict_proba_batch(&features).unwrap();
        let b = config.fit(&features, &labels, 2).unwrap().predict_proba_batch(&features).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn dedicated_pool_matches_global_pool() {
        let (features, labels) = imbalanced();
        let config = ResamplingConfig::new(2, RandomForestConfig::new(4).unwrap()).unwrap();
        let global = config.fit(&features, &labels, 2).unwrap();
        let pooled = config.clone().with_workers(2).fit(&features, &labels, 2).unwrap();
        assert_eq!(
            global.predict_proba_batch(&features).unwrap(),
            pooled.predict_proba_batch(&features).unwrap()
        );
    }

    #[test]
    fn zero_partitions_rejected() {
        let forest = RandomForestConfig::new(1).unwrap();
        assert!(matches!(
            ResamplingConfig::new(0, forest),
            Err(ForestError::InvalidPartitionCount { n_partitions: 0 })
        ));
    }
}
