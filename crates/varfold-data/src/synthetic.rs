//! Seeded synthetic classification data from a random decision list.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, instrument};

use crate::DataError;
use crate::dataset::{Dataset, Record};
use crate::schema::{Attribute, Schema};

/// One threshold test of a rule: `value > threshold` when `above`, else `value <= threshold`.
#[derive(Debug, Clone, Copy)]
struct Test {
    attribute: usize,
    threshold: f64,
    above: bool,
}

impl Test {
    fn matches(&self, row: &[f64]) -> bool {
        (row[self.attribute] > self.threshold) == self.above
    }
}

#[derive(Debug, Clone)]
struct Rule {
    tests: Vec<Test>,
    class: usize,
}

/// Configuration for the synthetic data generator.
///
/// Records have `n_attributes` numeric features drawn uniformly from `[0, 1)`
/// and a binary label (`c0`, `c1`). The label comes from a decision list of
/// `n_rules` random rules, each a conjunction of up to `max_tests` threshold
/// tests; the first matching rule decides the class, otherwise a default
/// class applies. Rules alternate classes so both appear.
///
/// # Defaults
///
/// | Parameter    | Default           |
/// |--------------|-------------------|
/// | `n_rules`    | 10                |
/// | `max_tests`  | 3                 |
/// | `seed`       | 42                |
/// | `relation`   | `"SyntheticData"` |
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    n_examples: usize,
    n_attributes: usize,
    n_rules: usize,
    max_tests: usize,
    seed: u64,
    relation: String,
}

impl SyntheticConfig {
    /// Create a generator config for `n_examples` records of `n_attributes` features.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidParameter`] if either count is zero.
    pub fn new(n_examples: usize, n_attributes: usize) -> Result<Self, DataError> {
        if n_examples == 0 {
            return Err(DataError::InvalidParameter {
                name: "n_examples",
                value: n_examples,
                reason: "must be at least 1",
            });
        }
        if n_attributes == 0 {
            return Err(DataError::InvalidParameter {
                name: "n_attributes",
                value: n_attributes,
                reason: "must be at least 1",
            });
        }
        Ok(Self {
            n_examples,
            n_attributes,
            n_rules: 10,
            max_tests: 3,
            seed: 42,
            relation: "SyntheticData".to_string(),
        })
    }

    /// Set the number of rules in the decision list.
    #[must_use]
    pub fn with_n_rules(mut self, n_rules: usize) -> Self {
        self.n_rules = n_rules;
        self
    }

    /// Set the maximum number of tests per rule. Clamped to `[1, n_attributes]`.
    #[must_use]
    pub fn with_max_tests(mut self, max_tests: usize) -> Self {
        self.max_tests = max_tests;
        self
    }

    /// Set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the relation name of the generated dataset.
    #[must_use]
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = relation.into();
        self
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate the dataset.
    ///
    /// # Errors
    ///
    /// Only fails if dataset construction rejects the generated records,
    /// which indicates a bug.
    #[instrument(skip_all, fields(n_examples = self.n_examples, n_attributes = self.n_attributes))]
    pub fn generate(&self) -> Result<Dataset, DataError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let rules = self.draw_rules(&mut rng);
        let default_class = rng.gen_range(0..2usize);

        let records = (0..self.n_examples)
            .map(|_| {
                let row: Vec<f64> = (0..self.n_attributes).map(|_| rng.r#gen::<f64>()).collect();
                let class = rules
                    .iter()
                    .find(|rule| rule.tests.iter().all(|t| t.matches(&row)))
                    .map_or(default_class, |rule| rule.class);
                let mut values: Vec<Option<f64>> = row.into_iter().map(Some).collect();
                values.push(Some(class as f64));
                Record::new(values)
            })
            .collect();

        let mut attributes: Vec<Attribute> = (0..self.n_attributes)
            .map(|a| Attribute::numeric(format!("a{a}")))
            .collect();
        attributes.push(Attribute::nominal("class", vec!["c0".into(), "c1".into()]));
        let schema = Schema::new(attributes);
        let label = schema.handles().last();

        let dataset = Dataset::new(self.relation.clone(), schema, records, label)?;
        info!(class_counts = ?dataset.class_counts(), "synthetic data generated");
        Ok(dataset)
    }

    fn draw_rules(&self, rng: &mut ChaCha8Rng) -> Vec<Rule> {
        let max_tests = self.max_tests.clamp(1, self.n_attributes);
        let mut order: Vec<usize> = (0..self.n_attributes).collect();
        (0..self.n_rules)
            .map(|r| {
                let n_tests = rng.gen_range(1..=max_tests);
                // Partial Fisher-Yates: distinct attributes per rule.
                for i in 0..n_tests {
                    let j = rng.gen_range(i..self.n_attributes);
                    order.swap(i, j);
                }
                let tests = order[..n_tests]
                    .iter()
                    .map(|&attribute| Test {
                        attribute,
                        threshold: rng.r#gen::<f64>(),
                        above: rng.gen_bool(0.5),
                    })
                    .collect();
                Rule { tests, class: r % 2 }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_requested_shape() {
        let ds = SyntheticConfig::new(500, 20).unwrap().generate().unwrap();
        assert_eq!(ds.len(), 500);
        assert_eq!(ds.schema().len(), 21);
        assert_eq!(ds.name(), "SyntheticData");
        assert_eq!(ds.class_names(), &["c0".to_string(), "c1".to_string()]);
        assert_eq!(ds.class_counts().iter().sum::<usize>(), 500);
    }

    #[test]
    fn deterministic_for_seed() {
        let a = SyntheticConfig::new(200, 5).unwrap().with_seed(7).generate().unwrap();
        let b = SyntheticConfig::new(200, 5).unwrap().with_seed(7).generate().unwrap();
        assert_eq!(a.records(), b.records());
    }

    #[test]
    fn different_seeds_differ() {
        let a = SyntheticConfig::new(50, 5).unwrap().with_seed(1).generate().unwrap();
        let b = SyntheticConfig::new(50, 5).unwrap().with_seed(2).generate().unwrap();
        assert_ne!(a.records(), b.records());
    }

    #[test]
    fn features_in_unit_interval() {
        let ds = SyntheticConfig::new(100, 4).unwrap().generate().unwrap();
        for record in ds.records() {
            for v in &record.values()[..4] {
                let v = v.unwrap();
                assert!((0.0..1.0).contains(&v));
            }
        }
    }

    #[test]
    fn zero_counts_rejected() {
        assert!(SyntheticConfig::new(0, 5).is_err());
        assert!(SyntheticConfig::new(5, 0).is_err());
    }
}
