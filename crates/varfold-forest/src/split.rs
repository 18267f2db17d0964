use rand::Rng;

/// Criterion for measuring the quality of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitCriterion {
    /// Gini impurity: 1 - Σ(p_i²)
    Gini,
    /// Information entropy: -Σ(p_i · ln(p_i))
    Entropy,
}

impl SplitCriterion {
    /// Compute the impurity of a node from its class counts.
    ///
    /// Zero for an empty node.
    #[must_use]
    pub fn impurity(&self, class_counts: &[usize], n_samples: usize) -> f64 {
        if n_samples == 0 {
            return 0.0;
        }
        let n = n_samples as f64;
        let proportions = class_counts.iter().filter(|&&c| c > 0).map(|&c| c as f64 / n);
        match self {
            SplitCriterion::Gini => 1.0 - proportions.map(|p| p * p).sum::<f64>(),
            SplitCriterion::Entropy => -proportions.map(|p| p * p.ln()).sum::<f64>(),
        }
    }
}

/// The chosen split of a node's samples.
#[derive(Debug, Clone)]
pub(crate) struct Split {
    pub(crate) feature: usize,
    pub(crate) threshold: f64,
    pub(crate) left: Vec<usize>,
    pub(crate) right: Vec<usize>,
}

/// Search a random subset of `max_features` columns for the split with the
/// largest impurity decrease.
///
/// `columns[feature][sample]` is column-major. Thresholds are midpoints
/// between consecutive distinct sorted values. Returns `None` when no split
/// leaves at least `min_samples_leaf` samples on both sides or none improves
/// on the parent.
#[allow(clippy::too_many_arguments)]
pub(crate) fn best_split(
    columns: &[Vec<f64>],
    labels: &[usize],
    samples: &[usize],
    n_classes: usize,
    criterion: SplitCriterion,
    max_features: usize,
    min_samples_leaf: usize,
    rng: &mut impl Rng,
) -> Option<Split> {
    let n_features = columns.len();
    let n = samples.len();
    if n < 2 || n_features == 0 {
        return None;
    }

    let mut parent = vec![0usize; n_classes];
    for &s in samples {
        parent[labels[s]] += 1;
    }
    let parent_impurity = criterion.impurity(&parent, n);

    let mut candidates: Vec<usize> = (0..n_features).collect();
    let take = max_features.min(n_features);
    for i in 0..take {
        let j = rng.gen_range(i..n_features);
        candidates.swap(i, j);
    }

    let mut best: Option<(usize, f64, f64)> = None;
    for &feature in &candidates[..take] {
        let column = &columns[feature];
        let mut sorted: Vec<(f64, usize)> = samples.iter().map(|&s| (column[s], labels[s])).collect();
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        let mut left = vec![0usize; n_classes];
        let mut right = parent.clone();
        for i in 0..n - 1 {
            let (value, label) = sorted[i];
            left[label] += 1;
            right[label] -= 1;

            let next = sorted[i + 1].0;
            if value == next {
                continue;
            }
            let n_left = i + 1;
            let n_right = n - n_left;
            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }

            let weighted = (n_left as f64 * criterion.impurity(&left, n_left)
                + n_right as f64 * criterion.impurity(&right, n_right))
                / n as f64;
            let decrease = parent_impurity - weighted;
            if decrease > 0.0 && best.is_none_or(|(_, _, d)| decrease > d) {
                best = Some((feature, (value + next) / 2.0, decrease));
            }
        }
    }

    let (feature, threshold, _) = best?;
    let (left, right) = samples
        .iter()
        .partition(|&&s| columns[feature][s] <= threshold);
    Some(Split { feature, threshold, left, right })
}
