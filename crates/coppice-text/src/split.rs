//! Train/test partitioning of vectorized corpora.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::TextError;

/// A matrix and its labels cut into train and test sides.
#[derive(Debug)]
pub struct SplitData {
    /// Training rows.
    pub train_x: Vec<Vec<f64>>,
    /// Training labels, aligned with `train_x`.
    pub train_y: Vec<usize>,
    /// Held-out rows.
    pub test_x: Vec<Vec<f64>>,
    /// Held-out labels, aligned with `test_x`.
    pub test_y: Vec<usize>,
}

/// Randomly hold out `ceil(n * test_fraction)` rows for testing.
///
/// Row order is shuffled with a seeded generator, so the same seed yields
/// the same partition on the same data.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`TextError::SplitSizeMismatch`] | `x.len() != y.len()` |
/// | [`TextError::InvalidTestFraction`] | fraction outside `(0, 1)` or not finite |
/// | [`TextError::DegenerateSplit`] | either side would end up empty |
pub fn train_test_split(
    x: &[Vec<f64>],
    y: &[usize],
    test_fraction: f64,
    seed: u64,
) -> Result<SplitData, TextError> {
    if x.len() != y.len() {
        return Err(TextError::SplitSizeMismatch {
            rows: x.len(),
            labels: y.len(),
        });
    }
    if !test_fraction.is_finite() || test_fraction <= 0.0 || test_fraction >= 1.0 {
        return Err(TextError::InvalidTestFraction {
            fraction: test_fraction,
        });
    }

    let n = x.len();
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(TextError::DegenerateSplit {
            train_rows: n.saturating_sub(n_test),
            test_rows: n_test,
        });
    }

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for i in (1..n).rev() {
        let j = rng.gen_range(0..=i);
        order.swap(i, j);
    }

    let (test_idx, train_idx) = order.split_at(n_test);
    let split = SplitData {
        train_x: train_idx.iter().map(|&i| x[i].clone()).collect(),
        train_y: train_idx.iter().map(|&i| y[i]).collect(),
        test_x: test_idx.iter().map(|&i| x[i].clone()).collect(),
        test_y: test_idx.iter().map(|&i| y[i]).collect(),
    };
    info!(
        train_rows = split.train_x.len(),
        test_rows = split.test_x.len(),
        "random split done"
    );
    Ok(split)
}

/// Hold out every row whose split value equals `holdout`.
///
/// The original row order is preserved within each side. Useful when the
/// corpus carries a natural partition such as a collection year.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`TextError::SplitSizeMismatch`] | `x.len() != y.len()` |
/// | [`TextError::SplitValueMismatch`] | `x.len() != values.len()` |
/// | [`TextError::DegenerateSplit`] | `holdout` matches no row, or every row |
pub fn split_by_value(
    x: &[Vec<f64>],
    y: &[usize],
    values: &[String],
    holdout: &str,
) -> Result<SplitData, TextError> {
    if x.len() != y.len() {
        return Err(TextError::SplitSizeMismatch {
            rows: x.len(),
            labels: y.len(),
        });
    }
    if x.len() != values.len() {
        return Err(TextError::SplitValueMismatch {
            rows: x.len(),
            values: values.len(),
        });
    }

    let mut split = SplitData {
        train_x: Vec::new(),
        train_y: Vec::new(),
        test_x: Vec::new(),
        test_y: Vec::new(),
    };
    for ((row, &label), value) in x.iter().zip(y).zip(values) {
        if value == holdout {
            split.test_x.push(row.clone());
            split.test_y.push(label);
        } else {
            split.train_x.push(row.clone());
            split.train_y.push(label);
        }
    }

    if split.train_x.is_empty() || split.test_x.is_empty() {
        return Err(TextError::DegenerateSplit {
            train_rows: split.train_x.len(),
            test_rows: split.test_x.len(),
        });
    }
    info!(
        holdout,
        train_rows = split.train_x.len(),
        test_rows = split.test_x.len(),
        "value split done"
    );
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(n: usize) -> (Vec<Vec<f64>>, Vec<usize>) {
        let x = (0..n).map(|i| vec![i as f64]).collect();
        let y = (0..n).map(|i| i % 2).collect();
        (x, y)
    }

    #[test]
    fn fraction_controls_test_size() {
        let (x, y) = matrix(10);
        let split = train_test_split(&x, &y, 0.25, 0).unwrap();
        // ceil(10 * 0.25) = 3 test rows.
        assert_eq!(split.test_x.len(), 3);
        assert_eq!(split.train_x.len(), 7);
        assert_eq!(split.test_y.len(), 3);
        assert_eq!(split.train_y.len(), 7);
    }

    #[test]
    fn rows_stay_aligned_with_labels() {
        let (x, y) = matrix(20);
        let split = train_test_split(&x, &y, 0.3, 9).unwrap();
        for (row, &label) in split.train_x.iter().zip(&split.train_y) {
            assert_eq!(row[0] as usize % 2, label);
        }
        for (row, &label) in split.test_x.iter().zip(&split.test_y) {
            assert_eq!(row[0] as usize % 2, label);
        }
    }

    #[test]
    fn every_row_lands_on_exactly_one_side() {
        let (x, y) = matrix(12);
        let split = train_test_split(&x, &y, 0.5, 4).unwrap();
        let mut seen: Vec<usize> = split
            .train_x
            .iter()
            .chain(&split.test_x)
            .map(|r| r[0] as usize)
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_partition() {
        let (x, y) = matrix(15);
        let a = train_test_split(&x, &y, 0.4, 7).unwrap();
        let b = train_test_split(&x, &y, 0.4, 7).unwrap();
        assert_eq!(a.test_x, b.test_x);
        assert_eq!(a.train_y, b.train_y);

        let c = train_test_split(&x, &y, 0.4, 8).unwrap();
        assert_ne!(a.test_x, c.test_x);
    }

    #[test]
    fn bad_fractions_rejected() {
        let (x, y) = matrix(10);
        for fraction in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let result = train_test_split(&x, &y, fraction, 0);
            assert!(
                matches!(result, Err(TextError::InvalidTestFraction { .. })),
                "fraction {fraction} should be rejected"
            );
        }
    }

    #[test]
    fn single_row_cannot_split() {
        let (x, y) = matrix(1);
        let result = train_test_split(&x, &y, 0.5, 0);
        assert!(matches!(result, Err(TextError::DegenerateSplit { .. })));
    }

    #[test]
    fn length_mismatch_rejected() {
        let (x, _) = matrix(10);
        let result = train_test_split(&x, &[0, 1], 0.25, 0);
        assert!(matches!(
            result,
            Err(TextError::SplitSizeMismatch { rows: 10, labels: 2 })
        ));
    }

    #[test]
    fn value_split_partitions_by_equality() {
        let (x, y) = matrix(6);
        let values: Vec<String> = ["2006", "2008", "2006", "2008", "2006", "2006"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let split = split_by_value(&x, &y, &values, "2008").unwrap();
        assert_eq!(split.test_x.len(), 2);
        assert_eq!(split.train_x.len(), 4);
        // Order within each side follows the original row order.
        assert_eq!(split.test_x[0][0], 1.0);
        assert_eq!(split.test_x[1][0], 3.0);
        assert_eq!(split.train_x[0][0], 0.0);
        assert_eq!(split.train_x[3][0], 5.0);
    }

    #[test]
    fn value_split_requires_both_sides() {
        let (x, y) = matrix(3);
        let values: Vec<String> = vec!["a".into(), "a".into(), "a".into()];
        let all_train = split_by_value(&x, &y, &values, "b");
        assert!(matches!(
            all_train,
            Err(TextError::DegenerateSplit { test_rows: 0, .. })
        ));
        let all_test = split_by_value(&x, &y, &values, "a");
        assert!(matches!(
            all_test,
            Err(TextError::DegenerateSplit { train_rows: 0, .. })
        ));
    }

    #[test]
    fn value_count_mismatch_rejected() {
        let (x, y) = matrix(4);
        let values: Vec<String> = vec!["a".into()];
        let result = split_by_value(&x, &y, &values, "a");
        assert!(matches!(
            result,
            Err(TextError::SplitValueMismatch { rows: 4, values: 1 })
        ));
    }
}
