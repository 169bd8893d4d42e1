//! Small numeric helpers shared by the analyzers.

use std::collections::HashMap;
use std::hash::Hash;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max).max(0.0)
}

/// Population variance.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Percentile with linear interpolation between closest ranks.
/// `q` is in [0, 100].
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Threshold for "strictly above the q-th percentile" flags. A lone value is
/// its own threshold, so a one-segment run is never flagged.
pub fn flag_threshold(values: &[f64], q: f64) -> f64 {
    match values {
        [] => 0.0,
        [only] => *only,
        _ => percentile(values, q),
    }
}

/// Shannon entropy (base 2) of a frequency distribution.
pub fn shannon_entropy<I>(counts: I) -> f64
where
    I: IntoIterator<Item = usize>,
{
    let counts: Vec<usize> = counts.into_iter().filter(|&c| c > 0).collect();
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let h: f64 = counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum();
    h.max(0.0)
}

/// Count items, returning counts in first-seen order.
pub fn ordered_counts<T, I>(items: I) -> Vec<(T, usize)>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut index: HashMap<T, usize> = HashMap::new();
    let mut counts: Vec<(T, usize)> = Vec::new();
    for item in items {
        match index.get(&item) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(item.clone(), counts.len());
                counts.push((item, 1));
            }
        }
    }
    counts
}

/// The `n` most common items; ties keep first-seen order.
pub fn most_common<T, I>(items: I, n: usize) -> Vec<(T, usize)>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut counts = ordered_counts(items);
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(n);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_percentile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(percentile(&v, 75.0), 3.25);
        assert_relative_eq!(percentile(&v, 90.0), 3.7);
        assert_relative_eq!(percentile(&v, 0.0), 1.0);
        assert_relative_eq!(percentile(&v, 100.0), 4.0);
    }

    #[test]
    fn test_flag_threshold_single_value_is_itself() {
        assert_eq!(flag_threshold(&[5.0], 75.0), 5.0);
        assert_eq!(flag_threshold(&[], 75.0), 0.0);
        assert_relative_eq!(flag_threshold(&[1.0, 2.0, 3.0, 4.0], 75.0), 3.25);
    }

    #[test]
    fn test_shannon_entropy() {
        assert_eq!(shannon_entropy([4]), 0.0);
        assert_relative_eq!(shannon_entropy([1, 1]), 1.0);
        assert_relative_eq!(shannon_entropy([1, 1, 1, 1]), 2.0);
        assert_eq!(shannon_entropy(Vec::<usize>::new()), 0.0);
    }

    #[test]
    fn test_variance_population() {
        assert_relative_eq!(variance(&[1.0, 3.0]), 1.0);
        assert_eq!(variance(&[]), 0.0);
    }

    #[test]
    fn test_most_common_ties_first_seen() {
        let top = most_common(["b", "a", "a", "c", "b", "d"], 3);
        assert_eq!(top, vec![("b", 2), ("a", 2), ("c", 1)]);
    }

    #[test]
    fn test_max_of_empty_is_zero() {
        assert_eq!(max(&[]), 0.0);
        assert_eq!(max(&[0.2, 0.9, 0.1]), 0.9);
    }
}
