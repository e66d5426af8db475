use std::cmp::Ordering;

/// Area under the ROC curve via the Mann-Whitney rank statistic.
///
/// Tied scores share their average rank. Returns `None` when the inputs are
/// empty, of unequal length, or contain only one class.
pub fn roc_auc(labels: &[i32], scores: &[f64]) -> Option<f64> {
    if labels.is_empty() || labels.len() != scores.len() {
        return None;
    }

    let n_pos = labels.iter().filter(|&&l| l == 1).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let ranks = average_ranks(scores);
    let positive_rank_sum: f64 = labels
        .iter()
        .zip(&ranks)
        .filter(|(l, _)| **l == 1)
        .map(|(_, r)| r)
        .sum();

    let n_pos = n_pos as f64;
    let u = positive_rank_sum - n_pos * (n_pos + 1.0) / 2.0;
    Some(u / (n_pos * n_neg as f64))
}

/// Share of labels equal to 1.
pub fn positive_rate(labels: &[i32]) -> Option<f64> {
    if labels.is_empty() {
        return None;
    }
    Some(labels.iter().filter(|&&l| l == 1).count() as f64 / labels.len() as f64)
}

/// 1-based ranks in ascending score order; ties get the mean of their ranks.
fn average_ranks(scores: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; scores.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Positions start..end hold ranks start+1..=end.
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_and_inverted_ranking() {
        let labels = [0, 0, 1, 1];
        assert_eq!(roc_auc(&labels, &[0.1, 0.2, 0.8, 0.9]), Some(1.0));
        assert_eq!(roc_auc(&labels, &[0.9, 0.8, 0.2, 0.1]), Some(0.0));
    }

    #[test]
    fn test_ties_count_half() {
        assert_eq!(roc_auc(&[0, 1], &[0.5, 0.5]), Some(0.5));
        // One tied pair out of four positive/negative pairs.
        let auc = roc_auc(&[0, 0, 1, 1], &[0.1, 0.5, 0.5, 0.9]).unwrap();
        assert!((auc - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_known_value() {
        // Pairs (pos, neg): (0.35, 0.1) win, (0.35, 0.4) loss, (0.8, *) wins.
        let auc = roc_auc(&[0, 0, 1, 1], &[0.1, 0.4, 0.35, 0.8]).unwrap();
        assert!((auc - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_undefined_cases() {
        assert_eq!(roc_auc(&[1, 1, 1], &[0.1, 0.2, 0.3]), None);
        assert_eq!(roc_auc(&[], &[]), None);
        assert_eq!(roc_auc(&[0, 1], &[0.1]), None);
    }

    #[test]
    fn test_positive_rate() {
        assert_eq!(positive_rate(&[0, 1, 1, 0]), Some(0.5));
        assert_eq!(positive_rate(&[]), None);
    }
}
