/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Quantile of already-sorted values, interpolating linearly between the
/// closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Five-number summary for a box plot. Whiskers reach the most extreme values
/// inside the 1.5·IQR fences; anything beyond them is an outlier.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<BoxStats> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25)?;
        let median = quantile(&sorted, 0.5)?;
        let q3 = quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;
        let (low_fence, high_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let (inside, outliers): (Vec<f64>, Vec<f64>) = sorted
            .iter()
            .partition(|v| (low_fence..=high_fence).contains(*v));
        let lower_whisker = inside.first().copied().unwrap_or(q1);
        let upper_whisker = inside.last().copied().unwrap_or(q3);

        Some(BoxStats {
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
            outliers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_three() {
        assert_eq!(mean(&[3.0, 4.0, 5.0]), Some(4.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn quantiles_interpolate() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&v, 0.0), Some(1.0));
        assert_eq!(quantile(&v, 0.5), Some(2.5));
        assert_eq!(quantile(&v, 0.25), Some(1.75));
        assert_eq!(quantile(&v, 1.0), Some(4.0));
    }

    #[test]
    fn box_stats_flag_outliers() {
        let stats = BoxStats::from_values(&[3.0, 3.5, 4.0, 4.0, 4.5, 0.5]).unwrap();
        assert_eq!(stats.outliers, vec![0.5]);
        assert_eq!(stats.lower_whisker, 3.0);
        assert_eq!(stats.upper_whisker, 4.5);
        assert!(stats.q1 <= stats.median && stats.median <= stats.q3);
    }

    #[test]
    fn single_value_box_collapses() {
        let stats = BoxStats::from_values(&[4.2]).unwrap();
        assert_eq!(stats.q1, 4.2);
        assert_eq!(stats.upper_whisker, 4.2);
        assert!(stats.outliers.is_empty());
        assert!(BoxStats::from_values(&[]).is_none());
    }
}
