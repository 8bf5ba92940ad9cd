use serde::Serialize;

/// Statistical distribution for a single metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDistribution {
    /// Number of data points (functions, files)
    pub count: usize,
    pub mean: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub max: f64,
}

impl MetricDistribution {
    /// Compute distribution from a list of values. Returns `None` when empty.
    pub fn from_values(values: &mut [f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;

        Some(Self {
            count: n,
            mean,
            p50: percentile(values, 50.0),
            p75: percentile(values, 75.0),
            p90: percentile(values, 90.0),
            p95: percentile(values, 95.0),
            max: *values.last().unwrap_or(&0.0),
        })
    }
}

fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (pct / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution() {
        let mut values: Vec<f64> = (1..=10).rev().map(|v| v as f64).collect();
        let d = MetricDistribution::from_values(&mut values).unwrap();
        assert_eq!(d.count, 10);
        assert_eq!(d.mean, 5.5);
        assert_eq!(d.max, 10.0);
        // index round(0.5 * 9) = 5 (rounds half away from zero)
        assert_eq!(d.p50, 6.0);
        assert_eq!(d.p90, 9.0);
    }

    #[test]
    fn test_empty_distribution() {
        assert!(MetricDistribution::from_values(&mut []).is_none());
    }
}
