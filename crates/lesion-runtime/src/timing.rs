use std::time::Duration;

/// Running mean and variance of prediction latency.
///
/// Uses Welford's online algorithm, so no samples are stored. The
/// variance is unstable for the first handful of samples.
#[derive(Debug, Clone, Default)]
pub struct LatencyStats {
    mean: f32,
    mean2: f32,

    count: usize,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, elapsed: Duration) {
        let value = elapsed.as_secs_f32() * 1000.0;

        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / (self.count as f32);

        let delta2 = value - self.mean;
        self.mean2 += delta * delta2;
    }

    /// Number of samples recorded.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> Option<Duration> {
        (self.count > 0).then(|| Duration::from_secs_f32(self.mean.max(0.0) / 1000.0))
    }

    /// Sample standard deviation; needs at least two samples.
    pub fn std_dev(&self) -> Option<Duration> {
        if self.count < 2 {
            return None;
        }

        let variance = self.mean2 / (self.count - 1) as f32;
        Some(Duration::from_secs_f32(variance.max(0.0).sqrt() / 1000.0))
    }
}

#[cfg(test)]
mod tests {
    use super::LatencyStats;
    use std::time::Duration;

    fn is_close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1.0e-4
    }

    fn stats_from(values: impl IntoIterator<Item = f32>) -> LatencyStats {
        let mut stats = LatencyStats::new();
        for v in values {
            stats.add(Duration::from_secs_f32(v));
        }
        stats
    }

    #[test]
    fn empty_has_no_mean() {
        let stats = LatencyStats::new();
        assert_eq!(stats.count(), 0);
        assert!(stats.mean().is_none());
        assert!(stats.std_dev().is_none());
    }

    #[test]
    fn initial_mean_initial_value() {
        let stats = stats_from([1.0]);
        assert!(is_close(stats.mean().unwrap().as_secs_f32(), 1.0));
        assert!(stats.std_dev().is_none());
    }

    #[test]
    fn mean_no_diverge() {
        let stats = stats_from(std::iter::repeat(1.0).take(11));

        assert!(is_close(stats.mean().unwrap().as_secs_f32(), 1.0));
        assert!(is_close(stats.std_dev().unwrap().as_secs_f32(), 0.0));
    }

    #[test]
    fn mean_converge() {
        let stats = stats_from((0..10).map(|v| v as f32));
        assert!(is_close(stats.mean().unwrap().as_secs_f32(), 4.5));
    }

    #[test]
    fn mean_converge2() {
        let stats = stats_from((0..100).map(|v| v as f32));
        assert!(is_close(stats.mean().unwrap().as_secs_f32(), 49.5));
    }

    #[test]
    fn std_dev_matches_two_pass() {
        let values = [0.010, 0.012, 0.009, 0.015, 0.011];
        let stats = stats_from(values);

        let mean = values.iter().sum::<f32>() / values.len() as f32;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / (values.len() - 1) as f32;

        assert!(is_close(stats.std_dev().unwrap().as_secs_f32(), var.sqrt()));
    }
}
