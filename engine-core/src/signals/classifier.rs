use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Two-threshold tercile classifier: `theta_1 > theta_2 > 0`.
/// `|value| > theta_1 => HIGH`, `theta_2 < |value| <= theta_1 => MEDIUM`,
/// else `LOW`. Recalibration (percentile-based, on a schedule) must not
/// change the thresholds mid-execution of an order — callers recalibrate
/// between trading-loop iterations, never inside one.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    theta_1: f64,
    theta_2: f64,
}

impl Default for Classifier {
    fn default() -> Self {
        Self { theta_1: 0.45, theta_2: 0.25 }
    }
}

impl Classifier {
    pub fn new(theta_1: f64, theta_2: f64) -> Self {
        assert!(theta_1 > theta_2 && theta_2 > 0.0, "classifier requires theta_1 > theta_2 > 0");
        Self { theta_1, theta_2 }
    }

    pub fn classify(&self, value: f64) -> Confidence {
        let magnitude = value.abs();
        if magnitude > self.theta_1 {
            Confidence::High
        } else if magnitude > self.theta_2 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    /// 90th/70th percentile recalibration from a vector of `|value|`
    /// observations; requires at least 100 samples.
    pub fn recalibrate(samples: &[f64]) -> Option<Self> {
        if samples.len() < 100 {
            return None;
        }
        let mut sorted: Vec<f64> = samples.iter().map(|v| v.abs()).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let theta_1 = percentile(&sorted, 0.90);
        let theta_2 = percentile(&sorted, 0.70);
        if theta_1 > theta_2 && theta_2 > 0.0 {
            Some(Self { theta_1, theta_2 })
        } else {
            None
        }
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    let idx = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_exactly_three_bands() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(0.60), Confidence::High);
        assert_eq!(classifier.classify(0.30), Confidence::Medium);
        assert_eq!(classifier.classify(0.10), Confidence::Low);
        assert_eq!(classifier.classify(-0.60), Confidence::High);
    }

    #[test]
    #[should_panic]
    fn rejects_inverted_thresholds() {
        Classifier::new(0.2, 0.4);
    }

    #[test]
    fn recalibrate_needs_min_sample_size() {
        let samples: Vec<f64> = vec![0.5; 50];
        assert!(Classifier::recalibrate(&samples).is_none());
    }
}
