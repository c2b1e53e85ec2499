/*!
Turning raw class scores into a human-readable verdict.
*/

use crate::error::PostprocessError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a score vector is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Postprocessing {
    /// The highest raw score wins and is reported as-is, with one
    /// decimal.
    Argmax,

    /// Scores are logits; they're normalized with a softmax and the
    /// winning probability is reported with two decimals.
    Softmax,
}

impl Postprocessing {
    /// Interpret `scores` against the positionally aligned `labels`.
    pub fn apply(&self, scores: &[f32], labels: &[String]) -> Result<Prediction, PostprocessError> {
        if scores.len() != labels.len() {
            return Err(PostprocessError::LabelMismatch {
                scores: scores.len(),
                labels: labels.len(),
            });
        }

        let index = argmax(scores).ok_or(PostprocessError::NoScores)?;
        let confidence = match self {
            Postprocessing::Argmax => scores[index],
            Postprocessing::Softmax => softmax(scores)[index],
        };

        Ok(Prediction {
            index,
            label: labels[index].clone(),
            confidence,
            strategy: *self,
        })
    }
}

/// Index of the highest score. Ties go to the earliest index and NaNs
/// never win.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }

        match best {
            Some(b) if *score <= scores[b] => {}
            _ => best = Some(idx),
        }
    }

    best
}

/// Normalize logits into a probability distribution.
///
/// The maximum is subtracted before exponentiating, so large logits
/// don't overflow to infinity. When the maximum itself is infinite the
/// entries equal to it split the whole mass.
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores
        .iter()
        .copied()
        .filter(|s| !s.is_nan())
        .fold(f32::NEG_INFINITY, f32::max);

    if max.is_infinite() {
        let top = scores.iter().filter(|s| **s == max).count() as f32;
        return scores
            .iter()
            .map(|s| if *s == max { 1.0 / top } else { 0.0 })
            .collect();
    }

    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().filter(|e| !e.is_nan()).sum();

    exps.into_iter().map(|e| e / sum).collect()
}

/// The outcome of one classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Position of the winning class in the label table.
    pub index: usize,
    pub label: String,

    /// Raw score or probability of the winning class, depending on
    /// `strategy`. Usually in `[0, 1]`.
    pub confidence: f32,
    pub strategy: Postprocessing,
}

impl Prediction {
    /// Confidence scaled to a percentage.
    pub fn percent(&self) -> f32 {
        self.confidence * 100.0
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.strategy {
            Postprocessing::Argmax => write!(f, "{} (prob: {:.1}%)", self.label, self.percent()),
            Postprocessing::Softmax => write!(f, "{} ({:.2}%)", self.label, self.percent()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn two_class() -> Vec<String> {
        labels(&["No lesion", "Lesion detected"])
    }

    #[test]
    fn argmax_higher_wins() {
        let p = Postprocessing::Argmax
            .apply(&[0.127, 0.873], &two_class())
            .unwrap();
        assert_eq!(p.index, 1);
        assert_eq!(p.to_string(), "Lesion detected (prob: 87.3%)");

        let p = Postprocessing::Argmax
            .apply(&[0.6, 0.4], &two_class())
            .unwrap();
        assert_eq!(p.index, 0);
        assert_eq!(p.to_string(), "No lesion (prob: 60.0%)");
    }

    #[test]
    fn argmax_tie_goes_to_first() {
        for value in [0.5, -3.0, 0.0, 12.0] {
            let p = Postprocessing::Argmax
                .apply(&[value, value], &two_class())
                .unwrap();
            assert_eq!(p.label, "No lesion");
        }
    }

    #[test]
    fn argmax_reports_raw_score() {
        let p = Postprocessing::Argmax
            .apply(&[-1.5, 2.25], &two_class())
            .unwrap();
        assert_eq!(p.to_string(), "Lesion detected (prob: 225.0%)");
    }

    #[test]
    fn argmax_skips_nan() {
        assert_eq!(argmax(&[f32::NAN, 0.1, 0.05]), Some(1));
        assert_eq!(argmax(&[f32::NAN, f32::NAN]), None);
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn softmax_sums_to_one() {
        let cases: [&[f32]; 4] = [
            &[0.0; 14],
            &[1.0, 2.0, 3.0, -4.0, 0.5, 0.25, 7.0, -1.0, 0.0, 3.3, 2.2, 1.1, 0.9, -9.0],
            &[-20.0, 20.0],
            &[1000.0, 1001.0, 999.0],
        ];

        for scores in cases {
            let probs = softmax(scores);
            let sum: f32 = probs.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "sum {} for {:?}", sum, scores);
            assert!(probs.iter().all(|p| p.is_finite() && *p >= 0.0));
        }
    }

    #[test]
    fn softmax_preserves_argmax() {
        let scores = [0.3, -1.0, 4.5, 4.4, 0.0, 2.0, 1.0, 3.0, -2.0, 0.1, 0.2, 0.3, 0.4, 0.5];
        let names: Vec<String> = (0..14).map(|i| format!("class {}", i)).collect();

        let p = Postprocessing::Softmax.apply(&scores, &names).unwrap();
        assert_eq!(Some(p.index), argmax(&scores));
        assert_eq!(argmax(&softmax(&scores)), argmax(&scores));
        assert_eq!(p.label, "class 2");
    }

    #[test]
    fn softmax_formats_two_decimals() {
        let p = Postprocessing::Softmax
            .apply(&[0.0, 0.0, 0.0, 0.0], &labels(&["a", "b", "c", "d"]))
            .unwrap();
        assert_eq!(p.to_string(), "a (25.00%)");
    }

    #[test]
    fn softmax_handles_infinite_logits() {
        assert_eq!(softmax(&[f32::INFINITY, 0.0]), vec![1.0, 0.0]);
        assert_eq!(
            softmax(&[f32::INFINITY, 2.0, f32::INFINITY, f32::NAN]),
            vec![0.5, 0.0, 0.5, 0.0]
        );
        assert_eq!(
            softmax(&[f32::NEG_INFINITY, f32::NEG_INFINITY]),
            vec![0.5, 0.5]
        );

        let p = Postprocessing::Softmax
            .apply(&[f32::INFINITY, 0.0], &labels(&["a", "b"]))
            .unwrap();
        assert_eq!(p.to_string(), "a (100.00%)");
    }

    #[test]
    fn label_table_must_match() {
        let err = Postprocessing::Softmax
            .apply(&[0.1, 0.2, 0.3], &two_class())
            .unwrap_err();
        assert_eq!(
            err,
            PostprocessError::LabelMismatch {
                scores: 3,
                labels: 2
            }
        );
    }
}
