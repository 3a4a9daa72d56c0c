/// Descriptive statistics over a score vector.

/// Mean, population standard deviation and per-element z-scores.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZScores {
    pub mean: f64,
    pub std_dev: f64,
    /// Same order as the input.
    pub z_scores: Vec<f64>,
}

/// Compute z-scores using the population standard deviation (divide by N).
///
/// When every value is identical the standard deviation is 0 and every
/// z-score is defined as 0. An empty input yields mean 0, std dev 0 and no
/// z-scores.
pub fn compute_z_scores(scores: &[f64]) -> ZScores {
    if scores.is_empty() {
        return ZScores {
            mean: 0.0,
            std_dev: 0.0,
            z_scores: Vec::new(),
        };
    }

    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let variance = scores.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    let z_scores = scores
        .iter()
        .map(|v| if std_dev == 0.0 { 0.0 } else { (v - mean) / std_dev })
        .collect();

    ZScores {
        mean,
        std_dev,
        z_scores,
    }
}

/// Convenience for integer score vectors.
pub fn compute_z_scores_i64(scores: &[i64]) -> ZScores {
    let as_f64: Vec<f64> = scores.iter().map(|&s| s as f64).collect();
    compute_z_scores(&as_f64)
}
