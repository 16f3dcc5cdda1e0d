use ndarray::{Array1, ArrayView1};

const EPSILON: f64 = 1e-12;

/// Population mean and standard deviation; `None` for an empty series.
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let view = ArrayView1::from(values);
    let mean = view.mean()?;
    let std = view.std(0.0);
    Some((mean, std))
}

/// Pearson correlation, `None` when undefined (length < 2 or zero variance).
pub fn pearson(lhs: &[f64], rhs: &[f64]) -> Option<f64> {
    if lhs.len() != rhs.len() || lhs.len() < 2 {
        return None;
    }
    let x = ArrayView1::from(lhs);
    let y = ArrayView1::from(rhs);
    let dx = &x - x.mean()?;
    let dy = &y - y.mean()?;
    let denom = (dx.dot(&dx) * dy.dot(&dy)).sqrt();
    if !denom.is_finite() || denom < EPSILON {
        return None;
    }
    Some((dx.dot(&dy) / denom).clamp(-1.0, 1.0))
}

/// Linearly interpolate `series` onto `target_len` evenly spaced points
/// spanning the same index range.
pub fn interpolate_to_len(series: &[f64], target_len: usize) -> Vec<f64> {
    match (target_len, series.len()) {
        (0, _) | (_, 0) => Vec::new(),
        (count, len) if count == len => series.to_vec(),
        (count, 1) => vec![series[0]; count],
        (1, _) => vec![series[0]],
        (count, len) => Array1::linspace(0.0, (len - 1) as f64, count)
            .iter()
            .map(|&position| {
                let lower = (position.floor() as usize).min(len - 1);
                let upper = (lower + 1).min(len - 1);
                let weight = position - lower as f64;
                series[lower] * (1.0 - weight) + series[upper] * weight
            })
            .collect(),
    }
}

/// Percentile with linear interpolation between closest ranks.
pub fn percentile(values: &[f64], percent: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (percent.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
}

pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64).sqrt()
}
