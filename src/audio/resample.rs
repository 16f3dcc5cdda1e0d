use crate::error::{AnalysisError, Result};

/// Linearly resample `samples` from `source_rate` to `target_rate`.
pub fn linear_resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    if source_rate == 0 || target_rate == 0 {
        return Err(AnalysisError::malformed(format!(
            "cannot resample from {source_rate} Hz to {target_rate} Hz"
        )));
    }
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples.to_vec());
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = ((samples.len() as f64) * ratio).ceil().max(1.0) as usize;
    let last_index = samples.len() - 1;
    let output = (0..output_len)
        .map(|i| {
            let position = i as f64 / ratio;
            let left = (position.floor() as usize).min(last_index);
            let right = (left + 1).min(last_index);
            let t = (position - left as f64) as f32;
            samples[left] * (1.0 - t) + samples[right] * t
        })
        .collect();
    Ok(output)
}

/// Resample to `ceiling` only when the source rate is above it.
pub fn downsample_to_at_most(
    samples: &[f32],
    source_rate: u32,
    ceiling: u32,
) -> Result<(Vec<f32>, u32)> {
    if source_rate <= ceiling {
        return Ok((samples.to_vec(), source_rate));
    }
    Ok((linear_resample(samples, source_rate, ceiling)?, ceiling))
}

#[cfg(test)]
mod tests {
    use super::{downsample_to_at_most, linear_resample};

    #[test]
    fn preserves_constant_signal_after_resample() {
        let input = vec![0.5; 480];
        let resampled = linear_resample(&input, 48_000, 16_000).unwrap();
        assert_eq!(resampled.len(), 160);
        assert!(resampled.iter().all(|&sample| (sample - 0.5).abs() < 1e-6));
    }

    #[test]
    fn rejects_zero_rate() {
        assert!(linear_resample(&[0.0; 4], 0, 16_000).is_err());
    }

    #[test]
    fn leaves_low_rate_audio_untouched() {
        let (samples, rate) = downsample_to_at_most(&[0.1, 0.2], 8_000, 16_000).unwrap();
        assert_eq!(rate, 8_000);
        assert_eq!(samples, vec![0.1, 0.2]);
    }
}
