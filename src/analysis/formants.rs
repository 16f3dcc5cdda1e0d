//! Short-time F1/F2 tracking with autocorrelation LPC.
//!
//! The signal is resampled so that its Nyquist frequency equals the formant
//! ceiling, pre-emphasised, and analysed in Hamming-windowed frames centred on
//! each time step. Formants are the peaks of the LPC spectral envelope.

use std::f64::consts::PI;

use crate::audio::resample;
use crate::config::PronunciationConfig;
use crate::error::{AnalysisError, Result};
use crate::types::{FormantPoint, Signal, VowelSpan};

const MIN_FORMANT_HZ: f64 = 90.0;
const ENVELOPE_BINS: usize = 512;

/// A signal prepared once for repeated formant queries.
#[derive(Debug, Clone)]
pub struct FormantTracker {
    samples: Vec<f64>,
    sample_rate: u32,
    config: PronunciationConfig,
}

impl FormantTracker {
    pub fn new(signal: &Signal, config: &PronunciationConfig) -> Result<Self> {
        let target_rate = (2.0 * config.max_formant_hz).round() as u32;
        if target_rate == 0 {
            return Err(AnalysisError::malformed("formant ceiling must be positive"));
        }
        let resampled = if signal.sample_rate == target_rate {
            signal.samples.to_vec()
        } else {
            resample::linear_resample(&signal.samples, signal.sample_rate, target_rate)?
        };
        Ok(Self {
            samples: pre_emphasis(&resampled, target_rate, config.pre_emphasis_hz),
            sample_rate: target_rate,
            config: config.clone(),
        })
    }

    /// Formant points at each time step in `[span.start, span.end)`.
    ///
    /// Frames without two envelope peaks are omitted.
    pub fn trajectory(&self, span: &VowelSpan) -> Vec<FormantPoint> {
        let step = self.config.time_step_ms / 1000.0;
        let steps = ((span.duration() / step) - 1e-9).ceil().max(0.0) as usize;
        let window = hamming(self.window_len());
        (0..steps)
            .filter_map(|i| {
                let time = span.start + i as f64 * step;
                let frame = self.frame_at(time, &window)?;
                let (f1_hz, f2_hz) = self.first_two_formants(&frame)?;
                Some(FormantPoint { time, f1_hz, f2_hz })
            })
            .collect()
    }

    fn window_len(&self) -> usize {
        ((self.config.window_ms / 1000.0) * self.sample_rate as f64).round() as usize
    }

    fn frame_at(&self, time: f64, window: &[f64]) -> Option<Vec<f64>> {
        let len = window.len();
        let centre = (time * self.sample_rate as f64).round() as isize;
        let first = centre - (len / 2) as isize;
        let frame: Vec<f64> = window
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let index = first + i as isize;
                if index < 0 {
                    0.0
                } else {
                    self.samples.get(index as usize).map_or(0.0, |s| s * w)
                }
            })
            .collect();
        let energy: f64 = frame.iter().map(|x| x * x).sum();
        (energy > 1e-12 && len > self.config.lpc_order).then_some(frame)
    }

    fn first_two_formants(&self, frame: &[f64]) -> Option<(f64, f64)> {
        let order = self.config.lpc_order;
        let r = autocorrelation(frame, order);
        let (coefficients, error) = levinson_durbin(&r, order);
        if error <= 0.0 {
            return None;
        }
        let envelope = lpc_spectral_envelope(&coefficients, ENVELOPE_BINS);
        let nyquist = self.sample_rate as f64 / 2.0;
        let mut peaks = envelope_peaks(&envelope)
            .into_iter()
            .map(|bin| bin * nyquist / ENVELOPE_BINS as f64)
            .filter(|&hz| hz > MIN_FORMANT_HZ);
        Some((peaks.next()?, peaks.next()?))
    }
}

/// First-order pre-emphasis above `from_hz`.
fn pre_emphasis(samples: &[f32], sample_rate: u32, from_hz: f64) -> Vec<f64> {
    let alpha = (-2.0 * PI * from_hz / sample_rate as f64).exp();
    let mut previous = 0.0;
    samples
        .iter()
        .map(|&s| {
            let current = s as f64;
            let emphasised = current - alpha * previous;
            previous = current;
            emphasised
        })
        .collect()
}

fn hamming(len: usize) -> Vec<f64> {
    let denom = len.saturating_sub(1).max(1) as f64;
    (0..len)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos())
        .collect()
}

fn autocorrelation(x: &[f64], order: usize) -> Vec<f64> {
    let n = x.len();
    (0..=order)
        .map(|lag| {
            if lag >= n {
                return 0.0;
            }
            (0..n - lag).map(|i| x[i] * x[i + lag]).sum()
        })
        .collect()
}

/// Returns `(a, prediction_error)` with `a[0] = 1`.
fn levinson_durbin(r: &[f64], order: usize) -> (Vec<f64>, f64) {
    let mut a = vec![0.0; order + 1];
    let mut a_prev = vec![0.0; order + 1];
    a[0] = 1.0;
    a_prev[0] = 1.0;

    let mut error = r[0];
    if error.abs() < 1e-30 {
        return (a, 0.0);
    }

    for i in 1..=order {
        let mut lambda = 0.0;
        for j in 0..i {
            lambda -= a_prev[j] * r[i - j];
        }
        lambda = (lambda / error).clamp(-0.999, 0.999);

        for j in 0..=i {
            a[j] = a_prev[j] + lambda * a_prev[i - j];
        }

        error *= 1.0 - lambda * lambda;
        if error.abs() < 1e-30 {
            break;
        }
        a_prev[..=i].copy_from_slice(&a[..=i]);
    }
    (a, error)
}

/// |1 / A(e^jw)| sampled at `bins` points over `[0, π)`.
fn lpc_spectral_envelope(a: &[f64], bins: usize) -> Vec<f64> {
    (0..bins)
        .map(|k| {
            let omega = PI * k as f64 / bins as f64;
            let (re, im) = a.iter().enumerate().fold((0.0, 0.0), |(re, im), (i, &c)| {
                (re + c * (omega * i as f64).cos(), im - c * (omega * i as f64).sin())
            });
            let magnitude = (re * re + im * im).sqrt();
            if magnitude > 1e-15 {
                1.0 / magnitude
            } else {
                1e15
            }
        })
        .collect()
}

/// Fractional bin positions of local maxima, refined by parabolic fit.
fn envelope_peaks(envelope: &[f64]) -> Vec<f64> {
    envelope
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] >= w[2])
        .map(|(i, w)| {
            let denom = w[0] - 2.0 * w[1] + w[2];
            let offset = if denom.abs() > f64::EPSILON {
                (0.5 * (w[0] - w[2]) / denom).clamp(-0.5, 0.5)
            } else {
                0.0
            };
            (i + 1) as f64 + offset
        })
        .collect()
}
