use aus::analysis;
use tracing::debug;

use crate::audio::resample;
use crate::config::{IntonationConfig, PitchMethod};
use crate::error::Result;
use crate::types::Signal;

const OCTAVE_COST: f64 = 0.01;
const PERIODS_PER_WINDOW: f64 = 3.0;

const PYIN_FREQ_MIN: f64 = 55.0;
const PYIN_FREQ_MAX: f64 = 1200.0;
const PYIN_FRAME_MS: usize = 25;
// Transition matrix width for a quarter-frame hop at 0.1 semitone bins.
const PYIN_MIN_PITCH_BINS: f64 = 31.0;

/// Voiced F0 values (Hz) at a fixed step; unvoiced frames are omitted.
pub fn extract_pitch_track(signal: &Signal, config: &IntonationConfig) -> Result<Vec<f64>> {
    if signal.is_empty() {
        return Ok(Vec::new());
    }
    let (samples, rate) = resample::downsample_to_at_most(
        &signal.samples,
        signal.sample_rate,
        config.max_analysis_rate,
    )?;
    let track = match config.method {
        PitchMethod::Autocorrelation => autocorrelation_track(&samples, rate, config),
        PitchMethod::Pyin => pyin_track(&samples, rate, config),
    };
    debug!(
        method = ?config.method,
        voiced_frames = track.len(),
        sample_rate = rate,
        "extracted pitch track"
    );
    Ok(track)
}

fn pyin_track(samples: &[f32], rate: u32, config: &IntonationConfig) -> Vec<f64> {
    let Some(frame_len) = pyin_frame_length(rate) else {
        debug!(sample_rate = rate, "sample rate too low for pYIN; no pitch track");
        return Vec::new();
    };
    if samples.len() < frame_len {
        debug!(
            samples = samples.len(),
            frame_len,
            "clip shorter than one pYIN frame; no pitch track"
        );
        return Vec::new();
    }
    let audio: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
    let (_timestamps, pitches, voiced_flags, _confidence) = analysis::pyin_pitch_estimator(
        &audio,
        rate,
        PYIN_FREQ_MIN,
        pyin_freq_max(rate),
        frame_len,
    );
    let range = config.pitch_floor_hz..=config.pitch_ceiling_hz;
    pitches
        .iter()
        .zip(voiced_flags.iter())
        .filter_map(|(&pitch, &voiced)| {
            (voiced && pitch.is_finite() && range.contains(&pitch)).then_some(pitch)
        })
        .collect()
}

fn pyin_freq_max(rate: u32) -> f64 {
    PYIN_FREQ_MAX.min(rate as f64 / 2.0)
}

/// 25 ms frames, or `None` when pYIN cannot be configured at this rate.
///
/// With a half-frame autocorrelation window the longest period searched is
/// `frame_len / 2 - 1`, which keeps every candidate above `PYIN_FREQ_MIN`.
fn pyin_frame_length(rate: u32) -> Option<usize> {
    let frame_len = (rate as usize * PYIN_FRAME_MS) / 1000;
    let min_period = ((rate as f64 / pyin_freq_max(rate)).floor() as usize).max(1);
    let max_period = (frame_len - frame_len / 2).checked_sub(1)?;
    let pitch_bins = 120.0 * (pyin_freq_max(rate) / PYIN_FREQ_MIN).log2();
    let feasible = frame_len >= 4
        && max_period >= min_period + 2
        && pyin_freq_max(rate) > PYIN_FREQ_MIN
        && pitch_bins >= PYIN_MIN_PITCH_BINS;
    feasible.then_some(frame_len)
}

fn window_samples(rate: u32, pitch_floor_hz: f64) -> usize {
    ((PERIODS_PER_WINDOW / pitch_floor_hz) * rate as f64).round().max(2.0) as usize
}

/// Normalized-autocorrelation tracker: Hann-windowed frames, correlation
/// corrected for the window's own autocorrelation, a small octave cost in
/// favour of higher candidates, and parabolic refinement of the best lag.
fn autocorrelation_track(samples: &[f32], rate: u32, config: &IntonationConfig) -> Vec<f64> {
    let window_len = window_samples(rate, config.pitch_floor_hz);
    let step = ((config.time_step_ms / 1000.0) * rate as f64).round().max(1.0) as usize;
    if samples.len() < window_len {
        return Vec::new();
    }

    let min_lag = ((rate as f64 / config.pitch_ceiling_hz).floor() as usize).max(2);
    let max_lag = ((rate as f64 / config.pitch_floor_hz).ceil() as usize).min(window_len - 1);
    if min_lag + 1 >= max_lag {
        return Vec::new();
    }

    let window = hann(window_len);
    let window_ac = autocorrelate(&window, max_lag + 1);
    let global_peak = samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs())) as f64;
    if global_peak <= 0.0 {
        return Vec::new();
    }

    let mut track = Vec::new();
    let mut frame = vec![0.0; window_len];
    let mut start = 0;
    while start + window_len <= samples.len() {
        let raw = &samples[start..start + window_len];
        let local_peak = raw.iter().fold(0.0_f32, |acc, s| acc.max(s.abs())) as f64;
        if local_peak >= config.silence_threshold * global_peak {
            let mean = raw.iter().map(|&s| s as f64).sum::<f64>() / window_len as f64;
            for ((dst, &src), &w) in frame.iter_mut().zip(raw).zip(&window) {
                *dst = (src as f64 - mean) * w;
            }
            if let Some(f0) = best_candidate(&frame, &window_ac, min_lag, max_lag, rate, config) {
                track.push(f0);
            }
        }
        start += step;
    }
    track
}

fn best_candidate(
    frame: &[f64],
    window_ac: &[f64],
    min_lag: usize,
    max_lag: usize,
    rate: u32,
    config: &IntonationConfig,
) -> Option<f64> {
    let ac = autocorrelate(frame, max_lag + 2);
    if ac[0] <= 0.0 {
        return None;
    }
    let normalized = |lag: usize| {
        if window_ac[lag.min(window_ac.len() - 1)] <= 0.0 {
            0.0
        } else {
            (ac[lag] / ac[0]) / (window_ac[lag.min(window_ac.len() - 1)] / window_ac[0])
        }
    };

    let mut best: Option<(f64, f64)> = None;
    for lag in min_lag..max_lag {
        let (prev, here, next) = (normalized(lag - 1), normalized(lag), normalized(lag + 1));
        if here < prev || here < next || here < config.voicing_threshold {
            continue;
        }
        let denom = prev - 2.0 * here + next;
        let offset = if denom.abs() > f64::EPSILON {
            (0.5 * (prev - next) / denom).clamp(-0.5, 0.5)
        } else {
            0.0
        };
        let f0 = rate as f64 / (lag as f64 + offset);
        if f0 < config.pitch_floor_hz || f0 > config.pitch_ceiling_hz {
            continue;
        }
        let strength = here - OCTAVE_COST * (config.pitch_floor_hz / f0).log2();
        if best.map_or(true, |(score, _)| strength > score) {
            best = Some((strength, f0));
        }
    }
    best.map(|(_, f0)| f0)
}

fn autocorrelate(x: &[f64], lags: usize) -> Vec<f64> {
    (0..lags)
        .map(|lag| {
            if lag >= x.len() {
                return 0.0;
            }
            x[..x.len() - lag]
                .iter()
                .zip(&x[lag..])
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

fn hann(len: usize) -> Vec<f64> {
    let denom = (len - 1).max(1) as f64;
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / denom).cos())
        .collect()
}
