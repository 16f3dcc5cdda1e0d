#![allow(dead_code)]

use std::f64::consts::PI;
use std::path::Path;

use lectorcmp::Signal;

pub const SAMPLE_RATE: u32 = 16_000;

/// Deterministic uniform noise in `[-amplitude, amplitude]`.
pub fn noise(seconds: f64, amplitude: f64, seed: u64) -> Vec<f32> {
    let mut state = seed.wrapping_mul(2_862_933_555_777_941_757).wrapping_add(3_037_000_493);
    (0..samples_for(seconds))
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            let unit = (state >> 33) as f64 / (1u64 << 31) as f64;
            ((unit * 2.0 - 1.0) * amplitude) as f32
        })
        .collect()
}

pub fn sine(freq: f64, seconds: f64, amplitude: f64) -> Vec<f32> {
    (0..samples_for(seconds))
        .map(|i| (amplitude * (2.0 * PI * freq * i as f64 / SAMPLE_RATE as f64).sin()) as f32)
        .collect()
}

/// Linear pitch glide from `from_hz` to `to_hz`.
pub fn glide(from_hz: f64, to_hz: f64, seconds: f64, amplitude: f64) -> Vec<f32> {
    let n = samples_for(seconds);
    let mut phase = 0.0;
    (0..n)
        .map(|i| {
            let freq = from_hz + (to_hz - from_hz) * i as f64 / n as f64;
            phase += 2.0 * PI * freq / SAMPLE_RATE as f64;
            (amplitude * phase.sin()) as f32
        })
        .collect()
}

/// Two steady "formant" partials with a little noise on top.
pub fn vowel(seconds: f64, amplitude: f64, seed: u64) -> Vec<f32> {
    let low = sine(500.0, seconds, amplitude * 0.7);
    let high = sine(1_500.0, seconds, amplitude * 0.3);
    let hiss = noise(seconds, 0.01, seed);
    low.iter()
        .zip(&high)
        .zip(&hiss)
        .map(|((a, b), c)| a + b + c)
        .collect()
}

/// A 120 Hz pulse train through two resonators whose centre frequencies
/// glide linearly from `f1[0]`/`f2[0]` to `f1[1]`/`f2[1]`.
pub fn formant_vowel(f1: [f64; 2], f2: [f64; 2], seconds: f64, amplitude: f64) -> Vec<f32> {
    let n = samples_for(seconds);
    let period = SAMPLE_RATE as usize / 120;
    let mut first = Resonator::new(80.0);
    let mut second = Resonator::new(100.0);
    let voiced: Vec<f64> = (0..n)
        .map(|i| {
            let progress = i as f64 / n.max(1) as f64;
            let pulse = if i % period == 0 { 1.0 } else { 0.0 };
            let low = first.step(pulse, f1[0] + (f1[1] - f1[0]) * progress);
            second.step(low, f2[0] + (f2[1] - f2[0]) * progress)
        })
        .collect();
    let peak = voiced.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())).max(1e-12);
    voiced
        .iter()
        .map(|v| (amplitude * v / peak) as f32)
        .collect()
}

struct Resonator {
    bandwidth: f64,
    y1: f64,
    y2: f64,
}

impl Resonator {
    fn new(bandwidth: f64) -> Self {
        Self {
            bandwidth,
            y1: 0.0,
            y2: 0.0,
        }
    }

    fn step(&mut self, input: f64, freq: f64) -> f64 {
        let rate = SAMPLE_RATE as f64;
        let r = (-PI * self.bandwidth / rate).exp();
        let theta = 2.0 * PI * freq / rate;
        let out = input + 2.0 * r * theta.cos() * self.y1 - r * r * self.y2;
        self.y2 = self.y1;
        self.y1 = out;
        out
    }
}

pub fn concat(parts: &[Vec<f32>]) -> Vec<f32> {
    parts.concat()
}

pub fn signal(samples: Vec<f32>) -> Signal {
    Signal::new(samples, SAMPLE_RATE)
}

/// Consonant-like noise around three vowels with the given amplitudes.
///
/// Layout: 0.1 s noise, then (0.15 s vowel, 0.1 s noise) three times: 0.85 s.
pub fn three_vowel_word(amplitudes: [f64; 3], seed: u64) -> Vec<f32> {
    let mut parts = vec![noise(0.1, 0.05, seed)];
    for (i, amplitude) in amplitudes.iter().enumerate() {
        parts.push(sine(220.0, 0.15, *amplitude));
        parts.push(noise(0.1, 0.05, seed + i as u64 + 1));
    }
    concat(&parts)
}

pub fn write_wav(path: &Path, samples: &[f32]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &sample in samples {
        writer
            .write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
}

fn samples_for(seconds: f64) -> usize {
    (seconds * SAMPLE_RATE as f64).round() as usize
}
