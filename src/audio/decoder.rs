use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::error::{AnalysisError, Result};
use crate::types::{Signal, TimeRange};

/// Decode an audio file to a mono signal (channels averaged).
pub fn decode_audio<P: AsRef<Path>>(path: P) -> Result<Signal> {
    let path = path.as_ref();
    let file =
        std::fs::File::open(path).map_err(|err| AnalysisError::io("opening audio file", err))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| malformed_audio(path, "unrecognised audio format", err))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AnalysisError::malformed(format!("no audio track in {}", path.display())))?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.ok_or_else(|| {
        AnalysisError::malformed(format!("sample rate missing in {}", path.display()))
    })?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|err| malformed_audio(path, "unsupported codec", err))?;

    let mut mono = Vec::new();
    let mut buffer: Option<SampleBuffer<f32>> = None;
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(malformed_audio(path, "failed to read packet", err)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                warn!(path = %path.display(), reason, "skipping undecodable packet");
                continue;
            }
            Err(err) => return Err(malformed_audio(path, "failed to decode packet", err)),
        };

        let channels = decoded.spec().channels.count().max(1);
        let needed = decoded.capacity() as u64;
        let samples = buffer.get_or_insert_with(|| SampleBuffer::new(needed, *decoded.spec()));
        if (samples.capacity() as u64) < needed * channels as u64 {
            *samples = SampleBuffer::new(needed, *decoded.spec());
        }
        samples.copy_interleaved_ref(decoded);
        downmix_into(samples.samples(), channels, &mut mono);
    }

    debug!(
        path = %path.display(),
        samples = mono.len(),
        sample_rate,
        "decoded audio"
    );
    Ok(Signal::new(mono, sample_rate))
}

/// Decode a file and cut it down to the given excerpt.
pub fn load_excerpt<P: AsRef<Path>>(path: P, range: &TimeRange) -> Result<Signal> {
    range.validate()?;
    let full = decode_audio(path.as_ref())?;
    ensure_range_within(&full, range, "reference")?;
    Ok(full.slice_seconds(range.start, range.end))
}

/// Reject ranges starting past the end of the recording or ending well after it.
pub fn ensure_range_within(signal: &Signal, range: &TimeRange, label: &str) -> Result<()> {
    let duration = signal.duration();
    let tolerance = 1.0 / signal.sample_rate.max(1) as f64;
    if range.start >= duration || range.end > duration + tolerance {
        return Err(AnalysisError::malformed(format!(
            "time range {:.3}s - {:.3}s lies outside the {label} recording ({:.3}s)",
            range.start, range.end, duration
        )));
    }
    Ok(())
}

fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels == 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

fn malformed_audio(path: &Path, what: &str, err: SymphoniaError) -> AnalysisError {
    AnalysisError::malformed(format!("{what} in {}: {err}", path.display()))
}
