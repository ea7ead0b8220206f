//! plectrum-file: WAVE I/O and sample-rate conversion.
//!
//! Grounded in `rf-file::audio_file`'s `AudioFormat`/`BitDepth`/
//! `AudioFileInfo`/`AudioData` shapes and its `read_wav`/`write_wav`
//! functions built on `hound`; resampling uses `rubato` the way the
//! teacher workspace does throughout its streaming crates.

use std::path::Path;

use rubato::{Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("wav i/o error: {0}")]
    Wav(#[from] hound::Error),

    #[error("resample error: {0}")]
    Resample(String),

    #[error("unsupported bit depth: {0} bits")]
    UnsupportedBitDepth(u16),

    #[error("empty audio data")]
    Empty,
}

pub type FileResult<T> = Result<T, FileError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    Int8,
    Int16,
    Int24,
    Int32,
    Float32,
}

#[derive(Debug, Clone, Copy)]
pub struct AudioFileInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: BitDepth,
    pub num_frames: usize,
}

/// Planar (per-channel) decoded audio, normalized to `[-1.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct AudioData {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f64>>,
}

impl AudioData {
    pub fn num_frames(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }
}

pub fn get_audio_info<P: AsRef<Path>>(path: P) -> FileResult<AudioFileInfo> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let bit_depth = bit_depth_of(spec)?;
    Ok(AudioFileInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bit_depth,
        num_frames: reader.duration() as usize,
    })
}

fn bit_depth_of(spec: hound::WavSpec) -> FileResult<BitDepth> {
    match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 8) => Ok(BitDepth::Int8),
        (hound::SampleFormat::Int, 16) => Ok(BitDepth::Int16),
        (hound::SampleFormat::Int, 24) => Ok(BitDepth::Int24),
        (hound::SampleFormat::Int, 32) => Ok(BitDepth::Int32),
        (hound::SampleFormat::Float, 32) => Ok(BitDepth::Float32),
        (_, bits) => Err(FileError::UnsupportedBitDepth(bits)),
    }
}

/// Reads a WAVE file into planar `f64` samples normalized to `[-1.0, 1.0]`.
pub fn read_wav<P: AsRef<Path>>(path: P) -> FileResult<AudioData> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    log::debug!("reading wav: {} Hz, {} ch, {:?}/{} bit", spec.sample_rate, spec.channels, spec.sample_format, spec.bits_per_sample);
    let channel_count = spec.channels as usize;
    let mut channels: Vec<Vec<f64>> = vec![Vec::new(); channel_count];

    match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => {
            for (i, sample) in reader.samples::<f32>().enumerate() {
                channels[i % channel_count].push(sample?.into());
            }
        }
        (hound::SampleFormat::Int, bits) => {
            let scale = 1.0 / (1i64 << (bits - 1)) as f64;
            for (i, sample) in reader.samples::<i32>().enumerate() {
                channels[i % channel_count].push(sample? as f64 * scale);
            }
        }
        (_, bits) => return Err(FileError::UnsupportedBitDepth(bits)),
    }

    Ok(AudioData { sample_rate: spec.sample_rate, channels })
}

/// Writes planar `f64` samples (expected in `[-1.0, 1.0]`) to a WAVE file.
pub fn write_wav<P: AsRef<Path>>(path: P, data: &AudioData, bit_depth: BitDepth) -> FileResult<()> {
    if data.channels.is_empty() {
        return Err(FileError::Empty);
    }
    let (sample_format, bits_per_sample) = match bit_depth {
        BitDepth::Int8 => (hound::SampleFormat::Int, 8),
        BitDepth::Int16 => (hound::SampleFormat::Int, 16),
        BitDepth::Int24 => (hound::SampleFormat::Int, 24),
        BitDepth::Int32 => (hound::SampleFormat::Int, 32),
        BitDepth::Float32 => (hound::SampleFormat::Float, 32),
    };
    let spec = hound::WavSpec {
        channels: data.channels.len() as u16,
        sample_rate: data.sample_rate,
        bits_per_sample,
        sample_format,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    let num_frames = data.num_frames();

    for frame in 0..num_frames {
        for channel in &data.channels {
            let sample = channel.get(frame).copied().unwrap_or(0.0).clamp(-1.0, 1.0);
            match bit_depth {
                BitDepth::Float32 => writer.write_sample(sample as f32)?,
                _ => {
                    let max = (1i64 << (bits_per_sample - 1)) - 1;
                    writer.write_sample((sample * max as f64) as i32)?
                }
            }
        }
    }
    writer.finalize()?;
    Ok(())
}

/// Resamples planar audio from `from_rate` to `to_rate` via `rubato`'s
/// windowed-sinc interpolator.
pub fn resample_planar(input: &[Vec<f64>], from_rate: u32, to_rate: u32) -> FileResult<Vec<Vec<f64>>> {
    if from_rate == to_rate || input.is_empty() {
        return Ok(input.to_vec());
    }
    let channels = input.len();
    let total_frames = input[0].len();
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = to_rate as f64 / from_rate as f64;
    let chunk_size = 1024;
    let mut resampler = SincFixedIn::<f64>::new(ratio, 2.0, params, chunk_size, channels)
        .map_err(|e| FileError::Resample(e.to_string()))?;

    let mut output: Vec<Vec<f64>> = vec![Vec::new(); channels];
    let mut pos = 0;
    while pos < total_frames {
        let end = (pos + chunk_size).min(total_frames);
        let chunk: Vec<Vec<f64>> = input
            .iter()
            .map(|c| {
                let mut v = c[pos..end].to_vec();
                v.resize(chunk_size, 0.0);
                v
            })
            .collect();
        let processed = resampler.process(&chunk, None).map_err(|e| FileError::Resample(e.to_string()))?;
        for (ch, data) in output.iter_mut().zip(processed) {
            ch.extend(data);
        }
        pos = end;
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_depth_maps_round_trip() {
        let spec = hound::WavSpec { channels: 1, sample_rate: 48000, bits_per_sample: 16, sample_format: hound::SampleFormat::Int };
        assert_eq!(bit_depth_of(spec).unwrap(), BitDepth::Int16);
    }

    #[test]
    fn write_then_read_16_bit_round_trips() {
        let dir = std::env::temp_dir();
        let path = dir.join("plectrum_file_test_roundtrip.wav");
        let data = AudioData { sample_rate: 44100, channels: vec![vec![0.0, 0.5, -0.5, 1.0, -1.0]] };
        write_wav(&path, &data, BitDepth::Int16).unwrap();
        let read_back = read_wav(&path).unwrap();
        assert_eq!(read_back.sample_rate, 44100);
        assert_eq!(read_back.channels.len(), 1);
        assert_eq!(read_back.channels[0].len(), 5);
        for (a, b) in data.channels[0].iter().zip(read_back.channels[0].iter()) {
            assert!((a - b).abs() < 1e-3);
        }
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn same_rate_resample_is_identity() {
        let input = vec![vec![0.1, 0.2, 0.3]];
        let output = resample_planar(&input, 48000, 48000).unwrap();
        assert_eq!(input, output);
    }
}
