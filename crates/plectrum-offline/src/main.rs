//! Offline batch-mode driver: resamples WAVE files to a chosen rate, runs
//! them through an `EngineState` block by block, and writes the N
//! processed channels plus the master stereo mix and metronome aux buffer
//! back out as WAVE files.

use std::io::{self, Write};
use std::process::ExitCode;

use plectrum_core::SUPPORTED_SAMPLE_RATES;
use plectrum_engine::EngineState;
use plectrum_file::{AudioData, BitDepth};
use thiserror::Error;

const BLOCK_SIZE: usize = 1024;

#[derive(Error, Debug)]
enum DriverError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("file error: {0}")]
    File(#[from] plectrum_file::FileError),
}

type DriverResult<T> = Result<T, DriverError>;

fn prompt(label: &str) -> DriverResult<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_sample_rate() -> DriverResult<u32> {
    loop {
        let rates: Vec<String> = SUPPORTED_SAMPLE_RATES.iter().map(|r| r.to_string()).collect();
        let answer = prompt(&format!("Target sample rate [{}]", rates.join(", ")))?;
        match answer.parse::<u32>() {
            Ok(rate) if SUPPORTED_SAMPLE_RATES.contains(&rate) => return Ok(rate),
            _ => println!("unsupported sample rate, try again"),
        }
    }
}

fn prompt_channel_count() -> DriverResult<usize> {
    loop {
        let answer = prompt("Number of channels")?;
        match answer.parse::<usize>() {
            Ok(n) if n > 0 => return Ok(n),
            _ => println!("enter a positive integer"),
        }
    }
}

fn prompt_bit_depth() -> DriverResult<BitDepth> {
    loop {
        let format = prompt("Output format (lpcm/float)")?;
        match format.as_str() {
            "lpcm" => {
                let bits = prompt("Bit depth (8/16/24/32)")?;
                return match bits.as_str() {
                    "8" => Ok(BitDepth::Int8),
                    "16" => Ok(BitDepth::Int16),
                    "24" => Ok(BitDepth::Int24),
                    "32" => Ok(BitDepth::Int32),
                    other => {
                        println!("unsupported lpcm bit depth: {other}");
                        continue;
                    }
                };
            }
            "float" => return Ok(BitDepth::Float32),
            other => println!("unrecognized format: {other}, enter lpcm or float"),
        }
    }
}

fn read_channel_input(path: &str, target_rate: u32) -> DriverResult<Vec<f64>> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let audio = plectrum_file::read_wav(path)?;
    let mono: Vec<f64> = if audio.channels.len() == 1 {
        audio.channels[0].clone()
    } else {
        let frames = audio.num_frames();
        (0..frames)
            .map(|i| audio.channels.iter().map(|c| c[i]).sum::<f64>() / audio.channels.len() as f64)
            .collect()
    };
    if audio.sample_rate == target_rate {
        Ok(mono)
    } else {
        let resampled = plectrum_file::resample_planar(&[mono], audio.sample_rate, target_rate)?;
        Ok(resampled.into_iter().next().unwrap_or_default())
    }
}

fn pad_to_block_multiple(channels: &mut [Vec<f64>]) {
    let frames = channels.iter().map(|c| c.len()).max().unwrap_or(0);
    let padded = frames.div_ceil(BLOCK_SIZE).max(1) * BLOCK_SIZE;
    for channel in channels {
        channel.resize(padded, 0.0);
    }
}

fn write_mono(path: &str, sample_rate: u32, samples: Vec<f64>, bit_depth: BitDepth) -> DriverResult<()> {
    if path.is_empty() {
        return Ok(());
    }
    let data = AudioData { sample_rate, channels: vec![samples] };
    plectrum_file::write_wav(path, &data, bit_depth)?;
    Ok(())
}

fn run() -> DriverResult<()> {
    let sample_rate = prompt_sample_rate()?;
    let channel_count = prompt_channel_count()?;

    let mut inputs = Vec::with_capacity(channel_count);
    for i in 0..channel_count {
        let path = prompt(&format!("Input WAVE path for channel {i} (blank = silent)"))?;
        inputs.push(read_channel_input(&path, sample_rate)?);
    }
    pad_to_block_multiple(&mut inputs);

    let bit_depth = prompt_bit_depth()?;

    let mut channel_outputs: Vec<Vec<f64>> = (0..channel_count).map(|_| Vec::new()).collect();
    let mut master_left = Vec::new();
    let mut master_right = Vec::new();
    let mut aux = Vec::new();

    let mut engine = EngineState::new(channel_count, sample_rate, num_cpus::get().max(1));
    let num_frames = inputs.first().map(|c| c.len()).unwrap_or(0);
    let mut offset = 0;
    while offset < num_frames {
        let end = (offset + BLOCK_SIZE).min(num_frames);
        let block: Vec<Vec<f64>> = inputs.iter().map(|c| c[offset..end].to_vec()).collect();
        let output = engine.process(&block);
        for (dst, src) in channel_outputs.iter_mut().zip(output.channels) {
            dst.extend(src);
        }
        master_left.extend(output.master_left);
        master_right.extend(output.master_right);
        aux.extend(output.aux);
        offset = end;
    }

    for i in 0..channel_count {
        let path = prompt(&format!("Output WAVE path for channel {i} (blank = skip)"))?;
        write_mono(&path, sample_rate, std::mem::take(&mut channel_outputs[i]), bit_depth)?;
    }
    let master_left_path = prompt("Output WAVE path for master left (blank = skip)")?;
    write_mono(&master_left_path, sample_rate, master_left, bit_depth)?;
    let master_right_path = prompt("Output WAVE path for master right (blank = skip)")?;
    write_mono(&master_right_path, sample_rate, master_right, bit_depth)?;
    let aux_path = prompt("Output WAVE path for metronome aux (blank = skip)")?;
    write_mono(&aux_path, sample_rate, aux, bit_depth)?;

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("batch run failed: {e}");
            ExitCode::FAILURE
        }
    }
}
