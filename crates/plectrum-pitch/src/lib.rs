//! plectrum-pitch: autocorrelation-based guitar tuner.
//!
//! Grounded in the buffer/bounds/parabolic-interpolation shape of
//! `rf-pitch::detection::YinDetector`, but computes plain lagged
//! autocorrelation rather than YIN's cumulative mean-normalized
//! difference function.

use plectrum_core::{PlectrumError, PlectrumResult};
use serde::{Deserialize, Serialize};

const MIN_FREQUENCY: f64 = 40.0;
const MAX_FREQUENCY: f64 = 2000.0;
const NOTE_NAMES: [&str; 12] =
    ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// A resolved pitch estimate, suitable for `get_tuner_analysis` snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunerAnalysis {
    pub frequency: f64,
    pub note: String,
    pub octave: i32,
    pub cents: f64,
}

pub struct Tuner {
    sample_rate: f64,
}

impl Tuner {
    pub fn new(sample_rate: f64) -> Self {
        Self { sample_rate }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    /// Runs autocorrelation pitch detection over one block and returns the
    /// nearest note with its cents deviation. Returns
    /// `PlectrumError::TransientDsp` when no credible peak is found, e.g.
    /// on silence or noise.
    pub fn analyze(&self, samples: &[f64]) -> PlectrumResult<TunerAnalysis> {
        let min_tau = (self.sample_rate / MAX_FREQUENCY).round().max(1.0) as usize;
        let max_tau = ((self.sample_rate / MIN_FREQUENCY).round() as usize).min(samples.len().saturating_sub(2));
        if max_tau <= min_tau + 1 {
            return Err(PlectrumError::TransientDsp);
        }

        let r0 = autocorrelation(samples, 0);
        if r0 <= 1e-12 {
            return Err(PlectrumError::TransientDsp);
        }

        let mut best_tau = None;
        let mut best_r = 0.0;
        let mut prev = autocorrelation(samples, min_tau - 1);
        let mut cur = autocorrelation(samples, min_tau);
        for tau in min_tau..=max_tau {
            let next = autocorrelation(samples, tau + 1);
            if cur > prev && cur > next && cur > best_r {
                best_r = cur;
                best_tau = Some(tau);
            }
            prev = cur;
            cur = next;
        }

        let tau = best_tau.ok_or(PlectrumError::TransientDsp)?;
        if best_r / r0 < 0.01 {
            log::debug!("no credible pitch peak, best_r/r0 = {:.4}", best_r / r0);
            return Err(PlectrumError::TransientDsp);
        }

        let r_lo = autocorrelation(samples, tau - 1);
        let r_mid = autocorrelation(samples, tau);
        let r_hi = autocorrelation(samples, tau + 1);
        let denom = r_lo - 2.0 * r_mid + r_hi;
        let refined_tau = if denom.abs() > 1e-12 {
            tau as f64 + 0.5 * (r_lo - r_hi) / denom
        } else {
            tau as f64
        };

        let frequency = self.sample_rate / refined_tau;
        Ok(frequency_to_note(frequency))
    }
}

fn autocorrelation(samples: &[f64], tau: usize) -> f64 {
    if tau >= samples.len() {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..samples.len() - tau {
        sum += samples[i] * samples[i + tau];
    }
    sum
}

fn frequency_to_note(frequency: f64) -> TunerAnalysis {
    let semitones_from_a4 = 12.0 * (frequency / 440.0).log2();
    let note_index = semitones_from_a4.round();
    let cents = (semitones_from_a4 - note_index) * 100.0;
    let midi_number = 69 + note_index as i64;
    let octave = (midi_number / 12 - 1) as i32;
    let name = NOTE_NAMES[midi_number.rem_euclid(12) as usize];
    TunerAnalysis { frequency, note: name.to_string(), octave, cents }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sample_rate: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate).sin()).collect()
    }

    #[test]
    fn detects_concert_a() {
        let tuner = Tuner::new(48000.0);
        let samples = sine(440.0, 48000.0, 8192);
        let analysis = tuner.analyze(&samples).expect("pitch detected");
        assert!((analysis.frequency - 440.0).abs() < 2.0);
        assert_eq!(analysis.note, "A");
        assert_eq!(analysis.octave, 4);
        assert!(analysis.cents.abs() < 10.0);
    }

    #[test]
    fn detects_low_e_string() {
        let tuner = Tuner::new(48000.0);
        let samples = sine(82.41, 48000.0, 8192);
        let analysis = tuner.analyze(&samples).expect("pitch detected");
        assert!((analysis.frequency - 82.41).abs() < 2.0);
        assert_eq!(analysis.note, "E");
    }

    #[test]
    fn silence_has_no_credible_peak() {
        let tuner = Tuner::new(48000.0);
        let samples = vec![0.0; 8192];
        assert!(tuner.analyze(&samples).is_err());
    }
}
