//! Chorus: five delay taps, each modulated by an LFO at its
//! own phase offset, linearly interpolated and mixed 50/50 with the dry
//! signal.

use plectrum_core::Parameter;

use crate::unit::UnitImpl;

const VOICES: usize = 5;
const CENTER_DELAY_MS: f64 = 40.0;
const MAX_DELAY_MS: f64 = 65.0;

pub struct Chorus {
    sample_rate: f64,
    buffer: Vec<f64>,
    write_pos: usize,
    phase: f64,
}

impl Chorus {
    pub fn new(sample_rate: f64) -> Self {
        let capacity = (MAX_DELAY_MS / 1000.0 * sample_rate) as usize + 4;
        Self { sample_rate, buffer: vec![0.0; capacity], write_pos: 0, phase: 0.0 }
    }

    fn read_interpolated(&self, delay_samples: f64) -> f64 {
        let len = self.buffer.len() as f64;
        let read_pos = (self.write_pos as f64 - delay_samples).rem_euclid(len);
        let lo = read_pos.floor() as usize % self.buffer.len();
        let hi = (lo + 1) % self.buffer.len();
        let frac = read_pos - read_pos.floor();
        self.buffer[lo] * (1.0 - frac) + self.buffer[hi] * frac
    }
}

impl UnitImpl for Chorus {
    fn default_parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::numeric("rate", "Hz", 1, 50, 8),
            Parameter::numeric("depth", "ms", 1, 20, 6),
        ]
    }

    fn process(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]) {
        if (sample_rate - self.sample_rate).abs() > f64::EPSILON {
            self.sample_rate = sample_rate;
        }
        let rate_hz = plectrum_core::find(params, "rate").and_then(|p| p.as_numeric()).unwrap_or(8.0);
        let depth_ms = plectrum_core::find(params, "depth").and_then(|p| p.as_numeric()).unwrap_or(6.0);

        for (i, &x) in input.iter().enumerate() {
            self.buffer[self.write_pos] = x;

            let mut wet = 0.0;
            for v in 0..VOICES {
                let voice_phase = self.phase + v as f64 / VOICES as f64;
                let lfo = (2.0 * std::f64::consts::PI * voice_phase).sin();
                let delay_ms = CENTER_DELAY_MS + depth_ms * lfo;
                let delay_samples = delay_ms / 1000.0 * self.sample_rate;
                wet += self.read_interpolated(delay_samples);
            }
            wet /= VOICES as f64;

            output[i] = plectrum_core::clip(x * 0.5 + wet * 0.5);

            self.phase += rate_hz / self.sample_rate;
            self.phase -= self.phase.floor();
            self.write_pos = (self.write_pos + 1) % self.buffer.len();
        }
    }

    fn on_sample_rate_changed(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        let capacity = (MAX_DELAY_MS / 1000.0 * sample_rate) as usize + 4;
        self.buffer = vec![0.0; capacity];
        self.write_pos = 0;
    }
}
