//! Phaser: like the flanger's delay-and-mix structure, but the
//! wet coefficient follows `0.5 sin(phase · π/180)` instead of a fixed
//! 50/50 blend.

use plectrum_core::Parameter;

use crate::unit::UnitImpl;

const MAX_DELAY_MS: f64 = 12.0;

pub struct Phaser {
    sample_rate: f64,
    buffer: Vec<f64>,
    write_pos: usize,
    phase: f64,
}

impl Phaser {
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

impl UnitImpl for Phaser {
    fn default_parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::numeric("rate", "Hz", 1, 50, 5),
            Parameter::numeric("depth", "ms", 1, 5, 2),
        ]
    }

    fn process(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]) {
        self.sample_rate = sample_rate;
        let rate_hz = plectrum_core::find(params, "rate").and_then(|p| p.as_numeric()).unwrap_or(5.0);
        let depth_ms = plectrum_core::find(params, "depth").and_then(|p| p.as_numeric()).unwrap_or(2.0);

        for (i, &x) in input.iter().enumerate() {
            let phase_deg = self.phase * 360.0;
            let lfo = (2.0 * std::f64::consts::PI * self.phase).sin();
            let delay_ms = depth_ms * (1.0 + lfo);
            let delay_samples = delay_ms / 1000.0 * self.sample_rate;
            let wet = self.read_interpolated(delay_samples);

            self.buffer[self.write_pos] = x;
            let wet_coeff = 0.5 * (phase_deg * std::f64::consts::PI / 180.0).sin();
            let dry_coeff = 1.0 - wet_coeff.abs();
            output[i] = plectrum_core::clip(dry_coeff * x + wet * wet_coeff);

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_in_range() {
        let mut phaser = Phaser::new(48000.0);
        let params = phaser.default_parameters();
        let input: Vec<f64> = (0..4800).map(|i| (i as f64 * 0.03).sin() * 0.6).collect();
        let mut output = vec![0.0; 4800];
        phaser.process(&params, 48000.0, &input, &mut output);
        assert!(output.iter().all(|&x| (-1.0..=1.0).contains(&x)));
    }
}
