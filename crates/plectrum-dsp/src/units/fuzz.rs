//! Fuzz: an envelope-derived bias voltage clamps the signal
//! asymmetrically before a coupling capacitor removes the resulting DC.

use plectrum_core::Parameter;

use crate::envelope::{EnvelopeFollower, EnvelopeMode};
use crate::onepole::{alpha_coupling, OnePoleHighpass};
use crate::unit::UnitImpl;

pub struct Fuzz {
    sample_rate: f64,
    envelope: EnvelopeFollower,
    coupling: OnePoleHighpass,
}

impl Fuzz {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            envelope: EnvelopeFollower::new(EnvelopeMode::Level, sample_rate),
            coupling: OnePoleHighpass::new(alpha_coupling(sample_rate)),
        }
    }
}

impl UnitImpl for Fuzz {
    fn default_parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::numeric("gain", "dB", 0, 40, 20),
            Parameter::numeric("bias", "%", 0, 100, 30),
            Parameter::numeric("fuzz_pct", "%", 0, 100, 100),
            Parameter::numeric("level", "dB", -40, 0, -6),
        ]
    }

    fn process(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]) {
        if (sample_rate - self.sample_rate).abs() > f64::EPSILON {
            self.sample_rate = sample_rate;
            self.envelope.set_sample_rate(sample_rate);
            self.coupling.set_alpha(alpha_coupling(sample_rate));
        }
        let gain = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "gain").and_then(|p| p.as_numeric()).unwrap_or(20.0),
        );
        let bias_weight = plectrum_core::find(params, "bias").and_then(|p| p.as_numeric()).unwrap_or(30.0) / 100.0;
        let fuzz_pct =
            plectrum_core::find(params, "fuzz_pct").and_then(|p| p.as_numeric()).unwrap_or(100.0) / 100.0;
        let level = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "level").and_then(|p| p.as_numeric()).unwrap_or(-6.0),
        );

        for (i, &x) in input.iter().enumerate() {
            let env = self.envelope.process(x);
            let bias = env * bias_weight;
            let distorted = (gain * (x - bias)).clamp(-1.0, 1.0);
            let mixed = fuzz_pct * distorted + (1.0 - fuzz_pct) * x;
            let blocked = self.coupling.process(mixed);
            output[i] = plectrum_core::clip(blocked * level);
        }
    }

    fn on_sample_rate_changed(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.envelope.set_sample_rate(sample_rate);
        self.coupling.set_alpha(alpha_coupling(sample_rate));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_stays_bounded() {
        let mut fuzz = Fuzz::new(48000.0);
        let params = fuzz.default_parameters();
        let input: Vec<f64> = (0..2000).map(|i| (i as f64 * 0.1).sin()).collect();
        let mut output = vec![0.0; 2000];
        fuzz.process(&params, 48000.0, &input, &mut output);
        assert!(output.iter().all(|&x| (-1.0..=1.0).contains(&x)));
    }

    #[test]
    fn dc_blocker_settles_near_zero() {
        let mut fuzz = Fuzz::new(48000.0);
        let params = fuzz.default_parameters();
        let input = vec![0.2; 48000];
        let mut output = vec![0.0; 48000];
        fuzz.process(&params, 48000.0, &input, &mut output);
        assert!(output[47999].abs() < 0.05);
    }
}
