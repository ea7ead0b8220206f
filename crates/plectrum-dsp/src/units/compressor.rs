//! Compressor: envelope-driven gain computation against a
//! target level with a hard limit ceiling.

use plectrum_core::Parameter;

use crate::envelope::{EnvelopeFollower, EnvelopeMode};
use crate::unit::UnitImpl;

pub struct Compressor {
    sample_rate: f64,
    envelope: EnvelopeFollower,
}

impl Compressor {
    pub fn new(sample_rate: f64) -> Self {
        Self { sample_rate, envelope: EnvelopeFollower::new(EnvelopeMode::Level, sample_rate) }
    }
}

impl UnitImpl for Compressor {
    fn default_parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::numeric("target", "dB", -40, 0, -18),
            Parameter::numeric("limit", "dB", -12, 0, -1),
        ]
    }

    fn process(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]) {
        if (sample_rate - self.sample_rate).abs() > f64::EPSILON {
            self.sample_rate = sample_rate;
            self.envelope.set_sample_rate(sample_rate);
        }
        let target_db = plectrum_core::find(params, "target").and_then(|p| p.as_numeric()).unwrap_or(-18.0);
        let limit_db = plectrum_core::find(params, "limit").and_then(|p| p.as_numeric()).unwrap_or(-1.0);
        let target_factor = plectrum_core::decibels_to_factor(target_db);
        let limit = plectrum_core::decibels_to_factor(limit_db);

        for (i, &x) in input.iter().enumerate() {
            let env = self.envelope.process(x).max(1e-9);
            let gain = (target_factor / env).min(limit);
            output[i] = plectrum_core::clip(x * gain);
        }
    }

    fn on_sample_rate_changed(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.envelope.set_sample_rate(sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loud_signal_is_attenuated_towards_target() {
        let mut comp = Compressor::new(48000.0);
        let params = comp.default_parameters();
        let input = vec![1.0; 48000];
        let mut output = vec![0.0; 48000];
        comp.process(&params, 48000.0, &input, &mut output);
        assert!(output[47999].abs() < 1.0);
    }

    #[test]
    fn output_never_exceeds_limit() {
        let mut comp = Compressor::new(48000.0);
        let mut params = comp.default_parameters();
        params[1].set_numeric(-3).unwrap();
        let input = vec![1.0; 4000];
        let mut output = vec![0.0; 4000];
        comp.process(&params, 48000.0, &input, &mut output);
        let limit = plectrum_core::decibels_to_factor(-3.0);
        assert!(output.iter().all(|&x| x.abs() <= limit + 1e-9));
    }
}
