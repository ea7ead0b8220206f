//! Auto-wah: envelope-controlled bandpass sweep. The envelope
//! maps piecewise-linearly onto a cutoff frequency that drives an 8-stage
//! HP/LP cascade, with a ×256 gain compensation for the cascade's loss.

use plectrum_core::Parameter;

use crate::envelope::{EnvelopeFollower, EnvelopeMode};
use crate::onepole::{alpha_from_freq, OnePoleHighpass, OnePoleLowpass};
use crate::unit::UnitImpl;

const STAGES: usize = 8;
const GAIN_COMPENSATION: f64 = 256.0;

pub struct AutoWah {
    sample_rate: f64,
    envelope: EnvelopeFollower,
    hp: [OnePoleHighpass; STAGES],
    lp: [OnePoleLowpass; STAGES],
}

impl AutoWah {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            envelope: EnvelopeFollower::new(EnvelopeMode::Envelope, sample_rate),
            hp: [OnePoleHighpass::default(); STAGES],
            lp: [OnePoleLowpass::default(); STAGES],
        }
    }
}

impl UnitImpl for AutoWah {
    fn default_parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::numeric("min_freq", "Hz", 50, 1000, 300),
            Parameter::numeric("max_freq", "Hz", 200, 5000, 2000),
            Parameter::numeric("sensitivity", "%", 0, 100, 60),
        ]
    }

    fn process(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]) {
        self.sample_rate = sample_rate;
        self.envelope.set_sample_rate(sample_rate);
        let min_freq = plectrum_core::find(params, "min_freq").and_then(|p| p.as_numeric()).unwrap_or(300.0);
        let max_freq = plectrum_core::find(params, "max_freq").and_then(|p| p.as_numeric()).unwrap_or(2000.0);
        let sensitivity = plectrum_core::find(params, "sensitivity").and_then(|p| p.as_numeric()).unwrap_or(60.0) / 100.0;

        for (i, &x) in input.iter().enumerate() {
            let env = self.envelope.process(x * sensitivity).min(1.0);
            let cutoff = min_freq + (max_freq - min_freq) * env;
            let alpha = alpha_from_freq(cutoff, self.sample_rate);
            for stage in self.hp.iter_mut() {
                stage.set_alpha(alpha);
            }
            for stage in self.lp.iter_mut() {
                stage.set_alpha(alpha);
            }

            let mut y = x;
            for stage in self.hp.iter_mut() {
                y = stage.process(y);
            }
            for stage in self.lp.iter_mut() {
                y = stage.process(y);
            }
            output[i] = plectrum_core::clip(y * GAIN_COMPENSATION);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn louder_input_sweeps_cutoff_higher() {
        let mut wah = AutoWah::new(48000.0);
        let params = wah.default_parameters();
        let loud = vec![1.0; 4000];
        let mut out_loud = vec![0.0; 4000];
        wah.process(&params, 48000.0, &loud, &mut out_loud);
        assert!(out_loud.iter().all(|&x| (-1.0..=1.0).contains(&x)));
    }

    #[test]
    fn silence_decays_envelope_to_zero() {
        let mut wah = AutoWah::new(48000.0);
        let params = wah.default_parameters();
        let silence = vec![0.0; 48000];
        let mut out = vec![0.0; 48000];
        wah.process(&params, 48000.0, &silence, &mut out);
        assert!(out[47999].abs() < 1e-6);
    }
}
