//! Octaver: zero-crossing detection drives a 3-bit octave-down
//! register that selects the sign of two sub-octave voices; a five-way
//! weighted mix is then passed through a coupling capacitor that removes
//! the composite's DC offset.

use plectrum_core::Parameter;

use crate::envelope::{EnvelopeFollower, EnvelopeMode};
use crate::onepole::{alpha_coupling, OnePoleHighpass};
use crate::unit::UnitImpl;

pub struct Octaver {
    sample_rate: f64,
    envelope: EnvelopeFollower,
    coupling: OnePoleHighpass,
    last_sign: bool,
    register: u8,
}

impl Octaver {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            envelope: EnvelopeFollower::new(EnvelopeMode::Envelope, sample_rate),
            coupling: OnePoleHighpass::new(alpha_coupling(sample_rate)),
            last_sign: true,
            register: 0,
        }
    }
}

impl UnitImpl for Octaver {
    fn default_parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::numeric("hysteresis", "%", 0, 100, 10),
            Parameter::numeric("clean_level", "dB", -40, 6, 0),
            Parameter::numeric("squared_level", "dB", -40, 6, -20),
            Parameter::numeric("octave_level", "dB", -40, 6, -6),
            Parameter::numeric("octave1_level", "dB", -40, 6, -9),
            Parameter::numeric("octave2_level", "dB", -40, 6, -9),
        ]
    }

    fn process(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]) {
        if (sample_rate - self.sample_rate).abs() > f64::EPSILON {
            self.sample_rate = sample_rate;
            self.envelope.set_sample_rate(sample_rate);
            self.coupling.set_alpha(alpha_coupling(sample_rate));
        }
        let hysteresis =
            plectrum_core::find(params, "hysteresis").and_then(|p| p.as_numeric()).unwrap_or(10.0) / 100.0;
        let clean_gain = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "clean_level").and_then(|p| p.as_numeric()).unwrap_or(0.0),
        );
        let squared_gain = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "squared_level").and_then(|p| p.as_numeric()).unwrap_or(-20.0),
        );
        let octave_gain = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "octave_level").and_then(|p| p.as_numeric()).unwrap_or(-6.0),
        );
        let octave1_gain = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "octave1_level").and_then(|p| p.as_numeric()).unwrap_or(-9.0),
        );
        let octave2_gain = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "octave2_level").and_then(|p| p.as_numeric()).unwrap_or(-9.0),
        );

        for (i, &x) in input.iter().enumerate() {
            let env = self.envelope.process(x).max(1e-9);

            let sign = x >= 0.0;
            if sign != self.last_sign && env > hysteresis {
                self.register = self.register.wrapping_add(1) & 0b111;
                self.last_sign = sign;
            }

            let sign1 = if self.register & 0b001 != 0 { -1.0 } else { 1.0 };
            let sign2 = if self.register & 0b010 != 0 { -1.0 } else { 1.0 };
            let raw_sign = if x >= 0.0 { 1.0 } else { -1.0 };

            let clean = x;
            let squared = (x * x) / env;
            let octave = raw_sign * env;
            let octave1 = sign1 * env;
            let octave2 = sign2 * env;

            let composite = clean * clean_gain
                + squared * squared_gain
                + octave * octave_gain
                + octave1 * octave1_gain
                + octave2 * octave2_gain;

            output[i] = plectrum_core::clip(self.coupling.process(composite));
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
    fn stays_in_range_on_sine_input() {
        let mut oct = Octaver::new(48000.0);
        let params = oct.default_parameters();
        let input: Vec<f64> = (0..4800).map(|i| (i as f64 * 0.05).sin() * 0.5).collect();
        let mut output = vec![0.0; 4800];
        oct.process(&params, 48000.0, &input, &mut output);
        assert!(output.iter().all(|&x| (-1.0..=1.0).contains(&x)));
    }

    #[test]
    fn silence_produces_silence() {
        let mut oct = Octaver::new(48000.0);
        let params = oct.default_parameters();
        let input = vec![0.0; 1000];
        let mut output = vec![0.0; 1000];
        oct.process(&params, 48000.0, &input, &mut output);
        assert!(output.iter().all(|&x| x.abs() < 1e-9));
    }

    #[test]
    fn register_advances_on_qualifying_zero_crossings() {
        let mut oct = Octaver::new(48000.0);
        let mut params = oct.default_parameters();
        params[0].set_numeric(0).unwrap();
        let input: Vec<f64> = (0..2000).map(|i| (i as f64 * 0.02).sin()).collect();
        let mut output = vec![0.0; 2000];
        oct.process(&params, 48000.0, &input, &mut output);
        assert!(oct.register != 0);
    }
}
