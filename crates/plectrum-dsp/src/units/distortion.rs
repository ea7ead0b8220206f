//! Distortion: hard clip scaled by output level.

use plectrum_core::Parameter;

use crate::unit::UnitImpl;

pub struct Distortion {
    sample_rate: f64,
}

impl Distortion {
    pub fn new(sample_rate: f64) -> Self {
        Self { sample_rate }
    }
}

impl UnitImpl for Distortion {
    fn default_parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::numeric("gain", "dB", 0, 40, 18),
            Parameter::numeric("level", "dB", -24, 12, -6),
        ]
    }

    fn process(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]) {
        self.sample_rate = sample_rate;
        let gain = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "gain").and_then(|p| p.as_numeric()).unwrap_or(18.0),
        );
        let level = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "level").and_then(|p| p.as_numeric()).unwrap_or(-6.0),
        );

        for (i, &x) in input.iter().enumerate() {
            let clipped = (x * gain).clamp(-1.0, 1.0);
            output[i] = plectrum_core::clip(clipped * level);
        }
    }
}
