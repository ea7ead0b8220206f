//! Ring modulator: `y = x · sin(2π · phase)`, phase driven by
//! a carrier-frequency accumulator.

use plectrum_core::Parameter;

use crate::unit::UnitImpl;

pub struct RingModulator {
    sample_rate: f64,
    phase: f64,
}

impl RingModulator {
    pub fn new(sample_rate: f64) -> Self {
        Self { sample_rate, phase: 0.0 }
    }
}

impl UnitImpl for RingModulator {
    fn default_parameters(&self) -> Vec<Parameter> {
        vec![Parameter::numeric("carrier_frequency", "Hz", 1, 5000, 200)]
    }

    fn process(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]) {
        self.sample_rate = sample_rate;
        let carrier = plectrum_core::find(params, "carrier_frequency").and_then(|p| p.as_numeric()).unwrap_or(200.0);

        for (i, &x) in input.iter().enumerate() {
            let carrier_sample = (2.0 * std::f64::consts::PI * self.phase).sin();
            output[i] = plectrum_core::clip(x * carrier_sample);

            self.phase += carrier / self.sample_rate;
            self.phase -= self.phase.floor();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_in_gives_silence_out() {
        let mut rm = RingModulator::new(48000.0);
        let params = rm.default_parameters();
        let input = vec![0.0; 500];
        let mut output = vec![0.0; 500];
        rm.process(&params, 48000.0, &input, &mut output);
        assert!(output.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn modulated_output_stays_bounded() {
        let mut rm = RingModulator::new(48000.0);
        let params = rm.default_parameters();
        let input = vec![0.8; 2000];
        let mut output = vec![0.0; 2000];
        rm.process(&params, 48000.0, &input, &mut output);
        assert!(output.iter().all(|&x| (-1.0..=1.0).contains(&x)));
    }
}
