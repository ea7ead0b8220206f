//! Noise gate: opens above a threshold, holds, then closes
//! below a lower threshold.

use plectrum_core::Parameter;

use crate::unit::UnitImpl;

pub struct NoiseGate {
    sample_rate: f64,
    open: bool,
    hold_counter: usize,
}

impl NoiseGate {
    pub fn new(sample_rate: f64) -> Self {
        Self { sample_rate, open: false, hold_counter: 0 }
    }
}

impl UnitImpl for NoiseGate {
    fn default_parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::numeric("threshold_open", "dB", -80, 0, -40),
            Parameter::numeric("threshold_close", "dB", -80, 0, -50),
            Parameter::numeric("hold", "ms", 0, 2000, 100),
        ]
    }

    fn process(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]) {
        self.sample_rate = sample_rate;
        let open_db = plectrum_core::find(params, "threshold_open").and_then(|p| p.as_numeric()).unwrap_or(-40.0);
        let close_db = plectrum_core::find(params, "threshold_close").and_then(|p| p.as_numeric()).unwrap_or(-50.0);
        let hold_ms = plectrum_core::find(params, "hold").and_then(|p| p.as_numeric()).unwrap_or(100.0);
        let hold_samples = ((hold_ms / 1000.0) * self.sample_rate) as usize;

        if open_db < close_db {
            // misconfigured thresholds: always pass through, open
            self.open = true;
            for (i, &x) in input.iter().enumerate() {
                output[i] = x;
            }
            return;
        }

        for (i, &x) in input.iter().enumerate() {
            let level_db = plectrum_core::factor_to_decibels(x.abs().max(1e-12));
            if level_db > open_db {
                self.open = true;
            }
            if level_db > close_db {
                self.hold_counter = 0;
            } else {
                self.hold_counter += 1;
                if self.open && self.hold_counter >= hold_samples {
                    self.open = false;
                }
            }
            output[i] = if self.open { x } else { 0.0 };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_closes_on_silence_after_hold() {
        let mut gate = NoiseGate::new(48000.0);
        let mut params = gate.default_parameters();
        params[2].set_numeric(0).unwrap();
        let input = vec![0.5, 0.0, 0.0, 0.0];
        let mut output = vec![0.0; 4];
        gate.process(&params, 48000.0, &input, &mut output);
        assert_eq!(output[0], 0.5);
        assert_eq!(output[3], 0.0);
    }

    #[test]
    fn gate_stays_closed_below_open_threshold() {
        let mut gate = NoiseGate::new(48000.0);
        let params = gate.default_parameters();
        let input = vec![0.0001; 8];
        let mut output = vec![0.0; 8];
        gate.process(&params, 48000.0, &input, &mut output);
        assert!(output.iter().all(|&x| x == 0.0));
    }
}
