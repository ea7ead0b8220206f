//! Tremolo: amplitude alternates between unity and a dB-scaled
//! gain over a duty cycle set by `phase_pct`.

use plectrum_core::Parameter;

use crate::unit::UnitImpl;

pub struct Tremolo {
    sample_rate: f64,
    counter: u64,
    attenuated: bool,
}

impl Tremolo {
    pub fn new(sample_rate: f64) -> Self {
        Self { sample_rate, counter: 0, attenuated: false }
    }
}

impl UnitImpl for Tremolo {
    fn default_parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::numeric("rate", "Hz", 1, 20, 5),
            Parameter::numeric("depth", "dB", -24, 0, -6),
            Parameter::numeric("phase_pct", "%", 0, 100, 50),
        ]
    }

    fn process(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]) {
        self.sample_rate = sample_rate;
        let rate_hz = plectrum_core::find(params, "rate").and_then(|p| p.as_numeric()).unwrap_or(5.0);
        let depth_gain = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "depth").and_then(|p| p.as_numeric()).unwrap_or(-6.0),
        );
        let phase_pct =
            plectrum_core::find(params, "phase_pct").and_then(|p| p.as_numeric()).unwrap_or(50.0) / 100.0;

        let period_samples = (self.sample_rate / (rate_hz / 10.0)).max(1.0);
        let attenuated_samples = (period_samples * phase_pct) as u64;

        for (i, &x) in input.iter().enumerate() {
            let gain = if self.attenuated { depth_gain } else { 1.0 };
            output[i] = plectrum_core::clip(x * gain);

            self.counter += 1;
            let boundary = if self.attenuated {
                attenuated_samples
            } else {
                period_samples as u64 - attenuated_samples
            };
            if self.counter >= boundary.max(1) {
                self.counter = 0;
                self.attenuated = !self.attenuated;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternates_between_two_gain_levels() {
        let mut trem = Tremolo::new(48000.0);
        let mut params = trem.default_parameters();
        params[0].set_numeric(1).unwrap();
        params[1].set_numeric(-24).unwrap();
        let input = vec![1.0; 48000];
        let mut output = vec![0.0; 48000];
        trem.process(&params, 48000.0, &input, &mut output);
        let distinct: std::collections::HashSet<i64> =
            output.iter().map(|&x| (x * 1000.0).round() as i64).collect();
        assert!(distinct.contains(&1000));
        assert!(distinct.iter().any(|&v| v < 1000));
    }
}
