//! Bandpass filter: cascaded one-pole highpass then lowpass
//! stages, order ∈ {2, 4, 6, 8} controlling the cascade depth.

use plectrum_core::Parameter;

use crate::onepole::{alpha_from_freq, OnePoleHighpass, OnePoleLowpass};
use crate::unit::UnitImpl;

const MAX_STAGES: usize = 4;

pub struct Bandpass {
    sample_rate: f64,
    hp: [OnePoleHighpass; MAX_STAGES],
    lp: [OnePoleLowpass; MAX_STAGES],
}

impl Bandpass {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            hp: [OnePoleHighpass::default(); MAX_STAGES],
            lp: [OnePoleLowpass::default(); MAX_STAGES],
        }
    }
}

impl UnitImpl for Bandpass {
    fn default_parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::numeric("low_cutoff", "Hz", 20, 10000, 200),
            Parameter::numeric("high_cutoff", "Hz", 20, 20000, 2000),
            Parameter::discrete("order", &["2", "4", "6", "8"], 0),
        ]
    }

    fn process(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]) {
        self.sample_rate = sample_rate;
        let low = plectrum_core::find(params, "low_cutoff").and_then(|p| p.as_numeric()).unwrap_or(200.0);
        let high = plectrum_core::find(params, "high_cutoff").and_then(|p| p.as_numeric()).unwrap_or(2000.0);
        let (low, high) = if low > high { (high, low) } else { (low, high) };
        let order_index = plectrum_core::find(params, "order").and_then(|p| p.as_discrete_index()).unwrap_or(0);
        let stages = order_index + 1;

        let hp_alpha = alpha_from_freq(low, self.sample_rate);
        let lp_alpha = alpha_from_freq(high, self.sample_rate);
        for stage in self.hp.iter_mut().take(stages) {
            stage.set_alpha(hp_alpha);
        }
        for stage in self.lp.iter_mut().take(stages) {
            stage.set_alpha(lp_alpha);
        }

        for (i, &x) in input.iter().enumerate() {
            let mut y = x;
            for (hp, lp) in self.hp.iter_mut().take(stages).zip(self.lp.iter_mut().take(stages)) {
                y = hp.process(y);
                y = lp.process(y);
                y = plectrum_core::clip(y);
            }
            output[i] = y;
        }
    }
}
