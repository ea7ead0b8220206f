//! Delay: a ring-buffer single-tap delay line with feedback.

use plectrum_core::Parameter;

use crate::unit::UnitImpl;

const MAX_DELAY_MS: f64 = 2000.0;

pub struct Delay {
    sample_rate: f64,
    buffer: Vec<f64>,
    write_pos: usize,
}

impl Delay {
    pub fn new(sample_rate: f64) -> Self {
        let capacity = (MAX_DELAY_MS / 1000.0 * sample_rate) as usize + 1;
        Self { sample_rate, buffer: vec![0.0; capacity], write_pos: 0 }
    }
}

impl UnitImpl for Delay {
    fn default_parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::numeric("time", "ms", 1, 2000, 350),
            Parameter::numeric("feedback", "%", 0, 95, 35),
            Parameter::numeric("level", "dB", -60, 12, 0),
        ]
    }

    fn process(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]) {
        self.sample_rate = sample_rate;
        let time_ms = plectrum_core::find(params, "time").and_then(|p| p.as_numeric()).unwrap_or(350.0);
        let feedback = plectrum_core::find(params, "feedback").and_then(|p| p.as_numeric()).unwrap_or(35.0) / 100.0;
        let level = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "level").and_then(|p| p.as_numeric()).unwrap_or(0.0),
        );

        let delay_samples = ((time_ms / 1000.0 * self.sample_rate) as usize).clamp(1, self.buffer.len() - 1);

        for (i, &x) in input.iter().enumerate() {
            let read_pos = (self.write_pos + self.buffer.len() - delay_samples) % self.buffer.len();
            let delayed = self.buffer[read_pos];

            self.buffer[self.write_pos] = plectrum_core::clip(x + feedback * delayed);
            output[i] = plectrum_core::clip(level * delayed);

            self.write_pos = (self.write_pos + 1) % self.buffer.len();
        }
    }

    fn on_sample_rate_changed(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        let capacity = (MAX_DELAY_MS / 1000.0 * sample_rate) as usize + 1;
        self.buffer = vec![0.0; capacity];
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_appears_after_delay_time_and_input_sample_is_silent() {
        let mut delay = Delay::new(48000.0);
        let mut params = delay.default_parameters();
        params[0].set_numeric(10).unwrap();
        params[1].set_numeric(0).unwrap();
        params[2].set_numeric(0).unwrap();
        let mut input = vec![0.0; 2000];
        input[0] = 1.0;
        let mut output = vec![0.0; 2000];
        delay.process(&params, 48000.0, &input, &mut output);
        let delay_samples = (10.0 / 1000.0 * 48000.0) as usize;
        assert_eq!(output[0], 0.0);
        assert!((output[delay_samples] - 1.0).abs() < 1e-9);
    }
}
