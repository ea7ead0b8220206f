//! Signal generator: phase-accumulator oscillator plus a
//! Lehmer LCG noise source, mixed with the live input by independent
//! amplitude/gain pairs.

use plectrum_core::Parameter;

use crate::unit::UnitImpl;

const LEHMER_MULTIPLIER: u64 = 48271;
const LEHMER_MODULUS: u64 = (1u64 << 31) - 1;
const LEHMER_SEED: u64 = 1337;

pub struct Generator {
    sample_rate: f64,
    phase: f64,
    lcg_state: u64,
}

impl Generator {
    pub fn new(sample_rate: f64) -> Self {
        Self { sample_rate, phase: 0.0, lcg_state: LEHMER_SEED }
    }

    fn next_noise(&mut self) -> f64 {
        self.lcg_state = (self.lcg_state * LEHMER_MULTIPLIER) % LEHMER_MODULUS;
        (self.lcg_state as f64 / LEHMER_MODULUS as f64) * 2.0 - 1.0
    }

    fn waveform_sample(&self, waveform: usize) -> f64 {
        match waveform {
            0 => (2.0 * std::f64::consts::PI * self.phase).sin(),
            1 => 4.0 * (self.phase - (self.phase + 0.5).floor()).abs() - 1.0,
            2 => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            _ => 2.0 * (self.phase - self.phase.floor()) - 1.0,
        }
    }
}

impl UnitImpl for Generator {
    fn default_parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::discrete("waveform", &["sine", "triangle", "square", "sawtooth", "noise"], 0),
            Parameter::numeric("frequency", "Hz", 20, 5000, 440),
            Parameter::numeric("input_amplitude", "%", 0, 100, 100),
            Parameter::numeric("input_gain", "dB", -60, 24, 0),
            Parameter::numeric("signal_amplitude", "%", 0, 100, 100),
            Parameter::numeric("signal_gain", "dB", -60, 0, -6),
        ]
    }

    fn process(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]) {
        self.sample_rate = sample_rate;
        let waveform = plectrum_core::find(params, "waveform").and_then(|p| p.as_discrete_index()).unwrap_or(0);
        let freq = plectrum_core::find(params, "frequency").and_then(|p| p.as_numeric()).unwrap_or(440.0);
        let input_amplitude =
            plectrum_core::find(params, "input_amplitude").and_then(|p| p.as_numeric()).unwrap_or(100.0) / 100.0;
        let input_gain = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "input_gain").and_then(|p| p.as_numeric()).unwrap_or(0.0),
        );
        let signal_amplitude =
            plectrum_core::find(params, "signal_amplitude").and_then(|p| p.as_numeric()).unwrap_or(100.0) / 100.0;
        let signal_gain = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "signal_gain").and_then(|p| p.as_numeric()).unwrap_or(-6.0),
        );

        for (i, sample) in output.iter_mut().enumerate() {
            let x = input.get(i).copied().unwrap_or(0.0);
            let carrier = if waveform == 4 { self.next_noise() } else { self.waveform_sample(waveform) };
            *sample = plectrum_core::clip(
                x * input_amplitude * input_gain + carrier * signal_amplitude * signal_gain,
            );
            if waveform != 4 {
                self.phase += freq / self.sample_rate;
                self.phase -= self.phase.floor();
            }
        }
    }

    fn on_sample_rate_changed(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_stays_in_range() {
        let mut gen = Generator::new(48000.0);
        let params = gen.default_parameters();
        let mut out = vec![0.0; 1000];
        gen.process(&params, 48000.0, &[], &mut out);
        assert!(out.iter().all(|&x| (-1.0..=1.0).contains(&x)));
    }

    #[test]
    fn lehmer_noise_is_deterministic() {
        let mut a = Generator::new(48000.0);
        let mut b = Generator::new(48000.0);
        let mut params = a.default_parameters();
        params[0].set_discrete(4).unwrap();
        let mut out_a = vec![0.0; 16];
        let mut out_b = vec![0.0; 16];
        a.process(&params, 48000.0, &[], &mut out_a);
        b.process(&params, 48000.0, &[], &mut out_b);
        assert_eq!(out_a, out_b);
    }
}
