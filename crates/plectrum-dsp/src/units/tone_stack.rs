//! Tone stack: four parallel shelving bands (bass, mid,
//! treble, presence), each an HP-then-LP pair, summed with independent
//! gains.

use plectrum_core::Parameter;

use crate::onepole::{alpha_from_freq, OnePoleHighpass, OnePoleLowpass};
use crate::unit::UnitImpl;

struct Band {
    hp: OnePoleHighpass,
    lp: OnePoleLowpass,
    low_freq: f64,
    high_freq: f64,
}

impl Band {
    fn new(low_freq: f64, high_freq: f64, sample_rate: f64) -> Self {
        Self {
            hp: OnePoleHighpass::new(alpha_from_freq(low_freq, sample_rate)),
            lp: OnePoleLowpass::new(alpha_from_freq(high_freq, sample_rate)),
            low_freq,
            high_freq,
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.hp.set_alpha(alpha_from_freq(self.low_freq, sample_rate));
        self.lp.set_alpha(alpha_from_freq(self.high_freq, sample_rate));
    }

    fn process(&mut self, x: f64) -> f64 {
        self.lp.process(self.hp.process(x))
    }
}

pub struct ToneStack {
    sample_rate: f64,
    bass: Band,
    mid: Band,
    treble: Band,
    presence: Band,
}

impl ToneStack {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            bass: Band::new(20.0, 300.0, sample_rate),
            mid: Band::new(300.0, 3000.0, sample_rate),
            treble: Band::new(3000.0, 6000.0, sample_rate),
            presence: Band::new(6000.0, 20000.0, sample_rate),
        }
    }
}

impl UnitImpl for ToneStack {
    fn default_parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::numeric("bass", "dB", -12, 12, 0),
            Parameter::numeric("mid", "dB", -12, 12, 0),
            Parameter::numeric("treble", "dB", -12, 12, 0),
            Parameter::numeric("presence", "dB", -12, 12, 0),
        ]
    }

    fn process(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]) {
        if (sample_rate - self.sample_rate).abs() > f64::EPSILON {
            self.sample_rate = sample_rate;
            self.bass.set_sample_rate(sample_rate);
            self.mid.set_sample_rate(sample_rate);
            self.treble.set_sample_rate(sample_rate);
            self.presence.set_sample_rate(sample_rate);
        }
        let bass_gain = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "bass").and_then(|p| p.as_numeric()).unwrap_or(0.0),
        );
        let mid_gain = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "mid").and_then(|p| p.as_numeric()).unwrap_or(0.0),
        );
        let treble_gain = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "treble").and_then(|p| p.as_numeric()).unwrap_or(0.0),
        );
        let presence_gain = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "presence").and_then(|p| p.as_numeric()).unwrap_or(0.0),
        );

        for (i, &x) in input.iter().enumerate() {
            let y = self.bass.process(x) * bass_gain
                + self.mid.process(x) * mid_gain
                + self.treble.process(x) * treble_gain
                + self.presence.process(x) * presence_gain;
            output[i] = plectrum_core::clip(y);
        }
    }

    fn on_sample_rate_changed(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.bass.set_sample_rate(sample_rate);
        self.mid.set_sample_rate(sample_rate);
        self.treble.set_sample_rate(sample_rate);
        self.presence.set_sample_rate(sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_settings_stay_bounded() {
        let mut ts = ToneStack::new(48000.0);
        let params = ts.default_parameters();
        let input: Vec<f64> = (0..2000).map(|i| (i as f64 * 0.05).sin() * 0.5).collect();
        let mut output = vec![0.0; 2000];
        ts.process(&params, 48000.0, &input, &mut output);
        assert!(output.iter().all(|&x| (-1.0..=1.0).contains(&x)));
    }
}
