//! The effects unit contract: a `Unit` pairs a `parking_lot`
//! read-write-locked parameter vector with per-effect algorithmic state.
//!
//! Mutators (`set_numeric`/`set_discrete`) take `&self` and only ever touch
//! the lock; `process` takes `&mut self` and only ever touches `algo`. A
//! chain's owning thread is the sole caller of `process` for a period, so
//! the algorithmic state never needs its own lock.

use parking_lot::RwLock;
use plectrum_core::{find, find_mut, PlectrumError, PlectrumResult};
use plectrum_core::Parameter;
use serde::{Deserialize, Serialize};

use crate::units::{
    auto_wah::AutoWah, bandpass::Bandpass, chorus::Chorus, compressor::Compressor,
    delay::Delay, distortion::Distortion, excess::Excess, flanger::Flanger, fuzz::Fuzz,
    generator::Generator, noise_gate::NoiseGate, octaver::Octaver, overdrive::Overdrive,
    phaser::Phaser, power_amp::PowerAmp, reverb::Reverb, ring_modulator::RingModulator,
    tone_stack::ToneStack, tremolo::Tremolo,
};

/// One row of the unit catalog; also the unit's wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitTypeTag {
    SignalGenerator,
    NoiseGate,
    Bandpass,
    AutoWah,
    Octaver,
    Fuzz,
    Overdrive,
    Distortion,
    Excess,
    ToneStack,
    Chorus,
    Flanger,
    Phaser,
    Tremolo,
    RingModulator,
    Delay,
    Reverb,
    Compressor,
    PowerAmp,
}

/// Per-effect algorithmic state, dispatched by static `match` rather than
/// a trait object so the hot per-period path never goes through a vtable.
pub enum UnitAlgo {
    SignalGenerator(Generator),
    NoiseGate(NoiseGate),
    Bandpass(Bandpass),
    AutoWah(AutoWah),
    Octaver(Octaver),
    Fuzz(Fuzz),
    Overdrive(Overdrive),
    Distortion(Distortion),
    Excess(Excess),
    ToneStack(ToneStack),
    Chorus(Chorus),
    Flanger(Flanger),
    Phaser(Phaser),
    Tremolo(Tremolo),
    RingModulator(RingModulator),
    Delay(Delay),
    Reverb(Reverb),
    Compressor(Compressor),
    PowerAmp(PowerAmp),
}

impl UnitAlgo {
    pub fn type_tag(&self) -> UnitTypeTag {
        match self {
            UnitAlgo::SignalGenerator(_) => UnitTypeTag::SignalGenerator,
            UnitAlgo::NoiseGate(_) => UnitTypeTag::NoiseGate,
            UnitAlgo::Bandpass(_) => UnitTypeTag::Bandpass,
            UnitAlgo::AutoWah(_) => UnitTypeTag::AutoWah,
            UnitAlgo::Octaver(_) => UnitTypeTag::Octaver,
            UnitAlgo::Fuzz(_) => UnitTypeTag::Fuzz,
            UnitAlgo::Overdrive(_) => UnitTypeTag::Overdrive,
            UnitAlgo::Distortion(_) => UnitTypeTag::Distortion,
            UnitAlgo::Excess(_) => UnitTypeTag::Excess,
            UnitAlgo::ToneStack(_) => UnitTypeTag::ToneStack,
            UnitAlgo::Chorus(_) => UnitTypeTag::Chorus,
            UnitAlgo::Flanger(_) => UnitTypeTag::Flanger,
            UnitAlgo::Phaser(_) => UnitTypeTag::Phaser,
            UnitAlgo::Tremolo(_) => UnitTypeTag::Tremolo,
            UnitAlgo::RingModulator(_) => UnitTypeTag::RingModulator,
            UnitAlgo::Delay(_) => UnitTypeTag::Delay,
            UnitAlgo::Reverb(_) => UnitTypeTag::Reverb,
            UnitAlgo::Compressor(_) => UnitTypeTag::Compressor,
            UnitAlgo::PowerAmp(_) => UnitTypeTag::PowerAmp,
        }
    }

    fn default_parameters(&self) -> Vec<Parameter> {
        match self {
            UnitAlgo::SignalGenerator(u) => u.default_parameters(),
            UnitAlgo::NoiseGate(u) => u.default_parameters(),
            UnitAlgo::Bandpass(u) => u.default_parameters(),
            UnitAlgo::AutoWah(u) => u.default_parameters(),
            UnitAlgo::Octaver(u) => u.default_parameters(),
            UnitAlgo::Fuzz(u) => u.default_parameters(),
            UnitAlgo::Overdrive(u) => u.default_parameters(),
            UnitAlgo::Distortion(u) => u.default_parameters(),
            UnitAlgo::Excess(u) => u.default_parameters(),
            UnitAlgo::ToneStack(u) => u.default_parameters(),
            UnitAlgo::Chorus(u) => u.default_parameters(),
            UnitAlgo::Flanger(u) => u.default_parameters(),
            UnitAlgo::Phaser(u) => u.default_parameters(),
            UnitAlgo::Tremolo(u) => u.default_parameters(),
            UnitAlgo::RingModulator(u) => u.default_parameters(),
            UnitAlgo::Delay(u) => u.default_parameters(),
            UnitAlgo::Reverb(u) => u.default_parameters(),
            UnitAlgo::Compressor(u) => u.default_parameters(),
            UnitAlgo::PowerAmp(u) => u.default_parameters(),
        }
    }

    fn process_block(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]) {
        match self {
            UnitAlgo::SignalGenerator(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::NoiseGate(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::Bandpass(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::AutoWah(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::Octaver(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::Fuzz(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::Overdrive(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::Distortion(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::Excess(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::ToneStack(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::Chorus(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::Flanger(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::Phaser(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::Tremolo(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::RingModulator(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::Delay(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::Reverb(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::Compressor(u) => u.process(params, sample_rate, input, output),
            UnitAlgo::PowerAmp(u) => u.process(params, sample_rate, input, output),
        }
    }

    fn on_sample_rate_changed(&mut self, sample_rate: f64) {
        match self {
            UnitAlgo::SignalGenerator(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::NoiseGate(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::Bandpass(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::AutoWah(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::Octaver(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::Fuzz(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::Overdrive(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::Distortion(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::Excess(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::ToneStack(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::Chorus(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::Flanger(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::Phaser(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::Tremolo(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::RingModulator(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::Delay(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::Reverb(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::Compressor(u) => u.on_sample_rate_changed(sample_rate),
            UnitAlgo::PowerAmp(u) => u.on_sample_rate_changed(sample_rate),
        }
    }
}

/// Contract every unit must satisfy, implemented once per
/// effect module and dispatched through `UnitAlgo`'s match arms above.
pub trait UnitImpl {
    fn default_parameters(&self) -> Vec<Parameter>;
    fn process(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]);
    fn on_sample_rate_changed(&mut self, sample_rate: f64) {
        let _ = sample_rate;
    }
}

pub struct Unit {
    params: RwLock<Vec<Parameter>>,
    algo: UnitAlgo,
    sample_rate: f64,
    bypass: bool,
}

impl Unit {
    pub fn new(algo: UnitAlgo, sample_rate: f64) -> Self {
        let params = algo.default_parameters();
        Self { params: RwLock::new(params), algo, sample_rate, bypass: false }
    }

    pub fn unit_type(&self) -> UnitTypeTag {
        self.algo.type_tag()
    }

    pub fn parameters(&self) -> Vec<Parameter> {
        self.params.read().clone()
    }

    pub fn bypass(&self) -> bool {
        self.bypass
    }

    pub fn set_bypass(&mut self, bypass: bool) {
        self.bypass = bypass;
    }

    pub fn get_numeric(&self, name: &str) -> PlectrumResult<i32> {
        let params = self.params.read();
        find(&params, name)
            .ok_or_else(|| PlectrumError::UnknownParameter(name.to_string()))?
            .as_numeric()
            .map(|v| v as i32)
            .ok_or_else(|| PlectrumError::WrongType(name.to_string()))
    }

    pub fn get_discrete(&self, name: &str) -> PlectrumResult<usize> {
        let params = self.params.read();
        find(&params, name)
            .ok_or_else(|| PlectrumError::UnknownParameter(name.to_string()))?
            .as_discrete_index()
            .ok_or_else(|| PlectrumError::WrongType(name.to_string()))
    }

    pub fn set_numeric(&self, name: &str, value: i32) -> PlectrumResult<()> {
        let mut params = self.params.write();
        let p = find_mut(&mut params, name).ok_or_else(|| PlectrumError::UnknownParameter(name.to_string()))?;
        p.set_numeric(value)
    }

    pub fn set_discrete(&self, name: &str, value: usize) -> PlectrumResult<()> {
        let mut params = self.params.write();
        let p = find_mut(&mut params, name).ok_or_else(|| PlectrumError::UnknownParameter(name.to_string()))?;
        p.set_discrete(value)
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.algo.on_sample_rate_changed(sample_rate);
    }

    /// Accessor used by the engine layer to wire resolved impulse
    /// responses into a power-amp unit's slots.
    pub fn power_amp_mut(&mut self) -> Option<&mut crate::units::power_amp::PowerAmp> {
        match &mut self.algo {
            UnitAlgo::PowerAmp(amp) => Some(amp),
            _ => None,
        }
    }

    /// Run one period. Bypassed units copy input to output untouched
    ///.
    pub fn process(&mut self, input: &[f64], output: &mut [f64]) {
        debug_assert_eq!(input.len(), output.len());
        if self.bypass {
            output.copy_from_slice(input);
            return;
        }
        let snapshot = self.params.read().clone();
        self.algo.process_block(&snapshot, self.sample_rate, input, output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::generator::Generator;

    #[test]
    fn bypass_copies_input_to_output() {
        let mut unit = Unit::new(UnitAlgo::SignalGenerator(Generator::new(48000.0)), 48000.0);
        unit.set_bypass(true);
        let input = vec![0.1, 0.2, 0.3];
        let mut output = vec![0.0; 3];
        unit.process(&input, &mut output);
        assert_eq!(input, output);
    }

    #[test]
    fn unknown_parameter_errors() {
        let unit = Unit::new(UnitAlgo::SignalGenerator(Generator::new(48000.0)), 48000.0);
        assert!(unit.get_numeric("does-not-exist").is_err());
    }
}
