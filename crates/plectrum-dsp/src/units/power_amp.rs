//! Power-amp engine: up to eight impulse-response slots,
//! each independently gained, combined and order-reduced into one
//! compiled `Filter`. Recompilation happens synchronously whenever a
//! slot's gain or the target order changes.

use plectrum_core::Parameter;

use crate::fir::Filter;
use crate::unit::UnitImpl;

const SLOTS: usize = 8;
const ORDER_CHOICES: [usize; 15] = [
    64, 128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768, 65536, 131072, 262144, 524288, 1048576,
];

pub struct PowerAmp {
    sample_rate: f64,
    slots: [Option<Filter>; SLOTS],
    compiled: Option<Filter>,
    dirty_key: Vec<i32>,
}

impl PowerAmp {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            slots: [None, None, None, None, None, None, None, None],
            compiled: None,
            dirty_key: Vec::new(),
        }
    }

    /// Assigns (or clears) the impulse response materialized for one slot.
    /// Called by the engine layer once it has resolved a slot's named
    /// impulse response at the current sample rate.
    pub fn set_slot(&mut self, slot: usize, filter: Option<Filter>) {
        if slot < SLOTS {
            self.slots[slot] = filter;
            self.dirty_key.clear();
        }
    }

    fn current_key(&self, params: &[Parameter]) -> Vec<i32> {
        let mut key = Vec::with_capacity(SLOTS + 1);
        for i in 0..SLOTS {
            key.push(plectrum_core::find(params, &format!("slot_{i}_gain")).and_then(|p| p.as_numeric()).unwrap_or(0.0) as i32);
        }
        key.push(
            plectrum_core::find(params, "order").and_then(|p| p.as_discrete_index()).unwrap_or(ORDER_CHOICES.len() - 1) as i32,
        );
        key
    }

    fn recompile(&mut self, params: &[Parameter]) {
        let order_index = plectrum_core::find(params, "order")
            .and_then(|p| p.as_discrete_index())
            .unwrap_or(ORDER_CHOICES.len() - 1);
        let target_order = ORDER_CHOICES[order_index.min(ORDER_CHOICES.len() - 1)];

        let mut combined: Option<Filter> = None;
        for (i, slot) in self.slots.iter().enumerate() {
            let Some(filter) = slot else { continue };
            let gain_db =
                plectrum_core::find(params, &format!("slot_{i}_gain")).and_then(|p| p.as_numeric()).unwrap_or(0.0);
            let reduced =
                if filter.len() > target_order { filter.reduce_order(target_order) } else { filter.clone() };
            let normalized = reduced.normalize(1.0);
            let scaled = normalized.scale(plectrum_core::decibels_to_factor(gain_db));
            combined = Some(match combined {
                Some(acc) => acc.add(&scaled),
                None => scaled,
            });
        }

        self.compiled = combined;
    }
}

impl UnitImpl for PowerAmp {
    fn default_parameters(&self) -> Vec<Parameter> {
        let mut params = Vec::with_capacity(SLOTS + 1);
        for i in 0..SLOTS {
            params.push(Parameter::numeric(&format!("slot_{i}_gain"), "dB", -24, 12, 0));
        }
        params.push(Parameter::discrete(
            "order",
            &[
                "64", "128", "256", "512", "1024", "2048", "4096", "8192", "16384", "32768", "65536", "131072",
                "262144", "524288", "1048576",
            ],
            ORDER_CHOICES.len() - 1,
        ));
        params
    }

    fn process(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]) {
        self.sample_rate = sample_rate;
        let key = self.current_key(params);
        if key != self.dirty_key {
            log::debug!("power amp recompiling, key {key:?} -> {:?}", self.dirty_key);
            self.recompile(params);
            self.dirty_key = key;
        }

        match &mut self.compiled {
            Some(filter) => filter.convolve(input, output),
            None => output.fill(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_slots_means_silence() {
        let mut amp = PowerAmp::new(48000.0);
        let params = amp.default_parameters();
        let input = vec![1.0; 16];
        let mut output = vec![0.0; 16];
        amp.process(&params, 48000.0, &input, &mut output);
        assert!(output.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn single_slot_passes_through_unity_gain() {
        let mut amp = PowerAmp::new(48000.0);
        amp.set_slot(0, Some(Filter::new(vec![1.0], 48000)));
        let params = amp.default_parameters();
        let input = vec![0.3, -0.2, 0.1];
        let mut output = vec![0.0; 3];
        amp.process(&params, 48000.0, &input, &mut output);
        for (a, b) in input.iter().zip(output.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn reduces_order_when_ir_longer_than_target() {
        let mut amp = PowerAmp::new(48000.0);
        amp.set_slot(0, Some(Filter::new(vec![1.0; 4000], 48000)));
        let mut params = amp.default_parameters();
        params[SLOTS].set_discrete(0).unwrap();
        let input = vec![0.1; 8];
        let mut output = vec![0.0; 8];
        amp.process(&params, 48000.0, &input, &mut output);
        assert_eq!(amp.compiled.as_ref().unwrap().len(), ORDER_CHOICES[0]);
    }
}
