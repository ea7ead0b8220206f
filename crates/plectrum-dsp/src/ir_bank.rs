//! Impulse response storage for the power-amp unit.
//!
//! The bank holds one `Filter` per (name, sample rate) pair. Loading WAVE
//! files and resampling to the supported rates is `plectrum-file`'s job;
//! this module only stores the result, keeping `plectrum-dsp` free of a
//! dependency on the file-I/O crate.

use std::collections::HashMap;

use crate::fir::Filter;

#[derive(Clone)]
pub struct ImpulseResponse {
    pub name: String,
    pub sample_rate: u32,
    pub filter: Filter,
}

#[derive(Default)]
pub struct ImpulseResponseBank {
    entries: HashMap<String, HashMap<u32, ImpulseResponse>>,
}

impl ImpulseResponseBank {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Register one rate's worth of coefficients for a named impulse response.
    pub fn insert(&mut self, name: &str, sample_rate: u32, coeffs: Vec<f64>) {
        let filter = Filter::new(coeffs, sample_rate);
        self.entries.entry(name.to_string()).or_default().insert(
            sample_rate,
            ImpulseResponse { name: name.to_string(), sample_rate, filter },
        );
    }

    pub fn get(&self, name: &str, sample_rate: u32) -> Option<&ImpulseResponse> {
        self.entries.get(name)?.get(&sample_rate)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn rates_for(&self, name: &str) -> Vec<u32> {
        self.entries
            .get(name)
            .map(|rates| {
                let mut r: Vec<u32> = rates.keys().copied().collect();
                r.sort_unstable();
                r
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_fetch_round_trip() {
        let mut bank = ImpulseResponseBank::new();
        bank.insert("cab-4x12", 48000, vec![1.0, 0.5, 0.25]);
        let ir = bank.get("cab-4x12", 48000).expect("ir present");
        assert_eq!(ir.name, "cab-4x12");
        assert_eq!(ir.filter.len(), 3);
        assert!(bank.get("cab-4x12", 44100).is_none());
    }

    #[test]
    fn names_are_sorted() {
        let mut bank = ImpulseResponseBank::new();
        bank.insert("zeta", 48000, vec![1.0]);
        bank.insert("alpha", 48000, vec![1.0]);
        assert_eq!(bank.names(), vec!["alpha".to_string(), "zeta".to_string()]);
    }
}
