//! Overdrive: a sigmoid soft-clipper blended against the dry signal
//! by `drive_pct`, `y = drive_pct/100*(2/(1+exp(-gain*x))-1) + (1-drive_pct/100)*x`.

use plectrum_core::Parameter;

use crate::unit::UnitImpl;

pub struct Overdrive {
    sample_rate: f64,
}

impl Overdrive {
    pub fn new(sample_rate: f64) -> Self {
        Self { sample_rate }
    }
}

impl UnitImpl for Overdrive {
    fn default_parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::numeric("drive", "dB", 0, 30, 12),
            Parameter::numeric("drive_pct", "%", 0, 100, 70),
            Parameter::numeric("level", "dB", -24, 12, 0),
        ]
    }

    fn process(&mut self, params: &[Parameter], sample_rate: f64, input: &[f64], output: &mut [f64]) {
        self.sample_rate = sample_rate;
        let gain = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "drive").and_then(|p| p.as_numeric()).unwrap_or(12.0),
        );
        let drive_pct =
            plectrum_core::find(params, "drive_pct").and_then(|p| p.as_numeric()).unwrap_or(70.0) / 100.0;
        let level = plectrum_core::decibels_to_factor(
            plectrum_core::find(params, "level").and_then(|p| p.as_numeric()).unwrap_or(0.0),
        );

        for (i, &x) in input.iter().enumerate() {
            let sigmoid = 2.0 / (1.0 + (-gain * x).exp()) - 1.0;
            let shaped = drive_pct * sigmoid + (1.0 - drive_pct) * x;
            output[i] = plectrum_core::clip(shaped * level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_input_saturates_towards_unity() {
        let mut od = Overdrive::new(48000.0);
        let mut params = od.default_parameters();
        params[2].set_numeric(0).unwrap();
        let input = vec![100.0];
        let mut output = vec![0.0; 1];
        od.process(&params, 48000.0, &input, &mut output);
        assert!(output[0] > 0.95 && output[0] <= 1.0);
    }

    #[test]
    fn zero_input_is_zero() {
        let mut od = Overdrive::new(48000.0);
        let params = od.default_parameters();
        let input = vec![0.0; 8];
        let mut output = vec![0.0; 8];
        od.process(&params, 48000.0, &input, &mut output);
        assert!(output.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn zero_drive_pct_is_transparent() {
        let mut od = Overdrive::new(48000.0);
        let mut params = od.default_parameters();
        params[1].set_numeric(0).unwrap();
        params[2].set_numeric(0).unwrap();
        let input = vec![0.3, -0.4, 0.9];
        let mut output = vec![0.0; 3];
        od.process(&params, 48000.0, &input, &mut output);
        for (&x, &y) in input.iter().zip(output.iter()) {
            assert!((x - y).abs() < 1e-9);
        }
    }
}
