//! Uniform parameter metadata for effects units

use serde::{Deserialize, Serialize};

use crate::error::PlectrumError;

/// Discrete or numeric parameter payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ParamKind {
    Numeric {
        minimum: i32,
        maximum: i32,
        current: i32,
    },
    Discrete {
        values: Vec<String>,
        selected_index: usize,
    },
}

/// One tunable knob on a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub physical_unit: String,
    #[serde(flatten)]
    pub kind: ParamKind,
}

impl Parameter {
    /// Build a numeric parameter, clamping `current` into `[minimum, maximum]`.
    pub fn numeric(name: &str, physical_unit: &str, minimum: i32, maximum: i32, current: i32) -> Self {
        debug_assert!(minimum <= maximum, "numeric parameter {name} has min > max");
        Self {
            name: name.to_string(),
            physical_unit: physical_unit.to_string(),
            kind: ParamKind::Numeric {
                minimum,
                maximum,
                current: current.clamp(minimum, maximum),
            },
        }
    }

    /// Build a discrete parameter. Panics if `values` is empty.
    pub fn discrete(name: &str, values: &[&str], selected_index: usize) -> Self {
        assert!(!values.is_empty(), "discrete parameter {name} has no values");
        Self {
            name: name.to_string(),
            physical_unit: String::new(),
            kind: ParamKind::Discrete {
                values: values.iter().map(|s| s.to_string()).collect(),
                selected_index: selected_index.min(values.len() - 1),
            },
        }
    }

    /// Current numeric value as `f64`, for unit algorithms that want float math.
    pub fn as_numeric(&self) -> Option<f64> {
        match &self.kind {
            ParamKind::Numeric { current, .. } => Some(*current as f64),
            ParamKind::Discrete { .. } => None,
        }
    }

    pub fn as_discrete_index(&self) -> Option<usize> {
        match &self.kind {
            ParamKind::Discrete { selected_index, .. } => Some(*selected_index),
            ParamKind::Numeric { .. } => None,
        }
    }

    pub fn set_numeric(&mut self, value: i32) -> Result<(), PlectrumError> {
        match &mut self.kind {
            ParamKind::Numeric { minimum, maximum, current } => {
                if value < *minimum || value > *maximum {
                    log::debug!("{} = {value} rejected, range [{minimum}, {maximum}]", self.name);
                    return Err(PlectrumError::OutOfRange(self.name.clone()));
                }
                *current = value;
                Ok(())
            }
            ParamKind::Discrete { .. } => Err(PlectrumError::WrongType(self.name.clone())),
        }
    }

    pub fn set_discrete(&mut self, value: usize) -> Result<(), PlectrumError> {
        match &mut self.kind {
            ParamKind::Discrete { values, selected_index } => {
                if value >= values.len() {
                    return Err(PlectrumError::OutOfRange(self.name.clone()));
                }
                *selected_index = value;
                Ok(())
            }
            ParamKind::Numeric { .. } => Err(PlectrumError::WrongType(self.name.clone())),
        }
    }
}

/// Find a parameter by name within a slice, used by every unit's get/set.
pub fn find<'a>(params: &'a [Parameter], name: &str) -> Option<&'a Parameter> {
    params.iter().find(|p| p.name == name)
}

pub fn find_mut<'a>(params: &'a mut [Parameter], name: &str) -> Option<&'a mut Parameter> {
    params.iter_mut().find(|p| p.name == name)
}

/// `decibels_to_factor(dB) = 10^(dB/20)`.
#[inline]
pub fn decibels_to_factor(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// `factor_to_decibels(x) = 20 log10(x)`.
#[inline]
pub fn factor_to_decibels(factor: f64) -> f64 {
    20.0 * factor.log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_round_trip() {
        let mut p = Parameter::numeric("gain", "dB", -60, 12, 0);
        p.set_numeric(6).unwrap();
        assert_eq!(p.as_numeric(), Some(6.0));
    }

    #[test]
    fn numeric_out_of_range() {
        let mut p = Parameter::numeric("gain", "dB", -60, 12, 0);
        assert!(p.set_numeric(100).is_err());
    }

    #[test]
    fn discrete_round_trip() {
        let mut p = Parameter::discrete("waveform", &["sine", "square"], 0);
        p.set_discrete(1).unwrap();
        assert_eq!(p.as_discrete_index(), Some(1));
    }

    #[test]
    fn wrong_type_rejected() {
        let mut p = Parameter::discrete("waveform", &["sine", "square"], 0);
        assert!(p.set_numeric(1).is_err());
    }

    #[test]
    fn db_round_trip() {
        let f = decibels_to_factor(20.0);
        assert!((f - 10.0).abs() < 1e-9);
        assert!((factor_to_decibels(f) - 20.0).abs() < 1e-9);
    }
}
