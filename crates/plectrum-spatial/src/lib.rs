//! plectrum-spatial: binaural stereo mixing.
//!
//! Structurally grounded in `rf-spatial::binaural::renderer::BinauralRenderer`
//! (per-channel state plus a `mix` entry point that fills separate L/R
//! buffers), but implements an explicit trigonometric pan law instead of
//! HRTF convolution.

use plectrum_core::{PlectrumError, PlectrumResult};
use serde::{Deserialize, Serialize};

/// Per-channel placement in the stereo field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpatial {
    pub azimuth_deg: f64,
    pub distance: f64,
    pub level: f64,
}

impl Default for ChannelSpatial {
    fn default() -> Self {
        Self { azimuth_deg: 0.0, distance: 0.0, level: 1.0 }
    }
}

/// `gL = cos((θ+90)/2 · π/180) · ℓ/(1+d²)`, `gR = sin((θ+90)/2 · π/180) · ℓ/(1+d²)`.
pub fn pan_gains(azimuth_deg: f64, distance: f64, level: f64) -> (f64, f64) {
    let half_angle_rad = (azimuth_deg + 90.0) / 2.0 * std::f64::consts::PI / 180.0;
    let distance_falloff = level / (1.0 + distance * distance);
    (half_angle_rad.cos() * distance_falloff, half_angle_rad.sin() * distance_falloff)
}

pub struct Spatializer {
    channels: Vec<ChannelSpatial>,
    metronome_aux: bool,
}

impl Spatializer {
    pub fn new(channel_count: usize) -> Self {
        Self { channels: vec![ChannelSpatial::default(); channel_count], metronome_aux: false }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn set_channel(&mut self, index: usize, placement: ChannelSpatial) -> PlectrumResult<()> {
        let slot = self.channels.get_mut(index).ok_or_else(|| PlectrumError::InvalidArgument(format!("channel {index}")))?;
        log::debug!("channel {index} placement now azimuth={} distance={}", placement.azimuth_deg, placement.distance);
        *slot = placement;
        Ok(())
    }

    pub fn channel(&self, index: usize) -> Option<ChannelSpatial> {
        self.channels.get(index).copied()
    }

    pub fn set_metronome_aux(&mut self, enabled: bool) {
        self.metronome_aux = enabled;
    }

    pub fn metronome_aux(&self) -> bool {
        self.metronome_aux
    }

    /// Mixes all per-channel buffers (and, if enabled, the metronome's
    /// click buffer) down to stereo. All buffers must share the same
    /// length, including `left`/`right`.
    pub fn mix(
        &self,
        channel_inputs: &[&[f64]],
        metronome: Option<&[f64]>,
        left: &mut [f64],
        right: &mut [f64],
    ) -> PlectrumResult<()> {
        if channel_inputs.len() != self.channels.len() {
            return Err(PlectrumError::InvalidArgument("channel count mismatch".to_string()));
        }
        left.fill(0.0);
        right.fill(0.0);

        for (channel, placement) in channel_inputs.iter().zip(&self.channels) {
            let (g_l, g_r) = pan_gains(placement.azimuth_deg, placement.distance, placement.level);
            for (i, &sample) in channel.iter().enumerate() {
                left[i] += sample * g_l;
                right[i] += sample * g_r;
            }
        }

        if self.metronome_aux {
            if let Some(click) = metronome {
                for (i, &sample) in click.iter().enumerate() {
                    left[i] += sample;
                    right[i] += sample;
                }
            }
        }

        for sample in left.iter_mut().chain(right.iter_mut()) {
            *sample = plectrum_core::clip(*sample);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_pan_is_balanced() {
        let (g_l, g_r) = pan_gains(0.0, 0.0, 1.0);
        assert!((g_l - g_r).abs() < 1e-9);
    }

    #[test]
    fn distance_attenuates_both_channels() {
        let (near_l, near_r) = pan_gains(0.0, 0.0, 1.0);
        let (far_l, far_r) = pan_gains(0.0, 3.0, 1.0);
        assert!(far_l < near_l);
        assert!(far_r < near_r);
    }

    #[test]
    fn hard_left_silences_right() {
        let (_, g_r) = pan_gains(-90.0, 0.0, 1.0);
        assert!(g_r.abs() < 1e-9);
    }

    #[test]
    fn mix_sums_channels_into_stereo() {
        let mut spatializer = Spatializer::new(2);
        spatializer.set_channel(0, ChannelSpatial { azimuth_deg: -90.0, distance: 0.0, level: 1.0 }).unwrap();
        spatializer.set_channel(1, ChannelSpatial { azimuth_deg: 90.0, distance: 0.0, level: 1.0 }).unwrap();

        let ch0 = vec![1.0; 4];
        let ch1 = vec![1.0; 4];
        let mut left = vec![0.0; 4];
        let mut right = vec![0.0; 4];
        spatializer.mix(&[&ch0, &ch1], None, &mut left, &mut right).unwrap();

        assert!(left.iter().all(|&x| (x - 1.0).abs() < 1e-6));
        assert!(right.iter().all(|&x| (x - 1.0).abs() < 1e-6));
    }
}
