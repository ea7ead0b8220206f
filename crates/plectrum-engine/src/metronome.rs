//! Metronome: an integer sample/beat counter plays back an
//! installed tick-coefficient buffer on the downbeat of each period and a
//! tock-coefficient buffer on every other beat.

pub struct Metronome {
    sample_rate: f64,
    bpm: f64,
    beats_per_measure: u32,
    enabled: bool,
    samples_per_beat: u64,
    sample_counter: u64,
    beat_counter: u32,
    tick_name: Option<String>,
    tick_samples: Vec<f64>,
    tock_name: Option<String>,
    tock_samples: Vec<f64>,
}

impl Metronome {
    pub fn new(sample_rate: f64) -> Self {
        let bpm = 120.0;
        let beats_per_measure = 4;
        let samples_per_beat = samples_per_beat_for(bpm, sample_rate);
        Self {
            sample_rate,
            bpm,
            beats_per_measure,
            enabled: false,
            samples_per_beat,
            sample_counter: 0,
            beat_counter: 0,
            tick_name: None,
            tick_samples: Vec::new(),
            tock_name: None,
            tock_samples: Vec::new(),
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = bpm.clamp(20.0, 400.0);
        self.samples_per_beat = samples_per_beat_for(self.bpm, self.sample_rate);
        log::debug!("metronome bpm set to {}", self.bpm);
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn set_beats_per_measure(&mut self, beats: u32) {
        self.beats_per_measure = beats.max(1);
        self.beat_counter %= self.beats_per_measure;
    }

    pub fn beats_per_measure(&self) -> u32 {
        self.beats_per_measure
    }

    /// Installs the tick (downbeat) sample buffer under a named identifier.
    pub fn set_tick(&mut self, name: Option<String>, samples: Vec<f64>) {
        log::debug!("metronome tick sound set to {name:?} ({} samples)", samples.len());
        self.tick_name = name;
        self.tick_samples = samples;
    }

    /// Installs the tock (off-beat) sample buffer under a named identifier.
    pub fn set_tock(&mut self, name: Option<String>, samples: Vec<f64>) {
        log::debug!("metronome tock sound set to {name:?} ({} samples)", samples.len());
        self.tock_name = name;
        self.tock_samples = samples;
    }

    pub fn tick_name(&self) -> Option<&str> {
        self.tick_name.as_deref()
    }

    pub fn tock_name(&self) -> Option<&str> {
        self.tock_name.as_deref()
    }

    /// Recomputes beat timing for a new sample rate, preserving the
    /// fractional position within the current beat and resampling the
    /// installed tick/tock buffers.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        let phase_fraction = if self.samples_per_beat > 0 {
            self.sample_counter as f64 / self.samples_per_beat as f64
        } else {
            0.0
        };

        if (sample_rate - self.sample_rate).abs() > f64::EPSILON {
            if !self.tick_samples.is_empty() {
                match plectrum_file::resample_planar(&[self.tick_samples.clone()], self.sample_rate as u32, sample_rate as u32) {
                    Ok(mut resampled) => self.tick_samples = resampled.remove(0),
                    Err(e) => log::error!("metronome tick resample failed: {e}"),
                }
            }
            if !self.tock_samples.is_empty() {
                match plectrum_file::resample_planar(&[self.tock_samples.clone()], self.sample_rate as u32, sample_rate as u32) {
                    Ok(mut resampled) => self.tock_samples = resampled.remove(0),
                    Err(e) => log::error!("metronome tock resample failed: {e}"),
                }
            }
        }

        self.sample_rate = sample_rate;
        self.samples_per_beat = samples_per_beat_for(self.bpm, sample_rate);
        self.sample_counter = (phase_fraction * self.samples_per_beat as f64).round() as u64;
    }

    /// Fills `output` with one period's worth of tick/tock samples.
    pub fn process(&mut self, output: &mut [f64]) {
        for sample in output.iter_mut() {
            if !self.enabled {
                *sample = 0.0;
            } else {
                let source = if self.beat_counter == 0 { &self.tick_samples } else { &self.tock_samples };
                *sample = source.get(self.sample_counter as usize).copied().unwrap_or(0.0);
            }

            self.sample_counter += 1;
            if self.sample_counter >= self.samples_per_beat.max(1) {
                self.sample_counter = 0;
                self.beat_counter = (self.beat_counter + 1) % self.beats_per_measure;
            }
        }
    }
}

fn samples_per_beat_for(bpm: f64, sample_rate: f64) -> u64 {
    (60.0 / bpm * sample_rate).round().max(1.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_metronome_is_silent() {
        let mut metro = Metronome::new(48000.0);
        metro.set_tick(None, vec![1.0]);
        let mut output = vec![0.0; 48000];
        metro.process(&mut output);
        assert!(output.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn tick_fires_at_the_start_of_every_beat() {
        let mut metro = Metronome::new(1000.0);
        metro.set_enabled(true);
        metro.set_bpm(60.0);
        metro.set_beats_per_measure(2);
        metro.set_tick(Some("click".into()), vec![1.0]);
        metro.set_tock(None, vec![]);
        let mut output = vec![0.0; 4000];
        metro.process(&mut output);
        assert_eq!(output[0], 1.0);
        assert_eq!(output[1000], 0.0);
        assert_eq!(output[2000], 1.0);
        assert_eq!(output[3000], 0.0);
    }

    #[test]
    fn tick_spacing_matches_rounded_samples_per_beat() {
        let mut metro = Metronome::new(44100.0);
        metro.set_enabled(true);
        metro.set_bpm(137.0);
        metro.set_beats_per_measure(1);
        metro.set_tick(Some("click".into()), vec![1.0]);
        let expected_spacing = (60.0 / 137.0 * 44100.0_f64).round() as usize;
        let mut output = vec![0.0; expected_spacing * 3];
        metro.process(&mut output);
        let onsets: Vec<usize> = output.iter().enumerate().filter(|&(_, &x)| x == 1.0).map(|(i, _)| i).collect();
        assert!(onsets.len() >= 2);
        assert_eq!(onsets[1] - onsets[0], expected_spacing);
    }

    #[test]
    fn sample_rate_change_preserves_phase_fraction() {
        let mut metro = Metronome::new(48000.0);
        metro.set_enabled(true);
        metro.sample_counter = metro.samples_per_beat / 4;
        metro.set_sample_rate(96000.0);
        let fraction = metro.sample_counter as f64 / metro.samples_per_beat as f64;
        assert!((fraction - 0.25).abs() < 1e-3);
    }
}
