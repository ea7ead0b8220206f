//! Level meter: per-channel RMS and peak tracking, with
//! enabling/disabling resetting the accumulators.

#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelLevel {
    pub rms_db: f64,
    pub peak_db: f64,
}

struct ChannelAccumulator {
    sum_squares: f64,
    count: usize,
    peak: f64,
}

impl ChannelAccumulator {
    fn new() -> Self {
        Self { sum_squares: 0.0, count: 0, peak: 0.0 }
    }

    fn reset(&mut self) {
        self.sum_squares = 0.0;
        self.count = 0;
        self.peak = 0.0;
    }

    fn accumulate(&mut self, samples: &[f64]) {
        for &x in samples {
            self.sum_squares += x * x;
            self.count += 1;
            self.peak = self.peak.max(x.abs());
        }
    }

    fn snapshot(&self) -> ChannelLevel {
        let rms = if self.count > 0 { (self.sum_squares / self.count as f64).sqrt() } else { 0.0 };
        ChannelLevel {
            rms_db: plectrum_core::factor_to_decibels(rms.max(1e-12)),
            peak_db: plectrum_core::factor_to_decibels(self.peak.max(1e-12)),
        }
    }
}

pub struct LevelMeter {
    enabled: bool,
    channels: Vec<ChannelAccumulator>,
}

impl LevelMeter {
    pub fn new(channel_count: usize) -> Self {
        Self { enabled: true, channels: (0..channel_count).map(|_| ChannelAccumulator::new()).collect() }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        log::debug!("level meter enabled = {enabled}");
        if !enabled {
            for channel in &mut self.channels {
                channel.reset();
            }
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn update(&mut self, channel_buffers: &[&[f64]]) {
        if !self.enabled {
            return;
        }
        for (channel, buffer) in self.channels.iter_mut().zip(channel_buffers) {
            channel.accumulate(buffer);
        }
    }

    pub fn levels(&self) -> Vec<ChannelLevel> {
        self.channels.iter().map(ChannelAccumulator::snapshot).collect()
    }

    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabling_resets_accumulators() {
        let mut meter = LevelMeter::new(1);
        let buf = vec![1.0; 100];
        meter.update(&[&buf]);
        assert!(meter.levels()[0].peak_db > -60.0);
        meter.set_enabled(false);
        assert_eq!(meter.levels()[0].peak_db, plectrum_core::factor_to_decibels(1e-12));
    }

    #[test]
    fn silence_reports_floor() {
        let mut meter = LevelMeter::new(1);
        let buf = vec![0.0; 1000];
        meter.update(&[&buf]);
        assert!(meter.levels()[0].rms_db < -100.0);
    }
}
