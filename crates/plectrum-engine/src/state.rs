//! Engine state: owns every channel's chain, the shared impulse
//! response bank, the spatializer, metronome, tuner and level meter, and
//! exposes the single `process` entry point a host's audio callback calls
//! once per period.

use std::fs;

use plectrum_core::{PlectrumError, PlectrumResult, SUPPORTED_SAMPLE_RATES};
use plectrum_dsp::unit::{UnitAlgo, UnitTypeTag};
use plectrum_dsp::units::{
    auto_wah::AutoWah, bandpass::Bandpass, chorus::Chorus, compressor::Compressor, delay::Delay,
    distortion::Distortion, excess::Excess, flanger::Flanger, fuzz::Fuzz, generator::Generator,
    noise_gate::NoiseGate, octaver::Octaver, overdrive::Overdrive, phaser::Phaser, power_amp::PowerAmp,
    reverb::Reverb, ring_modulator::RingModulator, tone_stack::ToneStack, tremolo::Tremolo,
};
use plectrum_dsp::{Chain, ImpulseResponseBank, Unit};
use plectrum_pitch::Tuner;
use plectrum_spatial::{ChannelSpatial, Spatializer};

use crate::controller::{ChannelPatch, Command, CommandReply, FileFormat, PatchDocument, UnitPatch};
use crate::graph::ProcessingGraph;
use crate::meter::{ChannelLevel, LevelMeter};
use crate::metronome::Metronome;

fn new_unit(unit_type: UnitTypeTag, sample_rate: f64) -> Unit {
    let algo = match unit_type {
        UnitTypeTag::SignalGenerator => UnitAlgo::SignalGenerator(Generator::new(sample_rate)),
        UnitTypeTag::NoiseGate => UnitAlgo::NoiseGate(NoiseGate::new(sample_rate)),
        UnitTypeTag::Bandpass => UnitAlgo::Bandpass(Bandpass::new(sample_rate)),
        UnitTypeTag::AutoWah => UnitAlgo::AutoWah(AutoWah::new(sample_rate)),
        UnitTypeTag::Octaver => UnitAlgo::Octaver(Octaver::new(sample_rate)),
        UnitTypeTag::Fuzz => UnitAlgo::Fuzz(Fuzz::new(sample_rate)),
        UnitTypeTag::Overdrive => UnitAlgo::Overdrive(Overdrive::new(sample_rate)),
        UnitTypeTag::Distortion => UnitAlgo::Distortion(Distortion::new(sample_rate)),
        UnitTypeTag::Excess => UnitAlgo::Excess(Excess::new(sample_rate)),
        UnitTypeTag::ToneStack => UnitAlgo::ToneStack(ToneStack::new(sample_rate)),
        UnitTypeTag::Chorus => UnitAlgo::Chorus(Chorus::new(sample_rate)),
        UnitTypeTag::Flanger => UnitAlgo::Flanger(Flanger::new(sample_rate)),
        UnitTypeTag::Phaser => UnitAlgo::Phaser(Phaser::new(sample_rate)),
        UnitTypeTag::Tremolo => UnitAlgo::Tremolo(Tremolo::new(sample_rate)),
        UnitTypeTag::RingModulator => UnitAlgo::RingModulator(RingModulator::new(sample_rate)),
        UnitTypeTag::Delay => UnitAlgo::Delay(Delay::new(sample_rate)),
        UnitTypeTag::Reverb => UnitAlgo::Reverb(Reverb::new(sample_rate)),
        UnitTypeTag::Compressor => UnitAlgo::Compressor(Compressor::new(sample_rate)),
        UnitTypeTag::PowerAmp => UnitAlgo::PowerAmp(PowerAmp::new(sample_rate)),
    };
    Unit::new(algo, sample_rate)
}

/// One period's worth of output: the N processed channel buffers, the
/// spatializer's master stereo mix, and the metronome's standalone aux
/// buffer.
#[derive(Debug, Clone)]
pub struct PeriodOutput {
    pub channels: Vec<Vec<f64>>,
    pub master_left: Vec<f64>,
    pub master_right: Vec<f64>,
    pub aux: Vec<f64>,
}

pub struct EngineState {
    sample_rate: u32,
    channels: Vec<Chain>,
    ir_bank: ImpulseResponseBank,
    spatializer: Spatializer,
    metronome: Metronome,
    tuner: Tuner,
    tuner_channel: Option<usize>,
    meter: LevelMeter,
    graph: ProcessingGraph,
    running: bool,
    scratch: Vec<Vec<f64>>,
    click_buffer: Vec<f64>,
    last_tuner_analysis: Option<plectrum_pitch::TunerAnalysis>,
}

impl EngineState {
    pub fn new(channel_count: usize, sample_rate: u32, worker_count: usize) -> Self {
        Self {
            sample_rate,
            channels: (0..channel_count).map(|_| Chain::new()).collect(),
            ir_bank: ImpulseResponseBank::new(),
            spatializer: Spatializer::new(channel_count),
            metronome: Metronome::new(sample_rate as f64),
            tuner: Tuner::new(sample_rate as f64),
            tuner_channel: None,
            meter: LevelMeter::new(channel_count),
            graph: ProcessingGraph::new(worker_count),
            running: false,
            scratch: (0..channel_count).map(|_| Vec::new()).collect(),
            click_buffer: Vec::new(),
            last_tuner_analysis: None,
        }
    }

    pub fn ir_bank_mut(&mut self) -> &mut ImpulseResponseBank {
        &mut self.ir_bank
    }

    /// Reads a WAVE impulse response and registers it in the bank at every
    /// supported sample rate, mixing to mono first if the file is
    /// multi-channel. This is the engine layer's half of the `plectrum-dsp`/
    /// `plectrum-file` split: the bank only stores resolved filters.
    pub fn load_impulse_response(&mut self, name: &str, path: &str) -> PlectrumResult<()> {
        log::debug!("loading impulse response {name} from {path}");
        let audio = plectrum_file::read_wav(path).map_err(|e| PlectrumError::FormatError(e.to_string()))?;
        if audio.channels.is_empty() {
            return Err(PlectrumError::MissingResource(format!("impulse response {name} has no channels")));
        }
        let frames = audio.num_frames();
        let mono: Vec<f64> = (0..frames)
            .map(|i| audio.channels.iter().map(|c| c[i]).sum::<f64>() / audio.channels.len() as f64)
            .collect();

        for &rate in &SUPPORTED_SAMPLE_RATES {
            let coeffs = if rate == audio.sample_rate {
                mono.clone()
            } else {
                plectrum_file::resample_planar(&[mono.clone()], audio.sample_rate, rate)
                    .map_err(|e| PlectrumError::FormatError(e.to_string()))?
                    .into_iter()
                    .next()
                    .unwrap_or_default()
            };
            self.ir_bank.insert(name, rate, coeffs);
        }
        Ok(())
    }

    /// Reads a WAVE file, mixes it to mono, and installs it as the
    /// metronome's tick (downbeat) sound.
    pub fn load_metronome_tick(&mut self, name: &str, path: &str) -> PlectrumResult<()> {
        let samples = self.read_mono_wav(path)?;
        self.metronome.set_tick(Some(name.to_string()), samples);
        Ok(())
    }

    /// Reads a WAVE file, mixes it to mono, and installs it as the
    /// metronome's tock (off-beat) sound.
    pub fn load_metronome_tock(&mut self, name: &str, path: &str) -> PlectrumResult<()> {
        let samples = self.read_mono_wav(path)?;
        self.metronome.set_tock(Some(name.to_string()), samples);
        Ok(())
    }

    fn read_mono_wav(&self, path: &str) -> PlectrumResult<Vec<f64>> {
        let audio = plectrum_file::read_wav(path).map_err(|e| PlectrumError::FormatError(e.to_string()))?;
        if audio.channels.is_empty() {
            return Err(PlectrumError::MissingResource(format!("{path} has no channels")));
        }
        let frames = audio.num_frames();
        let mono: Vec<f64> = (0..frames)
            .map(|i| audio.channels.iter().map(|c| c[i]).sum::<f64>() / audio.channels.len() as f64)
            .collect();
        if audio.sample_rate == self.sample_rate {
            Ok(mono)
        } else {
            plectrum_file::resample_planar(&[mono], audio.sample_rate, self.sample_rate)
                .map_err(|e| PlectrumError::FormatError(e.to_string()))?
                .into_iter()
                .next()
                .ok_or_else(|| PlectrumError::FormatError(format!("{path} resample produced no data")))
        }
    }

    /// Wires a bank entry into one power-amp unit's slot at the engine's
    /// current sample rate.
    pub fn assign_power_amp_slot(
        &mut self,
        channel: usize,
        unit: usize,
        slot: usize,
        ir_name: &str,
    ) -> PlectrumResult<()> {
        let sample_rate = self.sample_rate;
        let filter = self
            .ir_bank
            .get(ir_name, sample_rate)
            .ok_or_else(|| PlectrumError::MissingResource(ir_name.to_string()))?
            .filter
            .clone();
        let amp = self
            .unit_mut(channel, unit)?
            .power_amp_mut()
            .ok_or_else(|| PlectrumError::WrongType("not a power-amp unit".to_string()))?;
        amp.set_slot(slot, Some(filter));
        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Notifies every component of a host sample-rate change.
    pub fn set_sample_rate(&mut self, sample_rate: u32) -> PlectrumResult<()> {
        if !SUPPORTED_SAMPLE_RATES.contains(&sample_rate) {
            return Err(PlectrumError::InvalidArgument(format!("unsupported sample rate {sample_rate}")));
        }
        log::debug!("sample rate changing {} -> {sample_rate}", self.sample_rate);
        self.sample_rate = sample_rate;
        for chain in &mut self.channels {
            chain.set_sample_rate(sample_rate as f64);
        }
        self.metronome.set_sample_rate(sample_rate as f64);
        self.tuner.set_sample_rate(sample_rate as f64);
        Ok(())
    }

    /// The one entry point a host audio callback calls once per period:
    /// N processed channel outputs plus the master stereo mix and the
    /// metronome aux buffer.
    pub fn process(&mut self, inputs: &[Vec<f64>]) -> PeriodOutput {
        let period = inputs.first().map(|c| c.len()).unwrap_or(0);
        for buf in &mut self.scratch {
            buf.resize(period, 0.0);
        }
        self.click_buffer.resize(period, 0.0);

        self.graph.process_period(&mut self.channels, inputs, &mut self.scratch);

        if let Some(channel) = self.tuner_channel.and_then(|c| inputs.get(c)) {
            self.last_tuner_analysis = self.tuner.analyze(channel).ok();
        }

        self.metronome.process(&mut self.click_buffer);

        let channel_refs: Vec<&[f64]> = self.scratch.iter().map(|v| v.as_slice()).collect();
        self.meter.update(&channel_refs);

        let mut master_left = vec![0.0; period];
        let mut master_right = vec![0.0; period];
        let _ =
            self.spatializer.mix(&channel_refs, Some(&self.click_buffer), &mut master_left, &mut master_right);

        PeriodOutput {
            channels: self.scratch.clone(),
            master_left,
            master_right,
            aux: self.click_buffer.clone(),
        }
    }

    pub fn get_level_analysis(&self) -> Vec<ChannelLevel> {
        self.meter.levels()
    }

    pub fn get_tuner_analysis(&self) -> Option<plectrum_pitch::TunerAnalysis> {
        self.last_tuner_analysis.clone()
    }

    /// Applies one control command, returning the `{success, reason}`
    /// envelope every command returns.
    pub fn apply(&mut self, command: Command) -> CommandReply {
        match self.apply_inner(command) {
            Ok(()) => CommandReply::ok(),
            Err(e) => {
                log::warn!("command rejected: {e}");
                CommandReply::error(e.to_string())
            }
        }
    }

    fn chain_mut(&mut self, channel: usize) -> PlectrumResult<&mut Chain> {
        self.channels.get_mut(channel).ok_or_else(|| PlectrumError::InvalidArgument(format!("channel {channel}")))
    }

    fn unit_mut(&mut self, channel: usize, unit: usize) -> PlectrumResult<&mut Unit> {
        self.chain_mut(channel)?
            .unit_mut(unit)
            .ok_or_else(|| PlectrumError::InvalidArgument(format!("unit {unit} on channel {channel}")))
    }

    fn apply_inner(&mut self, command: Command) -> PlectrumResult<()> {
        match command {
            Command::GetConfiguration | Command::GetTunerAnalysis | Command::GetLevelAnalysis => Ok(()),
            Command::SetNumericParameter { channel, unit, name, value } => {
                self.unit_mut(channel, unit)?.set_numeric(&name, value)
            }
            Command::SetDiscreteParameter { channel, unit, name, value } => {
                self.unit_mut(channel, unit)?.set_discrete(&name, value)
            }
            Command::SetBypass { channel, unit, bypass } => {
                self.unit_mut(channel, unit)?.set_bypass(bypass);
                Ok(())
            }
            Command::AppendUnit { channel, unit_type } => {
                let sample_rate = self.sample_rate as f64;
                self.chain_mut(channel)?.append(new_unit(unit_type, sample_rate));
                Ok(())
            }
            Command::RemoveUnit { channel, unit } => {
                self.chain_mut(channel)?
                    .remove(unit)
                    .map(|_| ())
                    .ok_or_else(|| PlectrumError::InvalidArgument(format!("unit {unit}")))
            }
            Command::MoveUnitUp { channel, unit } => {
                if self.chain_mut(channel)?.move_up(unit) {
                    Ok(())
                } else {
                    Err(PlectrumError::InvalidArgument(format!("cannot move unit {unit} up")))
                }
            }
            Command::MoveUnitDown { channel, unit } => {
                if self.chain_mut(channel)?.move_down(unit) {
                    Ok(())
                } else {
                    Err(PlectrumError::InvalidArgument(format!("cannot move unit {unit} down")))
                }
            }
            Command::SetChannelSpatial { channel, placement } => self.spatializer.set_channel(channel, placement),
            Command::SetMetronome { bpm, beats_per_measure, enabled } => {
                self.metronome.set_bpm(bpm);
                self.metronome.set_beats_per_measure(beats_per_measure);
                self.metronome.set_enabled(enabled);
                Ok(())
            }
            Command::SetMetronomeMasterOutput { enabled } => {
                self.spatializer.set_metronome_aux(enabled);
                Ok(())
            }
            Command::SetMetronomeTickSound { name, path } => self.load_metronome_tick(&name, &path),
            Command::SetMetronomeTockSound { name, path } => self.load_metronome_tock(&name, &path),
            Command::SetTunerChannel { channel } => {
                if let Some(c) = channel {
                    if c >= self.channels.len() {
                        return Err(PlectrumError::InvalidArgument(format!("channel {c}")));
                    }
                }
                self.tuner_channel = channel;
                Ok(())
            }
            Command::SetLevelMeterEnabled { enabled } => {
                self.meter.set_enabled(enabled);
                Ok(())
            }
            Command::SavePatch { path } => self.save_patch(&path),
            Command::LoadPatch { path } => self.load_patch(&path),
            Command::Start => {
                self.running = true;
                Ok(())
            }
            Command::Stop => {
                self.running = false;
                Ok(())
            }
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    fn to_patch_document(&self) -> PatchDocument {
        PatchDocument {
            file_format: FileFormat::current(),
            sample_rate: self.sample_rate,
            channels: self
                .channels
                .iter()
                .enumerate()
                .map(|(i, chain)| ChannelPatch {
                    units: chain
                        .units()
                        .iter()
                        .map(|u| UnitPatch { unit_type: u.unit_type(), bypass: u.bypass(), parameters: u.parameters() })
                        .collect(),
                    spatial: self.spatializer.channel(i).unwrap_or_default(),
                })
                .collect(),
            metronome_bpm: self.metronome.bpm(),
            metronome_beats_per_measure: self.metronome.beats_per_measure(),
            metronome_enabled: self.metronome.enabled(),
            metronome_master: self.spatializer.metronome_aux(),
            metronome_tick_sound: self.metronome.tick_name().map(str::to_string),
            metronome_tock_sound: self.metronome.tock_name().map(str::to_string),
            tuner_channel: self.tuner_channel,
        }
    }

    fn save_patch(&self, path: &str) -> PlectrumResult<()> {
        let document = self.to_patch_document();
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| PlectrumError::FormatError(e.to_string()))?;
        log::info!("saving patch to {path} ({} channels)", document.channels.len());
        fs::write(path, json).map_err(PlectrumError::Io)
    }

    /// Loads a patch, validating it entirely before mutating any engine
    /// state.
    fn load_patch(&mut self, path: &str) -> PlectrumResult<()> {
        let json = fs::read_to_string(path).map_err(PlectrumError::Io)?;
        let document: PatchDocument =
            serde_json::from_str(&json).map_err(|e| PlectrumError::FormatError(e.to_string()))?;

        if document.file_format.kind != "patch" {
            return Err(PlectrumError::FormatError(format!(
                "unexpected file_format.type {:?}, expected \"patch\"",
                document.file_format.kind
            )));
        }
        if document.file_format.version.major != 1 {
            return Err(PlectrumError::FormatError(format!(
                "unsupported patch version {}.{}",
                document.file_format.version.major, document.file_format.version.minor
            )));
        }
        if document.channels.len() != self.channels.len() {
            return Err(PlectrumError::InvalidArgument(format!(
                "patch has {} channels, engine has {}",
                document.channels.len(),
                self.channels.len()
            )));
        }
        if !SUPPORTED_SAMPLE_RATES.contains(&document.sample_rate) {
            return Err(PlectrumError::InvalidArgument(format!("unsupported sample rate {}", document.sample_rate)));
        }
        log::info!("loading patch from {path} ({} channels)", document.channels.len());

        let sample_rate = document.sample_rate as f64;
        let mut new_channels = Vec::with_capacity(document.channels.len());
        for channel_patch in &document.channels {
            let mut chain = Chain::new();
            for unit_patch in &channel_patch.units {
                let mut unit = new_unit(unit_patch.unit_type, sample_rate);
                unit.set_bypass(unit_patch.bypass);
                for param in &unit_patch.parameters {
                    match &param.kind {
                        plectrum_core::ParamKind::Numeric { current, .. } => {
                            unit.set_numeric(&param.name, *current)?;
                        }
                        plectrum_core::ParamKind::Discrete { selected_index, .. } => {
                            unit.set_discrete(&param.name, *selected_index)?;
                        }
                    }
                }
                chain.append(unit);
            }
            new_channels.push(chain);
        }

        self.sample_rate = document.sample_rate;
        self.channels = new_channels;
        for (i, channel_patch) in document.channels.iter().enumerate() {
            let _ = self.spatializer.set_channel(i, channel_patch.spatial);
        }
        self.metronome.set_sample_rate(sample_rate);
        self.metronome.set_bpm(document.metronome_bpm);
        self.metronome.set_beats_per_measure(document.metronome_beats_per_measure);
        self.metronome.set_enabled(document.metronome_enabled);
        self.spatializer.set_metronome_aux(document.metronome_master);
        self.tuner.set_sample_rate(sample_rate);
        self.tuner_channel = document.tuner_channel;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_bypass_unit_round_trip() {
        let mut engine = EngineState::new(2, 48000, 2);
        let reply = engine.apply(Command::AppendUnit { channel: 0, unit_type: UnitTypeTag::Overdrive });
        assert!(reply.success);
        let reply = engine.apply(Command::SetBypass { channel: 0, unit: 0, bypass: true });
        assert!(reply.success);
        assert!(engine.channels[0].unit(0).unwrap().bypass());
    }

    #[test]
    fn invalid_channel_returns_failure_envelope() {
        let mut engine = EngineState::new(1, 48000, 1);
        let reply = engine.apply(Command::SetBypass { channel: 5, unit: 0, bypass: true });
        assert!(!reply.success);
        assert!(!reply.reason.is_empty());
    }

    #[test]
    fn process_produces_stereo_output_of_period_length() {
        let mut engine = EngineState::new(2, 48000, 2);
        let inputs = vec![vec![0.1; 256], vec![0.2; 256]];
        let output = engine.process(&inputs);
        assert_eq!(output.master_left.len(), 256);
        assert_eq!(output.master_right.len(), 256);
        assert_eq!(output.channels.len(), 2);
        assert_eq!(output.aux.len(), 256);
    }

    #[test]
    fn save_and_load_patch_round_trips() {
        let mut engine = EngineState::new(1, 48000, 1);
        engine.apply(Command::AppendUnit { channel: 0, unit_type: UnitTypeTag::Delay });
        engine.apply(Command::SetNumericParameter { channel: 0, unit: 0, name: "time".to_string(), value: 500 });
        engine.apply(Command::SetMetronomeMasterOutput { enabled: true });

        let path = std::env::temp_dir().join("plectrum_engine_test_patch.json");
        let path_str = path.to_string_lossy().to_string();
        assert!(engine.apply(Command::SavePatch { path: path_str.clone() }).success);

        let mut fresh = EngineState::new(1, 48000, 1);
        assert!(fresh.apply(Command::LoadPatch { path: path_str.clone() }).success);
        assert_eq!(fresh.channels[0].len(), 1);
        assert!(fresh.spatializer.metronome_aux());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_patch_rejects_wrong_file_format_type() {
        let document = serde_json::json!({
            "file_format": {"application": "plectrum", "type": "not-a-patch", "version": {"major": 1, "minor": 0}},
            "sample_rate": 48000,
            "channels": [],
            "metronome_bpm": 120.0,
            "metronome_beats_per_measure": 4,
            "metronome_enabled": false,
            "metronome_master": false,
            "metronome_tick_sound": null,
            "metronome_tock_sound": null,
            "tuner_channel": null,
        });
        let path = std::env::temp_dir().join("plectrum_engine_test_bad_patch.json");
        std::fs::write(&path, document.to_string()).unwrap();

        let mut engine = EngineState::new(0, 48000, 1);
        let reply = engine.apply(Command::LoadPatch { path: path.to_string_lossy().to_string() });
        assert!(!reply.success);

        let _ = std::fs::remove_file(&path);
    }
}
