//! Controller surface.
//!
//! `Command` is the full implementation of the command table; the
//! HTTPS/CGI transport that would deserialize JSON off a socket into a
//! `Command` is left to the host, so every variant already derives
//! `Serialize`/`Deserialize`.

use plectrum_dsp::UnitTypeTag;
use plectrum_spatial::ChannelSpatial;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    GetConfiguration,
    SetNumericParameter { channel: usize, unit: usize, name: String, value: i32 },
    SetDiscreteParameter { channel: usize, unit: usize, name: String, value: usize },
    SetBypass { channel: usize, unit: usize, bypass: bool },
    AppendUnit { channel: usize, unit_type: UnitTypeTag },
    RemoveUnit { channel: usize, unit: usize },
    MoveUnitUp { channel: usize, unit: usize },
    MoveUnitDown { channel: usize, unit: usize },
    SetChannelSpatial { channel: usize, placement: ChannelSpatial },
    SetMetronome { bpm: f64, beats_per_measure: u32, enabled: bool },
    SetMetronomeMasterOutput { enabled: bool },
    SetMetronomeTickSound { name: String, path: String },
    SetMetronomeTockSound { name: String, path: String },
    SetTunerChannel { channel: Option<usize> },
    GetTunerAnalysis,
    GetLevelAnalysis,
    SetLevelMeterEnabled { enabled: bool },
    SavePatch { path: String },
    LoadPatch { path: String },
    Start,
    Stop,
}

/// The `{success, reason}` envelope every command returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandReply {
    pub success: bool,
    pub reason: String,
}

impl CommandReply {
    pub fn ok() -> Self {
        Self { success: true, reason: String::new() }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self { success: false, reason: reason.into() }
    }
}

/// One unit's persisted state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitPatch {
    pub unit_type: UnitTypeTag,
    pub bypass: bool,
    pub parameters: Vec<plectrum_core::Parameter>,
}

/// One channel's persisted state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelPatch {
    pub units: Vec<UnitPatch>,
    pub spatial: ChannelSpatial,
}

/// File-format version; `load_patch` rejects anything but `type == "patch"`
/// at `major == 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFormatVersion {
    pub major: u32,
    pub minor: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFormat {
    pub application: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: FileFormatVersion,
}

impl FileFormat {
    pub fn current() -> Self {
        Self { application: "plectrum".to_string(), kind: "patch".to_string(), version: FileFormatVersion { major: 1, minor: 0 } }
    }
}

/// The full engine configuration, round-tripped through `save_patch` /
/// `load_patch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchDocument {
    pub file_format: FileFormat,
    pub sample_rate: u32,
    pub channels: Vec<ChannelPatch>,
    pub metronome_bpm: f64,
    pub metronome_beats_per_measure: u32,
    pub metronome_enabled: bool,
    pub metronome_master: bool,
    pub metronome_tick_sound: Option<String>,
    pub metronome_tock_sound: Option<String>,
    pub tuner_channel: Option<usize>,
}
