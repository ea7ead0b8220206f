//! plectrum-engine: ties the unit catalog, impulse-response bank,
//! spatializer, tuner and metronome into one per-period `EngineState`, and
//! defines the JSON control surface a host talks to it with.

pub mod controller;
pub mod graph;
pub mod meter;
pub mod metronome;
pub mod state;

pub use controller::{ChannelPatch, Command, CommandReply, PatchDocument, UnitPatch};
pub use graph::ProcessingGraph;
pub use meter::{ChannelLevel, LevelMeter};
pub use metronome::Metronome;
pub use state::{EngineState, PeriodOutput};
