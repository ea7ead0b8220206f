//! The nineteen effects units of the catalog, one module each.

pub mod auto_wah;
pub mod bandpass;
pub mod chorus;
pub mod compressor;
pub mod delay;
pub mod distortion;
pub mod excess;
pub mod flanger;
pub mod fuzz;
pub mod generator;
pub mod noise_gate;
pub mod octaver;
pub mod overdrive;
pub mod phaser;
pub mod power_amp;
pub mod reverb;
pub mod ring_modulator;
pub mod tone_stack;
pub mod tremolo;
