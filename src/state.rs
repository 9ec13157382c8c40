use std::collections::HashMap;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use rosc::OscType;

use crate::mapping::MappingStore;

/*
    Configurable, shared state variables. Written by the OSC daemon, read by
    the engine thread. Note state (anchor, holds) lives in the engine itself.
*/

pub const DEFAULT_KEY_VELOCITY: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelSelection {
    /// A single channel, 0-indexed internally.
    Channel(u8),
    /// Broadcast to all 16 channels.
    All,
}

impl ChannelSelection {
    /// User-facing selection: 1-16 picks a channel, 0 means all.
    pub fn from_user(value: i32) -> ChannelSelection {
        match value {
            0 => ChannelSelection::All,
            ch => ChannelSelection::Channel((ch.clamp(1, 16) - 1) as u8),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SynthParam {
    pub value: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl SynthParam {
    fn new(value: f32, min: f32, max: f32, step: f32) -> SynthParam {
        SynthParam {
            value,
            min,
            max,
            step,
        }
    }
}

pub struct State {
    pub synth_muted: bool,
    pub midi_muted: bool,
    pub channel: ChannelSelection,
    pub velocity_multiplier: u16,
    pub use_pad_velocity: bool,
    pub pad_velocity: u8,
    pub key_velocities: HashMap<char, u8>,
    pub instrument_name: String,
    pub message_args: Vec<OscType>,
    pub synth_params: HashMap<String, SynthParam>,
    pub mappings: MappingStore,
    pub selected_output: Option<String>,
    pub bpm: i64,
    pub quantization: BigDecimal,
}

impl State {
    pub fn new() -> State {
        State {
            synth_muted: false,
            midi_muted: false,
            channel: ChannelSelection::Channel(0),
            velocity_multiplier: 100,
            use_pad_velocity: false,
            pad_velocity: DEFAULT_KEY_VELOCITY,
            key_velocities: HashMap::new(),
            instrument_name: "aPad".to_string(),
            message_args: vec![
                OscType::String("relT".to_string()),
                OscType::Float(0.2),
                OscType::String("ofs".to_string()),
                OscType::Float(0.0),
            ],
            synth_params: default_synth_params(),
            mappings: MappingStore::new(),
            selected_output: None,
            bpm: 120,
            quantization: BigDecimal::from_str("0.125").unwrap(),
        }
    }

    pub fn key_velocity(&self, label: char) -> u8 {
        self.key_velocities
            .get(&label)
            .copied()
            .unwrap_or(DEFAULT_KEY_VELOCITY)
    }

    pub fn set_key_velocity(&mut self, label: char, velocity: i32) {
        self.key_velocities
            .insert(label, velocity.clamp(1, 127) as u8);
    }

    pub fn set_velocity_multiplier(&mut self, percent: i32) {
        self.velocity_multiplier = percent.clamp(1, 200) as u16;
    }

    pub fn set_pad_velocity(&mut self, velocity: i32) {
        self.pad_velocity = velocity.clamp(1, 127) as u8;
    }

    pub fn set_bpm(&mut self, value: i64) {
        self.bpm = value.clamp(4, 999);
    }

    pub fn set_quantization(&mut self, number_string: &str) {
        match BigDecimal::from_str(number_string) {
            Ok(quantization) if quantization > BigDecimal::from(0) => {
                self.quantization = quantization
            }
            _ => log::warn!(target: "state", "ignoring bad quantization '{}'", number_string),
        }
    }

    pub fn set_args(&mut self, args: Vec<OscType>) {
        self.message_args = args;
    }

    /// Clamp and store a parameter value. Unknown names are ignored.
    pub fn set_param_value(&mut self, name: &str, value: f32) -> Option<f32> {
        let param = self.synth_params.get_mut(name)?;
        param.value = value.clamp(param.min, param.max);
        Some(param.value)
    }
}

fn default_synth_params() -> HashMap<String, SynthParam> {
    [
        ("waveform", SynthParam::new(0.0, 0.0, 3.0, 1.0)),
        ("attack", SynthParam::new(0.01, 0.0, 2.0, 0.01)),
        ("decay", SynthParam::new(0.1, 0.0, 2.0, 0.01)),
        ("sustain", SynthParam::new(0.7, 0.0, 1.0, 0.01)),
        ("release", SynthParam::new(0.2, 0.0, 4.0, 0.01)),
        ("cutoff", SynthParam::new(8000.0, 20.0, 20000.0, 10.0)),
        ("resonance", SynthParam::new(0.2, 0.0, 1.0, 0.01)),
        ("volume", SynthParam::new(0.8, 0.0, 1.0, 0.01)),
    ]
    .into_iter()
    .map(|(name, param)| (name.to_string(), param))
    .collect()
}
