use rosc::OscType;

use crate::osc_client::OscClient;
use crate::osc_model;

/*
    The software-synth half of the output fan-out. Thin on purpose: voice
    identity and retrigger/idempotence semantics live in the osc_model
    message shapes.
*/

pub struct SynthClient {
    client: OscClient,
}

impl SynthClient {
    pub fn new(client: OscClient) -> SynthClient {
        SynthClient { client }
    }

    pub fn play_note(&self, note: u8, velocity: u8, instrument: &str, args: Vec<OscType>) {
        self.client
            .send(osc_model::create_note_on(note, velocity, instrument, args));
    }

    pub fn stop_note(&self, note: u8) {
        self.client.send(osc_model::create_note_off(note));
    }

    pub fn set_param(&self, name: &str, value: f32) {
        self.client.send(osc_model::create_synth_param(name, value));
    }
}
