use std::error::Error;
use std::thread::sleep;
use std::time::Duration;

use midir::{Ignore, MidiInput};
use ringbuf::traits::Producer;

use crate::input_model::{InputEvent, PipePub};
use crate::midi_decode;

/*
    Reads the external controller and publishes decoded events on the input
    pipe. Having no controller attached is a supported configuration:
    keyboard and pointer play continue without it.
*/

const CLIENT_NAME: &str = "jdw-interval-keys";

pub fn begin(
    mut publisher: PipePub<InputEvent>,
    port_hint: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let mut midi_in = MidiInput::new(CLIENT_NAME)?;
    midi_in.ignore(Ignore::None);

    let ports = midi_in.ports();
    let port = match &port_hint {
        Some(hint) => ports.iter().find(|port| {
            midi_in
                .port_name(port)
                .map(|name| name.contains(hint))
                .unwrap_or(false)
        }),
        None => ports.first(),
    };

    let Some(port) = port else {
        log::warn!(target: "midi_in", "no external midi input found, continuing without one");
        return Ok(());
    };

    let port_name = midi_in.port_name(port)?;

    // _conn_in needs to be a named binding: dropping it closes the subscription
    let _conn_in = midi_in.connect(
        port,
        "ivkeys-in",
        move |_stamp, message, _| {
            if let Some(event) = midi_decode::decode(message) {
                if publisher.try_push(event).is_err() {
                    log::debug!(target: "midi_in", "input pipe full, dropping event");
                }
            }
        },
        (),
    )?;

    log::info!(target: "midi_in", "reading from '{}'", port_name);

    loop {
        sleep(Duration::from_secs(3600));
    }
}
