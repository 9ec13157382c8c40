use midir::{MidiOutput, MidiOutputConnection};

use crate::state::ChannelSelection;

/*
    The hardware/virtual half of the output fan-out. The connection is cached
    across note events; it is re-validated only when the user selection
    changes or a send fails (hot-plug), never per note.
*/

const CLIENT_NAME: &str = "jdw-interval-keys";

const NOTE_ON_STATUS: u8 = 0x90;
const NOTE_OFF_STATUS: u8 = 0x80;

pub struct MidiOut {
    connection: Option<MidiOutputConnection>,
    connected_name: Option<String>,
}

impl MidiOut {
    pub fn new() -> MidiOut {
        MidiOut {
            connection: None,
            connected_name: None,
        }
    }

    pub fn connected_name(&self) -> Option<&str> {
        self.connected_name.as_deref()
    }

    /// Keep the cached connection unless the selection no longer matches it.
    pub fn ensure_connected(&mut self, preferred: Option<&str>) {
        if self.connection.is_some() {
            match (&self.connected_name, preferred) {
                (Some(name), Some(want)) if !name.contains(want) => {}
                _ => return,
            }
        }
        self.reconnect(preferred);
    }

    fn reconnect(&mut self, preferred: Option<&str>) {
        self.connection = None;
        self.connected_name = None;

        let output = match MidiOutput::new(CLIENT_NAME) {
            Ok(output) => output,
            Err(err) => {
                log::warn!(target: "midi_out", "midi backend unavailable: {}", err);
                return;
            }
        };

        let ports = output.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|port| output.port_name(port).unwrap_or_default())
            .collect();

        let Some(index) = pick_output(&names, preferred) else {
            log::info!(target: "midi_out", "no midi output devices present");
            return;
        };

        match output.connect(&ports[index], "ivkeys-out") {
            Ok(connection) => {
                log::info!(target: "midi_out", "sending to '{}'", names[index]);
                self.connected_name = Some(names[index].clone());
                self.connection = Some(connection);
            }
            Err(err) => {
                log::warn!(target: "midi_out", "could not open '{}': {}", names[index], err);
            }
        }
    }

    pub fn note_on(&mut self, note: u8, velocity: u8, channel: ChannelSelection) {
        self.send_voice(NOTE_ON_STATUS, note, velocity, channel);
    }

    pub fn note_off(&mut self, note: u8, channel: ChannelSelection) {
        self.send_voice(NOTE_OFF_STATUS, note, 0, channel);
    }

    fn send_voice(&mut self, status: u8, data1: u8, data2: u8, channel: ChannelSelection) {
        let Some(connection) = self.connection.as_mut() else {
            return;
        };

        for message in voice_messages(status, data1, data2, channel) {
            if let Err(err) = connection.send(&message) {
                // Device likely unplugged; drop the cache so the next event
                // re-enumerates and falls back.
                log::warn!(target: "midi_out", "send failed, dropping connection: {}", err);
                self.connection = None;
                self.connected_name = None;
                return;
            }
        }
    }
}

/// Channel-voice bytes for the selection: one message, or the same message
/// fanned out over all 16 channels.
fn voice_messages(status: u8, data1: u8, data2: u8, channel: ChannelSelection) -> Vec<[u8; 3]> {
    let channels: Vec<u8> = match channel {
        ChannelSelection::Channel(ch) => vec![ch],
        ChannelSelection::All => (0..16).collect(),
    };

    channels
        .into_iter()
        .map(|ch| [status | (ch & 0x0F), data1 & 0x7F, data2 & 0x7F])
        .collect()
}

/// Deterministic port preference: the explicit selection when it matches,
/// then a name starting with "1" (bus index convention), then the first name
/// not starting with "2", then the first port at all.
pub fn pick_output(names: &[String], preferred: Option<&str>) -> Option<usize> {
    if names.is_empty() {
        return None;
    }
    if let Some(want) = preferred {
        if let Some(index) = names.iter().position(|name| name.contains(want)) {
            return Some(index);
        }
    }
    if let Some(index) = names.iter().position(|name| name.starts_with('1')) {
        return Some(index);
    }
    if let Some(index) = names.iter().position(|name| !name.starts_with('2')) {
        return Some(index);
    }
    Some(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn explicit_selection_wins() {
        let ports = names(&["1: IAC Bus", "2: Loopback", "USB Synth"]);
        assert_eq!(pick_output(&ports, Some("Synth")), Some(2));
    }

    #[test]
    fn bus_index_one_preferred() {
        let ports = names(&["2: Loopback", "1: IAC Bus"]);
        assert_eq!(pick_output(&ports, None), Some(1));
        // a stale selection that matches nothing falls back the same way
        assert_eq!(pick_output(&ports, Some("gone")), Some(1));
    }

    #[test]
    fn avoids_two_prefix_when_possible() {
        let ports = names(&["2: Loopback", "USB Synth"]);
        assert_eq!(pick_output(&ports, None), Some(1));

        let only_two = names(&["2: Loopback"]);
        assert_eq!(pick_output(&only_two, None), Some(0));
    }

    #[test]
    fn empty_list_yields_nothing() {
        assert_eq!(pick_output(&[], None), None);
    }

    #[test]
    fn single_channel_voice_bytes() {
        let messages = voice_messages(NOTE_ON_STATUS, 56, 100, ChannelSelection::Channel(2));
        assert_eq!(messages, vec![[0x92, 56, 100]]);

        let offs = voice_messages(NOTE_OFF_STATUS, 56, 0, ChannelSelection::Channel(2));
        assert_eq!(offs, vec![[0x82, 56, 0]]);
    }

    #[test]
    fn broadcast_fans_out_over_all_channels() {
        let messages = voice_messages(NOTE_ON_STATUS, 64, 90, ChannelSelection::All);
        assert_eq!(messages.len(), 16);
        for (ch, message) in messages.iter().enumerate() {
            assert_eq!(message[0], 0x90 | ch as u8);
            assert_eq!(message[1], 64);
            assert_eq!(message[2], 90);
        }
    }
}
