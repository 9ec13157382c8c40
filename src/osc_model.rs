use bigdecimal::ToPrimitive;
use rosc::{OscMessage, OscPacket, OscType};

/*
    Message constructors for the synth collaborator. Notes are addressed by a
    stable per-pitch external id, which makes retriggers replace the running
    voice and makes gate-offs for dead voices harmless no-ops server-side.
*/

fn note_id(note: u8) -> String {
    format!("ivkeys_note_{}", note)
}

pub fn create_note_on(
    note: u8,
    velocity: u8,
    synth_name: &str,
    args: Vec<OscType>,
) -> OscPacket {
    let freq = psg::math::midi_pitch_to_frequency(note.to_f64().unwrap_or(0.0));
    let amp = velocity as f32 / 127.0;

    let mut base_args = vec![
        OscType::String(synth_name.to_string()),
        OscType::String(note_id(note)),
        OscType::Int(0),
        OscType::String("freq".to_string()),
        OscType::Float(freq as f32),
        OscType::String("amp".to_string()),
        OscType::Float(amp),
    ];

    base_args.extend(args);

    OscPacket::Message(OscMessage {
        addr: "/note_on".to_string(),
        args: base_args,
    })
}

pub fn create_note_off(note: u8) -> OscPacket {
    OscPacket::Message(OscMessage {
        addr: "/note_modify".to_string(),
        args: vec![
            OscType::String(note_id(note)),
            OscType::Int(0),
            OscType::String("gate".to_string()),
            OscType::Float(0.0),
        ],
    })
}

pub fn create_synth_param(name: &str, value: f32) -> OscPacket {
    OscPacket::Message(OscMessage {
        addr: "/synth_param".to_string(),
        args: vec![
            OscType::String(name.to_string()),
            OscType::Float(value),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_carries_frequency_and_amp() {
        let packet = create_note_on(69, 127, "aPad", Vec::new());
        let OscPacket::Message(msg) = packet else {
            panic!("expected a message");
        };

        assert_eq!(msg.addr, "/note_on");
        assert_eq!(msg.args[0], OscType::String("aPad".to_string()));
        assert_eq!(msg.args[1], OscType::String("ivkeys_note_69".to_string()));

        // A440 for midi note 69
        let OscType::Float(freq) = msg.args[4] else {
            panic!("expected freq arg");
        };
        assert!((freq - 440.0).abs() < 0.01);

        let OscType::Float(amp) = msg.args[6] else {
            panic!("expected amp arg");
        };
        assert!((amp - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn note_off_gates_the_same_id() {
        let OscPacket::Message(msg) = create_note_off(69) else {
            panic!("expected a message");
        };
        assert_eq!(msg.addr, "/note_modify");
        assert_eq!(msg.args[0], OscType::String("ivkeys_note_69".to_string()));
        assert_eq!(msg.args[3], OscType::Float(0.0));
    }
}
