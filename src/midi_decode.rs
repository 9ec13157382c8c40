use crate::input_model::{ExtControl, ExtNote, InputEvent};

/*
    Raw channel-voice bytes from the external controller, reduced to the two
    message families the engine consumes. Anything else (aftertouch, pitch
    bend, sysex) is dropped here.
*/

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;

pub fn decode(raw: &[u8]) -> Option<InputEvent> {
    if raw.len() < 3 {
        return None;
    }

    let status = raw[0] & 0xF0;
    let data1 = raw[1] & 0x7F;
    let data2 = raw[2] & 0x7F;

    match status {
        // Note-on with velocity zero is a release by convention
        NOTE_ON if data2 > 0 => Some(InputEvent::ExtNote(ExtNote {
            note: data1,
            velocity: data2,
            pressed: true,
        })),
        NOTE_ON | NOTE_OFF => Some(InputEvent::ExtNote(ExtNote {
            note: data1,
            velocity: 0,
            pressed: false,
        })),
        CONTROL_CHANGE => Some(InputEvent::ExtControl(ExtControl {
            number: data1,
            value: data2,
        })),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_any_channel() {
        for channel in 0..16u8 {
            match decode(&[0x90 | channel, 38, 100]) {
                Some(InputEvent::ExtNote(note)) => {
                    assert_eq!(note.note, 38);
                    assert_eq!(note.velocity, 100);
                    assert!(note.pressed);
                }
                other => panic!("unexpected decode: {:?}", other),
            }
        }
    }

    #[test]
    fn zero_velocity_is_release() {
        match decode(&[0x90, 38, 0]) {
            Some(InputEvent::ExtNote(note)) => assert!(!note.pressed),
            other => panic!("unexpected decode: {:?}", other),
        }
        match decode(&[0x83, 38, 64]) {
            Some(InputEvent::ExtNote(note)) => {
                assert_eq!(note.note, 38);
                assert!(!note.pressed);
            }
            other => panic!("unexpected decode: {:?}", other),
        }
    }

    #[test]
    fn control_change() {
        match decode(&[0xB2, 74, 99]) {
            Some(InputEvent::ExtControl(control)) => {
                assert_eq!(control.number, 74);
                assert_eq!(control.value, 99);
            }
            other => panic!("unexpected decode: {:?}", other),
        }
    }

    #[test]
    fn irrelevant_messages_dropped() {
        assert!(decode(&[0xE0, 0, 64]).is_none()); // pitch bend
        assert!(decode(&[0xF8]).is_none()); // clock
        assert!(decode(&[0x90, 60]).is_none()); // truncated
        assert!(decode(&[]).is_none());
    }
}
