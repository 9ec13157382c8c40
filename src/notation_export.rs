use std::collections::HashMap;
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive, Zero};
use rosc::OscType;
use wl_clipboard_rs::copy::{MimeType, Options, Source};

use crate::event_history::SequentialEvent;

/*
    Shuttle-notation rendering of the played history, delivered through the
    clipboard so a sequencer pattern can be pasted straight in.
*/

const NOTE_NAMES: [&str; 12] = [
    "c", "db", "d", "eb", "e", "f", "gb", "g", "ab", "a", "bb", "b",
];

const SILENCE_REP: &str = "x";

/// Letter-and-octave name used by the notation format, octave 1 starting at
/// note 0.
pub fn note_name(note: u8) -> String {
    let letter = NOTE_NAMES[(note % 12) as usize];
    let octave = note / 12 + 1;
    format!("{}{}", letter, octave)
}

pub fn stringify(sequence: &[SequentialEvent], args: &[OscType]) -> String {
    let total_beats = sequence
        .iter()
        .map(|event| event.reserved_beats.clone())
        .reduce(|a, b| a + b)
        .unwrap_or(BigDecimal::zero());

    let desired_total =
        next_power_of_two(total_beats.clone()).max(BigDecimal::from_str("4.0").unwrap());

    let difference = desired_total.clone() - total_beats.clone();

    let arg_string = args_summary(args);

    let notes = sequence
        .iter()
        .map(|seq| {
            let mut base = format!("{}:{:.4}", seq.representation, seq.reserved_beats.normalized());

            if let Some(sustain) = &seq.sustain_beats {
                let rounded = sustain.round(2);
                base += format!(",sus{:.4}", rounded.normalized()).as_str();
            }
            base
        })
        .collect::<Vec<String>>()
        .join(" ");

    // Pad with silence until the next power-of-two beat total
    let diff_note = format!("{}:{:.4}", SILENCE_REP, difference.normalized());

    format!(
        "({} {}):{},len{},tot{}",
        notes, diff_note, arg_string, desired_total, total_beats
    )
}

pub fn copy_to_clipboard(text: &str) {
    let opts = Options::new();
    if let Err(err) = opts.copy(
        Source::Bytes(text.as_bytes().to_vec().into()),
        MimeType::Autodetect,
    ) {
        log::warn!(target: "export", "clipboard copy failed: {}", err);
    }
}

fn next_power_of_two(source: BigDecimal) -> BigDecimal {
    // Round(0) removes decimal digits
    let integer = source
        .with_scale_round(0, RoundingMode::Up)
        .to_u64()
        .unwrap_or(0);
    BigDecimal::from(integer.next_power_of_two())
}

/// Collapse name/value OSC argument pairs into the notation arg suffix.
fn args_summary(args: &[OscType]) -> String {
    let mut map: HashMap<String, OscType> = HashMap::new();

    let mut pending_key: Option<String> = None;
    for arg in args {
        match arg {
            OscType::String(value) if pending_key.is_none() => {
                pending_key = Some(value.clone());
            }
            value => {
                if let Some(key) = pending_key.take() {
                    map.insert(key, value.clone());
                }
            }
        }
    }

    map.iter()
        .map(|(key, value)| {
            let rendered: String = match value {
                OscType::Int(int) => int.to_string(),
                OscType::Float(float) => float.to_string(),
                OscType::String(string) => string.to_string(),
                _ => "err".to_string(),
            };
            format!("{}{}", key, rendered)
        })
        .collect::<Vec<String>>()
        .join(",")
}
