use std::error::Error;
use std::path::Path;

use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};

use crate::event_history::TimedNote;

/*
    Single-track SMF rendering of the played history. Real elapsed time is
    mapped onto ticks through the configured bpm, so the file plays back at
    the speed it was performed.
*/

const TICKS_PER_BEAT: u16 = 480;
const EXPORT_CHANNEL: u8 = 0;
const EXPORT_VELOCITY: u8 = 100;

pub fn write_file(notes: &[TimedNote], bpm: i64, path: &Path) -> Result<(), Box<dyn Error>> {
    let bpm = bpm.clamp(4, 999);

    let header = Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(TICKS_PER_BEAT)),
    );
    let mut smf = Smf::new(header);
    let mut track = Track::new();

    let tempo_us = (60_000_000 / bpm) as u32;
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_us))),
    });

    for (tick, on, note) in tick_moments(notes, bpm) {
        track.push(event_at(tick, on, note));
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    smf.tracks.push(track);
    smf.save(path)?;
    Ok(())
}

/// Interleaved on/off moments as (delta_ticks, is_on, note), off before on
/// at equal ticks.
fn tick_moments(notes: &[TimedNote], bpm: i64) -> Vec<(u32, bool, u8)> {
    let beats_per_second = bpm as f64 / 60.0;
    let to_ticks =
        |seconds: f64| (seconds * beats_per_second * TICKS_PER_BEAT as f64).round() as u64;

    let mut moments: Vec<(u64, bool, u8)> = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        let on_tick = to_ticks(note.onset.as_secs_f64());
        let off_tick = on_tick + to_ticks(note.duration.as_secs_f64()).max(1);
        moments.push((on_tick, true, note.note));
        moments.push((off_tick, false, note.note));
    }
    moments.sort_by_key(|(tick, on, _)| (*tick, *on));

    let mut last_tick = 0u64;
    moments
        .into_iter()
        .map(|(tick, on, note)| {
            let delta = (tick - last_tick) as u32;
            last_tick = tick;
            (delta, on, note)
        })
        .collect()
}

fn event_at(delta: u32, on: bool, note: u8) -> TrackEvent<'static> {
    let message = if on {
        MidiMessage::NoteOn {
            key: u7::new(note & 0x7F),
            vel: u7::new(EXPORT_VELOCITY),
        }
    } else {
        MidiMessage::NoteOff {
            key: u7::new(note & 0x7F),
            vel: u7::new(0),
        }
    };

    TrackEvent {
        delta: u28::new(delta.min(0x0FFF_FFFF)),
        kind: TrackEventKind::Midi {
            channel: u4::new(EXPORT_CHANNEL),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn moments_delta_encode_in_order() {
        // two quarter notes at 120 bpm, 500ms apart, held 250ms each
        let notes = [
            TimedNote {
                note: 60,
                onset: Duration::ZERO,
                duration: Duration::from_millis(250),
            },
            TimedNote {
                note: 64,
                onset: Duration::from_millis(500),
                duration: Duration::from_millis(250),
            },
        ];

        let moments = tick_moments(&notes, 120);
        assert_eq!(
            moments,
            vec![
                (0, true, 60),
                (240, false, 60),  // half a beat held
                (240, true, 64),   // next onset at one full beat
                (240, false, 64),
            ]
        );
    }

    #[test]
    fn off_precedes_on_at_equal_tick() {
        let notes = [
            TimedNote {
                note: 60,
                onset: Duration::ZERO,
                duration: Duration::from_millis(500),
            },
            TimedNote {
                note: 62,
                onset: Duration::from_millis(500),
                duration: Duration::from_millis(100),
            },
        ];

        let moments = tick_moments(&notes, 120);
        assert_eq!(moments[1], (480, false, 60));
        assert_eq!(moments[2], (0, true, 62));
    }

    #[test]
    fn zero_length_notes_still_close() {
        let notes = [TimedNote {
            note: 60,
            onset: Duration::ZERO,
            duration: Duration::ZERO,
        }];
        let moments = tick_moments(&notes, 120);
        assert_eq!(moments, vec![(0, true, 60), (1, false, 60)]);
    }
}
