use std::collections::VecDeque;
use std::time::{Duration, Instant};

use bigdecimal::BigDecimal;

use crate::event_model::{Event, NoteOn};
use crate::notation_export;
use crate::util::{duration_to_beats, round_to_nearest};

/*
    Append-only record of what was played, for display and the exports. The
    resolution logic never reads it. Bounded: the oldest events fall off once
    the buffer is full.
*/

pub const MAX_HISTORY: usize = 1000;

/// Fallback length for a note whose release was never recorded (e.g. still
/// held at export time).
const DEFAULT_SUSTAIN: Duration = Duration::from_millis(200);

pub struct EventHistory {
    events: VecDeque<Event>,
}

/// One history note with its quantized timing, ready for notation output.
pub struct SequentialEvent {
    pub representation: String,
    pub reserved_beats: BigDecimal,
    pub sustain_beats: Option<BigDecimal>,
}

/// One history note with real-time placement, ready for MIDI file output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedNote {
    pub note: u8,
    pub onset: Duration,
    pub duration: Duration,
}

impl EventHistory {
    pub fn new() -> EventHistory {
        EventHistory {
            events: VecDeque::new(),
        }
    }

    pub fn add(&mut self, event: Event) {
        if self.events.len() >= MAX_HISTORY {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /*
        Find the first following NoteOff matching the given NoteOn and infer
        the time passed between them.
    */
    fn sustain_of(&self, event: &NoteOn) -> Option<Duration> {
        let mut self_found = false;

        for iter_event in &self.events {
            if !self_found {
                if let Event::NoteOn(note_on) = iter_event {
                    if note_on == event {
                        self_found = true;
                    }
                }
            } else if let Event::NoteOff(note_off) = iter_event {
                if note_off.note == event.note {
                    return Some(note_off.time.duration_since(event.time));
                }
            }
        }

        None
    }

    /// Sequential representation with beat-quantized gaps and sustains.
    pub fn as_sequence(&self, bpm: i64, quantization: BigDecimal) -> Vec<SequentialEvent> {
        let mut next_note_time: Option<Instant> = None;

        let mut notes: Vec<SequentialEvent> = self
            .events
            .iter()
            .rev() // iterate backwards so the next event time is always known
            .filter_map(|event| match event {
                Event::NoteOn(note_on) => {
                    let gap = next_note_time
                        .map(|next| next.duration_since(note_on.time))
                        .unwrap_or(Duration::ZERO);

                    next_note_time = Some(note_on.time);

                    let sustain_beats = self.sustain_of(note_on).map(|sustain| {
                        round_to_nearest(duration_to_beats(sustain, bpm), quantization.clone())
                    });

                    let reserved_beats =
                        round_to_nearest(duration_to_beats(gap, bpm), quantization.clone());

                    Some(SequentialEvent {
                        representation: notation_export::note_name(note_on.note),
                        reserved_beats,
                        sustain_beats,
                    })
                }
                _ => None,
            })
            .collect();

        notes.reverse();
        notes
    }

    /// Real-time note placements relative to the first recorded note.
    pub fn timed_notes(&self) -> Vec<TimedNote> {
        let first = self.events.iter().find_map(|event| match event {
            Event::NoteOn(note_on) => Some(note_on.time),
            _ => None,
        });
        let Some(first) = first else {
            return Vec::new();
        };

        self.events
            .iter()
            .filter_map(|event| match event {
                Event::NoteOn(note_on) => Some(TimedNote {
                    note: note_on.note,
                    onset: note_on.time.duration_since(first),
                    duration: self.sustain_of(note_on).unwrap_or(DEFAULT_SUSTAIN),
                }),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::event_model::NoteOff;

    use super::*;

    fn on(note: u8, at: Instant, offset: Duration) -> Event {
        Event::NoteOn(NoteOn {
            note,
            time: at + offset,
        })
    }

    fn off(note: u8, at: Instant, offset: Duration) -> Event {
        Event::NoteOff(NoteOff {
            note,
            time: at + offset,
        })
    }

    #[test]
    fn oldest_events_evicted_at_capacity() {
        let mut history = EventHistory::new();
        let start = Instant::now();

        for tick in 0..(MAX_HISTORY + 10) {
            history.add(on(60, start, Duration::from_millis(tick as u64)));
        }
        assert_eq!(history.events.len(), MAX_HISTORY);

        // the survivor set is the most recent one
        let first_kept = history.timed_notes()[0];
        assert_eq!(first_kept.onset, Duration::ZERO);
        assert_eq!(history.timed_notes().len(), MAX_HISTORY);
    }

    #[test]
    fn sequence_quantizes_gaps_and_sustains() {
        let mut history = EventHistory::new();
        let start = Instant::now();

        // two quarter notes at 120 bpm: 500ms apart, each held ~240ms
        history.add(on(60, start, Duration::ZERO));
        history.add(off(60, start, Duration::from_millis(240)));
        history.add(on(64, start, Duration::from_millis(500)));
        history.add(off(64, start, Duration::from_millis(740)));

        let sequence = history.as_sequence(120, BigDecimal::from_str("0.25").unwrap());
        assert_eq!(sequence.len(), 2);

        assert_eq!(sequence[0].representation, "c6");
        assert_eq!(
            sequence[0].reserved_beats,
            BigDecimal::from_str("1").unwrap()
        );
        assert_eq!(
            sequence[0].sustain_beats,
            Some(BigDecimal::from_str("0.5").unwrap())
        );

        // the final note has no follower: zero reserved beats
        assert_eq!(
            sequence[1].reserved_beats,
            BigDecimal::from_str("0").unwrap()
        );
    }

    #[test]
    fn timed_notes_are_relative_to_first_onset() {
        let mut history = EventHistory::new();
        let start = Instant::now();

        history.add(on(48, start, Duration::ZERO));
        history.add(off(48, start, Duration::from_millis(100)));
        history.add(on(50, start, Duration::from_millis(300)));

        let notes = history.timed_notes();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].onset, Duration::ZERO);
        assert_eq!(notes[0].duration, Duration::from_millis(100));
        assert_eq!(notes[1].onset, Duration::from_millis(300));
        // unreleased note falls back to the default sustain
        assert_eq!(notes[1].duration, DEFAULT_SUSTAIN);
    }

    #[test]
    fn wipe_events_are_not_notes() {
        let mut history = EventHistory::new();
        history.add(Event::Wipe);
        assert!(history.timed_notes().is_empty());
        assert!(history
            .as_sequence(120, BigDecimal::from_str("0.25").unwrap())
            .is_empty());
    }
}
