use std::fmt;

/*
    The action vocabulary every input source resolves to: a signed semitone
    interval held for as long as the source is down, or an octave jump that
    sounds briefly and releases itself.
*/

pub const MAX_INTERVAL: i8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Offset from the current note, -12..=12. Zero repeats the current note.
    Interval(i8),
    /// Anchor shift by a full octave with a timed auto-release.
    OctaveJump(i8),
}

impl Action {
    pub fn semitones(&self) -> i32 {
        match self {
            Action::Interval(interval) => *interval as i32,
            Action::OctaveJump(offset) => *offset as i32,
        }
    }

    /// Parse the OSC-facing action name: "octave_down", "octave_up" or a
    /// signed interval like "-5", "0", "+7".
    pub fn parse(name: &str) -> Option<Action> {
        match name {
            "octave_down" => Some(Action::OctaveJump(-12)),
            "octave_up" => Some(Action::OctaveJump(12)),
            _ => name
                .parse::<i8>()
                .ok()
                .filter(|interval| interval.abs() <= MAX_INTERVAL)
                .map(Action::Interval),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Interval(interval) if *interval > 0 => write!(f, "+{}", interval),
            Action::Interval(interval) => write!(f, "{}", interval),
            Action::OctaveJump(offset) if *offset < 0 => write!(f, "octave_down"),
            Action::OctaveJump(_) => write!(f, "octave_up"),
        }
    }
}

/// Rapid-learn assignment order: low to high, octave jumps at the edges.
pub fn rapid_learn_order() -> Vec<Action> {
    let mut order = vec![Action::OctaveJump(-12)];
    order.extend((-MAX_INTERVAL..=MAX_INTERVAL).map(Action::Interval));
    order.push(Action::OctaveJump(12));
    order
}
