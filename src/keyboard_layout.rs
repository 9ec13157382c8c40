use crate::actions::Action;

/*
    Default computer-keyboard bindings. The top row walks outward from the
    current note in semitones, the home row gives fourth/fifth/octave jumps.
    Space repeats the current note, z/x are the self-releasing octave jumps.
*/

pub const KEY_BINDINGS: [(char, i8); 14] = [
    ('q', -5),
    ('w', -4),
    ('e', -3),
    ('r', -2),
    ('t', -1),
    ('y', 1),
    ('u', 2),
    ('i', 3),
    ('o', 4),
    ('p', 5),
    ('a', -12),
    ('s', -7),
    ('d', 7),
    ('f', 12),
];

pub const REPEAT_KEY: char = ' ';
pub const OCTAVE_DOWN_KEY: char = 'z';
pub const OCTAVE_UP_KEY: char = 'x';

pub fn action_for(key: char) -> Option<Action> {
    match key {
        REPEAT_KEY => Some(Action::Interval(0)),
        OCTAVE_DOWN_KEY => Some(Action::OctaveJump(-12)),
        OCTAVE_UP_KEY => Some(Action::OctaveJump(12)),
        _ => KEY_BINDINGS
            .iter()
            .find(|(bound, _)| *bound == key)
            .map(|(_, interval)| Action::Interval(*interval)),
    }
}

pub fn bound_chars() -> Vec<char> {
    let mut chars: Vec<char> = KEY_BINDINGS.iter().map(|(key, _)| *key).collect();
    chars.extend([REPEAT_KEY, OCTAVE_DOWN_KEY, OCTAVE_UP_KEY]);
    chars
}

/*
    The pointer strip is column-addressed: a click anywhere in the terminal
    selects by column alone, so the scrolling status plane cannot move the
    targets out from under the mouse.
*/

pub const POINTER_STRIP: [i8; 15] = [-12, -7, -5, -4, -3, -2, -1, 0, 1, 2, 3, 4, 5, 7, 12];
pub const STRIP_CELL_WIDTH: i32 = 4;

pub fn strip_action(column: i32) -> Option<Action> {
    if column < 0 {
        return None;
    }
    POINTER_STRIP
        .get((column / STRIP_CELL_WIDTH) as usize)
        .copied()
        .map(Action::Interval)
}

pub fn strip_legend() -> String {
    POINTER_STRIP
        .iter()
        .map(|interval| format!("{:>3} ", interval))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_bound_char_resolves() {
        for key in bound_chars() {
            assert!(action_for(key).is_some(), "no action for '{}'", key);
        }
        assert_eq!(action_for('5'), None);
    }

    #[test]
    fn special_keys() {
        assert_eq!(action_for(REPEAT_KEY), Some(Action::Interval(0)));
        assert_eq!(action_for(OCTAVE_DOWN_KEY), Some(Action::OctaveJump(-12)));
        assert_eq!(action_for(OCTAVE_UP_KEY), Some(Action::OctaveJump(12)));
    }

    #[test]
    fn strip_columns_map_to_cells() {
        assert_eq!(strip_action(0), Some(Action::Interval(-12)));
        assert_eq!(strip_action(3), Some(Action::Interval(-12)));
        assert_eq!(strip_action(4), Some(Action::Interval(-7)));
        assert_eq!(strip_action(-1), None);
        assert_eq!(strip_action(STRIP_CELL_WIDTH * POINTER_STRIP.len() as i32), None);
    }
}
