use std::collections::HashMap;

use itertools::Itertools;

/*
    Single source of truth for what is currently sounding and why. Every
    input modality gets its own source-key namespace ("key_q", "pointer",
    "pad_38"), so holds from different modalities never collide. A note
    shared by several sources keeps sounding until its last holder lets go.
*/

pub struct HeldNotes {
    held: HashMap<String, u8>,
}

impl HeldNotes {
    pub fn new() -> HeldNotes {
        HeldNotes {
            held: HashMap::new(),
        }
    }

    /// Record a new hold for <source>. Returns the previous hold as
    /// (note, now_silent) so the caller can close it out first; a source key
    /// never holds two notes at once.
    pub fn hold(&mut self, source: &str, note: u8) -> Option<(u8, bool)> {
        let prior = self.release(source);
        self.held.insert(source.to_string(), note);
        prior
    }

    /// Drop <source>'s hold. Returns (note, now_silent); now_silent is false
    /// while another source still holds the same note. Releasing an unheld
    /// source is a no-op.
    pub fn release(&mut self, source: &str) -> Option<(u8, bool)> {
        let note = self.held.remove(source)?;
        let still_held = self.held.values().any(|&held| held == note);
        Some((note, !still_held))
    }

    /// De-duplicated sounding notes, for display.
    pub fn active_notes(&self) -> Vec<u8> {
        self.held.values().copied().unique().sorted().collect()
    }

    /// Clear everything, returning the notes that must be silenced.
    pub fn drain(&mut self) -> Vec<u8> {
        let notes = self.active_notes();
        self.held.clear();
        notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_is_idempotent() {
        let mut held = HeldNotes::new();
        held.hold("key_q", 55);

        assert_eq!(held.release("key_q"), Some((55, true)));
        assert_eq!(held.release("key_q"), None);
        assert_eq!(held.release("never_held"), None);
    }

    #[test]
    fn rehold_replaces_previous_note() {
        let mut held = HeldNotes::new();
        assert_eq!(held.hold("key_q", 55), None);
        assert_eq!(held.hold("key_q", 57), Some((55, true)));
        assert_eq!(held.active_notes(), vec![57]);
    }

    #[test]
    fn shared_note_sounds_until_last_holder_releases() {
        let mut held = HeldNotes::new();
        held.hold("key_q", 64);
        held.hold("pad_38", 64);
        assert_eq!(held.active_notes(), vec![64]);

        // first release must not silence the shared note
        assert_eq!(held.release("key_q"), Some((64, false)));
        assert_eq!(held.active_notes(), vec![64]);

        assert_eq!(held.release("pad_38"), Some((64, true)));
        assert!(held.active_notes().is_empty());
    }

    #[test]
    fn sources_hold_independently() {
        let mut held = HeldNotes::new();
        held.hold("key_q", 60);
        held.hold("pointer", 64);
        held.hold("pad_38", 48);
        assert_eq!(held.active_notes(), vec![48, 60, 64]);

        assert_eq!(held.drain(), vec![48, 60, 64]);
        assert!(held.active_notes().is_empty());
    }
}
