use std::time::Instant;

/*
    History events, produced by the engine and consumed by the history
    worker. Wipe travels on the same pipe so clears stay ordered with the
    note events around them.
*/

#[derive(PartialEq, Debug)]
pub enum Event {
    NoteOn(NoteOn),
    NoteOff(NoteOff),
    Wipe,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct NoteOn {
    pub note: u8,
    pub time: Instant,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct NoteOff {
    pub note: u8,
    pub time: Instant,
}
