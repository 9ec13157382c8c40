use std::sync::Arc;

use ringbuf::storage::Heap;
use ringbuf::wrap::caching::Caching;
use ringbuf::SharedRb;

use crate::actions::Action;

/*
    The internal event type crossing the input pipes, plus the pipe end
    aliases every daemon signature uses.
*/

pub type PipePub<T> = Caching<Arc<SharedRb<Heap<T>>>, true, false>;
pub type PipeSub<T> = Caching<Arc<SharedRb<Heap<T>>>, false, true>;

#[derive(Debug)]
pub enum InputEvent {
    Key(KeyInput),
    Pointer(PointerInput),
    ExtNote(ExtNote),
    ExtControl(ExtControl),
    SetAnchor(u8),
    Wipe,
    Panic,
}

/// A computer-keyboard key, already resolved against the layout.
#[derive(Debug)]
pub struct KeyInput {
    pub label: char,
    pub action: Action,
    pub pressed: bool,
}

/// The single on-screen pointer pressing an interval cell.
#[derive(Debug)]
pub struct PointerInput {
    pub action: Action,
    pub pressed: bool,
}

/// External controller note-on/off, velocity as received.
#[derive(Debug)]
pub struct ExtNote {
    pub note: u8,
    pub velocity: u8,
    pub pressed: bool,
}

/// External control-change message.
#[derive(Debug)]
pub struct ExtControl {
    pub number: u8,
    pub value: u8,
}
