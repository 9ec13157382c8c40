use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use itertools::Itertools;
use ringbuf::traits::Producer;

use crate::actions::Action;
use crate::event_model::{Event, NoteOff, NoteOn};
use crate::held_notes::HeldNotes;
use crate::input_model::{ExtControl, ExtNote, InputEvent, KeyInput, PipePub, PointerInput};
use crate::mapping::LastReceived;
use crate::midi_out::MidiOut;
use crate::notation_export;
use crate::state::{State, DEFAULT_KEY_VELOCITY};
use crate::synth_client::SynthClient;
use crate::util::{resolve_note, scale_cc_value, scale_velocity};

/*
    The performance core: one of these lives on the engine thread and handles
    every input event in arrival order. It owns the anchor note, the held
    registry and the pending auto-releases; everything configurable is read
    from the shared state under a short lock.
*/

pub const DEFAULT_ANCHOR: u8 = 60;

pub(crate) const OCTAVE_JUMP_HOLD: Duration = Duration::from_millis(150);

const POINTER_SOURCE: &str = "pointer";

struct PendingRelease {
    source: String,
    due: Instant,
}

pub struct Engine {
    state: Arc<Mutex<State>>,
    synth: SynthClient,
    midi_out: MidiOut,
    held: HeldNotes,
    anchor: u8,
    pending_releases: Vec<PendingRelease>,
    history_out: PipePub<Event>,
    status_out: PipePub<String>,
}

impl Engine {
    pub fn new(
        state: Arc<Mutex<State>>,
        synth: SynthClient,
        midi_out: MidiOut,
        history_out: PipePub<Event>,
        status_out: PipePub<String>,
    ) -> Engine {
        Engine {
            state,
            synth,
            midi_out,
            held: HeldNotes::new(),
            anchor: DEFAULT_ANCHOR,
            pending_releases: Vec::new(),
            history_out,
            status_out,
        }
    }

    pub fn anchor(&self) -> u8 {
        self.anchor
    }

    pub fn active_notes(&self) -> Vec<u8> {
        self.held.active_notes()
    }

    /// Fire any auto-releases that have come due. Called on every loop pass.
    pub fn tick(&mut self) {
        let now = Instant::now();
        let due: Vec<String> = self
            .pending_releases
            .iter()
            .filter(|pending| pending.due <= now)
            .map(|pending| pending.source.clone())
            .collect();

        for source in due {
            self.release_source(&source);
        }
    }

    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key(key) => self.handle_key(key),
            InputEvent::Pointer(pointer) => self.handle_pointer(pointer),
            InputEvent::ExtNote(ext) => self.handle_ext_note(ext),
            InputEvent::ExtControl(control) => self.handle_ext_control(control),
            InputEvent::SetAnchor(note) => {
                self.anchor = note.min(127);
                self.push_status();
            }
            InputEvent::Wipe => {
                self.record(Event::Wipe);
                log::info!(target: "engine", "history wiped");
            }
            InputEvent::Panic => self.panic(),
        }
    }

    fn handle_key(&mut self, key: KeyInput) {
        let source = format!("key_{}", key.label);
        if key.pressed {
            // Octave jumps sound at the fixed default; everything else uses
            // the per-key configured velocity.
            let base = match key.action {
                Action::OctaveJump(_) => DEFAULT_KEY_VELOCITY,
                _ => self.state.lock().unwrap().key_velocity(key.label),
            };
            self.press(source, key.action, base);
        } else {
            self.release_source(&source);
        }
    }

    fn handle_pointer(&mut self, pointer: PointerInput) {
        if pointer.pressed {
            self.press(POINTER_SOURCE.to_string(), pointer.action, DEFAULT_KEY_VELOCITY);
        } else {
            self.release_source(POINTER_SOURCE);
        }
    }

    fn handle_ext_note(&mut self, ext: ExtNote) {
        let source = format!("pad_{}", ext.note);

        if !ext.pressed {
            self.release_source(&source);
            return;
        }

        let mut state = self.state.lock().unwrap();
        state.mappings.last_received = Some(LastReceived::Note {
            note: ext.note,
            velocity: ext.velocity,
        });

        // An armed learn session captures the note instead of playing it
        if let Some(step) = state.mappings.learn_note(ext.note) {
            drop(state);
            match step.next {
                Some(next) => log::info!(
                    target: "engine",
                    "pad {} learned as {}, next up: {}",
                    ext.note, step.assigned, next
                ),
                None => log::info!(target: "engine", "pad {} learned as {}", ext.note, step.assigned),
            }
            self.push_status();
            return;
        }

        let Some(action) = state.mappings.pads.lookup(ext.note) else {
            // Unmapped pads are expected steady-state, not an error
            drop(state);
            log::debug!(target: "engine", "unmapped external note {}", ext.note);
            self.push_status();
            return;
        };

        let base = if state.use_pad_velocity && ext.velocity > 0 {
            ext.velocity
        } else {
            state.pad_velocity
        };
        drop(state);

        self.press(source, action, base);
    }

    fn handle_ext_control(&mut self, control: ExtControl) {
        let mut state = self.state.lock().unwrap();
        state.mappings.last_received = Some(LastReceived::Control {
            number: control.number,
            value: control.value,
        });

        if let Some(param) = state.mappings.learn_cc(control.number) {
            drop(state);
            log::info!(target: "engine", "cc {} learned as {}", control.number, param);
            self.push_status();
            return;
        }

        let Some(param) = state.mappings.ccs.lookup(control.number).map(str::to_string) else {
            // Unmapped knobs are silently ignored
            drop(state);
            self.push_status();
            return;
        };

        let Some(decl) = state.synth_params.get(&param).copied() else {
            drop(state);
            log::warn!(target: "engine", "cc map points at unknown param '{}'", param);
            return;
        };

        let value = scale_cc_value(control.value, decl.min, decl.max, decl.step);
        state.set_param_value(&param, value);
        drop(state);

        // CC routing drives settings only; note state is never touched here
        self.synth.set_param(&param, value);
        self.push_status();
    }

    /*
        The one path every note-triggering input funnels through: resolve the
        interval against the current anchor, swap the source's hold, sound
        the note and move the anchor.
    */
    fn press(&mut self, source: String, action: Action, base_velocity: u8) {
        let note = resolve_note(self.anchor, action.semitones());
        let velocity = {
            let state = self.state.lock().unwrap();
            scale_velocity(base_velocity, state.velocity_multiplier)
        };

        self.cancel_release(&source);

        if let Some((previous, now_silent)) = self.held.hold(&source, note) {
            self.record(Event::NoteOff(NoteOff {
                note: previous,
                time: Instant::now(),
            }));
            if now_silent {
                self.send_off(previous);
            }
        }

        self.record(Event::NoteOn(NoteOn {
            note,
            time: Instant::now(),
        }));
        self.send_on(note, velocity);
        self.anchor = note;

        if let Action::OctaveJump(_) = action {
            self.schedule_release(source, OCTAVE_JUMP_HOLD);
        }

        self.push_status();
    }

    fn release_source(&mut self, source: &str) {
        self.cancel_release(source);

        if let Some((note, now_silent)) = self.held.release(source) {
            self.record(Event::NoteOff(NoteOff {
                note,
                time: Instant::now(),
            }));
            if now_silent {
                self.send_off(note);
            }
            self.push_status();
        }
    }

    fn panic(&mut self) {
        self.pending_releases.clear();
        let now = Instant::now();
        for note in self.held.drain() {
            self.record(Event::NoteOff(NoteOff { note, time: now }));
            self.send_off(note);
        }
        log::info!(target: "engine", "panic: all notes released");
        self.push_status();
    }

    // Auto-releases are keyed by source, so a retrigger replaces the pending
    // release instead of racing it.

    fn schedule_release(&mut self, source: String, after: Duration) {
        self.cancel_release(&source);
        self.pending_releases.push(PendingRelease {
            source,
            due: Instant::now() + after,
        });
    }

    fn cancel_release(&mut self, source: &str) {
        self.pending_releases
            .retain(|pending| pending.source != source);
    }

    fn send_on(&mut self, note: u8, velocity: u8) {
        let (synth_muted, midi_muted, channel, instrument, args, selected) = {
            let state = self.state.lock().unwrap();
            (
                state.synth_muted,
                state.midi_muted,
                state.channel,
                state.instrument_name.clone(),
                state.message_args.clone(),
                state.selected_output.clone(),
            )
        };

        if !synth_muted {
            self.synth.play_note(note, velocity, &instrument, args);
        }
        if !midi_muted {
            self.midi_out.ensure_connected(selected.as_deref());
            self.midi_out.note_on(note, velocity, channel);
        }
    }

    fn send_off(&mut self, note: u8) {
        let (channel, selected) = {
            let state = self.state.lock().unwrap();
            (state.channel, state.selected_output.clone())
        };

        // Note-offs bypass the mutes: a toggle mid-note must not strand a
        // sounding voice on either path.
        self.synth.stop_note(note);
        self.midi_out.ensure_connected(selected.as_deref());
        self.midi_out.note_off(note, channel);
    }

    fn record(&mut self, event: Event) {
        if self.history_out.try_push(event).is_err() {
            log::debug!(target: "engine", "history pipe full, dropping event");
        }
    }

    fn push_status(&mut self) {
        let (prompt, last) = {
            let state = self.state.lock().unwrap();
            (state.mappings.learn_prompt(), state.mappings.last_received)
        };

        let held = self
            .active_notes()
            .iter()
            .map(|note| notation_export::note_name(*note))
            .join(" ");

        let mut line = format!(
            "anchor {} | held [{}]",
            notation_export::note_name(self.anchor()),
            held
        );
        if let Some(prompt) = prompt {
            line += &format!(" | {}", prompt);
        }
        if let Some(device) = self.midi_out.connected_name() {
            line += &format!(" | out: {}", device);
        }
        if let Some(last) = last {
            line += &format!(" | last in: {}", last);
        }

        let _ = self.status_out.try_push(line);
    }
}
