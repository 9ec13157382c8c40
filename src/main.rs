use std::error::Error;
use std::net::{SocketAddrV4, UdpSocket};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::thread;
use std::thread::sleep;
use std::time::Duration;

use jdw_osc_lib::osc_stack::OSCStack;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::HeapRb;
use rosc::{OscMessage, OscType};

use crate::actions::Action;
use crate::engine::Engine;
use crate::event_history::EventHistory;
use crate::event_model::Event;
use crate::input_model::InputEvent;
use crate::ncurses_daemon::NcursesDaemon;
use crate::osc_client::OscClient;
use crate::state::{ChannelSelection, State};
use crate::synth_client::SynthClient;

mod actions;
mod engine;
mod event_history;
mod event_model;
mod held_notes;
mod input_model;
mod keyboard_layout;
mod mapping;
mod midi_decode;
mod midi_file_export;
mod midi_out;
mod midi_read_daemon;
mod ncurses_daemon;
mod notation_export;
mod osc_client;
mod osc_model;
mod state;
mod synth_client;
mod util;

// TODO: modular in/out ports
const LOCAL_BIND: &str = "127.0.0.1:15460";
const SYNTH_TARGET: &str = "127.0.0.1:13339";
const OSC_LISTEN_ADDR: &str = "127.0.0.1:17778";

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        log::error!("fatal: {}", err);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    // Input pipes: one per producing daemon (they are single-producer rings)
    let (kb_pub, mut kb_sub) = HeapRb::<InputEvent>::new(256).split();
    let (midi_pub, mut midi_sub) = HeapRb::<InputEvent>::new(256).split();
    let (osc_pub, mut osc_sub) = HeapRb::<InputEvent>::new(64).split();

    let (history_pub, mut history_sub) = HeapRb::<Event>::new(256).split();
    let (status_pub, status_sub) = HeapRb::<String>::new(64).split();

    let state = Arc::new(Mutex::new(State::new()));
    let history = Arc::new(Mutex::new(EventHistory::new()));

    // Synth collaborator for the engine thread
    let socket = UdpSocket::bind(SocketAddrV4::from_str(LOCAL_BIND)?)?;
    socket.set_nonblocking(true)?;
    socket.set_write_timeout(Some(Duration::from_millis(1)))?;
    let synth = SynthClient::new(OscClient::new(
        socket,
        SocketAddrV4::from_str(SYNTH_TARGET)?,
    ));

    // History worker: applies engine events to the shared history
    let worker_history = history.clone();
    thread::spawn(move || loop {
        while let Some(event) = history_sub.try_pop() {
            match event {
                Event::Wipe => worker_history.lock().unwrap().clear(),
                event => worker_history.lock().unwrap().add(event),
            }
        }
        sleep(Duration::from_millis(50));
    });

    // External controller reader
    let midi_hint = std::env::args().nth(1);
    thread::spawn(move || {
        if let Err(err) = midi_read_daemon::begin(midi_pub, midi_hint) {
            log::warn!(target: "midi_in", "midi input unavailable: {}", err);
        }
    });

    // Engine thread: consumes every input pipe in arrival order
    let engine_state = state.clone();
    thread::spawn(move || {
        let mut engine = Engine::new(
            engine_state,
            synth,
            midi_out::MidiOut::new(),
            history_pub,
            status_pub,
        );

        loop {
            engine.tick();
            while let Some(event) = kb_sub.try_pop() {
                engine.handle(event);
            }
            while let Some(event) = midi_sub.try_pop() {
                engine.handle(event);
            }
            while let Some(event) = osc_sub.try_pop() {
                engine.handle(event);
            }
            sleep(Duration::from_micros(500));
        }
    });

    // OSC configuration surface
    let osc_state = state.clone();
    let osc_history = history.clone();
    thread::spawn(move || {
        let control = Mutex::new(osc_pub);

        let param_client = match UdpSocket::bind("127.0.0.1:0") {
            Ok(socket) => Some(OscClient::new(
                socket,
                SocketAddrV4::from_str(SYNTH_TARGET).unwrap(),
            )),
            Err(err) => {
                log::warn!(target: "osc", "no socket for param forwarding: {}", err);
                None
            }
        };

        let push_control = |event: InputEvent| {
            if control.lock().unwrap().try_push(event).is_err() {
                log::debug!(target: "osc", "control pipe full, dropping event");
            }
        };

        OSCStack::init(OSC_LISTEN_ADDR.to_string())
            .on_message("/set_bpm", &|msg| {
                if let Some(bpm) = int_arg(&msg, 0) {
                    osc_state.lock().unwrap().set_bpm(bpm as i64);
                }
            })
            .on_message("/set_quantization", &|msg| {
                if let Some(quantization) = str_arg(&msg, 0) {
                    osc_state.lock().unwrap().set_quantization(&quantization);
                }
            })
            .on_message("/set_instrument", &|msg| {
                if let Some(name) = str_arg(&msg, 0) {
                    log::info!(target: "osc", "instrument -> {}", name);
                    osc_state.lock().unwrap().instrument_name = name;
                }
            })
            .on_message("/set_args", &|msg| {
                osc_state.lock().unwrap().set_args(msg.args.clone());
            })
            .on_message("/set_velocity_multiplier", &|msg| {
                if let Some(percent) = int_arg(&msg, 0) {
                    osc_state.lock().unwrap().set_velocity_multiplier(percent);
                }
            })
            .on_message("/set_key_velocity", &|msg| {
                if let (Some(key), Some(velocity)) = (str_arg(&msg, 0), int_arg(&msg, 1)) {
                    if let Some(label) = key.chars().next() {
                        osc_state.lock().unwrap().set_key_velocity(label, velocity);
                    }
                }
            })
            .on_message("/set_pad_velocity", &|msg| {
                if let Some(velocity) = int_arg(&msg, 0) {
                    osc_state.lock().unwrap().set_pad_velocity(velocity);
                }
            })
            .on_message("/use_pad_velocity", &|msg| {
                if let Some(enabled) = int_arg(&msg, 0) {
                    osc_state.lock().unwrap().use_pad_velocity = enabled != 0;
                }
            })
            .on_message("/set_channel", &|msg| {
                if let Some(channel) = int_arg(&msg, 0) {
                    osc_state.lock().unwrap().channel = ChannelSelection::from_user(channel);
                }
            })
            .on_message("/mute_synth", &|msg| {
                if let Some(muted) = int_arg(&msg, 0) {
                    osc_state.lock().unwrap().synth_muted = muted != 0;
                }
            })
            .on_message("/mute_midi", &|msg| {
                if let Some(muted) = int_arg(&msg, 0) {
                    osc_state.lock().unwrap().midi_muted = muted != 0;
                }
            })
            .on_message("/select_midi_output", &|msg| {
                let selection = str_arg(&msg, 0).filter(|name| !name.is_empty());
                log::info!(target: "osc", "midi output selection -> {:?}", selection);
                osc_state.lock().unwrap().selected_output = selection;
            })
            .on_message("/set_anchor", &|msg| {
                if let Some(note) = int_arg(&msg, 0) {
                    push_control(InputEvent::SetAnchor(note.clamp(0, 127) as u8));
                }
            })
            .on_message("/panic", &|_msg| {
                push_control(InputEvent::Panic);
            })
            .on_message("/learn_pad", &|msg| {
                match str_arg(&msg, 0).as_deref().and_then(Action::parse) {
                    Some(action) => osc_state.lock().unwrap().mappings.arm_pad_learn(action),
                    None => log::warn!(target: "osc", "learn_pad with no parsable action"),
                }
            })
            .on_message("/learn_cc", &|msg| {
                match str_arg(&msg, 0) {
                    Some(param) => osc_state.lock().unwrap().mappings.arm_cc_learn(param),
                    None => log::warn!(target: "osc", "learn_cc with no param name"),
                }
            })
            .on_message("/cancel_learn", &|_msg| {
                osc_state.lock().unwrap().mappings.cancel_learn();
            })
            .on_message("/rapid_learn", &|_msg| {
                log::info!(target: "osc", "rapid learn armed, pad table cleared");
                osc_state.lock().unwrap().mappings.start_rapid_learn();
            })
            .on_message("/set_synth_param", &|msg| {
                if let (Some(name), Some(value)) = (str_arg(&msg, 0), float_arg(&msg, 1)) {
                    let stored = osc_state.lock().unwrap().set_param_value(&name, value);
                    match (stored, &param_client) {
                        (Some(value), Some(client)) => {
                            client.send(osc_model::create_synth_param(&name, value))
                        }
                        (None, _) => {
                            log::warn!(target: "osc", "unknown synth param '{}'", name)
                        }
                        _ => {}
                    }
                }
            })
            .on_message("/wipe_history", &|_msg| {
                osc_history.lock().unwrap().clear();
            })
            .on_message("/export_notation", &|_msg| {
                export_notation(&osc_history, &osc_state);
            })
            .on_message("/export_midi", &|msg| {
                match str_arg(&msg, 0) {
                    Some(path) => export_midi(&osc_history, &osc_state, &path),
                    None => log::warn!(target: "osc", "export_midi needs a target path"),
                }
            })
            .begin();
    });

    // The terminal front owns the main thread, as the last thing started
    NcursesDaemon::new(kb_pub, status_sub)
        .begin()
        .map_err(|err| format!("terminal failure: {}", err))?;

    Ok(())
}

fn int_arg(msg: &OscMessage, index: usize) -> Option<i32> {
    msg.args.get(index).cloned().and_then(OscType::int)
}

fn str_arg(msg: &OscMessage, index: usize) -> Option<String> {
    msg.args.get(index).cloned().and_then(OscType::string)
}

fn float_arg(msg: &OscMessage, index: usize) -> Option<f32> {
    msg.args.get(index).cloned().and_then(OscType::float)
}

fn export_notation(history: &Mutex<EventHistory>, state: &Mutex<State>) {
    let (bpm, quantization, args) = {
        let state = state.lock().unwrap();
        (
            state.bpm,
            state.quantization.clone(),
            state.message_args.clone(),
        )
    };

    let sequence = history.lock().unwrap().as_sequence(bpm, quantization);
    if sequence.is_empty() {
        log::info!(target: "export", "history empty, nothing to export");
        return;
    }

    let text = notation_export::stringify(&sequence, &args);
    notation_export::copy_to_clipboard(&text);
    log::info!(target: "export", "copied {} notes to clipboard (bpm {})", sequence.len(), bpm);
}

fn export_midi(history: &Mutex<EventHistory>, state: &Mutex<State>, path: &str) {
    let bpm = state.lock().unwrap().bpm;
    let notes = history.lock().unwrap().timed_notes();
    if notes.is_empty() {
        log::info!(target: "export", "history empty, nothing to export");
        return;
    }

    match midi_file_export::write_file(&notes, bpm, Path::new(path)) {
        Ok(()) => log::info!(target: "export", "wrote {} notes to {}", notes.len(), path),
        Err(err) => log::warn!(target: "export", "midi export failed: {}", err),
    }
}
