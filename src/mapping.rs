use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::actions::{self, Action};

/*
    The two learnable tables: controller note -> action and controller CC ->
    synth parameter. Both are one-to-one on the target side: assigning a
    target to a new controller number evicts it from any number it was bound
    to before.
*/

pub struct PadMap {
    assignments: HashMap<u8, Action>,
}

impl PadMap {
    pub fn empty() -> PadMap {
        PadMap {
            assignments: HashMap::new(),
        }
    }

    /// The classic 8-pad row (notes 36-43), octaves at the edges.
    pub fn with_default_preset() -> PadMap {
        let intervals = [-12, -5, -2, -1, 1, 2, 5, 12];
        let assignments = (36u8..=43)
            .zip(intervals)
            .map(|(note, interval)| (note, Action::Interval(interval)))
            .collect();
        PadMap { assignments }
    }

    pub fn assign(&mut self, note: u8, action: Action) {
        self.assignments.retain(|_, bound| *bound != action);
        self.assignments.insert(note, action);
    }

    pub fn lookup(&self, note: u8) -> Option<Action> {
        self.assignments.get(&note).copied()
    }

    pub fn clear(&mut self) {
        self.assignments.clear();
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }
}

pub struct CcMap {
    assignments: HashMap<u8, String>,
}

impl CcMap {
    /// Conventional controller numbers for the main synth parameters.
    pub fn with_default_preset() -> CcMap {
        let assignments = [
            (74u8, "cutoff"),
            (71, "resonance"),
            (73, "attack"),
            (72, "release"),
            (7, "volume"),
        ]
        .into_iter()
        .map(|(number, param)| (number, param.to_string()))
        .collect();
        CcMap { assignments }
    }

    pub fn assign(&mut self, number: u8, param: String) {
        self.assignments.retain(|_, bound| *bound != param);
        self.assignments.insert(number, param);
    }

    pub fn lookup(&self, number: u8) -> Option<&str> {
        self.assignments.get(&number).map(String::as_str)
    }
}

enum PadLearn {
    Idle,
    Learning(Action),
    Rapid {
        target: Action,
        queue: VecDeque<Action>,
    },
}

enum CcLearn {
    Idle,
    Learning(String),
}

/// Diagnostic record of the most recent external event, mapped or not.
#[derive(Debug, Clone, Copy)]
pub enum LastReceived {
    Note { note: u8, velocity: u8 },
    Control { number: u8, value: u8 },
}

impl fmt::Display for LastReceived {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastReceived::Note { note, velocity } => write!(f, "note {} vel {}", note, velocity),
            LastReceived::Control { number, value } => write!(f, "cc {} val {}", number, value),
        }
    }
}

/// Outcome of feeding an external note into an armed pad-learn session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearnStep {
    pub assigned: Action,
    pub next: Option<Action>,
}

pub struct MappingStore {
    pub pads: PadMap,
    pub ccs: CcMap,
    pad_learn: PadLearn,
    cc_learn: CcLearn,
    pub last_received: Option<LastReceived>,
}

impl MappingStore {
    pub fn new() -> MappingStore {
        MappingStore {
            pads: PadMap::with_default_preset(),
            ccs: CcMap::with_default_preset(),
            pad_learn: PadLearn::Idle,
            cc_learn: CcLearn::Idle,
            last_received: None,
        }
    }

    // The two learn sessions are tracked separately but arming one always
    // disarms the other.

    pub fn arm_pad_learn(&mut self, target: Action) {
        self.cc_learn = CcLearn::Idle;
        self.pad_learn = PadLearn::Learning(target);
    }

    pub fn arm_cc_learn(&mut self, param: String) {
        self.pad_learn = PadLearn::Idle;
        self.cc_learn = CcLearn::Learning(param);
    }

    pub fn cancel_learn(&mut self) {
        self.pad_learn = PadLearn::Idle;
        self.cc_learn = CcLearn::Idle;
    }

    /// Wipe the pad table and arm learning for the full action sequence.
    pub fn start_rapid_learn(&mut self) {
        self.cc_learn = CcLearn::Idle;
        log::info!(
            target: "mapping",
            "rapid learn: dropping {} pad assignments",
            self.pads.len()
        );
        self.pads.clear();
        let mut queue: VecDeque<Action> = actions::rapid_learn_order().into();
        let target = queue.pop_front().expect("rapid order is never empty");
        self.pad_learn = PadLearn::Rapid { target, queue };
    }

    /// The prompt to show while a learn session is armed.
    pub fn learn_prompt(&self) -> Option<String> {
        match (&self.pad_learn, &self.cc_learn) {
            (PadLearn::Learning(target), _) => Some(format!("learn pad -> {}", target)),
            (PadLearn::Rapid { target, queue }, _) => {
                Some(format!("rapid learn -> {} ({} left)", target, queue.len()))
            }
            (_, CcLearn::Learning(param)) => Some(format!("learn cc -> {}", param)),
            _ => None,
        }
    }

    /// Feed an external note-on to the pad-learn session. None when no
    /// session is armed (the note keeps its normal meaning).
    pub fn learn_note(&mut self, note: u8) -> Option<LearnStep> {
        match std::mem::replace(&mut self.pad_learn, PadLearn::Idle) {
            PadLearn::Idle => None,
            PadLearn::Learning(target) => {
                self.pads.assign(note, target);
                Some(LearnStep {
                    assigned: target,
                    next: None,
                })
            }
            PadLearn::Rapid { target, mut queue } => {
                self.pads.assign(note, target);
                let next = queue.pop_front();
                if let Some(upcoming) = next {
                    self.pad_learn = PadLearn::Rapid {
                        target: upcoming,
                        queue,
                    };
                }
                Some(LearnStep {
                    assigned: target,
                    next,
                })
            }
        }
    }

    /// Feed an external control-change to the cc-learn session. Returns the
    /// parameter the number was bound to.
    pub fn learn_cc(&mut self, number: u8) -> Option<String> {
        match std::mem::replace(&mut self.cc_learn, CcLearn::Idle) {
            CcLearn::Idle => None,
            CcLearn::Learning(param) => {
                self.ccs.assign(number, param.clone());
                Some(param)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_assignment_is_one_to_one_on_actions() {
        let mut pads = PadMap::empty();
        pads.assign(5, Action::Interval(3));
        pads.assign(9, Action::Interval(3));

        assert_eq!(pads.lookup(5), None);
        assert_eq!(pads.lookup(9), Some(Action::Interval(3)));
        assert_eq!(pads.len(), 1);
    }

    #[test]
    fn cc_assignment_evicts_previous_number() {
        let mut ccs = CcMap::with_default_preset();
        assert_eq!(ccs.lookup(74), Some("cutoff"));

        ccs.assign(20, "cutoff".to_string());
        assert_eq!(ccs.lookup(74), None);
        assert_eq!(ccs.lookup(20), Some("cutoff"));
    }

    #[test]
    fn single_learn_assigns_and_disarms() {
        let mut store = MappingStore::new();
        store.arm_pad_learn(Action::Interval(-4));

        let step = store.learn_note(50).unwrap();
        assert_eq!(step.assigned, Action::Interval(-4));
        assert_eq!(step.next, None);
        assert_eq!(store.pads.lookup(50), Some(Action::Interval(-4)));

        // disarmed: the next note is not captured
        assert_eq!(store.learn_note(51), None);
    }

    #[test]
    fn arming_one_table_disarms_the_other() {
        let mut store = MappingStore::new();
        store.arm_cc_learn("cutoff".to_string());
        store.arm_pad_learn(Action::Interval(2));

        assert_eq!(store.learn_cc(30), None);
        assert!(store.learn_note(60).is_some());
    }

    #[test]
    fn rapid_learn_walks_the_full_order_and_finishes() {
        let mut store = MappingStore::new();
        store.start_rapid_learn();
        assert_eq!(store.pads.len(), 0, "rapid learn starts from a clean table");

        let order = actions::rapid_learn_order();
        for (offset, expected) in order.iter().enumerate() {
            let step = store.learn_note(offset as u8).unwrap();
            assert_eq!(step.assigned, *expected);
        }

        // queue exhausted: back to idle, everything assigned
        assert_eq!(store.learn_note(120), None);
        assert_eq!(store.pads.len(), order.len());
        assert_eq!(store.pads.lookup(0), Some(Action::OctaveJump(-12)));
    }

    #[test]
    fn cancel_leaves_tables_untouched() {
        let mut store = MappingStore::new();
        let before = store.pads.len();
        store.arm_pad_learn(Action::Interval(1));
        store.cancel_learn();

        assert_eq!(store.learn_note(60), None);
        assert_eq!(store.pads.len(), before);
    }
}
