use std::thread::sleep;
use std::time::Duration;

use notcurses::*;
use ringbuf::traits::{Consumer, Producer};

use crate::input_model::{InputEvent, KeyInput, PipePub, PipeSub, PointerInput};
use crate::keyboard_layout;

/*
    Terminal front: translates key press/release and mouse events into input
    events, and scrolls the engine's status lines under a static keymap
    header. All musical decisions happen on the engine thread.
*/

pub struct NcursesDaemon {
    publisher: PipePub<InputEvent>,
    status_in: PipeSub<String>,
}

impl NcursesDaemon {
    pub fn new(publisher: PipePub<InputEvent>, status_in: PipeSub<String>) -> NcursesDaemon {
        NcursesDaemon {
            publisher,
            status_in,
        }
    }

    pub fn begin(mut self) -> NotcursesResult<()> {
        let mut nc = Notcurses::new()?;
        nc.mice_enable(MiceEvents::All)?;

        let mut plane = Plane::new(&mut nc)?;
        plane.set_scrolling(true);

        putstrln!(+render plane,
            "\n{0}\nrelative keys: q..p = -5..+5, a/s/d/f = -12/-7/+7/+12, space repeats\nz/x = octave jump, enter wipes history, esc = panic, F01 exits\nmouse strip (by column): {1}\n{0}\n",
            "-".repeat(60),
            keyboard_layout::strip_legend()
        )?;

        let bound_chars = keyboard_layout::bound_chars();
        let mut pointer_down = false;

        loop {
            while let Some(line) = self.status_in.try_pop() {
                putstrln!(+render plane, "{}", line)?;
            }

            let event = nc.poll_event()?;

            if !event.received() {
                sleep(Duration::from_millis(1));
                continue;
            }

            for &key in &bound_chars {
                if !event.is_char(key) {
                    continue;
                }

                let Some(action) = keyboard_layout::action_for(key) else {
                    continue;
                };

                if event.is_press() {
                    self.publish(InputEvent::Key(KeyInput {
                        label: key,
                        action,
                        pressed: true,
                    }));
                } else if event.is_release() {
                    self.publish(InputEvent::Key(KeyInput {
                        label: key,
                        action,
                        pressed: false,
                    }));
                }
            }

            // Pointer strip: button 1 anywhere, selected by column
            if event.is_key(Key::Button1) {
                if event.is_press() {
                    let action = event
                        .cell
                        .and_then(|position| keyboard_layout::strip_action(position.x()));
                    if let Some(action) = action {
                        pointer_down = true;
                        self.publish(InputEvent::Pointer(PointerInput {
                            action,
                            pressed: true,
                        }));
                    }
                } else if event.is_release() && pointer_down {
                    pointer_down = false;
                    self.publish(InputEvent::Pointer(PointerInput {
                        // the engine releases by source, the action is moot
                        action: crate::actions::Action::Interval(0),
                        pressed: false,
                    }));
                }
            }

            if event.is_key(Key::Enter) && event.is_press() {
                self.publish(InputEvent::Wipe);
            }

            if event.is_key(Key::Esc) && event.is_press() {
                self.publish(InputEvent::Panic);
            }

            if event.is_key(Key::F01) {
                break;
            }
        }

        Ok(())
    }

    fn publish(&mut self, event: InputEvent) {
        if self.publisher.try_push(event).is_err() {
            log::debug!(target: "terminal", "input pipe full, dropping event");
        }
    }
}
