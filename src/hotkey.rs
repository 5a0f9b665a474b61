use anyhow::Context;
use rdev::{listen, EventType, Key};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::events::{EventSender, TriggerSource};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hotkey {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Default for Hotkey {
    fn default() -> Self {
        Self {
            key: Key::KeyJ,
            ctrl: true,
            shift: true,
            alt: true,
        }
    }
}

/// Parse a hotkey string like "Ctrl+Alt+Shift+J" into a [`Hotkey`].
pub fn parse_hotkey(s: &str) -> Option<Hotkey> {
    let mut ctrl = false;
    let mut shift = false;
    let mut alt = false;
    let mut key: Option<Key> = None;

    for part in s.split('+') {
        let upper = part.trim().to_ascii_uppercase();
        match upper.as_str() {
            "CTRL" | "CONTROL" => ctrl = true,
            "SHIFT" => shift = true,
            "ALT" => alt = true,
            "" => {}
            _ => key = Some(parse_key(&upper)?),
        }
    }

    key.map(|k| Hotkey {
        key: k,
        ctrl,
        shift,
        alt,
    })
}

fn parse_key(upper: &str) -> Option<Key> {
    match upper {
        "SPACE" => Some(Key::Space),
        "TAB" => Some(Key::Tab),
        "ENTER" | "RETURN" => Some(Key::Return),
        "ESC" | "ESCAPE" => Some(Key::Escape),
        "DELETE" => Some(Key::Delete),
        "BACKSPACE" => Some(Key::Backspace),
        "HOME" => Some(Key::Home),
        "END" => Some(Key::End),
        "PAGEUP" => Some(Key::PageUp),
        "PAGEDOWN" => Some(Key::PageDown),
        _ if upper.len() > 1 && upper.starts_with('F') => match upper[1..].parse::<u8>().ok()? {
            1 => Some(Key::F1),
            2 => Some(Key::F2),
            3 => Some(Key::F3),
            4 => Some(Key::F4),
            5 => Some(Key::F5),
            6 => Some(Key::F6),
            7 => Some(Key::F7),
            8 => Some(Key::F8),
            9 => Some(Key::F9),
            10 => Some(Key::F10),
            11 => Some(Key::F11),
            12 => Some(Key::F12),
            _ => None,
        },
        _ if upper.len() == 1 => {
            let c = upper.chars().next()?;
            Some(match c {
                '0' => Key::Num0,
                '1' => Key::Num1,
                '2' => Key::Num2,
                '3' => Key::Num3,
                '4' => Key::Num4,
                '5' => Key::Num5,
                '6' => Key::Num6,
                '7' => Key::Num7,
                '8' => Key::Num8,
                '9' => Key::Num9,
                'A' => Key::KeyA,
                'B' => Key::KeyB,
                'C' => Key::KeyC,
                'D' => Key::KeyD,
                'E' => Key::KeyE,
                'F' => Key::KeyF,
                'G' => Key::KeyG,
                'H' => Key::KeyH,
                'I' => Key::KeyI,
                'J' => Key::KeyJ,
                'K' => Key::KeyK,
                'L' => Key::KeyL,
                'M' => Key::KeyM,
                'N' => Key::KeyN,
                'O' => Key::KeyO,
                'P' => Key::KeyP,
                'Q' => Key::KeyQ,
                'R' => Key::KeyR,
                'S' => Key::KeyS,
                'T' => Key::KeyT,
                'U' => Key::KeyU,
                'V' => Key::KeyV,
                'W' => Key::KeyW,
                'X' => Key::KeyX,
                'Y' => Key::KeyY,
                'Z' => Key::KeyZ,
                _ => return None,
            })
        }
        _ => None,
    }
}

/// Modifier and key state of one listener. Reports the rising edge of the
/// combo only, so holding the keys fires once.
#[derive(Debug, Default)]
pub struct ComboState {
    ctrl: bool,
    shift: bool,
    alt: bool,
    watch: bool,
    triggered: bool,
}

impl ComboState {
    pub fn update(&mut self, hotkey: &Hotkey, event: &EventType) -> bool {
        let (key, pressed) = match *event {
            EventType::KeyPress(k) => (k, true),
            EventType::KeyRelease(k) => (k, false),
            _ => return false,
        };
        match key {
            Key::ControlLeft | Key::ControlRight => self.ctrl = pressed,
            Key::ShiftLeft | Key::ShiftRight => self.shift = pressed,
            Key::Alt | Key::AltGr => self.alt = pressed,
            _ => {}
        }
        if key == hotkey.key {
            self.watch = pressed;
        }

        let combo = self.watch
            && (!hotkey.ctrl || self.ctrl)
            && (!hotkey.shift || self.shift)
            && (!hotkey.alt || self.alt);
        if combo && !self.triggered {
            self.triggered = true;
            return true;
        }
        if !combo {
            self.triggered = false;
        }
        false
    }
}

/// Global hotkey that forces a jumpscare.
pub struct HotkeyTrigger {
    pub hotkey: Hotkey,
    label: String,
    state: Arc<Mutex<ComboState>>,
}

impl HotkeyTrigger {
    pub fn new(hotkey: Hotkey, label: impl Into<String>) -> Self {
        Self {
            hotkey,
            label: label.into(),
            state: Arc::new(Mutex::new(ComboState::default())),
        }
    }

    /// Feed one keyboard event. Returns true when the combo was just completed.
    pub fn handle_event(&self, event: &EventType) -> bool {
        match self.state.lock() {
            Ok(mut state) => state.update(&self.hotkey, event),
            Err(_) => false,
        }
    }

    pub fn start_listener(&self, events: EventSender) -> anyhow::Result<()> {
        let hotkey = self.hotkey;
        let state = self.state.clone();
        tracing::debug!("starting hotkey listener for {:?}", hotkey.key);
        thread::Builder::new()
            .name("hotkey-listener".to_string())
            .spawn(move || loop {
                let state = state.clone();
                let events = events.clone();
                let result = listen(move |event| {
                    let fired = state
                        .lock()
                        .map(|mut s| s.update(&hotkey, &event.event_type))
                        .unwrap_or(false);
                    if fired {
                        tracing::debug!("hotkey match -> force trigger");
                        events.force_trigger();
                    }
                });

                match result {
                    Ok(()) => tracing::warn!("Hotkey listener exited unexpectedly. Restarting shortly"),
                    Err(e) => tracing::warn!("Hotkey listener failed: {:?}. Retrying shortly", e),
                }
                thread::sleep(Duration::from_millis(500));
            })
            .context("failed to spawn hotkey listener")?;
        Ok(())
    }
}

impl TriggerSource for HotkeyTrigger {
    fn name(&self) -> String {
        format!("hotkey {}", self.label)
    }

    fn start(&self, events: EventSender) -> anyhow::Result<()> {
        self.start_listener(events)
    }
}

/// Replay keyboard events through the triggers, forwarding matches to `events`.
pub fn process_test_events(triggers: &[Arc<HotkeyTrigger>], events: &EventSender, input: &[EventType]) {
    for event in input {
        for trigger in triggers {
            if trigger.handle_event(event) {
                events.force_trigger();
            }
        }
    }
}
