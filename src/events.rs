use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

pub type SessionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCause {
    /// The scheduler rolled the winning value.
    Roll(u32),
    /// A hotkey or test hook bypassed the roll.
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    EndOfStream,
    OpenFailed,
    StartAborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Trigger(TriggerCause),
    SessionEnded { session: SessionId, reason: EndReason },
}

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Cloneable handle other threads use to hand events to the UI loop.
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<AppEvent>,
    waker: Option<Waker>,
}

impl fmt::Debug for EventSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("has_waker", &self.waker.is_some())
            .finish()
    }
}

impl EventSender {
    pub fn send(&self, event: AppEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("event loop gone, dropping event");
            return;
        }
        if let Some(wake) = &self.waker {
            wake();
        }
    }

    pub fn force_trigger(&self) {
        self.send(AppEvent::Trigger(TriggerCause::Forced));
    }

    pub fn session_ended(&self, session: SessionId, reason: EndReason) {
        self.send(AppEvent::SessionEnded { session, reason });
    }
}

/// Create the event channel. `waker` is invoked after every send so a
/// sleeping UI loop repaints and drains the queue.
pub fn event_channel(waker: Option<Waker>) -> (EventSender, Receiver<AppEvent>) {
    let (tx, rx) = channel();
    (EventSender { tx, waker }, rx)
}

/// An optional producer of forced triggers living outside the UI loop.
pub trait TriggerSource {
    fn name(&self) -> String;
    fn start(&self, events: EventSender) -> anyhow::Result<()>;
}

/// Start `source`, logging the outcome. Returns whether it is running.
pub fn start_source(source: &dyn TriggerSource, events: EventSender) -> bool {
    match source.start(events) {
        Ok(()) => {
            tracing::info!("Registered {} (force jumpscare)", source.name());
            true
        }
        Err(err) => {
            tracing::warn!("Failed to register {}: {err:#}", source.name());
            false
        }
    }
}
