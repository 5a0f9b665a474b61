use rand::rngs::StdRng;
use rand::Rng;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crate::events::{AppEvent, EventSender, SessionId, TriggerCause};
use crate::overlay::{OverlayServices, OverlaySession, OverlayState, OverlaySurface};
use crate::scheduler::TriggerScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyActive,
}

/// Longest the loop sleeps when nothing is scheduled.
const IDLE_WAKE: Duration = Duration::from_secs(1);

/// Wires triggers to overlay sessions and keeps at most one alive.
pub struct AppController<R: Rng = StdRng> {
    video_path: PathBuf,
    services: OverlayServices,
    scheduler: TriggerScheduler<R>,
    active: Option<OverlaySession>,
    next_session: SessionId,
    sessions_started: u64,
    events_tx: EventSender,
    events_rx: Receiver<AppEvent>,
}

impl<R: Rng> AppController<R> {
    pub fn new(
        video_path: impl Into<PathBuf>,
        services: OverlayServices,
        scheduler: TriggerScheduler<R>,
        events: (EventSender, Receiver<AppEvent>),
    ) -> Self {
        let (events_tx, events_rx) = events;
        Self {
            video_path: video_path.into(),
            services,
            scheduler,
            active: None,
            next_session: 1,
            sessions_started: 0,
            events_tx,
            events_rx,
        }
    }

    /// Handle for other threads (hotkey listeners) to request a trigger.
    pub fn event_sender(&self) -> EventSender {
        self.events_tx.clone()
    }

    pub fn start(&mut self, now: Instant) {
        self.scheduler.start(now);
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_state(&self) -> Option<OverlayState> {
        self.active.as_ref().map(|s| s.state())
    }

    pub fn active_session(&self) -> Option<&OverlaySession> {
        self.active.as_ref()
    }

    pub fn sessions_started(&self) -> u64 {
        self.sessions_started
    }

    /// Trigger immediately, bypassing the roll.
    pub fn force_trigger(&mut self, surface: &mut dyn OverlaySurface, now: Instant) -> StartOutcome {
        let cause = self.scheduler.force_trigger();
        self.on_trigger(cause, surface, now)
    }

    pub fn on_trigger(
        &mut self,
        cause: TriggerCause,
        surface: &mut dyn OverlaySurface,
        now: Instant,
    ) -> StartOutcome {
        if self.active.is_some() {
            tracing::debug!(?cause, "jumpscare already running, trigger dropped");
            return StartOutcome::AlreadyActive;
        }

        tracing::info!(?cause, "Triggering jumpscare");
        let id = self.next_session;
        self.next_session += 1;
        self.sessions_started += 1;

        let session = self
            .active
            .insert(OverlaySession::new(id, self.video_path.clone(), self.events_tx.clone()));
        session.start(&self.services, surface, now);
        StartOutcome::Started
    }

    /// Drain queued events: triggers from other threads and session
    /// completion notices.
    pub fn process_events(&mut self, surface: &mut dyn OverlaySurface, now: Instant) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                AppEvent::Trigger(cause) => {
                    self.on_trigger(cause, surface, now);
                }
                AppEvent::SessionEnded { session, reason } => {
                    if self.active.as_ref().map(|s| s.id()) == Some(session) {
                        self.active = None;
                        tracing::info!(session, ?reason, "Jumpscare window destroyed");
                    }
                }
            }
        }
    }

    /// One pass of the event loop. Returns when it next wants to run.
    pub fn pump(&mut self, surface: &mut dyn OverlaySurface, now: Instant) -> Instant {
        self.process_events(surface, now);

        if let Some(cause) = self.scheduler.poll(now) {
            self.on_trigger(cause, surface, now);
        }

        if let Some(session) = self.active.as_mut() {
            session.on_frame_tick(&self.services.chroma, surface, now);
        }

        self.process_events(surface, now);
        self.next_wake(now)
    }

    pub fn next_wake(&self, now: Instant) -> Instant {
        let session = self.active.as_ref().and_then(|s| s.next_deadline());
        [self.scheduler.next_deadline(), session]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(now + IDLE_WAKE)
    }
}
