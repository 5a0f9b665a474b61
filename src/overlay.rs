use image::RgbaImage;
use raw_window_handle::RawWindowHandle;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::audio::{AudioOutput, Playback};
use crate::chroma::ChromaKey;
use crate::click_through::ClickThrough;
use crate::events::{EndReason, EventSender, SessionId};
use crate::video::{effective_fps, frame_interval, VideoDecoder, VideoSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Created,
    Starting,
    Playing,
    Ending,
    FailedToOpen,
    Destroyed,
}

impl OverlayState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Destroyed)
    }
}

pub fn can_transition(from: OverlayState, to: OverlayState) -> bool {
    use OverlayState::*;
    matches!(
        (from, to),
        (Created, Starting)
            | (Created, Destroyed)
            | (Starting, Playing)
            | (Starting, FailedToOpen)
            | (Starting, Destroyed)
            | (Playing, Ending)
            | (Ending, Destroyed)
            | (FailedToOpen, Destroyed)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonitorRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Display service the overlay draws through.
pub trait OverlaySurface {
    /// Full bounds of the primary display.
    fn primary_monitor(&self) -> MonitorRect;
    /// Borderless, topmost, transparent background, visible.
    fn show_fullscreen(&mut self, rect: MonitorRect);
    fn native_handle(&self) -> Option<RawWindowHandle>;
    /// Display `image` stretched over the whole surface.
    fn present(&mut self, image: RgbaImage);
    fn clear(&mut self);
    fn hide(&mut self);
}

/// Everything a session needs from the outside world.
pub struct OverlayServices {
    pub decoder: Box<dyn VideoDecoder>,
    pub audio: Box<dyn AudioOutput>,
    pub click_through: Box<dyn ClickThrough>,
    pub chroma: ChromaKey,
    pub volume: f32,
}

/// Repeating frame timer. Deadlines advance on a fixed schedule so the
/// frame rate holds even when ticks land late; once a whole interval has
/// been missed the schedule restarts from `now` instead of bursting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTimer {
    interval: Duration,
    next_due: Instant,
}

impl FrameTimer {
    pub fn start(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_due: now + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due += self.interval;
        if self.next_due <= now {
            self.next_due = now + self.interval;
        }
        true
    }
}

/// One jumpscare: show, play, tear down.
pub struct OverlaySession {
    id: SessionId,
    video_path: PathBuf,
    state: OverlayState,
    history: Vec<OverlayState>,
    source: Option<Box<dyn VideoSource>>,
    playback: Option<Box<dyn Playback>>,
    timer: Option<FrameTimer>,
    frames_presented: u64,
    events: EventSender,
}

impl OverlaySession {
    pub fn new(id: SessionId, video_path: impl Into<PathBuf>, events: EventSender) -> Self {
        Self {
            id,
            video_path: video_path.into(),
            state: OverlayState::Created,
            history: vec![OverlayState::Created],
            source: None,
            playback: None,
            timer: None,
            frames_presented: 0,
            events,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    /// Every state this session has been in, oldest first.
    pub fn history(&self) -> &[OverlayState] {
        &self.history
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn frame_interval(&self) -> Option<Duration> {
        self.timer.map(|t| t.interval())
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.map(|t| t.next_due())
    }

    fn transition(&mut self, to: OverlayState) {
        if !can_transition(self.state, to) {
            tracing::warn!(session = self.id, "ignored transition {:?} -> {:?}", self.state, to);
            return;
        }
        tracing::debug!(session = self.id, "overlay {:?} -> {:?}", self.state, to);
        self.state = to;
        self.history.push(to);
    }

    pub fn start(&mut self, services: &OverlayServices, surface: &mut dyn OverlaySurface, now: Instant) {
        if self.state != OverlayState::Created {
            return;
        }
        tracing::info!(session = self.id, "overlay start");
        self.transition(OverlayState::Starting);

        let rect = surface.primary_monitor();
        surface.show_fullscreen(rect);
        match surface.native_handle() {
            Some(handle) => services.click_through.apply(handle),
            None => tracing::debug!("no native window handle, click-through skipped"),
        }

        let source = match services.decoder.open(&self.video_path) {
            Ok(source) => source,
            Err(err) => {
                tracing::error!("Failed to open video {}: {err:#}", self.video_path.display());
                self.transition(OverlayState::FailedToOpen);
                self.teardown(surface);
                self.finish(EndReason::OpenFailed);
                return;
            }
        };

        let fps = effective_fps(source.fps());
        let interval = frame_interval(fps);
        self.source = Some(source);

        self.playback = match services.audio.play(&self.video_path, services.volume) {
            Ok(playback) => Some(playback),
            Err(err) => {
                tracing::warn!("audio unavailable, playing silently: {err:#}");
                None
            }
        };

        self.timer = Some(FrameTimer::start(interval, now));
        tracing::info!(
            session = self.id,
            fps,
            interval_ms = interval.as_millis() as u64,
            "overlay playing"
        );
        self.transition(OverlayState::Playing);
    }

    /// Frame-pull timer callback. Does nothing unless the timer is due.
    pub fn on_frame_tick(&mut self, chroma: &ChromaKey, surface: &mut dyn OverlaySurface, now: Instant) {
        if self.state != OverlayState::Playing {
            return;
        }
        let due = self.timer.as_mut().map(|t| t.fire_if_due(now)).unwrap_or(false);
        if !due {
            return;
        }

        let frame = self.source.as_mut().and_then(|s| s.next_frame());
        let Some(frame) = frame else {
            self.end(surface);
            return;
        };

        match chroma.composite(&frame.data, frame.width, frame.height) {
            Ok(image) => {
                surface.present(image);
                self.frames_presented += 1;
            }
            Err(err) => tracing::warn!("dropping frame at {:?}: {err:#}", frame.pts),
        }
    }

    /// Normal end of playback.
    pub fn end(&mut self, surface: &mut dyn OverlaySurface) {
        if self.state != OverlayState::Playing {
            return;
        }
        tracing::info!(session = self.id, "Ending jumpscare");
        self.transition(OverlayState::Ending);
        self.teardown(surface);
        self.finish(EndReason::EndOfStream);
    }

    /// Abort before `Playing` was reached, or after any other path when the
    /// owner is shutting down. Safe to call repeatedly.
    pub fn cleanup(&mut self, surface: &mut dyn OverlaySurface) {
        match self.state {
            OverlayState::Destroyed => {}
            OverlayState::Playing => self.end(surface),
            _ => {
                tracing::info!(session = self.id, "overlay cleanup");
                self.teardown(surface);
                self.finish(EndReason::StartAborted);
            }
        }
    }

    fn teardown(&mut self, surface: &mut dyn OverlaySurface) {
        self.timer = None;
        self.source = None;
        if let Some(mut playback) = self.playback.take() {
            if let Err(err) = playback.stop() {
                tracing::warn!("audio stop failed: {err:#}");
            }
        }
        surface.clear();
        surface.hide();
    }

    fn finish(&mut self, reason: EndReason) {
        self.transition(OverlayState::Destroyed);
        self.events.session_ended(self.id, reason);
    }
}

impl Drop for OverlaySession {
    fn drop(&mut self) {
        if !self.state.is_terminal() {
            tracing::debug!(session = self.id, "overlay dropped while {:?}", self.state);
        }
    }
}
