#![allow(dead_code)]

use anyhow::{bail, Result};
use foxy_jumpscare::audio::{AudioOutput, Playback};
use foxy_jumpscare::chroma::ChromaKey;
use foxy_jumpscare::click_through::ClickThrough;
use foxy_jumpscare::overlay::{MonitorRect, OverlayServices, OverlaySurface};
use foxy_jumpscare::video::{Frame, VideoDecoder, VideoSource};
use image::RgbaImage;
use raw_window_handle::{RawWindowHandle, WebWindowHandle};
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

#[derive(Clone)]
pub struct FakeDecoder {
    pub fps: f64,
    pub frames: usize,
    pub size: (u32, u32),
    pub fail: bool,
    pub opened: Rc<Cell<usize>>,
    pub log: Log,
}

impl FakeDecoder {
    pub fn new(log: &Log, fps: f64, frames: usize) -> Self {
        Self {
            fps,
            frames,
            size: (2, 2),
            fail: false,
            opened: Rc::new(Cell::new(0)),
            log: log.clone(),
        }
    }

    pub fn failing(log: &Log) -> Self {
        Self {
            fail: true,
            ..Self::new(log, 30.0, 0)
        }
    }
}

impl VideoDecoder for FakeDecoder {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>> {
        self.opened.set(self.opened.get() + 1);
        if self.fail {
            self.log.borrow_mut().push("open failed".into());
            bail!("cannot open {}", path.display());
        }
        self.log.borrow_mut().push("open".into());
        Ok(Box::new(FakeSource {
            fps: self.fps,
            remaining: self.frames,
            index: 0,
            size: self.size,
            log: self.log.clone(),
        }))
    }
}

pub struct FakeSource {
    fps: f64,
    remaining: usize,
    index: u32,
    size: (u32, u32),
    log: Log,
}

impl VideoSource for FakeSource {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn next_frame(&mut self) -> Option<Frame> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.index += 1;
        let (w, h) = self.size;
        // Left half green screen, right half red, in BGR order.
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for _y in 0..h {
            for x in 0..w {
                if x < w / 2 {
                    data.extend_from_slice(&[0, 200, 0]);
                } else {
                    data.extend_from_slice(&[0, 0, 200]);
                }
            }
        }
        Some(Frame {
            width: w,
            height: h,
            data,
            pts: Duration::from_millis(self.index as u64 * 40),
        })
    }
}

impl Drop for FakeSource {
    fn drop(&mut self) {
        self.log.borrow_mut().push("source released".into());
    }
}

#[derive(Clone)]
pub struct FakeAudio {
    pub fail_play: bool,
    pub fail_stop: bool,
    pub volumes: Rc<RefCell<Vec<f32>>>,
    pub log: Log,
}

impl FakeAudio {
    pub fn new(log: &Log) -> Self {
        Self {
            fail_play: false,
            fail_stop: false,
            volumes: Rc::new(RefCell::new(Vec::new())),
            log: log.clone(),
        }
    }
}

struct FakePlayback {
    fail_stop: bool,
    log: Log,
}

impl Playback for FakePlayback {
    fn stop(&mut self) -> Result<()> {
        self.log.borrow_mut().push("audio stopped".into());
        if self.fail_stop {
            bail!("device unplugged");
        }
        Ok(())
    }
}

impl AudioOutput for FakeAudio {
    fn play(&self, _path: &Path, volume: f32) -> Result<Box<dyn Playback>> {
        if self.fail_play {
            bail!("no device");
        }
        self.volumes.borrow_mut().push(volume);
        self.log.borrow_mut().push("audio playing".into());
        Ok(Box::new(FakePlayback {
            fail_stop: self.fail_stop,
            log: self.log.clone(),
        }))
    }
}

#[derive(Clone, Default)]
pub struct FakeClickThrough {
    pub applied: Rc<Cell<usize>>,
}

impl ClickThrough for FakeClickThrough {
    fn apply(&self, _handle: RawWindowHandle) {
        self.applied.set(self.applied.get() + 1);
    }
}

pub struct FakeSurface {
    pub log: Log,
    pub monitor: MonitorRect,
    pub presented: Vec<RgbaImage>,
    pub visible: bool,
}

impl FakeSurface {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            monitor: MonitorRect {
                x: 0,
                y: 0,
                width: 1280,
                height: 720,
            },
            presented: Vec::new(),
            visible: false,
        }
    }
}

impl OverlaySurface for FakeSurface {
    fn primary_monitor(&self) -> MonitorRect {
        self.monitor
    }

    fn show_fullscreen(&mut self, rect: MonitorRect) {
        self.visible = true;
        self.log
            .borrow_mut()
            .push(format!("show {}x{}", rect.width, rect.height));
    }

    fn native_handle(&self) -> Option<RawWindowHandle> {
        Some(RawWindowHandle::Web(WebWindowHandle::new(1)))
    }

    fn present(&mut self, image: RgbaImage) {
        self.presented.push(image);
    }

    fn clear(&mut self) {
        self.log.borrow_mut().push("clear".into());
    }

    fn hide(&mut self) {
        self.visible = false;
        self.log.borrow_mut().push("hide".into());
    }
}

pub fn services(decoder: FakeDecoder, audio: FakeAudio, click: FakeClickThrough) -> OverlayServices {
    OverlayServices {
        decoder: Box::new(decoder),
        audio: Box::new(audio),
        click_through: Box::new(click),
        chroma: ChromaKey::default(),
        volume: 1.0,
    }
}
