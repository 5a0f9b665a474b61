use eframe::egui;
use image::RgbaImage;
use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use std::sync::Arc;
use std::time::Instant;

use crate::audio;
use crate::chroma::ChromaKey;
use crate::click_through;
use crate::controller::AppController;
use crate::events::{event_channel, start_source, TriggerSource};
use crate::overlay::{MonitorRect, OverlayServices, OverlaySurface};
use crate::scheduler::TriggerScheduler;
use crate::settings::AppContext;
use crate::video::FfmpegDecoder;
use crate::visibility::{park_overlay, primary_monitor_pixels, primary_monitor_rect, show_overlay};

const FALLBACK_MONITOR: MonitorRect = MonitorRect {
    x: 0,
    y: 0,
    width: 1920,
    height: 1080,
};

/// Texture currently shown by the overlay.
#[derive(Default)]
pub struct OverlayView {
    texture: Option<egui::TextureHandle>,
}

impl OverlayView {
    pub fn texture(&self) -> Option<&egui::TextureHandle> {
        self.texture.as_ref()
    }
}

/// `OverlaySurface` backed by the eframe root viewport.
pub struct EguiSurface<'a> {
    ctx: &'a egui::Context,
    frame: &'a eframe::Frame,
    view: &'a mut OverlayView,
    offscreen: (i32, i32),
}

impl<'a> EguiSurface<'a> {
    pub fn new(
        ctx: &'a egui::Context,
        frame: &'a eframe::Frame,
        view: &'a mut OverlayView,
        offscreen: (i32, i32),
    ) -> Self {
        Self {
            ctx,
            frame,
            view,
            offscreen,
        }
    }
}

impl OverlaySurface for EguiSurface<'_> {
    fn primary_monitor(&self) -> MonitorRect {
        let (monitor_size, ppp) = self.ctx.input(|i| {
            let viewport = i.viewport();
            (
                viewport.monitor_size,
                viewport.native_pixels_per_point.unwrap_or(1.0),
            )
        });
        primary_monitor_rect(primary_monitor_pixels(), ppp, monitor_size).unwrap_or_else(|| {
            tracing::warn!("monitor size unknown, assuming {FALLBACK_MONITOR:?}");
            FALLBACK_MONITOR
        })
    }

    fn show_fullscreen(&mut self, rect: MonitorRect) {
        show_overlay(self.ctx, rect);
    }

    fn native_handle(&self) -> Option<RawWindowHandle> {
        self.frame.window_handle().ok().map(|handle| handle.as_raw())
    }

    fn present(&mut self, image: RgbaImage) {
        let size = [image.width() as usize, image.height() as usize];
        let color = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
        match &mut self.view.texture {
            Some(texture) => texture.set(color, egui::TextureOptions::LINEAR),
            None => {
                let texture =
                    self.ctx
                        .load_texture("jumpscare-frame", color, egui::TextureOptions::LINEAR);
                self.view.texture = Some(texture);
            }
        }
        self.ctx.request_repaint();
    }

    fn clear(&mut self) {
        self.view.texture = None;
    }

    fn hide(&mut self) {
        park_overlay(self.ctx, self.offscreen);
    }
}

pub fn native_options(ctx: &AppContext) -> eframe::NativeOptions {
    let (x, y) = ctx.settings.offscreen_pos;
    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Foxy Jumpscare")
            .with_decorations(false)
            .with_transparent(true)
            .with_always_on_top()
            .with_taskbar(false)
            .with_resizable(false)
            .with_position([x as f32, y as f32])
            .with_inner_size([1.0, 1.0]),
        ..Default::default()
    }
}

fn overlay_services(ctx: &AppContext, egui_ctx: &egui::Context) -> OverlayServices {
    let mut search_dirs = Vec::new();
    if let Some(dir) = &ctx.settings.ffmpeg_dir {
        search_dirs.push(crate::settings::resolve_against(
            &ctx.base_dir,
            &dir.to_string_lossy(),
        ));
    }
    search_dirs.push(ctx.base_dir.clone());

    OverlayServices {
        decoder: Box::new(FfmpegDecoder::locate(
            &search_dirs,
            ctx.settings.open_timeout(),
            ctx.settings.frame_stall_timeout(),
        )),
        audio: audio::platform_default(),
        click_through: click_through::platform_default(egui_ctx),
        chroma: ChromaKey::new(ctx.settings.green_min, ctx.settings.green_diff),
        volume: audio::clamp_volume(ctx.settings.volume),
    }
}

/// Global hotkey source, registered only for console runs.
#[cfg(any(target_os = "windows", target_os = "macos"))]
pub fn external_trigger_source(ctx: &AppContext) -> Option<Box<dyn TriggerSource>> {
    use crate::hotkey::{parse_hotkey, HotkeyTrigger};

    if !ctx.is_console {
        tracing::info!("No console detected, skipping global hotkey registration");
        return None;
    }
    let spec = ctx.settings.hotkey.as_deref()?;
    match parse_hotkey(spec) {
        Some(hotkey) => Some(Box::new(HotkeyTrigger::new(hotkey, spec))),
        None => {
            tracing::warn!("provided hotkey string '{spec}' is invalid; ignoring");
            None
        }
    }
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub fn external_trigger_source(_ctx: &AppContext) -> Option<Box<dyn TriggerSource>> {
    tracing::info!("global hotkeys unavailable on this platform");
    None
}

pub struct JumpscareApp {
    controller: AppController,
    view: OverlayView,
    offscreen: (i32, i32),
    parked: bool,
}

impl JumpscareApp {
    pub fn new(cc: &eframe::CreationContext<'_>, ctx: &AppContext) -> Self {
        let repaint = cc.egui_ctx.clone();
        let events = event_channel(Some(Arc::new(move || repaint.request_repaint())));
        let scheduler = TriggerScheduler::new(ctx.settings.tick_interval(), ctx.settings.roll_max);
        let mut controller = AppController::new(
            ctx.video_path.clone(),
            overlay_services(ctx, &cc.egui_ctx),
            scheduler,
            events,
        );

        if let Some(source) = external_trigger_source(ctx) {
            start_source(source.as_ref(), controller.event_sender());
        }

        controller.start(Instant::now());
        Self {
            controller,
            view: OverlayView::default(),
            offscreen: ctx.settings.offscreen_pos,
            parked: false,
        }
    }
}

impl eframe::App for JumpscareApp {
    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0, 0.0, 0.0, 0.0]
    }

    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let now = Instant::now();
        let mut surface = EguiSurface::new(ctx, frame, &mut self.view, self.offscreen);
        if !self.parked {
            surface.hide();
            self.parked = true;
        }
        let next = self.controller.pump(&mut surface, now);

        if let Some(texture) = self.view.texture() {
            ctx.layer_painter(egui::LayerId::background()).image(
                texture.id(),
                ctx.screen_rect(),
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        ctx.request_repaint_after(next.saturating_duration_since(Instant::now()));
    }
}
