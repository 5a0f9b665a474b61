use eframe::egui;

use crate::overlay::MonitorRect;

/// The part of `egui::Context` the overlay needs, so tests can record
/// viewport commands instead of driving a real window.
pub trait ViewportCtx {
    fn send_viewport_cmd(&self, cmd: egui::ViewportCommand);
    fn request_repaint(&self);
}

impl ViewportCtx for egui::Context {
    fn send_viewport_cmd(&self, cmd: egui::ViewportCommand) {
        egui::Context::send_viewport_cmd(self, cmd);
    }

    fn request_repaint(&self) {
        egui::Context::request_repaint(self);
    }
}

/// Cover `rect` with the overlay and keep it above every other window.
pub fn show_overlay<C: ViewportCtx>(ctx: &C, rect: MonitorRect) {
    tracing::debug!(?rect, "showing overlay");
    ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(egui::pos2(
        rect.x as f32,
        rect.y as f32,
    )));
    ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(egui::vec2(
        rect.width as f32,
        rect.height as f32,
    )));
    ctx.send_viewport_cmd(egui::ViewportCommand::Visible(true));
    ctx.send_viewport_cmd(egui::ViewportCommand::WindowLevel(
        egui::WindowLevel::AlwaysOnTop,
    ));
    ctx.request_repaint();
}

/// Move the idle overlay off-screen. The window stays alive so the event
/// loop keeps running the scheduler.
pub fn park_overlay<C: ViewportCtx>(ctx: &C, offscreen: (i32, i32)) {
    tracing::debug!(?offscreen, "parking overlay");
    ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(egui::vec2(1.0, 1.0)));
    ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(egui::pos2(
        offscreen.0 as f32,
        offscreen.1 as f32,
    )));
    ctx.request_repaint();
}

/// Size of the primary display in physical pixels.
#[cfg(target_os = "windows")]
pub fn primary_monitor_pixels() -> Option<(i32, i32)> {
    use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};
    let (w, h) = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
    (w > 0 && h > 0).then_some((w, h))
}

#[cfg(not(target_os = "windows"))]
pub fn primary_monitor_pixels() -> Option<(i32, i32)> {
    None
}

/// Primary display bounds in egui points. `monitor_size` is what the
/// viewport reports for its current monitor, used when the platform cannot
/// name the primary one.
pub fn primary_monitor_rect(
    physical: Option<(i32, i32)>,
    pixels_per_point: f32,
    monitor_size: Option<egui::Vec2>,
) -> Option<MonitorRect> {
    if let Some((w, h)) = physical {
        let ppp = if pixels_per_point > 0.0 { pixels_per_point } else { 1.0 };
        return Some(MonitorRect {
            x: 0,
            y: 0,
            width: (w as f32 / ppp).round() as i32,
            height: (h as f32 / ppp).round() as i32,
        });
    }
    monitor_size.map(|size| MonitorRect {
        x: 0,
        y: 0,
        width: size.x.round() as i32,
        height: size.y.round() as i32,
    })
}
