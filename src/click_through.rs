use eframe::egui;
use raw_window_handle::RawWindowHandle;

use crate::visibility::ViewportCtx;

pub const WS_EX_TRANSPARENT: u32 = 0x0000_0020;
pub const WS_EX_LAYERED: u32 = 0x0008_0000;

/// Extended window style with mouse input passing through to whatever is
/// underneath. Applying it twice is the same as applying it once.
pub fn click_through_ex_style(style: u32) -> u32 {
    style | WS_EX_LAYERED | WS_EX_TRANSPARENT
}

/// Makes a realized window transparent to pointer input. Implementations
/// log failures and never propagate them.
pub trait ClickThrough {
    fn apply(&self, handle: RawWindowHandle);
}

/// Asks the windowing backend for pointer passthrough on the egui viewport.
/// Used where there is no native extended-style primitive.
#[derive(Clone)]
pub struct ViewportClickThrough<C: ViewportCtx> {
    ctx: C,
}

impl<C: ViewportCtx> ViewportClickThrough<C> {
    pub fn new(ctx: C) -> Self {
        Self { ctx }
    }
}

impl<C: ViewportCtx> ClickThrough for ViewportClickThrough<C> {
    fn apply(&self, _handle: RawWindowHandle) {
        self.ctx
            .send_viewport_cmd(egui::ViewportCommand::MousePassthrough(true));
        tracing::debug!("mouse passthrough requested for overlay viewport");
    }
}

#[cfg(target_os = "windows")]
mod win32 {
    use super::{click_through_ex_style, ClickThrough};
    use raw_window_handle::RawWindowHandle;
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::WindowsAndMessaging::{GetWindowLongW, SetWindowLongW, GWL_EXSTYLE};

    #[derive(Debug, Default, Clone, Copy)]
    pub struct Win32ClickThrough;

    impl ClickThrough for Win32ClickThrough {
        fn apply(&self, handle: RawWindowHandle) {
            let RawWindowHandle::Win32(handle) = handle else {
                tracing::warn!("click-through expects a Win32 window handle, got {handle:?}");
                return;
            };
            let hwnd = HWND(handle.hwnd.get() as *mut core::ffi::c_void);
            unsafe {
                let style = GetWindowLongW(hwnd, GWL_EXSTYLE) as u32;
                let updated = click_through_ex_style(style);
                if updated != style {
                    SetWindowLongW(hwnd, GWL_EXSTYLE, updated as i32);
                }
                let applied = GetWindowLongW(hwnd, GWL_EXSTYLE) as u32;
                if applied & updated != updated {
                    tracing::warn!("window refused click-through style {updated:#x} (has {applied:#x})");
                } else {
                    tracing::debug!("click-through style applied: {applied:#x}");
                }
            }
        }
    }
}

#[cfg(target_os = "windows")]
pub use win32::Win32ClickThrough;

/// The click-through implementation compiled for this platform.
pub fn platform_default(ctx: &egui::Context) -> Box<dyn ClickThrough> {
    #[cfg(target_os = "windows")]
    {
        let _ = ctx;
        Box::new(Win32ClickThrough)
    }
    #[cfg(not(target_os = "windows"))]
    {
        Box::new(ViewportClickThrough::new(ctx.clone()))
    }
}
