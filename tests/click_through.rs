use eframe::egui;
use foxy_jumpscare::click_through::{ClickThrough, ViewportClickThrough};
use raw_window_handle::{RawWindowHandle, WebWindowHandle};

use mock_ctx::MockCtx;

#[test]
fn viewport_passthrough_is_requested() {
    let ctx = MockCtx::default();
    let click = ViewportClickThrough::new(ctx.clone());
    click.apply(RawWindowHandle::Web(WebWindowHandle::new(1)));

    let cmds = ctx.take();
    assert_eq!(cmds.len(), 1);
    assert!(matches!(cmds[0], egui::ViewportCommand::MousePassthrough(true)));
}

#[test]
fn applying_twice_requests_the_same_state() {
    let ctx = MockCtx::default();
    let click = ViewportClickThrough::new(ctx.clone());
    click.apply(RawWindowHandle::Web(WebWindowHandle::new(1)));
    click.apply(RawWindowHandle::Web(WebWindowHandle::new(1)));

    let cmds = ctx.take();
    assert!(cmds
        .iter()
        .all(|c| matches!(c, egui::ViewportCommand::MousePassthrough(true))));
}
