#![cfg_attr(all(windows, feature = "windows_gui"), windows_subsystem = "windows")]

use anyhow::anyhow;
use foxy_jumpscare::gui::{native_options, JumpscareApp};
use foxy_jumpscare::settings::{console_attached, AppContext};
use foxy_jumpscare::{logging, startup};

fn run(ctx: &AppContext) -> anyhow::Result<()> {
    tracing::info!("Jumpscare daemon starting");
    startup::register(ctx);
    tracing::info!("Video path resolved to: {}", ctx.video_path.display());

    let app_ctx = ctx.clone();
    eframe::run_native(
        "Foxy Jumpscare",
        native_options(ctx),
        Box::new(move |cc| Box::new(JumpscareApp::new(cc, &app_ctx))),
    )
    .map_err(|e| anyhow!("event loop failed: {e}"))
}

fn install_panic_hook(is_console: bool) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("FATAL PANIC: {info}");
        if is_console {
            previous(info);
        }
    }));
}

fn main() -> anyhow::Result<()> {
    let ctx = match AppContext::discover() {
        Ok(ctx) => ctx,
        Err(err) => {
            // Settings are unreadable; log next to the exe with defaults so the
            // failure is not lost.
            let exe = std::env::current_exe().unwrap_or_default();
            let fallback = AppContext::new(exe, Default::default(), console_attached());
            logging::init(true, Some(&fallback.log_path), fallback.is_console);
            tracing::error!("FATAL ERROR: {err:?}");
            return if fallback.is_console { Err(err) } else { Ok(()) };
        }
    };

    logging::init(ctx.settings.debug_logging, Some(&ctx.log_path), ctx.is_console);
    install_panic_hook(ctx.is_console);

    match run(&ctx) {
        Ok(()) => {
            tracing::info!("Jumpscare daemon exited");
            Ok(())
        }
        Err(err) => {
            tracing::error!("FATAL ERROR: {err:?}");
            if ctx.is_console {
                Err(err)
            } else {
                Ok(())
            }
        }
    }
}
