use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::settings::AppContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupOutcome {
    Created(PathBuf),
    AlreadyPresent,
    Unsupported,
    Disabled,
    Failed,
}

/// VBScript that launches `exe` hidden and without waiting.
pub fn startup_script_contents(exe: &Path) -> String {
    let escaped = exe.to_string_lossy().replace('"', "\"\"");
    format!(
        "Set WshShell = CreateObject(\"WScript.Shell\")\nWshShell.Run \"{escaped}\", 0, False\n"
    )
}

/// Write the launcher script into `dir` unless one with that name exists.
pub fn ensure_startup_script_in(dir: &Path, name: &str, exe: &Path) -> Result<StartupOutcome> {
    let path = dir.join(name);
    if path.exists() {
        return Ok(StartupOutcome::AlreadyPresent);
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    std::fs::write(&path, startup_script_contents(exe))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(StartupOutcome::Created(path))
}

/// Per-user Startup folder, when this platform has one.
pub fn startup_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        dirs_next::config_dir().map(|appdata| {
            appdata
                .join("Microsoft")
                .join("Windows")
                .join("Start Menu")
                .join("Programs")
                .join("Startup")
        })
    } else {
        None
    }
}

/// Register the running executable to start at login. Never fails; the
/// outcome is logged and returned.
pub fn register(ctx: &AppContext) -> StartupOutcome {
    if !ctx.settings.register_startup {
        return StartupOutcome::Disabled;
    }
    let Some(dir) = startup_dir() else {
        tracing::debug!("login startup registration unsupported on this platform");
        return StartupOutcome::Unsupported;
    };
    match ensure_startup_script_in(&dir, &ctx.settings.startup_script_name, &ctx.exe_path) {
        Ok(StartupOutcome::Created(path)) => {
            tracing::info!("Created startup script at: {}", path.display());
            StartupOutcome::Created(path)
        }
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!("Failed to create startup script: {err:#}");
            StartupOutcome::Failed
        }
    }
}
