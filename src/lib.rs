pub mod audio;
pub mod chroma;
pub mod click_through;
pub mod controller;
pub mod events;
pub mod gui;
#[cfg(any(target_os = "windows", target_os = "macos"))]
pub mod hotkey;
pub mod logging;
pub mod overlay;
pub mod scheduler;
pub mod settings;
pub mod startup;
pub mod video;
pub mod visibility;
