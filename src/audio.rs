use anyhow::Result;
use std::path::Path;

pub trait Playback {
    fn stop(&mut self) -> Result<()>;
}

pub trait AudioOutput {
    /// Start playing the audio track of `path` at `volume` (0.0..=1.0).
    fn play(&self, path: &Path, volume: f32) -> Result<Box<dyn Playback>>;
}

pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Audio output used where no mixer backend is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioOutput for NullAudio {
    fn play(&self, path: &Path, _volume: f32) -> Result<Box<dyn Playback>> {
        anyhow::bail!(
            "no audio output on this platform, {} plays silently",
            path.display()
        )
    }
}

#[cfg(any(target_os = "windows", target_os = "macos"))]
mod backend {
    use super::{clamp_volume, AudioOutput, Playback};
    use anyhow::{anyhow, Context, Result};
    use std::fs::File;
    use std::io::BufReader;
    use std::path::Path;

    #[derive(Debug, Default, Clone, Copy)]
    pub struct RodioAudio;

    struct RodioPlayback {
        // The stream must outlive the sink or playback stops immediately.
        _stream: rodio::OutputStream,
        sink: rodio::Sink,
    }

    impl Playback for RodioPlayback {
        fn stop(&mut self) -> Result<()> {
            self.sink.stop();
            Ok(())
        }
    }

    impl AudioOutput for RodioAudio {
        fn play(&self, path: &Path, volume: f32) -> Result<Box<dyn Playback>> {
            let (stream, handle) = rodio::OutputStream::try_default()
                .map_err(|e| anyhow!("no audio output device: {e}"))?;
            let file = File::open(path)
                .with_context(|| format!("failed to open audio source {}", path.display()))?;
            let source = rodio::Decoder::new(BufReader::new(file))
                .map_err(|e| anyhow!("unsupported audio in {}: {e}", path.display()))?;
            let sink = rodio::Sink::try_new(&handle).map_err(|e| anyhow!("audio sink: {e}"))?;
            sink.set_volume(clamp_volume(volume));
            sink.append(source);
            sink.play();
            Ok(Box::new(RodioPlayback {
                _stream: stream,
                sink,
            }))
        }
    }
}

#[cfg(any(target_os = "windows", target_os = "macos"))]
pub use backend::RodioAudio;

/// The audio output compiled for this platform.
pub fn platform_default() -> Box<dyn AudioOutput> {
    #[cfg(any(target_os = "windows", target_os = "macos"))]
    {
        Box::new(RodioAudio)
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        Box::new(NullAudio)
    }
}
