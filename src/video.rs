use anyhow::{anyhow, bail, Context, Result};
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

pub const FALLBACK_FPS: f64 = 30.0;
const FRAME_QUEUE: usize = 4;
const PROBE_POLL: Duration = Duration::from_millis(10);

/// One decoded picture, tightly packed in BGR order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub pts: Duration,
}

pub trait VideoSource {
    /// Frame rate reported by the container. May be zero or garbage.
    fn fps(&self) -> f64;
    /// Next frame, or `None` once the stream is exhausted or gone.
    fn next_frame(&mut self) -> Option<Frame>;
}

pub trait VideoDecoder {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>>;
}

pub fn effective_fps(reported: f64) -> f64 {
    if reported.is_finite() && reported > 0.0 {
        reported
    } else {
        FALLBACK_FPS
    }
}

/// `1000 / fps` milliseconds, truncated, never zero.
pub fn frame_interval(fps: f64) -> Duration {
    let ms = (1000.0 / effective_fps(fps)) as u64;
    Duration::from_millis(ms.max(1))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Parse `num/den` or a plain number. Unparsable or `x/0` yields `0.0`.
pub fn parse_frame_rate(value: &str) -> f64 {
    let value = value.trim();
    match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().unwrap_or(0.0);
            let den: f64 = den.trim().parse().unwrap_or(0.0);
            if den == 0.0 {
                0.0
            } else {
                num / den
            }
        }
        None => value.parse().unwrap_or(0.0),
    }
}

/// Parse `ffprobe -show_entries stream=width,height,r_frame_rate -of csv=s=x:p=0`.
pub fn parse_probe_output(output: &str) -> Result<StreamInfo> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| anyhow!("ffprobe reported no video stream"))?;
    let mut parts = line.split('x');
    let width: u32 = parts
        .next()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| anyhow!("bad width in probe output '{line}'"))?;
    let height: u32 = parts
        .next()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| anyhow!("bad height in probe output '{line}'"))?;
    if width == 0 || height == 0 {
        bail!("video stream has empty dimensions {width}x{height}");
    }
    let fps = parts.next().map(parse_frame_rate).unwrap_or(0.0);
    Ok(StreamInfo { width, height, fps })
}

fn hide_console(cmd: &mut Command) {
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    #[cfg(not(windows))]
    let _ = cmd;
}

fn binary_name(stem: &str) -> String {
    if cfg!(windows) {
        format!("{stem}.exe")
    } else {
        stem.to_string()
    }
}

/// Pick `stem` from the first directory containing it, else rely on `PATH`.
pub fn locate_binary(stem: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let name = binary_name(stem);
    search_dirs
        .iter()
        .map(|dir| dir.join(&name))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(name))
}

/// Arguments streaming `path` as raw BGR frames on stdout. Rotation
/// metadata is ignored so frames keep the coded size `ffprobe` reports.
pub fn decoder_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-v", "error", "-nostdin", "-noautorotate", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_owned());
    args.extend(["-f", "rawvideo", "-pix_fmt", "bgr24", "-"].iter().map(OsString::from));
    args
}

/// Decodes through `ffprobe`/`ffmpeg` child processes.
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub open_timeout: Duration,
    pub stall_timeout: Duration,
}

impl FfmpegDecoder {
    pub fn locate(search_dirs: &[PathBuf], open_timeout: Duration, stall_timeout: Duration) -> Self {
        Self {
            ffmpeg: locate_binary("ffmpeg", search_dirs),
            ffprobe: locate_binary("ffprobe", search_dirs),
            open_timeout,
            stall_timeout,
        }
    }

    pub fn probe(&self, path: &Path) -> Result<StreamInfo> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "csv=s=x:p=0",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
        hide_console(&mut cmd);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to run {}", self.ffprobe.display()))?;
        let deadline = Instant::now() + self.open_timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                bail!("ffprobe did not answer within {:?}", self.open_timeout);
            }
            thread::sleep(PROBE_POLL);
        };
        if !status.success() {
            bail!("ffprobe rejected {} ({status})", path.display());
        }

        let mut output = String::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout.read_to_string(&mut output)?;
        }
        parse_probe_output(&output)
    }

    fn spawn_decoder(&self, path: &Path) -> Result<Child> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(decoder_args(path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        hide_console(&mut cmd);
        cmd.spawn()
            .with_context(|| format!("failed to run {}", self.ffmpeg.display()))
    }
}

impl VideoDecoder for FfmpegDecoder {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>> {
        if !path.is_file() {
            bail!("video not found: {}", path.display());
        }
        let info = self.probe(path)?;
        let mut child = self.spawn_decoder(path)?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("ffmpeg stdout unavailable"))?;

        let frame_len = info.width as usize * info.height as usize * 3;
        let (tx, rx) = sync_channel::<Vec<u8>>(FRAME_QUEUE);
        let spawned = thread::Builder::new()
            .name("video-decode".to_string())
            .spawn(move || loop {
                let mut buf = vec![0u8; frame_len];
                if stdout.read_exact(&mut buf).is_err() || tx.send(buf).is_err() {
                    break;
                }
            });
        if let Err(err) = spawned {
            let _ = child.kill();
            let _ = child.wait();
            bail!("failed to spawn decode reader: {err}");
        }

        tracing::debug!(
            width = info.width,
            height = info.height,
            fps = info.fps,
            "opened {}",
            path.display()
        );
        Ok(Box::new(FfmpegSource {
            child,
            frames: rx,
            info,
            index: 0,
            stall_timeout: self.stall_timeout,
            exhausted: false,
        }))
    }
}

struct FfmpegSource {
    child: Child,
    frames: Receiver<Vec<u8>>,
    info: StreamInfo,
    index: u64,
    stall_timeout: Duration,
    exhausted: bool,
}

impl VideoSource for FfmpegSource {
    fn fps(&self) -> f64 {
        self.info.fps
    }

    fn next_frame(&mut self) -> Option<Frame> {
        if self.exhausted {
            return None;
        }
        match self.frames.recv_timeout(self.stall_timeout) {
            Ok(data) => {
                let pts = Duration::from_secs_f64(self.index as f64 / effective_fps(self.info.fps));
                self.index += 1;
                Some(Frame {
                    width: self.info.width,
                    height: self.info.height,
                    data,
                    pts,
                })
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!("decoder stalled for {:?}, ending stream", self.stall_timeout);
                self.exhausted = true;
                None
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.exhausted = true;
                None
            }
        }
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
