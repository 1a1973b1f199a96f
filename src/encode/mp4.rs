//! H.264/MP4 encoding through the system `ffmpeg` binary.
//!
//! Raw RGBA frames are piped into ffmpeg's stdin. The container is written into a private
//! temporary directory (MP4 needs a seekable output for `+faststart`) and read back into memory
//! on `finish`. The directory is removed when the encoder finishes, aborts, or is dropped.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::Context as _;
use tokio::io::AsyncWriteExt as _;
use tokio::process::{Child, ChildStdin, Command};

use crate::encode::encoder::{
    EncoderConfig, ExportArtifact, FrameEncoder, check_frame, check_order,
};
use crate::export::config::{ExportFormat, Mp4Quality};
use crate::foundation::error::{ExportError, ExportResult};
use crate::foundation::math::flatten_premul_over_bg;
use crate::media::ffmpeg::is_ffmpeg_on_path;
use crate::render::frame::FrameRGBA;

const OUTPUT_FILE: &str = "export.mp4";
const LOG_FILE: &str = "ffmpeg.log";

/// Rate control arguments for a quality tier: average bitrate, 1.5x peak, 2x buffer.
pub fn bitrate_args(quality: Mp4Quality) -> Vec<String> {
    let kbps = quality.bitrate_kbps();
    vec![
        "-b:v".to_string(),
        format!("{kbps}k"),
        "-maxrate".to_string(),
        format!("{}k", kbps + kbps / 2),
        "-bufsize".to_string(),
        format!("{}k", kbps * 2),
    ]
}

/// Full ffmpeg argument list for one encode, output path last.
pub fn ffmpeg_args(cfg: &EncoderConfig, quality: Mp4Quality, out_path: &str) -> Vec<String> {
    let dims = cfg.dimensions;
    let mut args: Vec<String> = [
        "-y",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(format!("{}x{}", dims.width, dims.height));
    args.push("-r".to_string());
    args.push(cfg.fps.to_string());
    args.extend(["-i", "pipe:0", "-an"].map(String::from));

    // yuv420p needs even sides; source-resolution exports may be odd.
    if !dims.is_even() {
        args.extend(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"].map(String::from));
    }

    args.extend(["-c:v", "libx264", "-preset", "medium", "-profile:v", "high"].map(String::from));
    args.extend(bitrate_args(quality));
    args.extend(["-pix_fmt", "yuv420p", "-movflags", "+faststart"].map(String::from));
    args.push(out_path.to_string());
    args
}

async fn read_log(path: PathBuf) -> String {
    tokio::fs::read_to_string(path)
        .await
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

struct Running {
    dir: tempfile::TempDir,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl Running {
    fn out_path(&self) -> PathBuf {
        self.dir.path().join(OUTPUT_FILE)
    }

    fn log_path(&self) -> PathBuf {
        self.dir.path().join(LOG_FILE)
    }

    async fn kill(mut self) {
        drop(self.stdin.take());
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
    }
}

/// MP4 encoder for one quality tier.
pub struct Mp4FrameEncoder {
    quality: Mp4Quality,
    bg_rgba: [u8; 4],
    cfg: Option<EncoderConfig>,
    running: Option<Running>,
    scratch: Vec<u8>,
    last_idx: Option<u64>,
    frames_written: u64,
}

impl Mp4FrameEncoder {
    /// Encoder for `quality`, flattening over opaque black.
    pub fn new(quality: Mp4Quality) -> Self {
        Self {
            quality,
            bg_rgba: [0, 0, 0, 255],
            cfg: None,
            running: None,
            scratch: Vec::new(),
            last_idx: None,
            frames_written: 0,
        }
    }

    /// Background used to flatten translucent pixels.
    pub fn with_background(mut self, bg_rgba: [u8; 4]) -> Self {
        self.bg_rgba = bg_rgba;
        self
    }

    /// Quality tier this encoder was built for.
    pub fn quality(&self) -> Mp4Quality {
        self.quality
    }

    fn spawn(&self, cfg: &EncoderConfig) -> anyhow::Result<Running> {
        let dir = tempfile::Builder::new()
            .prefix("reelcut-mp4-")
            .tempdir()
            .context("failed to create temporary directory for mp4 output")?;
        let out_path = dir.path().join(OUTPUT_FILE);
        let log = std::fs::File::create(dir.path().join(LOG_FILE))
            .context("failed to create ffmpeg log file")?;

        let args = ffmpeg_args(cfg, self.quality, &out_path.to_string_lossy());
        tracing::debug!(?args, "spawning ffmpeg");

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log))
            .kill_on_drop(true)
            .spawn()
            .context("failed to spawn ffmpeg (is it installed and on PATH?)")?;
        let stdin = child
            .stdin
            .take()
            .context("failed to open ffmpeg stdin (unexpected)")?;

        Ok(Running {
            dir,
            child,
            stdin: Some(stdin),
        })
    }
}

#[async_trait::async_trait]
impl FrameEncoder for Mp4FrameEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Mp4
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn begin(&mut self, cfg: EncoderConfig) -> ExportResult<()> {
        let dims = cfg.dimensions;
        if dims.width == 0 || dims.height == 0 {
            return Err(ExportError::encoder_init(format!(
                "mp4 dimensions must be non-zero, got {dims}"
            )));
        }
        if !is_ffmpeg_on_path().await {
            return Err(ExportError::encoder_init(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }
        if let Some(prev) = self.running.take() {
            prev.kill().await;
        }

        let running = self
            .spawn(&cfg)
            .map_err(|e| ExportError::encoder_init(format!("{e:#}")))?;

        tracing::debug!(quality = ?self.quality, "ffmpeg started");
        self.scratch = vec![0u8; dims.rgba8_len()];
        self.running = Some(running);
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.frames_written = 0;
        Ok(())
    }

    async fn push_frame(&mut self, idx: u64, frame: &FrameRGBA) -> ExportResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ExportError::encoder_write("mp4 encoder not started"))?;
        check_frame(cfg, frame)?;
        check_order(self.last_idx, idx)?;

        if frame.premultiplied {
            flatten_premul_over_bg(&mut self.scratch, &frame.data, self.bg_rgba)?;
        } else {
            self.scratch.copy_from_slice(&frame.data);
            for px in self.scratch.chunks_exact_mut(4) {
                px[3] = 255;
            }
        }

        let Some(stdin) = self.running.as_mut().and_then(|r| r.stdin.as_mut()) else {
            return Err(ExportError::encoder_write("mp4 encoder is already finalized"));
        };
        let written = stdin.write_all(&self.scratch).await;
        if let Err(e) = written {
            let log = match self.running.as_ref().map(Running::log_path) {
                Some(path) => read_log(path).await,
                None => String::new(),
            };
            return Err(ExportError::encoder_write(format!(
                "failed to write frame {idx} to ffmpeg stdin: {e} {log}"
            )));
        }

        self.last_idx = Some(idx);
        self.frames_written += 1;
        Ok(())
    }

    async fn finish(&mut self) -> ExportResult<ExportArtifact> {
        let mut running = self
            .running
            .take()
            .ok_or_else(|| ExportError::encoder_write("mp4 encoder not started"))?;
        self.cfg = None;
        if self.frames_written == 0 {
            running.kill().await;
            return Err(ExportError::encoder_write("no frames were written"));
        }

        if let Some(mut stdin) = running.stdin.take() {
            let _ = stdin.shutdown().await;
        }
        let status = running
            .child
            .wait()
            .await
            .map_err(|e| ExportError::encoder_write(format!("failed to wait for ffmpeg: {e}")))?;
        if !status.success() {
            let log = read_log(running.log_path()).await;
            return Err(ExportError::encoder_write(format!(
                "ffmpeg exited with status {status}: {log}"
            )));
        }

        let data = tokio::fs::read(running.out_path())
            .await
            .map_err(|e| ExportError::encoder_write(format!("failed to read mp4 output: {e}")))?;
        if data.is_empty() {
            return Err(ExportError::encoder_write("ffmpeg produced an empty file"));
        }
        tracing::debug!(bytes = data.len(), frames = self.frames_written, "mp4 finalized");
        Ok(ExportArtifact {
            format: ExportFormat::Mp4,
            data,
        })
    }

    async fn abort(&mut self) {
        self.cfg = None;
        if let Some(running) = self.running.take() {
            running.kill().await;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/mp4.rs"]
mod tests;
