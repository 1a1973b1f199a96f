//! ffprobe/ffmpeg backed [`VideoSource`].
//!
//! The decoder keeps one `ffmpeg` process per forward run of seeks. Frames are emitted as raw
//! RGBA8 at a constant rate starting at the stream origin, so the presentation time of frame `k`
//! is `origin + k / rate`. Forward seeks read frames until the requested time is reached; a
//! backward seek, or a jump far ahead, restarts the process at the new time.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncReadExt as _;
use tokio::process::{Child, ChildStdout, Command};

use crate::foundation::core::{Fps, OutputDimensions};
use crate::foundation::error::{ExportError, ExportResult};
use crate::media::source::{SeekCompletion, SeekRequest, SourceFrame, SourceMedia, VideoSource};

// Jumps further ahead than this restart the decoder instead of reading through.
const MAX_READ_AHEAD_SECS: f64 = 2.0;
const PTS_EPSILON_SECS: f64 = 1e-6;

/// Probe source video metadata through `ffprobe`.
pub async fn probe_media(source_path: &Path) -> ExportResult<SourceMedia> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .await
        .map_err(|e| ExportError::media(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ExportError::media(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ExportError::media(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ExportError::media("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| ExportError::media("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| ExportError::media("missing video height from ffprobe"))?;

    let duration_secs = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video_stream.duration.as_deref())
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| ExportError::media("missing duration from ffprobe"))?;

    let media = SourceMedia {
        width,
        height,
        duration_secs,
        frame_rate: video_stream
            .r_frame_rate
            .as_deref()
            .and_then(Fps::parse_ratio),
    };
    tracing::debug!(
        path = %source_path.display(),
        width,
        height,
        duration_secs,
        "probed source"
    );
    Ok(media)
}

/// Options for [`FfmpegVideoSource`].
#[derive(Clone, Debug, Default)]
pub struct FfmpegSourceOpts {
    /// Scale frames inside ffmpeg before they reach the compositor.
    pub decode_size: Option<OutputDimensions>,
    /// Decode rate. Defaults to the source's native rate.
    pub decode_fps: Option<Fps>,
}

struct DecodeStream {
    child: Child,
    stdout: ChildStdout,
    origin_secs: f64,
    step_secs: f64,
    width: u32,
    height: u32,
    next_index: u64,
    current: Option<(f64, Vec<u8>)>,
    eof: bool,
}

impl DecodeStream {
    fn next_pts(&self) -> f64 {
        self.origin_secs + (self.next_index as f64) * self.step_secs
    }

    fn current_pts(&self) -> Option<f64> {
        self.current.as_ref().map(|(pts, _)| *pts)
    }

    async fn read_frame(&mut self) -> ExportResult<bool> {
        let len = (self.width as usize) * (self.height as usize) * 4;
        let mut buf = vec![0u8; len];
        match self.stdout.read_exact(&mut buf).await {
            Ok(_) => {
                let pts = self.next_pts();
                self.next_index += 1;
                self.current = Some((pts, buf));
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.eof = true;
                Ok(false)
            }
            Err(e) => Err(ExportError::media(format!(
                "failed to read decoded frame from ffmpeg: {e}"
            ))),
        }
    }

    async fn shutdown(mut self) {
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
    }
}

/// Video source decoding through the system `ffmpeg` binary.
pub struct FfmpegVideoSource {
    path: PathBuf,
    media: SourceMedia,
    opts: FfmpegSourceOpts,
    stream: Option<DecodeStream>,
}

impl FfmpegVideoSource {
    /// Probe `path` and prepare a decoder. No process is started until the first seek.
    pub async fn open(path: impl Into<PathBuf>, opts: FfmpegSourceOpts) -> ExportResult<Self> {
        let path = path.into();
        let media = probe_media(&path).await?;
        media.validate()?;
        Ok(Self::with_media(path, media, opts))
    }

    /// Build a decoder from already known metadata.
    pub fn with_media(path: impl Into<PathBuf>, media: SourceMedia, opts: FfmpegSourceOpts) -> Self {
        Self {
            path: path.into(),
            media,
            opts,
            stream: None,
        }
    }

    fn frame_size(&self) -> (u32, u32) {
        match self.opts.decode_size {
            Some(d) => (d.width, d.height),
            None => (self.media.width, self.media.height),
        }
    }

    fn spawn_stream(&self, origin_secs: f64) -> ExportResult<DecodeStream> {
        let fps = self.opts.decode_fps.unwrap_or_else(|| self.media.native_fps());
        let (width, height) = self.frame_size();

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-v", "error", "-nostdin"])
            .args(["-ss", &format!("{origin_secs:.6}")])
            .arg("-i")
            .arg(&self.path)
            .args(["-an", "-sn"]);
        if self.opts.decode_size.is_some() {
            cmd.args(["-vf", &format!("scale={width}:{height}:flags=bicubic")]);
        }
        cmd.args([
            "-r",
            &fps.to_string(),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            ExportError::media(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExportError::media("failed to open ffmpeg stdout (unexpected)"))?;

        tracing::debug!(origin_secs, %fps, width, height, "started decode stream");
        Ok(DecodeStream {
            child,
            stdout,
            origin_secs,
            step_secs: fps.frame_duration_secs(),
            width,
            height,
            next_index: 0,
            current: None,
            eof: false,
        })
    }

    fn needs_restart(&self, t: f64) -> bool {
        let Some(stream) = self.stream.as_ref() else {
            return true;
        };
        if t + PTS_EPSILON_SECS < stream.origin_secs {
            return true;
        }
        if let Some(pts) = stream.current_pts()
            && t + PTS_EPSILON_SECS < pts
        {
            return true;
        }
        !stream.eof && t - stream.next_pts() > MAX_READ_AHEAD_SECS
    }
}

#[async_trait::async_trait]
impl VideoSource for FfmpegVideoSource {
    fn media(&self) -> SourceMedia {
        self.media
    }

    async fn seek(&mut self, req: SeekRequest) -> ExportResult<SeekCompletion> {
        let t = req.timestamp_secs.max(0.0);
        if self.needs_restart(t) {
            if let Some(old) = self.stream.take() {
                old.shutdown().await;
            }
            self.stream = Some(self.spawn_stream(t)?);
        }
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| ExportError::media("decode stream missing (unexpected)"))?;

        while !stream.eof && stream.next_pts() <= t + PTS_EPSILON_SECS {
            stream.read_frame().await?;
        }
        if stream.current.is_none() && !stream.eof {
            stream.read_frame().await?;
        }

        let (presented_secs, data) = stream.current.as_ref().ok_or_else(|| {
            ExportError::media(format!(
                "ffmpeg produced no frame at {t:.3}s for '{}'",
                self.path.display()
            ))
        })?;
        let frame = SourceFrame::new(stream.width, stream.height, data.clone())?;
        Ok(SeekCompletion {
            generation: req.generation,
            presented_secs: *presented_secs,
            frame,
        })
    }

    async fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.shutdown().await;
        }
    }
}

/// Return `true` when `tool -version` runs successfully.
pub async fn is_tool_on_path(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub async fn is_ffmpeg_on_path() -> bool {
    is_tool_on_path("ffmpeg").await
}

#[cfg(test)]
#[path = "../../tests/unit/media/ffmpeg.rs"]
mod tests;
