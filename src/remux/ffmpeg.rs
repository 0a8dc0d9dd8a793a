//! Remuxing through the ffmpeg binary.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::remux::{Container, Remuxer, TrackTags};

/// [`Remuxer`] running `ffmpeg` with stream copy.
pub struct FfmpegRemuxer {
    binary: PathBuf,
    container: Container,
}

impl FfmpegRemuxer {
    pub fn new(binary: impl Into<PathBuf>, container: Container) -> Self {
        Self {
            binary: binary.into(),
            container,
        }
    }

    /// Arguments for one invocation.
    pub fn build_args(
        &self,
        input: &Path,
        output: &Path,
        tags: &TrackTags,
        cover: Option<&Path>,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(input.as_os_str().to_owned());

        if let Some(cover) = cover {
            args.push("-i".into());
            args.push(cover.as_os_str().to_owned());
            for arg in ["-map", "0:a", "-map", "1:v", "-c", "copy"] {
                args.push(arg.into());
            }
            for arg in [
                "-disposition:v",
                "attached_pic",
                "-metadata:s:v",
                "title=Album cover",
                "-metadata:s:v",
                "comment=Cover (front)",
            ] {
                args.push(arg.into());
            }
        } else {
            for arg in ["-map", "0:a", "-c:a", "copy"] {
                args.push(arg.into());
            }
        }

        if self.container == Container::Mp3 {
            args.push("-id3v2_version".into());
            args.push("3".into());
        }

        for (name, value) in [
            ("artist", &tags.artist),
            ("title", &tags.title),
            ("comment", &tags.comment),
        ] {
            args.push("-metadata".into());
            args.push(format!("{}={}", name, value).into());
        }

        args.push("-f".into());
        args.push(self.container.muxer().into());
        args.push(output.as_os_str().to_owned());
        args
    }

    /// Check that the binary can be started at all.
    pub async fn check_available(&self) -> Result<()> {
        let status = Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|_| Error::FFmpegNotFound)?;

        if !status.success() {
            return Err(Error::FFmpegNotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    fn container(&self) -> Container {
        self.container
    }

    async fn remux(
        &self,
        input: &Path,
        output: &Path,
        tags: &TrackTags,
        cover: Option<&Path>,
    ) -> Result<()> {
        let args = self.build_args(input, output, tags, cover);
        tracing::debug!("Running {} {:?}", self.binary.display(), args);

        let result = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::FFmpegNotFound
                } else {
                    Error::Remux(format!("Failed to run ffmpeg: {}", e))
                }
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let detail = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("no output");
            return Err(Error::Remux(format!(
                "ffmpeg exited with status {}: {}",
                result.status, detail
            )));
        }

        Ok(())
    }
}
