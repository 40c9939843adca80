// src/ocr.rs
//! OCR engine seam. The production engine shells out to the `tesseract`
//! binary with the image on stdin and the recognized text on stdout.

use std::process::Stdio;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize text in `image` using the given language hint (e.g. "ukr").
    async fn recognize(&self, image: &[u8], language: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: String,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TesseractCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    async fn recognize(&self, image: &[u8], language: &str) -> Result<String> {
        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawn {}", self.binary))?;

        let mut stdin = child.stdin.take().context("tesseract stdin")?;
        stdin.write_all(image).await.context("write image to tesseract")?;
        drop(stdin);

        let out = child
            .wait_with_output()
            .await
            .context("wait for tesseract")?;
        if !out.status.success() {
            bail!(
                "tesseract exited with {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}
