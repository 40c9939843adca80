// src/extract.rs
//! Turning a detected post into a [`Schedule`].
//!
//! Strategies are tried in configured order; the first one producing at
//! least one queue wins.

use std::time::Instant;

use anyhow::{Context, Result};
use metrics::histogram;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::feed::{FeedSource, SourcePost};
use crate::ocr::OcrEngine;
use crate::schedule::{self, Schedule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStrategy {
    /// OCR every image of the album and parse the merged text.
    Ocr,
    /// Parse the caption itself.
    Caption,
}

/// Run OCR over `images` in the given order and concatenate the results.
///
/// Any OCR failure aborts the merge.
pub async fn merge<I, B>(images: I, ocr: &dyn OcrEngine, language: &str) -> Result<String>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut merged = String::new();
    for (i, img) in images.into_iter().enumerate() {
        let t0 = Instant::now();
        let text = ocr
            .recognize(img.as_ref(), language)
            .await
            .with_context(|| format!("ocr of image #{i}"))?;
        histogram!("watch_ocr_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        if !merged.is_empty() && !merged.ends_with('\n') {
            merged.push('\n');
        }
        merged.push_str(&text);
    }
    Ok(merged)
}

/// Collaborators needed by the strategies.
pub struct Extractor<'a> {
    pub feed: &'a dyn FeedSource,
    pub ocr: &'a dyn OcrEngine,
    pub language: &'a str,
    pub strategies: &'a [ExtractionStrategy],
}

impl Extractor<'_> {
    /// `post` carries the caption; `album` the photo posts in album order.
    /// Returns an empty schedule when no strategy finds a queue.
    pub async fn extract(&self, post: &SourcePost, album: &[SourcePost]) -> Result<Schedule> {
        for strategy in self.strategies {
            let parsed = match strategy {
                ExtractionStrategy::Ocr => {
                    if album.is_empty() {
                        debug!(post = post.id, "ocr strategy: no photos");
                        continue;
                    }
                    let mut images = Vec::with_capacity(album.len());
                    for p in album {
                        images.push(self.feed.download_image(p).await?);
                    }
                    schedule::parse(&merge(&images, self.ocr, self.language).await?)
                }
                ExtractionStrategy::Caption => schedule::parse(&post.text),
            };

            debug!(
                post = post.id,
                ?strategy,
                queues = parsed.queues.len(),
                "extraction attempt"
            );
            if !parsed.is_empty() {
                return Ok(parsed);
            }
        }
        Ok(Schedule::default())
    }
}
