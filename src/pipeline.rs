// src/pipeline.rs
//! One watch cycle: fetch → detect → extract → format → reconcile.

use anyhow::{Context, Result};
use metrics::counter;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::change_detector::{ChangeDetector, Detection, SkipReason};
use crate::config::WatchConfig;
use crate::extract::Extractor;
use crate::feed::FeedSource;
use crate::notify::Publisher;
use crate::ocr::OcrEngine;
use crate::reconcile::{Reconciler, Reconciliation};
use crate::schedule::extract_date;
use crate::state::StateRepo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    NoCandidatePost,
    AlreadyProcessed { identity: String },
    /// Post is new but nothing parseable was found; state not advanced.
    ExtractionEmpty { identity: String },
    Published { identity: String, message_id: i64 },
    Edited { identity: String, message_id: i64 },
    Unchanged { identity: String },
    /// A previous cycle was still running.
    Busy,
}

impl CycleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::NoCandidatePost => SkipReason::NoCandidatePost.as_str(),
            CycleOutcome::AlreadyProcessed { .. } => SkipReason::AlreadyProcessed.as_str(),
            CycleOutcome::ExtractionEmpty { .. } => "extraction_empty",
            CycleOutcome::Published { .. } => "published",
            CycleOutcome::Edited { .. } => "edited",
            CycleOutcome::Unchanged { .. } => "unchanged",
            CycleOutcome::Busy => "busy",
        }
    }
}

/// Owns the collaborators and runs cycles one at a time.
pub struct Watcher {
    pub cfg: WatchConfig,
    detector: ChangeDetector,
    feed: Box<dyn FeedSource>,
    ocr: Box<dyn OcrEngine>,
    publisher: Box<dyn Publisher>,
    repo: StateRepo,
    running: Mutex<()>,
}

impl Watcher {
    pub fn new(
        cfg: WatchConfig,
        feed: Box<dyn FeedSource>,
        ocr: Box<dyn OcrEngine>,
        publisher: Box<dyn Publisher>,
        repo: StateRepo,
    ) -> Result<Self> {
        Ok(Self {
            detector: ChangeDetector::from_config(&cfg)?,
            cfg,
            feed,
            ocr,
            publisher,
            repo,
            running: Mutex::new(()),
        })
    }

    /// Run one cycle unless another one is still in flight.
    pub async fn tick(&self) -> Result<CycleOutcome> {
        let Ok(_guard) = self.running.try_lock() else {
            debug!(target: "watch", "previous cycle still running, tick skipped");
            return Ok(CycleOutcome::Busy);
        };
        self.run_cycle().await
    }

    async fn run_cycle(&self) -> Result<CycleOutcome> {
        counter!("watch_cycles_total").increment(1);

        let recent = self
            .feed
            .fetch_recent(self.cfg.fetch_limit)
            .await
            .with_context(|| format!("fetch recent posts from {}", self.feed.name()))?;
        debug!(target: "watch", fetched = recent.len(), "feed fetched");
        for p in &recent {
            debug!(
                target: "watch",
                id = p.id,
                group = ?p.group_id,
                photo = p.has_photo(),
                text = %p.text.chars().take(45).collect::<String>(),
                "post"
            );
        }

        let prev = self.repo.load().await?;
        let candidate = match self
            .detector
            .detect(&recent, prev.last_source_identity.as_deref())
        {
            Detection::Skip { reason, identity } => {
                counter!("watch_skips_total", "reason" => reason.as_str()).increment(1);
                debug!(target: "watch", reason = reason.as_str(), ?identity, "skip");
                return Ok(match identity {
                    Some(identity) if reason == SkipReason::AlreadyProcessed => {
                        CycleOutcome::AlreadyProcessed { identity }
                    }
                    _ => CycleOutcome::NoCandidatePost,
                });
            }
            Detection::Process(c) => c,
        };

        info!(
            target: "watch",
            identity = %candidate.identity,
            post = candidate.post.id,
            revision = candidate.is_revision,
            images = candidate.album.len(),
            "new schedule post"
        );

        let extractor = Extractor {
            feed: self.feed.as_ref(),
            ocr: self.ocr.as_ref(),
            language: &self.cfg.ocr_language,
            strategies: &self.cfg.strategies,
        };
        let schedule = extractor.extract(&candidate.post, &candidate.album).await?;

        let reference_date =
            extract_date(&candidate.post.text).or_else(|| schedule.reference_date.clone());

        let reconciler = Reconciler {
            publisher: self.publisher.as_ref(),
            repo: &self.repo,
        };
        let identity = candidate.identity;
        let outcome = match reconciler
            .reconcile(
                &identity,
                reference_date.as_deref(),
                &schedule,
                candidate.is_revision,
                &prev,
            )
            .await?
        {
            Reconciliation::Empty => {
                counter!("watch_extraction_empty_total").increment(1);
                info!(target: "watch", %identity, "no queues detected, will retry next cycle");
                CycleOutcome::ExtractionEmpty { identity }
            }
            Reconciliation::Published { message_id, .. } => {
                counter!("watch_published_total").increment(1);
                CycleOutcome::Published {
                    identity,
                    message_id,
                }
            }
            Reconciliation::Edited { message_id, .. } => {
                counter!("watch_edited_total").increment(1);
                CycleOutcome::Edited {
                    identity,
                    message_id,
                }
            }
            Reconciliation::Unchanged { .. } => CycleOutcome::Unchanged { identity },
        };
        Ok(outcome)
    }
}
