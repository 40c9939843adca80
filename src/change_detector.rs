// src/change_detector.rs
//! Picks the schedule announcement out of a fetched batch and decides
//! whether it still needs processing.

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use crate::config::WatchConfig;
use crate::feed::SourcePost;

/// Why a cycle stops early without doing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoCandidatePost,
    AlreadyProcessed,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::NoCandidatePost => "no_candidate",
            SkipReason::AlreadyProcessed => "already_processed",
        }
    }
}

/// The post selected for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub post: SourcePost,
    /// Dedup key: album id if the post belongs to one, else the post id.
    pub identity: String,
    pub is_revision: bool,
    /// Photo posts of the album (or the post alone), ascending id.
    pub album: Vec<SourcePost>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Skip {
        reason: SkipReason,
        identity: Option<String>,
    },
    Process(Candidate),
}

impl Detection {
    pub fn is_skip(&self) -> bool {
        matches!(self, Detection::Skip { .. })
    }

    pub fn identity(&self) -> Option<&str> {
        match self {
            Detection::Skip { identity, .. } => identity.as_deref(),
            Detection::Process(c) => Some(&c.identity),
        }
    }
}

/// Caption rules compiled once from [`WatchConfig`].
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    announcement: Regex,
    revision: Regex,
}

impl ChangeDetector {
    pub fn new(region: &str, keyword: &str, revision_marker: &str) -> Result<Self> {
        let build = |pattern: String| {
            RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .dot_matches_new_line(true)
                .build()
                .with_context(|| format!("compile caption pattern {pattern}"))
        };
        let region = regex::escape(region.trim());
        let keyword = regex::escape(keyword.trim());
        let marker = regex::escape(revision_marker.trim());

        Ok(Self {
            announcement: build(format!("{region}:.*{keyword}"))?,
            revision: build(format!("{region}:.*{marker}.*{keyword}"))?,
        })
    }

    pub fn from_config(cfg: &WatchConfig) -> Result<Self> {
        Self::new(&cfg.region, &cfg.keyword, &cfg.revision_marker)
    }

    pub fn is_revision(&self, caption: &str) -> bool {
        self.revision.is_match(caption)
    }

    fn is_plain(&self, caption: &str) -> bool {
        self.announcement.is_match(caption) && !self.is_revision(caption)
    }

    /// `recent` is expected newest first; the first match of each kind wins
    /// and a revision beats a plain announcement.
    pub fn detect(&self, recent: &[SourcePost], last_identity: Option<&str>) -> Detection {
        let revision = recent.iter().find(|p| self.is_revision(&p.text));
        let target = revision.or_else(|| recent.iter().find(|p| self.is_plain(&p.text)));

        let Some(post) = target else {
            return Detection::Skip {
                reason: SkipReason::NoCandidatePost,
                identity: None,
            };
        };

        let identity = identity_of(post);
        if last_identity == Some(identity.as_str()) {
            return Detection::Skip {
                reason: SkipReason::AlreadyProcessed,
                identity: Some(identity),
            };
        }

        Detection::Process(Candidate {
            album: album_of(post, recent),
            post: post.clone(),
            identity,
            is_revision: revision.is_some(),
        })
    }
}

pub fn identity_of(post: &SourcePost) -> String {
    match &post.group_id {
        Some(g) => g.clone(),
        None => post.id.to_string(),
    }
}

fn album_of(post: &SourcePost, recent: &[SourcePost]) -> Vec<SourcePost> {
    let mut album: Vec<SourcePost> = match &post.group_id {
        Some(g) => recent
            .iter()
            .filter(|p| p.group_id.as_ref() == Some(g) && p.has_photo())
            .cloned()
            .collect(),
        None if post.has_photo() => vec![post.clone()],
        None => Vec::new(),
    };
    album.sort_by_key(|p| p.id);
    album
}
