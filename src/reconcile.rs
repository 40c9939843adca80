// src/reconcile.rs
//! Publish-or-edit decision and the bookkeeping that follows it.

use anyhow::{Context, Result};
use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::notify::Publisher;
use crate::schedule::{format_announcement, Schedule};
use crate::state::{ProcessingState, StateRepo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Nothing was extracted; nothing sent, state untouched.
    Empty,
    /// A new announcement was sent.
    Published { message_id: i64, state: ProcessingState },
    /// The previous announcement was edited in place.
    Edited { message_id: i64, state: ProcessingState },
    /// Revision with the same text as the last announcement; no edit sent,
    /// only the identity advanced.
    Unchanged { state: ProcessingState },
}

impl Reconciliation {
    pub fn state(&self) -> Option<&ProcessingState> {
        match self {
            Reconciliation::Empty => None,
            Reconciliation::Published { state, .. }
            | Reconciliation::Edited { state, .. }
            | Reconciliation::Unchanged { state } => Some(state),
        }
    }
}

pub(crate) fn text_digest(text: &str) -> String {
    use std::fmt::Write as _;
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub struct Reconciler<'a> {
    pub publisher: &'a dyn Publisher,
    pub repo: &'a StateRepo,
}

impl Reconciler<'_> {
    /// Edit only when the post is a revision AND a previous announcement id
    /// is known; otherwise publish a new announcement. A revision whose text
    /// matches the last announcement skips the edit. The new state is
    /// persisted with one write, only after the send succeeded.
    pub async fn reconcile(
        &self,
        identity: &str,
        reference_date: Option<&str>,
        schedule: &Schedule,
        is_revision: bool,
        prev: &ProcessingState,
    ) -> Result<Reconciliation> {
        if schedule.is_empty() {
            return Ok(Reconciliation::Empty);
        }

        let text = format_announcement(reference_date, schedule, is_revision);
        let digest = text_digest(&text);
        let mut next = ProcessingState {
            last_source_identity: Some(identity.to_string()),
            last_output_message_id: prev.last_output_message_id,
            last_text_digest: Some(digest.clone()),
            updated_at: Some(Utc::now()),
        };

        let outcome = if let (true, Some(message_id)) =
            (is_revision, prev.last_output_message_id)
        {
            if prev.last_text_digest.as_deref() == Some(digest.as_str()) {
                info!(identity, message_id, "revised text unchanged, edit skipped");
                return self.finish(Reconciliation::Unchanged { state: next }).await;
            }
            self.publisher
                .edit(message_id, &text)
                .await
                .context("edit announcement")?;
            info!(identity, message_id, "announcement edited");
            Reconciliation::Edited {
                message_id,
                state: next,
            }
        } else {
            let message_id = self
                .publisher
                .publish(&text)
                .await
                .context("publish announcement")?;
            next.last_output_message_id = Some(message_id);
            info!(identity, message_id, "announcement published");
            Reconciliation::Published {
                message_id,
                state: next,
            }
        };

        self.finish(outcome).await
    }

    async fn finish(&self, outcome: Reconciliation) -> Result<Reconciliation> {
        if let Some(state) = outcome.state() {
            self.repo.save(state).await.context("persist processing state")?;
        }
        Ok(outcome)
    }
}
