// src/metrics.rs
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and describe the watch series.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("watch_cycles_total", "Watch cycles started.");
        describe_counter!("watch_skips_total", "Cycles ended early, by reason.");
        describe_counter!("watch_published_total", "New announcements sent.");
        describe_counter!("watch_edited_total", "Announcements edited in place.");
        describe_counter!(
            "watch_extraction_empty_total",
            "New posts where no queue could be extracted."
        );
        describe_counter!("watch_errors_total", "Cycles aborted by a collaborator failure.");
        describe_histogram!("watch_ocr_ms", "OCR time per image in milliseconds.");
        describe_gauge!("watch_last_run_ts", "Unix ts of the last watch tick.");

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
