#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the `job_market` binary.
//!
//! Provides a fixed-length `indicatif` stage bar behind the pipeline's
//! [`ProgressCallback`] trait, plus [`init_logger`] which sets up
//! `indicatif-log-bridge` so that `log::info!` and friends are suspended
//! while the bar redraws.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use job_market_pipeline::progress::ProgressCallback;

pub use indicatif::MultiProgress;

/// An `indicatif` [`ProgressBar`] that implements [`ProgressCallback`].
pub struct IndicatifProgress {
    bar: ProgressBar,
}

impl IndicatifProgress {
    fn stages(multi: &MultiProgress, message: &str, total: u64) -> Self {
        let bar = multi.add(ProgressBar::new(total));
        bar.enable_steady_tick(Duration::from_millis(250));
        bar.set_style(
            ProgressStyle::with_template(
                "{msg:<26} {wide_bar:.green/dim} {pos}/{len} [{elapsed_precise}]",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
        );
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// Creates a bar over the `total` stages of a pipeline run.
    #[must_use]
    pub fn stages_bar(
        multi: &MultiProgress,
        message: &str,
        total: u64,
    ) -> Arc<dyn ProgressCallback> {
        Arc::new(Self::stages(multi, message, total))
    }
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// log lines and progress bars never fight for the terminal.
///
/// `RUST_LOG` controls the level. Returns the [`MultiProgress`] that all
/// progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Already set, e.g. in tests

    log::set_max_level(level);

    multi
}

#[cfg(test)]
mod tests {
    use indicatif::ProgressDrawTarget;

    use super::*;

    #[test]
    fn stage_bar_has_its_length_from_the_start() {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let progress = IndicatifProgress::stages(&multi, "Starting", 5);
        assert_eq!(progress.bar.length(), Some(5));
        assert_eq!(progress.bar.position(), 0);

        progress.inc(2);
        progress.set_message("Computing statistics".to_string());
        assert_eq!(progress.bar.position(), 2);
        assert_eq!(progress.bar.message(), "Computing statistics");

        progress.set_total(5);
        assert_eq!(progress.bar.position(), 2);

        progress.finish("Done".to_string());
        assert!(progress.bar.is_finished());
    }
}
