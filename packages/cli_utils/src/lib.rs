#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the blackout map tools.
//!
//! Provides [`init_logger`], which sets up `indicatif-log-bridge` so that
//! `log::info!` and friends are suspended while spinners redraw, and
//! [`Spinner`] for the "waiting on the backend" indicator.

use std::future::Future;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// An `indicatif` spinner shown while a request is in flight.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    /// Adds a ticking spinner with `message` to `multi`.
    #[must_use]
    pub fn start(multi: &MultiProgress, message: &str) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// Stops the spinner, leaving `message` on screen.
    pub fn finish(self, message: String) {
        self.bar.finish_with_message(message);
    }

    /// Stops the spinner and removes it.
    pub fn finish_and_clear(self) {
        self.bar.finish_and_clear();
    }
}

/// Runs `task` with a spinner showing `message`, clearing it afterwards.
pub async fn with_spinner<F: Future>(multi: &MultiProgress, message: &str, task: F) -> F::Output {
    let spinner = Spinner::start(multi, message);
    let output = task.await;
    spinner.finish_and_clear();
    output
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while progress bars redraw.
///
/// Returns the [`MultiProgress`] that all spinners must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Already set (e.g. in tests)

    log::set_max_level(level);

    multi
}
