//! Live progress line for `watch-build`, drawn on stderr.

use std::sync::Once;
use std::time::Duration;

use console::Style;
use dhstatus_core::WatchObserver;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::icons::{self, Icons};
use super::Palette;

const TICK: Duration = Duration::from_millis(100);

/// Spinner with elapsed time. The bar's internal lock serialises redraws
/// against message updates; once finished, further progress is ignored.
pub struct WatchSpinner {
    bar: ProgressBar,
    ticking: Once,
    icons: Icons,
    palette: Palette,
}

impl WatchSpinner {
    pub fn new(icons: Icons, color: bool) -> Self {
        Self::with_target(icons, color, ProgressDrawTarget::stderr())
    }

    pub fn with_target(icons: Icons, color: bool, target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(None, target);
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(icons.spinner_frames());
        bar.set_style(style);
        Self {
            bar,
            ticking: Once::new(),
            icons,
            palette: Palette::new(color),
        }
    }

    fn finish(&self, icon: &console::Emoji<'static, 'static>, style: &Style, message: &str) {
        let elapsed = Duration::from_secs(self.bar.elapsed().as_secs());
        self.bar.finish_and_clear();
        eprintln!(
            "{} {}\x07",
            style.apply_to(format!("{} {message}", self.icons.get(icon))),
            self.palette
                .dim
                .apply_to(format!("[{}]", humantime::format_duration(elapsed)))
        );
    }
}

impl WatchObserver for WatchSpinner {
    fn progress(&self, message: &str) {
        if self.bar.is_finished() {
            return;
        }
        self.bar.set_message(message.to_string());
        self.ticking.call_once(|| self.bar.enable_steady_tick(TICK));
    }

    fn notice(&self, message: &str) {
        self.bar.suspend(|| eprintln!("{message}"));
    }

    fn success(&self, message: &str) {
        self.finish(&icons::UP_TO_DATE, &self.palette.green, message);
    }

    fn failure(&self, message: &str) {
        self.finish(&icons::FAILED, &self.palette.red, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hidden() -> WatchSpinner {
        WatchSpinner::with_target(Icons::new(false), false, ProgressDrawTarget::hidden())
    }

    #[test]
    fn test_progress_updates_message() {
        let spinner = hidden();
        spinner.progress("Build FE: queued");
        spinner.progress("Build FE: in progress");
        assert_eq!(spinner.bar.message(), "Build FE: in progress");
        assert!(!spinner.bar.is_finished());
    }

    #[test]
    fn test_progress_after_finish_is_ignored() {
        let spinner = hidden();
        spinner.progress("Build FE: in progress");
        spinner.success("Build FE completed successfully");
        spinner.progress("Build FE: late tick");
        assert!(spinner.bar.is_finished());
        assert_eq!(spinner.bar.message(), "Build FE: in progress");

        spinner.notice("Restarting deployment...");
        spinner.failure("Restart failed: boom");
        assert!(spinner.bar.is_finished());
    }
}
