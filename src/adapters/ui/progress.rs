//! Spinner shown while a stage waits on the models.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::{Duration, Instant};

pub struct StageSpinner {
    bar: ProgressBar,
    label: String,
    start: Instant,
}

impl StageSpinner {
    pub fn start(label: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg} {elapsed}") {
            bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        bar.enable_steady_tick(Duration::from_millis(80));
        bar.set_message(format!("{}...", label));
        Self {
            bar,
            label: label.to_string(),
            start: Instant::now(),
        }
    }

    /// Clear the spinner and print a one-line outcome with the elapsed time.
    pub fn finish(self, ok: bool) {
        self.bar.finish_and_clear();
        let mark = if ok { "\x1b[32m✓\x1b[0m" } else { "\x1b[31m✗\x1b[0m" };
        let mut stderr = io::stderr().lock();
        let _ = writeln!(
            stderr,
            "  {} {:<44} {:>6.1}s",
            mark,
            self.label,
            self.start.elapsed().as_secs_f64()
        );
    }
}
