use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use scanrename_ocr::{ProgressSink, StatusSink};

const SCALE: u64 = 1000;

/// Terminal rendering of the two batch callbacks, sharing one bar.
pub struct TerminalSinks {
    bar: ProgressBar,
    quiet: bool,
}

impl TerminalSinks {
    pub fn new(quiet: bool) -> Self {
        let bar = ProgressBar::new(SCALE);
        if quiet {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Self { bar, quiet }
    }

    pub fn progress(&self) -> BarProgress {
        BarProgress(self.bar.clone())
    }

    pub fn status(&self) -> BarStatus {
        BarStatus { bar: self.bar.clone(), quiet: self.quiet }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

pub struct BarProgress(ProgressBar);

impl ProgressSink for BarProgress {
    fn progress(&mut self, fraction: f64) {
        let pos = (fraction.clamp(0.0, 1.0) * SCALE as f64).round() as u64;
        self.0.set_position(pos);
    }
}

pub struct BarStatus {
    bar: ProgressBar,
    quiet: bool,
}

impl StatusSink for BarStatus {
    fn status(&mut self, message: &str) {
        tracing::debug!("{message}");
        self.bar.set_message(message.to_string());
        if !self.quiet {
            self.bar.println(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_maps_fraction_onto_bar() {
        let sinks = TerminalSinks::new(true);
        let mut p = sinks.progress();
        p.progress(0.5);
        assert_eq!(sinks.bar.position(), 500);
        p.progress(1.0);
        assert_eq!(sinks.bar.position(), SCALE);
    }

    #[test]
    fn status_becomes_bar_message() {
        let sinks = TerminalSinks::new(true);
        sinks.status().status("Processing SCN_0001.jpg...");
        assert_eq!(sinks.bar.message(), "Processing SCN_0001.jpg...");
    }
}
