//! Fetch feedback for the terminal front-end.
//!
//! A spinner runs while a fetch is in flight. With `--log-only` the spinner is
//! hidden and each fetch reports `[fetch]` lines on stderr instead.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::models::MusicType;

static LOG_ONLY: AtomicBool = AtomicBool::new(false);

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// 250ms, 2.5s, 1.5m
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", d.as_millis())
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

fn fetch_line(artist: &str, music_type: MusicType, outcome: Option<Duration>) -> String {
    match outcome {
        None => format!("[fetch] {} {} ...", artist, music_type),
        Some(elapsed) => format!("[fetch] {} {} landed in {}", artist, music_type, format_duration(elapsed)),
    }
}

/// Spinner shown while `artist` is loading. Hidden in log-only mode, where
/// the start is reported as a status line instead.
pub fn fetch_spinner(artist: &str, music_type: MusicType) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
        eprintln!("{}", fetch_line(artist, music_type, None));
    } else {
        let style = ProgressStyle::default_spinner()
            .template("{msg} {spinner} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(100));
    }
    pb.set_message(format!("Fetching {} {}", artist, music_type));
    pb
}

/// Clear the spinner; in log-only mode report how long the fetch took.
pub fn finish_fetch(pb: &ProgressBar, artist: &str, music_type: MusicType, elapsed: Duration) {
    pb.finish_and_clear();
    if is_log_only() {
        eprintln!("{}", fetch_line(artist, music_type, Some(elapsed)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1.5m");
    }

    #[test]
    fn test_fetch_line() {
        assert_eq!(
            fetch_line("Olivia Rodrigo", MusicType::Songs, None),
            "[fetch] Olivia Rodrigo songs ..."
        );
        assert_eq!(
            fetch_line("Olivia Rodrigo", MusicType::Albums, Some(Duration::from_millis(40))),
            "[fetch] Olivia Rodrigo albums landed in 40ms"
        );
    }
}
