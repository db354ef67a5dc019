// Countdown formatting and the display it is drawn on.

use std::io::Write;

use crate::transit_feed::ArrivalState;

/// Shown whenever no qualifying arrival is known.
pub const PLACEHOLDER: &str = "--:--";

const MAX_DISPLAY_MINUTES: i64 = 99;

/// Derive the 5-character countdown string for the current second.
///
/// A stale ETA holds at "00:00" until the next fetch cycle replaces it, and
/// anything beyond 99 minutes is capped at "99:59" because the layout
/// reserves exactly two digits for minutes.
pub fn format_countdown(state: &ArrivalState, now: i64) -> String {
    if !state.available || state.eta_epoch <= 0 {
        return PLACEHOLDER.to_string();
    }

    let delta = (state.eta_epoch - now).max(0);
    let minutes = delta / 60;
    let seconds = delta % 60;

    if minutes > MAX_DISPLAY_MINUTES {
        return "99:59".to_string();
    }

    format!("{:02}:{:02}", minutes, seconds)
}

pub trait CountdownDisplay {
    fn draw(&mut self, text: &str);
}

/// Terminal stand-in for the panel: one line, redrawn in place. Draws are
/// skipped while the string is unchanged so the line survives interleaved
/// status output for at most a second.
pub struct ConsoleDisplay {
    last_drawn: Option<String>,
}

impl ConsoleDisplay {
    const WIDTH: usize = 21;

    pub fn new() -> Self {
        ConsoleDisplay { last_drawn: None }
    }
}

impl CountdownDisplay for ConsoleDisplay {
    fn draw(&mut self, text: &str) {
        if self.last_drawn.as_deref() == Some(text) {
            return;
        }

        print!("\r🚌 |{:^width$}|", text, width = Self::WIDTH);
        std::io::stdout().flush().ok();

        self.last_drawn = Some(text.to_string());
    }
}
