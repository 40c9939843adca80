// src/schedule/parser.rs
//! Line-oriented schedule parser.
//!
//! Two recognizers run over every trimmed line: a queue-label matcher
//! (`1.1` .. `6.2`) and a clock-time matcher (`H:MM` / `HH:MM`). A label
//! switches the parser into that queue; time pairs are attached to the
//! current queue. Text before the first label is ignored.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Schedule, TimeWindow};

// Label must not be glued to other digits, so "13.10" is not "3.1". A
// trailing period is fine ("3.1.") unless a digit follows it.
static RE_QUEUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\d.])([1-6]\.[12])(?:[^\d.]|\.(?:\D|$)|$)").expect("queue regex")
});

static RE_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,2}:\d{2}").expect("time regex"));

// "на 12 березня" -> "12 березня"
static RE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bна\s+(\d{1,2})\s+(\p{Cyrillic}+)").expect("date regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NoQueue,
    InQueue(usize),
}

/// Parse OCR (or caption) text into a [`Schedule`].
///
/// Never fails: text without any queue label yields an empty schedule,
/// which callers treat as "nothing extracted".
pub fn parse(text: &str) -> Schedule {
    let mut schedule = Schedule {
        reference_date: extract_date(text),
        queues: Vec::new(),
    };
    let mut state = State::NoQueue;

    for line in text.lines().map(str::trim) {
        // On a label line only the text after the label carries windows.
        let mut rest = line;
        if let Some((key, end)) = queue_label(line) {
            state = State::InQueue(schedule.open_queue(key));
            rest = &line[end..];
        }

        if let State::InQueue(idx) = state {
            schedule.queues[idx].windows.extend(time_windows(rest));
        }
    }

    schedule
}

/// Search the whole text for a "на <day> <month>" phrase.
pub fn extract_date(text: &str) -> Option<String> {
    RE_DATE
        .captures(text)
        .map(|c| format!("{} {}", &c[1], &c[2]))
}

/// The label and the byte offset just past it.
fn queue_label(line: &str) -> Option<(&str, usize)> {
    RE_QUEUE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| (m.as_str(), m.end()))
}

/// Consecutive clock times on one line, paired up in order. A trailing
/// unpaired time is dropped.
fn time_windows(line: &str) -> Vec<TimeWindow> {
    let times: Vec<&str> = RE_TIME.find_iter(line).map(|m| m.as_str()).collect();
    times
        .chunks_exact(2)
        .map(|pair| TimeWindow::new(pair[0], pair[1]))
        .collect()
}
