// src/schedule/format.rs
use std::fmt::Write as _;

use super::Schedule;

pub const TITLE: &str = "⚡️💡 <b>ГРАФІК ВІДКЛЮЧЕНЬ СВІТЛА</b>";
pub const TITLE_REVISED: &str = "⚡️💡 <b>ОНОВЛЕНИЙ ГРАФІК ВІДКЛЮЧЕНЬ</b>";

/// Render the announcement as Telegram HTML.
///
/// Layout: title, optional date line plus blank line, then one section per
/// queue in schedule order (header, one line per window, blank line).
/// Trailing whitespace is trimmed.
pub fn format_announcement(
    reference_date: Option<&str>,
    schedule: &Schedule,
    is_revision: bool,
) -> String {
    let mut msg = String::new();
    msg.push_str(if is_revision { TITLE_REVISED } else { TITLE });
    msg.push('\n');

    if let Some(date) = reference_date.map(str::trim).filter(|d| !d.is_empty()) {
        let _ = write!(msg, "📆 {}\n\n", html_escape::encode_text(date));
    }

    for q in &schedule.queues {
        let _ = writeln!(msg, "💡 <b>Черга {}:</b>", q.key);
        for w in &q.windows {
            let _ = writeln!(msg, "❌ з {} до {}", w.start, w.end);
        }
        msg.push('\n');
    }

    msg.trim_end().to_string()
}
