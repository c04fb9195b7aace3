//! Log sanitising for player-supplied text (ids, names, raw command lines).
//! Keeps every record on one line and bounded in length.

use std::fmt::Write;

/// Default cap on escaped characters.
pub const LOG_PREVIEW_CHARS: usize = 160;

/// [`escape_log_bounded`] with [`LOG_PREVIEW_CHARS`].
pub fn escape_log(s: &str) -> String {
    escape_log_bounded(s, LOG_PREVIEW_CHARS)
}

/// Escape `\`, newlines, tabs and other control characters (`\xNN`), and cut
/// the input after `max_chars` source characters with a trailing `…`.
pub fn escape_log_bounded(s: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(s.len().min(max_chars) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count == max_chars {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
