//! # Record formatting
//! Turns an accepted `Entry` into the display string that is stored in history
//! and pushed to subscribers verbatim.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::types::Entry;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("static regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// `2024-01-02T10:00:00` → `2024-01-02 10:00:00`.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Strip markup from a feed summary and collapse whitespace.
///
/// Tags become a single space so adjacent words never fuse; entities are
/// decoded after the tags are gone so escaped angle brackets survive as text.
pub fn clean_summary(raw: &str) -> String {
    let without_tags = RE_TAGS.replace_all(raw, " ");
    let decoded = html_escape::decode_html_entities(&without_tags);
    RE_WS.replace_all(&decoded, " ").trim().to_string()
}

/// The record shape shared by history, the plain-text API and WebSocket pushes.
pub fn format_record(provider: &str, title: &str, summary: &str, ts: &NaiveDateTime) -> String {
    format!(
        "[{}] Product: {} - {}\n{}\n",
        format_timestamp(ts),
        provider,
        title,
        clean_summary(summary)
    )
}

pub fn format_entry(provider: &str, entry: &Entry) -> String {
    format_record(provider, &entry.title, &entry.summary, &entry.published_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn summary_tags_removed_and_ws_collapsed() {
        let s = "<p>Status: <b>Investigating</b></p>  issue";
        assert_eq!(clean_summary(s), "Status: Investigating issue");
    }

    #[test]
    fn summary_entities_decoded_after_tags() {
        let s = "<small>Jan&nbsp;2</small><br/>\n\t Latency &lt;5ms&gt; &amp; falling";
        assert_eq!(clean_summary(s), "Jan 2 Latency <5ms> & falling");
    }

    #[test]
    fn record_layout() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let entry = Entry {
            title: "Elevated errors".into(),
            summary: "<p>Resolved</p>".into(),
            published_at: ts,
        };
        assert_eq!(
            format_entry("Acme", &entry),
            "[2024-01-02 10:00:00] Product: Acme - Elevated errors\nResolved\n"
        );
    }

    #[test]
    fn empty_summary_leaves_blank_line() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 5)
            .unwrap();
        assert_eq!(
            format_record("Acme", "Maintenance", "", &ts),
            "[2024-03-01 00:00:05] Product: Acme - Maintenance\n\n"
        );
    }
}
