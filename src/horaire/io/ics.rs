//! iCalendar (RFC 5545) serialisation of [`CalendarEvent`]s.

use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};

use crate::horaire::error::Result;
use crate::horaire::materialize::{CalendarEvent, EventTiming};

/// Content lines longer than this many octets are folded.
const MAX_LINE_OCTETS: usize = 75;

/// Serialises `events` into one VCALENDAR document.
pub fn write_calendar(events: &[CalendarEvent], prodid: &str) -> String {
    let mut out = String::new();
    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, &format!("PRODID:{prodid}"));
    push_line(&mut out, "VERSION:2.0");
    for event in events {
        push_event(&mut out, event);
    }
    push_line(&mut out, "END:VCALENDAR");
    out
}

/// Writes `events` as an `.ics` file.
pub fn write_file(path: &Path, events: &[CalendarEvent], prodid: &str) -> Result<()> {
    fs::write(path, write_calendar(events, prodid))?;
    Ok(())
}

fn push_event(out: &mut String, event: &CalendarEvent) {
    push_line(out, "BEGIN:VEVENT");
    push_line(out, &format!("UID:{}", event.uid));
    push_line(out, &format!("SUMMARY:{}", escape_text(&event.summary)));
    push_line(out, &format!("DESCRIPTION:{}", escape_text(&event.description)));
    push_line(out, &format!("DTSTAMP:{}", format_utc(event.stamp)));
    match event.timing {
        EventTiming::Date { start, end } => {
            push_line(out, &format!("DTSTART;VALUE=DATE:{}", format_date(start)));
            push_line(out, &format!("DTEND;VALUE=DATE:{}", format_date(end)));
        }
        EventTiming::DateTime { start, end } => {
            push_line(out, &format!("DTSTART:{}", format_utc(start)));
            push_line(out, &format!("DTEND:{}", format_utc(end)));
        }
    }
    if event.transparent {
        push_line(out, "TRANSP:TRANSPARENT");
    }
    push_line(out, "END:VEVENT");
}

fn format_utc(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Escapes a TEXT property value.
fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

/// Appends a content line, folding it at octet boundaries that do not split
/// a character.
fn push_line(out: &mut String, line: &str) {
    let mut limit = MAX_LINE_OCTETS;
    let mut current = 0;
    for (idx, ch) in line.char_indices() {
        if idx - current + ch.len_utf8() > limit {
            out.push_str(&line[current..idx]);
            out.push_str("\r\n ");
            current = idx;
            // Continuation lines start with a space.
            limit = MAX_LINE_OCTETS - 1;
        }
    }
    out.push_str(&line[current..]);
    out.push_str("\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(timing: EventTiming, transparent: bool) -> CalendarEvent {
        CalendarEvent {
            uid: "abc_horaire".into(),
            summary: "<> Doe, Jane".into(),
            description: String::new(),
            stamp: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            timing,
            transparent,
            employee: "Doe, Jane".into(),
        }
    }

    #[test]
    fn timed_event_uses_utc_date_times() {
        let timing = EventTiming::DateTime {
            start: Utc.with_ymd_and_hms(2024, 6, 2, 16, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap(),
        };
        let ics = write_calendar(&[event(timing, false)], "-//test//EN");

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nPRODID:-//test//EN\r\nVERSION:2.0\r\n"));
        assert!(ics.contains("UID:abc_horaire\r\n"));
        assert!(ics.contains("SUMMARY:<> Doe\\, Jane\r\n"));
        assert!(ics.contains("DESCRIPTION:\r\n"));
        assert!(ics.contains("DTSTAMP:20240601T120000Z\r\n"));
        assert!(ics.contains("DTSTART:20240602T160000Z\r\n"));
        assert!(ics.contains("DTEND:20240603T000000Z\r\n"));
        assert!(!ics.contains("TRANSP"));
        assert!(ics.ends_with("END:VEVENT\r\nEND:VCALENDAR\r\n"));
    }

    #[test]
    fn all_day_event_uses_date_values() {
        let timing = EventTiming::Date {
            start: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(),
        };
        let ics = write_calendar(&[event(timing, true)], "-//test//EN");

        assert!(ics.contains("DTSTART;VALUE=DATE:20240603\r\n"));
        assert!(ics.contains("DTEND;VALUE=DATE:20240604\r\n"));
        assert!(ics.contains("TRANSP:TRANSPARENT\r\n"));
    }

    #[test]
    fn long_lines_are_folded() {
        let mut out = String::new();
        let line = format!("SUMMARY:{}", "é".repeat(60));
        push_line(&mut out, &line);

        for physical in out.split("\r\n").filter(|part| !part.is_empty()) {
            assert!(physical.len() <= MAX_LINE_OCTETS, "{physical:?}");
        }
        assert_eq!(out.replace("\r\n ", ""), format!("{line}\r\n"));
    }
}
