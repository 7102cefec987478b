use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone, Utc};
use horaire::config::CalendarConfig;
use horaire::materialize::{
    CalendarEvent, CalendarService, EventTiming, build_event, build_events, prune, publish,
    route_events,
};
use horaire::model::{ShiftInterval, ShiftKind};
use horaire::{HoraireError, Result};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).expect("valid date")
}

fn sample_intervals() -> Vec<ShiftInterval> {
    let start = chrono_tz::UTC.with_ymd_and_hms(2024, 6, 2, 16, 0, 0).unwrap();
    let end = chrono_tz::UTC.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
    vec![
        ShiftInterval::timed("Doe, Jane", ShiftKind::Work, start, end),
        ShiftInterval::all_day("Roe, Rick", ShiftKind::Off, day(2)),
        ShiftInterval::all_day("Doe, Jane", ShiftKind::Vacation, day(3)),
    ]
}

fn calendars() -> CalendarConfig {
    let mut personal = BTreeMap::new();
    personal.insert("Doe, Jane".to_string(), "jane".to_string());
    CalendarConfig {
        shared: "team".to_string(),
        personal,
        ..CalendarConfig::default()
    }
}

/// In-memory service that refuses events whose summary mentions `reject`.
#[derive(Default)]
struct MemoryCalendars {
    reject: Option<&'static str>,
    saved: BTreeMap<String, Vec<String>>,
    cleared: Vec<String>,
}

impl CalendarService for MemoryCalendars {
    fn ensure_calendar(&mut self, calendar: &str) -> Result<()> {
        self.saved.entry(calendar.to_string()).or_default();
        Ok(())
    }

    fn clear_calendar(&mut self, calendar: &str) -> Result<usize> {
        self.cleared.push(calendar.to_string());
        Ok(self.saved.get_mut(calendar).map(std::mem::take).map_or(0, |events| events.len()))
    }

    fn save_event(&mut self, calendar: &str, event: &CalendarEvent) -> Result<()> {
        if self.reject.is_some_and(|needle| event.summary.contains(needle)) {
            return Err(HoraireError::Calendar("refused".into()));
        }
        self.saved
            .entry(calendar.to_string())
            .or_default()
            .push(event.summary.clone());
        Ok(())
    }
}

#[test]
fn events_carry_summary_uid_and_timing() {
    let stamp = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    let intervals = sample_intervals();

    let work = build_event(&intervals[0], "horaire", stamp);
    assert_eq!(work.summary, "<> Doe, Jane");
    assert_eq!(work.description, "");
    assert_eq!(work.stamp, stamp);
    assert!(work.uid.ends_with("_horaire"));
    assert_eq!(work.uid.len(), 32 + "_horaire".len());
    assert!(!work.transparent);
    assert_eq!(
        work.timing,
        EventTiming::DateTime {
            start: Utc.with_ymd_and_hms(2024, 6, 2, 16, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap(),
        }
    );

    let off = build_event(&intervals[1], "horaire", stamp);
    assert_eq!(off.summary, "Off Roe, Rick");
    assert!(off.transparent);
    assert_eq!(
        off.timing,
        EventTiming::Date {
            start: day(2),
            end: day(3)
        }
    );

    let vacation = build_event(&intervals[2], "horaire", stamp);
    assert_eq!(vacation.summary, "Vacation Doe, Jane");
    assert_ne!(vacation.uid, work.uid);
}

#[test]
fn lunch_summary_uses_dashes() {
    assert_eq!(ShiftKind::Lunch.summary("Doe, Jane"), "-- Doe, Jane");
}

#[test]
fn routing_sends_personal_employees_to_their_calendar() {
    let routed = route_events(build_events(&sample_intervals(), "horaire"), &calendars());

    let jane: Vec<&str> = routed["jane"].iter().map(|e| e.summary.as_str()).collect();
    let team: Vec<&str> = routed["team"].iter().map(|e| e.summary.as_str()).collect();
    assert_eq!(jane, vec!["<> Doe, Jane", "Vacation Doe, Jane"]);
    assert_eq!(team, vec!["Off Roe, Rick"]);
}

#[test]
fn refused_event_does_not_stop_the_batch() {
    let routed = route_events(build_events(&sample_intervals(), "horaire"), &calendars());
    let mut service = MemoryCalendars {
        reject: Some("Vacation"),
        ..MemoryCalendars::default()
    };

    let report = publish(&mut service, &routed);

    assert_eq!(report.created, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].calendar, "jane");
    assert_eq!(report.failures[0].summary, "Vacation Doe, Jane");
    assert!(report.failures[0].reason.contains("refused"));
    assert_eq!(service.saved["jane"], vec!["<> Doe, Jane".to_string()]);
    assert_eq!(service.saved["team"], vec!["Off Roe, Rick".to_string()]);
}

#[test]
fn prune_clears_every_calendar() {
    let routed = route_events(build_events(&sample_intervals(), "horaire"), &calendars());
    let mut service = MemoryCalendars::default();
    publish(&mut service, &routed);

    let removed = prune(&mut service, &calendars().names()).expect("pruned");

    assert_eq!(removed, 3);
    assert_eq!(service.cleared, vec!["team".to_string(), "jane".to_string()]);
    assert!(service.saved.values().all(Vec::is_empty));
}
