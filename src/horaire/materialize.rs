//! Turns shift intervals into calendar events and hands them to a
//! [`CalendarService`].

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::horaire::config::CalendarConfig;
use crate::horaire::error::Result;
use crate::horaire::model::{ShiftInterval, ShiftSpan};

/// When an event takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTiming {
    /// Date-only event; `end` is exclusive.
    Date { start: NaiveDate, end: NaiveDate },
    DateTime {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// A calendar entry ready to be serialised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub uid: String,
    pub summary: String,
    pub description: String,
    /// Creation time of the event record.
    pub stamp: DateTime<Utc>,
    pub timing: EventTiming,
    /// All-day events do not block time.
    pub transparent: bool,
    pub employee: String,
}

/// Builds the event for one interval with a fresh UID.
pub fn build_event(interval: &ShiftInterval, uid_suffix: &str, stamp: DateTime<Utc>) -> CalendarEvent {
    let timing = match interval.span {
        ShiftSpan::AllDay { start, end } => EventTiming::Date { start, end },
        ShiftSpan::Timed { start, end } => EventTiming::DateTime {
            start: start.with_timezone(&Utc),
            end: end.with_timezone(&Utc),
        },
    };

    CalendarEvent {
        uid: format!("{}_{uid_suffix}", Uuid::new_v4().simple()),
        summary: interval.summary(),
        description: String::new(),
        stamp,
        timing,
        transparent: interval.is_all_day(),
        employee: interval.employee.clone(),
    }
}

/// Builds events for `intervals`, all stamped with the current time.
pub fn build_events(intervals: &[ShiftInterval], uid_suffix: &str) -> Vec<CalendarEvent> {
    let stamp = Utc::now();
    intervals
        .iter()
        .map(|interval| build_event(interval, uid_suffix, stamp))
        .collect()
}

/// Groups events by destination calendar, keeping their order.
pub fn route_events(
    events: Vec<CalendarEvent>,
    calendars: &CalendarConfig,
) -> BTreeMap<String, Vec<CalendarEvent>> {
    let mut routed: BTreeMap<String, Vec<CalendarEvent>> = BTreeMap::new();
    for event in events {
        let calendar = calendars
            .personal
            .get(&event.employee)
            .unwrap_or(&calendars.shared)
            .clone();
        routed.entry(calendar).or_default().push(event);
    }
    routed
}

/// Storage for calendar events, e.g. a CalDAV collection.
///
/// Methods take `&mut self` so writes to one backend never interleave.
pub trait CalendarService {
    /// Creates the calendar when it does not exist yet.
    fn ensure_calendar(&mut self, calendar: &str) -> Result<()>;

    /// Deletes every event of the calendar and returns how many were removed.
    fn clear_calendar(&mut self, calendar: &str) -> Result<usize>;

    fn save_event(&mut self, calendar: &str, event: &CalendarEvent) -> Result<()>;
}

/// An event the calendar service refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub calendar: String,
    pub uid: String,
    pub summary: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub created: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl DeliveryReport {
    pub fn merge(&mut self, other: DeliveryReport) {
        self.created += other.created;
        self.failures.extend(other.failures);
    }
}

/// Saves every routed event. A refused event is recorded and the batch
/// carries on; only a calendar that cannot be opened skips its events.
#[instrument(level = "info", skip_all, fields(calendars = routed.len()))]
pub fn publish(
    service: &mut dyn CalendarService,
    routed: &BTreeMap<String, Vec<CalendarEvent>>,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    for (calendar, events) in routed {
        if let Err(err) = service.ensure_calendar(calendar) {
            warn!(%calendar, error = %err, "calendar unavailable");
            report
                .failures
                .extend(events.iter().map(|event| failure(calendar, event, &err)));
            continue;
        }

        for event in events {
            match service.save_event(calendar, event) {
                Ok(()) => report.created += 1,
                Err(err) => {
                    warn!(%calendar, uid = %event.uid, error = %err, "event not saved");
                    report.failures.push(failure(calendar, event, &err));
                }
            }
        }
    }

    info!(
        created = report.created,
        failed = report.failures.len(),
        "events published"
    );
    report
}

/// Empties the given calendars, creating the ones that are missing.
#[instrument(level = "info", skip_all)]
pub fn prune(service: &mut dyn CalendarService, calendars: &[String]) -> Result<usize> {
    let mut removed = 0;
    for calendar in calendars {
        service.ensure_calendar(calendar)?;
        removed += service.clear_calendar(calendar)?;
    }
    info!(removed, "calendars pruned");
    Ok(removed)
}

fn failure(calendar: &str, event: &CalendarEvent, err: &impl std::fmt::Display) -> DeliveryFailure {
    DeliveryFailure {
        calendar: calendar.to_string(),
        uid: event.uid.clone(),
        summary: event.summary.clone(),
        reason: err.to_string(),
    }
}
