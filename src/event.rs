//! Calendar events (iCal `VEVENT` item), as read from a server

use chrono::{DateTime, NaiveDate, Utc};

/// When an event happens
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventTime {
    /// A date span with no time of day. `end` is exclusive, as in iCal.
    AllDay { start: NaiveDate, end: NaiveDate },
    /// A time span. `end` is `None` for events that only have a start.
    Timed { start: DateTime<Utc>, end: Option<DateTime<Utc>> },
}

/// A calendar event.
///
/// Events only live for the duration of a run: they are read from the server, rendered, and dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    summary: Option<String>,
    location: Option<String>,
    description: Option<String>,
    calendar: String,
    time: EventTime,
}

impl Event {
    pub fn new(summary: Option<String>, calendar: String, time: EventTime) -> Self {
        Self {
            summary,
            location: None,
            description: None,
            calendar,
            time,
        }
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Name of the calendar this event comes from
    pub fn calendar(&self) -> &str {
        &self.calendar
    }

    pub fn time(&self) -> &EventTime {
        &self.time
    }
}
