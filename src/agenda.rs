//! Turns raw events into the ordered agenda of a single day

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::event::{Event, EventTime};
use crate::utils::comparison::compare_summaries_alpha;
use crate::utils::localize;

/// Shown instead of the summary of events that have none
pub const NO_TITLE: &str = "(no title)";

/// The date of "today", as seen in `tz`
pub fn today_in(tz: &Tz) -> NaiveDate {
    Utc::now().with_timezone(tz).date_naive()
}


/// The half-open interval `[start, end)` between two consecutive midnights of `tz`
#[derive(Clone, Debug, PartialEq)]
pub struct DayWindow {
    date: NaiveDate,
    tz: Tz,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DayWindow {
    pub fn new(date: NaiveDate, tz: Tz) -> Self {
        let next_day = date.succ_opt().unwrap_or(date);
        Self {
            date,
            tz,
            start: localize(&tz, &date.and_time(NaiveTime::MIN)),
            end: localize(&tz, &next_day.and_time(NaiveTime::MIN)),
        }
    }

    pub fn date(&self) -> NaiveDate { self.date }
    pub fn timezone(&self) -> Tz { self.tz }
    pub fn start(&self) -> DateTime<Utc> { self.start }
    pub fn end(&self) -> DateTime<Utc> { self.end }

    /// Whether `event` overlaps this day.
    ///
    /// An event starting exactly at the window start is inside, an event ending exactly at the window start is not.
    /// Events without a duration are inside when they start within the window.
    pub fn contains(&self, event: &Event) -> bool {
        match event.time() {
            EventTime::AllDay { start, end } => *start <= self.date && self.date < *end,
            EventTime::Timed { start, end } => {
                match end {
                    Some(end) if end > start => *start < self.end && *end > self.start,
                    _ => self.start <= *start && *start < self.end,
                }
            },
        }
    }
}


/// When an agenda entry happens, in the agenda timezone
#[derive(Clone, Debug, PartialEq)]
pub enum EntryTime {
    AllDay,
    Timed { start: DateTime<Tz>, end: Option<DateTime<Tz>> },
}

/// An event, ready to be displayed
#[derive(Clone, Debug, PartialEq)]
pub struct AgendaEntry {
    pub summary: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub calendar: String,
    pub time: EntryTime,
}

impl AgendaEntry {
    fn from_event(event: &Event, tz: &Tz) -> Self {
        let time = match event.time() {
            EventTime::AllDay { .. } => EntryTime::AllDay,
            EventTime::Timed { start, end } => EntryTime::Timed {
                start: start.with_timezone(tz),
                end: end.as_ref().map(|end| end.with_timezone(tz)),
            },
        };

        Self {
            summary: event.summary().unwrap_or(NO_TITLE).to_string(),
            location: event.location().map(String::from),
            description: event.description().map(String::from),
            calendar: event.calendar().to_string(),
            time,
        }
    }

    pub fn is_all_day(&self) -> bool {
        self.time == EntryTime::AllDay
    }
}

/// All-day entries first (by summary), then timed entries by start time, then by summary.
/// Remaining ties are broken by end time and calendar name, so that the order never depends on the input order.
fn compare_entries(left: &AgendaEntry, right: &AgendaEntry) -> Ordering {
    let by_time = match (&left.time, &right.time) {
        (EntryTime::AllDay, EntryTime::AllDay) => Ordering::Equal,
        (EntryTime::AllDay, EntryTime::Timed { .. }) => Ordering::Less,
        (EntryTime::Timed { .. }, EntryTime::AllDay) => Ordering::Greater,
        (EntryTime::Timed { start: ls, .. }, EntryTime::Timed { start: rs, .. }) => ls.cmp(rs),
    };

    by_time
        .then_with(|| compare_summaries_alpha(&left.summary, &right.summary))
        .then_with(|| match (&left.time, &right.time) {
            (EntryTime::Timed { end: le, .. }, EntryTime::Timed { end: re, .. }) => le.cmp(re),
            _ => Ordering::Equal,
        })
        .then_with(|| left.calendar.cmp(&right.calendar))
}


/// The agenda of a day
#[derive(Clone, Debug, PartialEq)]
pub struct AgendaDocument {
    date: NaiveDate,
    timezone: Tz,
    calendars: Vec<String>,
    entries: Vec<AgendaEntry>,
}

impl AgendaDocument {
    pub fn date(&self) -> NaiveDate { self.date }
    pub fn timezone(&self) -> Tz { self.timezone }
    /// Names of the calendars that have been queried
    pub fn calendars(&self) -> &[String] { &self.calendars }
    pub fn entries(&self) -> &[AgendaEntry] { &self.entries }

    /// Names of the calendars that contributed entries, or of every queried calendar when there are none. Sorted and deduplicated.
    pub fn calendars_used(&self) -> Vec<String> {
        let mut names: Vec<String> = if self.entries.is_empty() {
            self.calendars.clone()
        } else {
            self.entries.iter().map(|e| e.calendar.clone()).collect()
        };
        names.sort();
        names.dedup();
        names
    }

    /// Remove the timed entries that are over at `now`. All-day entries are always kept.
    pub fn drop_finished(&mut self, now: DateTime<Utc>) {
        self.entries.retain(|entry| match &entry.time {
            EntryTime::AllDay => true,
            EntryTime::Timed { start, end } => end.as_ref().unwrap_or(start).with_timezone(&Utc) >= now,
        });
    }
}

/// Build the agenda of `window` from `events`.
///
/// Events outside the window are dropped. `calendars` are the names of the calendars that have been queried.
pub fn build_agenda(events: &[Event], window: &DayWindow, calendars: Vec<String>) -> AgendaDocument {
    let tz = window.timezone();
    let mut entries: Vec<AgendaEntry> = events.iter()
        .filter(|event| {
            let inside = window.contains(event);
            if inside == false {
                log::debug!("Event {:?} is outside of {}, skipping it", event.summary(), window.date());
            }
            inside
        })
        .map(|event| AgendaEntry::from_event(event, &tz))
        .collect();
    entries.sort_by(compare_entries);

    AgendaDocument {
        date: window.date(),
        timezone: tz,
        calendars,
        entries,
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    fn paris() -> Tz {
        "Europe/Paris".parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn timed(summary: Option<&str>, tz: &Tz, start: (u32, u32, u32), end: Option<(u32, u32, u32)>) -> Event {
        let at = |(d, h, m): (u32, u32, u32)| tz.with_ymd_and_hms(2026, 3, d, h, m, 0).unwrap().with_timezone(&Utc);
        Event::new(summary.map(String::from), "Work".to_string(), EventTime::Timed {
            start: at(start),
            end: end.map(at),
        })
    }

    fn all_day(summary: &str, start: NaiveDate, end: NaiveDate) -> Event {
        Event::new(Some(summary.to_string()), "Family".to_string(), EventTime::AllDay { start, end })
    }

    #[test]
    fn test_window_is_computed_in_the_timezone() {
        let window = DayWindow::new(date(2026, 3, 15), paris());
        assert_eq!(window.start(), Utc.with_ymd_and_hms(2026, 3, 14, 23, 0, 0).unwrap());
        assert_eq!(window.end(), Utc.with_ymd_and_hms(2026, 3, 15, 23, 0, 0).unwrap());

        // Clocks go forward on that day: the day only lasts 23 hours
        let window = DayWindow::new(date(2026, 3, 29), paris());
        assert_eq!(window.end() - window.start(), chrono::Duration::hours(23));
    }

    #[test]
    fn test_midnight_in_a_dst_gap() {
        // Chile moves its clocks from midnight to 01:00 in September
        let santiago: Tz = "America/Santiago".parse().unwrap();
        let window = DayWindow::new(date(2026, 9, 6), santiago);
        assert_eq!(window.start(), Utc.with_ymd_and_hms(2026, 9, 6, 4, 0, 0).unwrap());
        assert_eq!(window.start().with_timezone(&santiago).date_naive(), date(2026, 9, 6));
    }

    #[test]
    fn test_boundaries() {
        let tz = paris();
        let window = DayWindow::new(date(2026, 3, 15), tz);
        let next_window = DayWindow::new(date(2026, 3, 16), tz);
        let previous_window = DayWindow::new(date(2026, 3, 14), tz);

        let starts_at_midnight = timed(Some("Early"), &tz, (15, 0, 0), Some((15, 1, 0)));
        assert!(window.contains(&starts_at_midnight));
        assert!(previous_window.contains(&starts_at_midnight) == false);

        let ends_at_midnight = timed(Some("Late"), &tz, (15, 23, 0), Some((16, 0, 0)));
        assert!(window.contains(&ends_at_midnight));
        assert!(next_window.contains(&ends_at_midnight) == false);

        let spans_midnight = timed(Some("Night shift"), &tz, (15, 22, 0), Some((16, 6, 0)));
        assert!(window.contains(&spans_midnight));
        assert!(next_window.contains(&spans_midnight));

        let instant = timed(Some("Reminder"), &tz, (16, 0, 0), None);
        assert!(window.contains(&instant) == false);
        assert!(next_window.contains(&instant));
    }

    #[test]
    fn test_all_day_spans() {
        let window = DayWindow::new(date(2026, 3, 15), paris());
        assert!(window.contains(&all_day("Conference", date(2026, 3, 14), date(2026, 3, 17))));
        assert!(window.contains(&all_day("Birthday", date(2026, 3, 15), date(2026, 3, 16))));
        assert!(window.contains(&all_day("Yesterday", date(2026, 3, 14), date(2026, 3, 15))) == false);
        assert!(window.contains(&all_day("Tomorrow", date(2026, 3, 16), date(2026, 3, 17))) == false);
    }

    #[test]
    fn test_sorting_does_not_depend_on_input_order() {
        let tz = paris();
        let window = DayWindow::new(date(2026, 3, 15), tz);
        let events = vec![
            timed(Some("Lunch"), &tz, (15, 12, 0), Some((15, 13, 0))),
            all_day("Holiday", date(2026, 3, 15), date(2026, 3, 16)),
            timed(Some("Call"), &tz, (15, 9, 0), Some((15, 9, 30))),
            timed(None, &tz, (15, 9, 0), Some((15, 10, 0))),
            all_day("Conference", date(2026, 3, 14), date(2026, 3, 17)),
            timed(Some("Yesterday"), &tz, (14, 9, 0), Some((14, 10, 0))),
        ];

        let expected = vec!["Conference", "Holiday", "(no title)", "Call", "Lunch"];

        let agenda = build_agenda(&events, &window, vec!["Work".to_string()]);
        let summaries: Vec<&str> = agenda.entries().iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(summaries, expected);

        let mut reversed = events.clone();
        reversed.reverse();
        let agenda_reversed = build_agenda(&reversed, &window, vec!["Work".to_string()]);
        assert_eq!(agenda, agenda_reversed);
    }

    #[test]
    fn test_times_are_displayed_in_the_timezone() {
        let tz = paris();
        let window = DayWindow::new(date(2026, 3, 15), tz);
        let event = timed(Some("Call"), &tz, (15, 9, 0), Some((15, 9, 30)));

        let agenda = build_agenda(&[event.clone()], &window, vec![]);
        match &agenda.entries()[0].time {
            EntryTime::Timed { start, end } => {
                assert_eq!(start.format("%H:%M").to_string(), "09:00");
                assert_eq!(end.as_ref().map(|e| e.format("%H:%M").to_string()), Some("09:30".to_string()));
                // The instant itself is unchanged
                assert_eq!(start.with_timezone(&Utc), Utc.with_ymd_and_hms(2026, 3, 15, 8, 0, 0).unwrap());
            },
            other => panic!("unexpected entry time {:?}", other),
        }
    }

    #[test]
    fn test_drop_finished() {
        let tz = paris();
        let window = DayWindow::new(date(2026, 3, 15), tz);
        let events = vec![
            all_day("Holiday", date(2026, 3, 15), date(2026, 3, 16)),
            timed(Some("Breakfast"), &tz, (15, 8, 0), Some((15, 9, 0))),
            timed(Some("Lunch"), &tz, (15, 12, 0), Some((15, 13, 0))),
            timed(Some("Reminder"), &tz, (15, 10, 0), None),
        ];
        let mut agenda = build_agenda(&events, &window, vec![]);

        let now = tz.with_ymd_and_hms(2026, 3, 15, 10, 30, 0).unwrap().with_timezone(&Utc);
        agenda.drop_finished(now);
        let summaries: Vec<&str> = agenda.entries().iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(summaries, vec!["Holiday", "Lunch"]);
    }

    #[test]
    fn test_calendars_used() {
        let tz = paris();
        let window = DayWindow::new(date(2026, 3, 15), tz);
        let queried = vec!["Work".to_string(), "Family".to_string(), "Sports".to_string()];

        let empty = build_agenda(&[], &window, queried.clone());
        assert_eq!(empty.calendars_used(), vec!["Family".to_string(), "Sports".to_string(), "Work".to_string()]);

        let events = vec![
            timed(Some("Call"), &tz, (15, 9, 0), Some((15, 9, 30))),
            timed(Some("Lunch"), &tz, (15, 12, 0), Some((15, 13, 0))),
        ];
        let agenda = build_agenda(&events, &window, queried);
        assert_eq!(agenda.calendars_used(), vec!["Work".to_string()]);
    }
}
