//! A module to parse ICal files

use std::error::Error;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use ical::parser::ical::component::IcalEvent;
use ical::property::Property;

use crate::event::{Event, EventTime};
use crate::utils::localize;


/// Parse the content of a `calendar-data` element into events.
///
/// `calendar` is the name of the calendar the data comes from.
/// Floating times (and times in an unknown `TZID`) are read in `default_tz`.
/// VEVENTs that cannot be understood are skipped with a warning.
pub fn parse_events(content: &str, calendar: &str, default_tz: Tz) -> Result<Vec<Event>, Box<dyn Error>> {
    let reader = ical::IcalParser::new(content.as_bytes());

    let mut events = Vec::new();
    for parsed in reader {
        let parsed = match parsed {
            Err(err) => return Err(format!("Unable to parse iCal data from calendar {}: {}", calendar, err).into()),
            Ok(cal) => cal,
        };

        for vevent in &parsed.events {
            match parse_event(vevent, calendar, default_tz) {
                Err(err) => {
                    log::warn!("Ignoring an event of calendar {}: {}", calendar, err);
                    continue;
                },
                Ok(event) => events.push(event),
            }
        }
    }

    Ok(events)
}

/// Extract the timezone identifier from a `calendar-timezone` property.
///
/// The property is usually a VCALENDAR holding a single VTIMEZONE, but some servers only give a bare identifier.
pub fn parse_timezone_id(content: &str) -> Option<String> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }

    if content.contains("BEGIN:") == false {
        // A bare identifier, such as "Europe/Paris"
        if content.lines().count() == 1 && content.contains(':') == false {
            return Some(content.to_string());
        }
        return None;
    }

    content.lines()
        .map(|line| line.trim())
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            // Some servers add parameters, e.g. TZID;X-LIC-LOCATION=...:Europe/Paris
            let name = name.split(';').next().unwrap_or(name);
            if name.eq_ignore_ascii_case("TZID") && value.trim().is_empty() == false {
                Some(value.trim().to_string())
            } else {
                None
            }
        })
}


enum PointInTime {
    Date(NaiveDate),
    Instant(DateTime<Utc>),
}

fn parse_event(vevent: &IcalEvent, calendar: &str, default_tz: Tz) -> Result<Event, Box<dyn Error>> {
    let summary = text_property(vevent, "SUMMARY");

    let dtstart = match find_property(vevent, "DTSTART") {
        None => return Err(format!("missing DTSTART for event {:?}", summary.as_deref().unwrap_or("(no title)")).into()),
        Some(prop) => parse_point_in_time(prop, default_tz)?,
    };
    let dtend = match find_property(vevent, "DTEND") {
        None => None,
        Some(prop) => Some(parse_point_in_time(prop, default_tz)?),
    };
    let duration = match find_property(vevent, "DURATION").and_then(|prop| prop.value.as_deref()) {
        None => None,
        Some(value) => Some(parse_duration(value)
            .ok_or_else(|| format!("invalid DURATION {:?}", value.trim()))?),
    };

    let time = match dtstart {
        PointInTime::Date(start) => {
            let day_after = start.succ_opt()
                .ok_or_else(|| format!("start date {} is out of range", start))?;
            let end = match (dtend, duration) {
                (Some(PointInTime::Date(end)), _) => end,
                (Some(PointInTime::Instant(end)), _) => end.with_timezone(&default_tz).date_naive(),
                (None, Some(duration)) => u64::try_from(duration.num_days()).ok()
                    .and_then(|days| start.checked_add_days(Days::new(days)))
                    .ok_or_else(|| format!("DURATION of {} days from {} is out of range", duration.num_days(), start))?,
                (None, None) => day_after,
            };
            // An all-day event lasts at least the day it starts on
            let end = if end > start { end } else { day_after };
            EventTime::AllDay { start, end }
        },
        PointInTime::Instant(start) => {
            let end = match (dtend, duration) {
                (Some(PointInTime::Instant(end)), _) => Some(end),
                (Some(PointInTime::Date(end)), _) => Some(localize(&default_tz, &end.and_time(chrono::NaiveTime::MIN))),
                (None, Some(duration)) => Some(start.checked_add_signed(duration)
                    .ok_or_else(|| format!("DURATION {} from {} is out of range", duration, start))?),
                (None, None) => None,
            };
            EventTime::Timed { start, end }
        },
    };

    Ok(Event::new(summary, calendar.to_string(), time)
        .with_location(text_property(vevent, "LOCATION"))
        .with_description(text_property(vevent, "DESCRIPTION")))
}

fn find_property<'a>(vevent: &'a IcalEvent, name: &str) -> Option<&'a Property> {
    vevent.properties.iter().find(|prop| prop.name.eq_ignore_ascii_case(name))
}

/// The unescaped value of a text property, if it is present and not blank
fn text_property(vevent: &IcalEvent, name: &str) -> Option<String> {
    find_property(vevent, name)
        .and_then(|prop| prop.value.as_deref())
        .map(|value| unescape_text(value.trim_end_matches(|c| c == '\r' || c == '\n')))
        .filter(|text| text.trim().is_empty() == false)
}

fn param<'a>(prop: &'a Property, name: &str) -> Option<&'a str> {
    prop.params.as_ref()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(|value| value.as_str())
}

fn parse_point_in_time(prop: &Property, default_tz: Tz) -> Result<PointInTime, Box<dyn Error>> {
    let value = match prop.value.as_deref() {
        None => return Err(format!("{} has no value", prop.name).into()),
        Some(v) => v.trim(),
    };

    let is_date = param(prop, "VALUE").map(|v| v.eq_ignore_ascii_case("DATE")).unwrap_or(false)
        || (value.len() == 8 && value.contains('T') == false);
    if is_date {
        let date = NaiveDate::parse_from_str(value, "%Y%m%d")
            .map_err(|err| format!("invalid date {:?} for {}: {}", value, prop.name, err))?;
        return Ok(PointInTime::Date(date));
    }

    if let Some(utc_value) = value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        let naive = NaiveDateTime::parse_from_str(utc_value, "%Y%m%dT%H%M%S")
            .map_err(|err| format!("invalid date-time {:?} for {}: {}", value, prop.name, err))?;
        return Ok(PointInTime::Instant(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
        .map_err(|err| format!("invalid date-time {:?} for {}: {}", value, prop.name, err))?;
    let tz = match param(prop, "TZID") {
        None => default_tz,
        Some(tzid) => {
            let tzid = tzid.trim_matches('"').trim_start_matches('/');
            match tzid.parse::<Tz>() {
                Ok(tz) => tz,
                Err(_) => {
                    log::warn!("Unknown TZID {:?}, reading {} as {}", tzid, prop.name, default_tz);
                    default_tz
                },
            }
        },
    };
    Ok(PointInTime::Instant(localize(&tz, &naive)))
}

/// Parse an iCal `DURATION` value (e.g. `PT1H30M`, `P1D`, `P2W`).
///
/// Negative durations make no sense for an event length and are rejected, as are durations chrono cannot represent.
pub fn parse_duration(value: &str) -> Option<chrono::Duration> {
    let value = value.trim();
    let value = value.strip_prefix('+').unwrap_or(value);
    let mut chars = value.strip_prefix('P')?.chars();

    let mut total = chrono::Duration::zero();
    let mut in_time = false;
    let mut digits = String::new();
    let mut seen_component = false;

    while let Some(c) = chars.next() {
        match c {
            '0'..='9' => digits.push(c),
            'T' if digits.is_empty() && in_time == false => in_time = true,
            designator => {
                let amount: i64 = digits.parse().ok()?;
                digits.clear();
                let part = match (designator, in_time) {
                    ('W', false) => chrono::Duration::try_weeks(amount),
                    ('D', false) => chrono::Duration::try_days(amount),
                    ('H', true) => chrono::Duration::try_hours(amount),
                    ('M', true) => chrono::Duration::try_minutes(amount),
                    ('S', true) => chrono::Duration::try_seconds(amount),
                    _ => return None,
                }?;
                total = total.checked_add(&part)?;
                seen_component = true;
            },
        }
    }

    if digits.is_empty() == false || seen_component == false {
        return None;
    }
    Some(total)
}

/// Undo the iCal text escaping (RFC 5545, section 3.3.11)
pub fn unescape_text(raw: &str) -> String {
    let mut unescaped = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => unescaped.push('\n'),
            Some(',') => unescaped.push(','),
            Some(';') => unescaped.push(';'),
            Some('\\') => unescaped.push('\\'),
            Some(other) => {
                unescaped.push('\\');
                unescaped.push(other);
            },
            None => unescaped.push('\\'),
        }
    }
    unescaped
}
