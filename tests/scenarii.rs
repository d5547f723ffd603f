//! Shared fixtures for the integration tests: populated sources, settings and a mail transport that only records what it is given
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use lettre::Message;
use url::Url;

use daily_agenda::agenda::{today_in, AgendaDocument};
use daily_agenda::calendar::{CalendarRef, SupportedComponents};
use daily_agenda::config::{Config, PASSWORD_VAR, USERNAME_VAR};
use daily_agenda::mailer::{deliver, DeliveryMode, MailTransport};
use daily_agenda::memory::MemorySource;
use daily_agenda::render::render;
use daily_agenda::runner::collect_agenda;
use daily_agenda::{AgendaError, Event, EventTime};

pub const PARIS_TIMEZONE: &str = "BEGIN:VCALENDAR\r
VERSION:2.0\r
PRODID:-//fixtures//EN\r
BEGIN:VTIMEZONE\r
TZID:Europe/Paris\r
END:VTIMEZONE\r
END:VCALENDAR\r
";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn march_15() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
}

pub fn paris() -> Tz {
    "Europe/Paris".parse().unwrap()
}

/// Settings with valid credentials, plus `extra`
pub fn credentials_and(extra: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut env = vec![
        (USERNAME_VAR.to_string(), "jane@fastmail.com".to_string()),
        (PASSWORD_VAR.to_string(), "app-secret".to_string()),
    ];
    env.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    env
}

pub fn event_calendar(name: &str) -> CalendarRef {
    let url = Url::parse(&format!("https://caldav.example.org/cal/{}/", name.to_lowercase())).unwrap();
    CalendarRef::new(Some(name.to_string()), url, SupportedComponents::EVENT)
}

pub fn task_calendar(name: &str) -> CalendarRef {
    let url = Url::parse(&format!("https://caldav.example.org/cal/{}/", name.to_lowercase())).unwrap();
    CalendarRef::new(Some(name.to_string()), url, SupportedComponents::TODO)
}

/// A timed event on 2026-03-15, Paris time
pub fn meeting(summary: &str, calendar: &str, start: (u32, u32), end: (u32, u32)) -> Event {
    let tz = paris();
    let at = |(h, m): (u32, u32)| tz.with_ymd_and_hms(2026, 3, 15, h, m, 0).unwrap().with_timezone(&Utc);
    Event::new(Some(summary.to_string()), calendar.to_string(), EventTime::Timed {
        start: at(start),
        end: Some(at(end)),
    })
}

pub fn all_day(summary: &str, calendar: &str, start: NaiveDate, end: NaiveDate) -> Event {
    Event::new(Some(summary.to_string()), calendar.to_string(), EventTime::AllDay { start, end })
}


/// A mail transport that keeps what it should have sent
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Message>>,
}

impl RecordingTransport {
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: Message) -> Result<(), AgendaError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}


/// Everything the binary does, against an in-memory source
pub async fn run_agenda(
    source: &MemorySource,
    env: &[(String, String)],
    date: Option<NaiveDate>,
    mode: DeliveryMode,
    transport: &RecordingTransport,
    out: &mut Vec<u8>,
) -> Result<AgendaDocument, AgendaError> {
    let env: HashMap<String, String> = env.iter().cloned().collect();
    let config = Config::from_lookup(|key| env.get(key).cloned())?;

    let agenda = collect_agenda(source, &config, date, today_in).await?;
    let rendered = render(&agenda, config.display_name());
    deliver(&rendered, &config, mode, transport, out).await?;
    Ok(agenda)
}
