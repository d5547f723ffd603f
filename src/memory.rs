//! An in-memory [`CalDavSource`], used to build agendas without a server (e.g. in tests)
#![cfg(any(test, feature = "mocks"))]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use url::Url;

use crate::agenda::DayWindow;
use crate::calendar::CalendarRef;
use crate::error::AgendaError;
use crate::event::Event;
use crate::mock_behaviour::MockBehaviour;
use crate::traits::CalDavSource;

struct MemoryCalendar {
    calendar: CalendarRef,
    timezone: Option<String>,
    events: Vec<Event>,
    mock_behaviour: Mutex<MockBehaviour>,
}

/// A CalDAV source that stores its calendars in memory.
///
/// Failures can be scripted with [`MockBehaviour`]s, either for the whole source or for a single calendar.
#[derive(Default)]
pub struct MemorySource {
    calendars: Vec<MemoryCalendar>,
    mock_behaviour: Mutex<MockBehaviour>,
    requests: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how the source-wide operations (e.g. listing calendars) behave
    pub fn with_behaviour(self, behaviour: MockBehaviour) -> Self {
        Self { mock_behaviour: Mutex::new(behaviour), ..self }
    }

    /// Add a calendar, with its raw `calendar-timezone` property and its events
    pub fn add_calendar(&mut self, calendar: CalendarRef, timezone: Option<String>, events: Vec<Event>) {
        self.calendars.push(MemoryCalendar {
            calendar,
            timezone,
            events,
            mock_behaviour: Mutex::new(MockBehaviour::default()),
        });
    }

    /// Set how the operations on a given calendar behave
    pub fn set_calendar_behaviour(&mut self, url: &Url, behaviour: MockBehaviour) -> Result<(), AgendaError> {
        match self.calendars.iter_mut().find(|cal| cal.calendar.url() == url) {
            None => Err(AgendaError::Protocol(format!("no calendar at {}", url))),
            Some(cal) => {
                cal.mock_behaviour = Mutex::new(behaviour);
                Ok(())
            },
        }
    }

    /// How many requests this source has answered (or refused)
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn find(&self, calendar: &CalendarRef) -> Result<&MemoryCalendar, AgendaError> {
        self.calendars.iter()
            .find(|cal| cal.calendar.url() == calendar.url())
            .ok_or_else(|| AgendaError::Protocol(format!("no calendar at {}", calendar.url())))
    }
}

fn behaviour(mutex: &Mutex<MockBehaviour>) -> std::sync::MutexGuard<'_, MockBehaviour> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl CalDavSource for MemorySource {
    async fn list_calendars(&self) -> Result<Vec<CalendarRef>, AgendaError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        behaviour(&self.mock_behaviour).can_list_calendars()?;
        Ok(self.calendars.iter().map(|cal| cal.calendar.clone()).collect())
    }

    async fn calendar_timezone(&self, calendar: &CalendarRef) -> Result<Option<String>, AgendaError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let cal = self.find(calendar)?;
        behaviour(&cal.mock_behaviour).can_get_calendar_timezone()?;
        Ok(cal.timezone.clone())
    }

    async fn search_events(&self, calendar: &CalendarRef, window: &DayWindow) -> Result<Vec<Event>, AgendaError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let cal = self.find(calendar)?;
        behaviour(&cal.mock_behaviour).can_search_events()?;
        // Behave like a server time-range query
        Ok(cal.events.iter()
            .filter(|event| window.contains(event))
            .cloned()
            .collect())
    }
}
