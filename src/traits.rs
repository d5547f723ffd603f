//! Traits used to abstract the calendar server, so that an agenda can be built from a mocked source

use async_trait::async_trait;

use crate::agenda::DayWindow;
use crate::calendar::CalendarRef;
use crate::error::AgendaError;
use crate::event::Event;

/// A source of calendars and events (usually a CalDAV [`Client`](crate::client::Client))
#[async_trait]
pub trait CalDavSource {
    /// Returns the calendars that this source contains, in the order the source lists them
    async fn list_calendars(&self) -> Result<Vec<CalendarRef>, AgendaError>;

    /// Returns the raw `calendar-timezone` property of a calendar, if it has one
    async fn calendar_timezone(&self, calendar: &CalendarRef) -> Result<Option<String>, AgendaError>;

    /// Returns the events of a calendar that overlap `window`.
    ///
    /// Times that are not anchored to a timezone are read in the timezone of the window.
    async fn search_events(&self, calendar: &CalendarRef, window: &DayWindow) -> Result<Vec<Event>, AgendaError>;
}
