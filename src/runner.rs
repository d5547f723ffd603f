//! Gathers the agenda of a day from a [`CalDavSource`]

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::agenda::{build_agenda, AgendaDocument, DayWindow};
use crate::calendar::{filter_calendars, CalendarRef};
use crate::config::Config;
use crate::error::AgendaError;
use crate::traits::CalDavSource;

/// Find the timezone of the account.
///
/// Calendars are inspected in the given order, and the first valid timezone wins. Falls back to UTC.
pub async fn resolve_timezone<S>(source: &S, calendars: &[CalendarRef]) -> Tz
where
    S: CalDavSource + Sync,
{
    for calendar in calendars {
        let raw = match source.calendar_timezone(calendar).await {
            Err(err) => {
                log::warn!("Unable to get the timezone of calendar {}: {}", calendar.display_name(), err);
                continue;
            },
            Ok(None) => continue,
            Ok(Some(raw)) => raw,
        };

        let tzid = match crate::ical::parse_timezone_id(&raw) {
            None => continue,
            Some(tzid) => tzid,
        };
        match tzid.parse::<Tz>() {
            Ok(tz) => return tz,
            Err(_) => {
                log::warn!("Calendar {} has an unknown timezone {:?}, ignoring it", calendar.display_name(), tzid);
                continue;
            },
        }
    }

    log::debug!("No calendar has a timezone, using UTC");
    chrono_tz::UTC
}

/// Build the agenda of a day.
///
/// The day is `date` if it is given, or `today(timezone)` where `timezone` is the timezone of the account.
/// Calendars that cannot be queried are skipped, unless none of them can.
pub async fn collect_agenda<S, F>(source: &S, config: &Config, date: Option<NaiveDate>, today: F) -> Result<AgendaDocument, AgendaError>
where
    S: CalDavSource + Sync,
    F: FnOnce(&Tz) -> NaiveDate,
{
    let calendars = source.list_calendars().await
        .map_err(|err| AgendaError::NoCalendars(format!("unable to list calendars: {}", err)))?;
    let listed = calendars.len();

    let calendars: Vec<CalendarRef> = filter_calendars(calendars, config.calendar_names())
        .into_iter()
        .filter(|cal| {
            if cal.holds_events() == false {
                log::debug!("Calendar {} cannot hold events, skipping it", cal.display_name());
            }
            cal.holds_events()
        })
        .collect();
    if calendars.is_empty() {
        return Err(AgendaError::NoCalendars(format!("none of the {} calendar(s) found can be queried for events", listed)));
    }

    let tz = resolve_timezone(source, &calendars).await;
    log::info!("Detected calendar timezone: {}", tz.name());

    let date = date.unwrap_or_else(|| today(&tz));
    let window = DayWindow::new(date, tz);
    log::info!("Fetching events for {}...", date);

    let mut events = Vec::new();
    let mut queried = Vec::new();
    let mut last_error = None;
    for calendar in &calendars {
        match source.search_events(calendar, &window).await {
            Err(err) => {
                log::warn!("Could not search calendar '{}': {}", calendar.display_name(), err);
                last_error = Some(err);
            },
            Ok(found) => {
                events.extend(found);
                queried.push(calendar.display_name().to_string());
            },
        }
    }

    if queried.is_empty() {
        let cause = last_error.map(|err| err.to_string()).unwrap_or_default();
        return Err(AgendaError::NoCalendars(format!("every calendar failed to answer (last error: {})", cause)));
    }

    let agenda = build_agenda(&events, &window, queried);
    log::info!("Found {} event(s).", agenda.entries().len());
    Ok(agenda)
}
