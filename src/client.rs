//! This module provides a client to connect to a CalDAV server

use std::convert::TryFrom;
use std::time::Duration;

use async_trait::async_trait;
use chrono_tz::Tz;
use minidom::Element;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::agenda::DayWindow;
use crate::calendar::{CalendarRef, SupportedComponents};
use crate::config::Config;
use crate::error::AgendaError;
use crate::event::Event;
use crate::traits::CalDavSource;
use crate::utils::{find_elem, find_elems};


static DAVCLIENT_BODY: &str = r#"
    <d:propfind xmlns:d="DAV:">
       <d:prop>
           <d:current-user-principal />
       </d:prop>
    </d:propfind>
"#;

static HOMESET_BODY: &str = r#"
    <d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav" >
      <d:self/>
      <d:prop>
        <c:calendar-home-set />
      </d:prop>
    </d:propfind>
"#;

static CAL_BODY: &str = r#"
    <d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav" >
       <d:prop>
         <d:displayname />
         <d:resourcetype />
         <c:supported-calendar-component-set />
       </d:prop>
    </d:propfind>
"#;

static TIMEZONE_BODY: &str = r#"
    <d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav" >
       <d:prop>
         <c:calendar-timezone />
       </d:prop>
    </d:propfind>
"#;

/// Ask for the VEVENTs overlapping a time range, with recurring events expanded by the server
fn events_body(window: &DayWindow) -> String {
    let start = window.start().format("%Y%m%dT%H%M%SZ");
    let end = window.end().format("%Y%m%dT%H%M%SZ");
    format!(r#"
    <c:calendar-query xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
        <d:prop>
            <d:getetag />
            <c:calendar-data>
                <c:expand start="{start}" end="{end}" />
            </c:calendar-data>
        </d:prop>
        <c:filter>
            <c:comp-filter name="VCALENDAR">
                <c:comp-filter name="VEVENT">
                    <c:time-range start="{start}" end="{end}" />
                </c:comp-filter>
            </c:comp-filter>
        </c:filter>
    </c:calendar-query>
"#, start = start, end = end)
}


/// A CalDAV source that fetches its data from a CalDAV server.
///
/// The underlying HTTP connections are released when the client is dropped.
pub struct Client {
    url: Url,
    username: String,
    password: String,

    http: reqwest::Client,
}

impl Client {
    /// Create a client. This does not start a connection
    pub fn new<S: AsRef<str>, T: ToString, U: ToString>(url: S, username: T, password: U, timeout: Duration) -> Result<Self, AgendaError> {
        let url = Url::parse(url.as_ref())
            .map_err(|err| AgendaError::Configuration(format!("invalid CalDAV URL {:?}: {}", url.as_ref(), err)))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AgendaError::Connectivity(format!("unable to set up an HTTP client: {}", err)))?;

        Ok(Self{
            url,
            username: username.to_string(),
            password: password.to_string(),
            http,
        })
    }

    /// Create a client for the account of `config`
    pub fn from_config(config: &Config) -> Result<Self, AgendaError> {
        Self::new(config.caldav_url().as_str(), config.username(), config.password(), config.timeout())
    }

    /// Resolve an href given by the server against the server URL
    fn combine(&self, href: &str) -> Url {
        match self.url.join(href) {
            Ok(url) => url,
            Err(err) => {
                log::debug!("Unable to join {:?} to {}: {}. Replacing the path instead", href, self.url, err);
                let mut url = self.url.clone();
                url.set_path(href);
                url
            },
        }
    }

    async fn sub_request(&self, url: &Url, method: &str, body: String, depth: u32) -> Result<Element, AgendaError> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|err| AgendaError::Protocol(format!("cannot create {} method: {}", method, err)))?;

        let res = self.http
            .request(method, url.as_str())
            .header("Depth", depth)
            .header(CONTENT_TYPE, "application/xml")
            .basic_auth(self.username.clone(), Some(self.password.clone()))
            .body(body)
            .send()
            .await
            .map_err(AgendaError::from_http)?
            .error_for_status()
            .map_err(AgendaError::from_http)?;
        let text = res.text().await.map_err(AgendaError::from_http)?;

        text.parse::<Element>()
            .map_err(|err| AgendaError::Protocol(format!("invalid XML answer from {}: {}", url, err)))
    }

    async fn sub_request_and_extract_elem(&self, url: &Url, body: String, items: &[&str]) -> Result<String, AgendaError> {
        let root = self.sub_request(url, "PROPFIND", body, 0).await?;

        let mut current_element: &Element = &root;
        for item in items {
            current_element = match find_elem(current_element, item) {
                Some(elem) => elem,
                None => return Err(AgendaError::Protocol(format!("missing <{}> in the answer from {}", item, url))),
            };
        }

        Ok(current_element.text())
    }

    /// Return the Principal URL
    async fn get_principal(&self) -> Result<Url, AgendaError> {
        let href = self.sub_request_and_extract_elem(&self.url, DAVCLIENT_BODY.into(), &["current-user-principal", "href"]).await?;
        let principal_url = self.combine(href.trim());
        log::debug!("Principal URL is {}", principal_url);

        Ok(principal_url)
    }

    /// Return the Homeset URL
    async fn get_cal_home_set(&self) -> Result<Url, AgendaError> {
        let principal_url = self.get_principal().await?;

        let href = self.sub_request_and_extract_elem(&principal_url, HOMESET_BODY.into(), &["calendar-home-set", "href"]).await?;
        let chs_url = self.combine(href.trim());
        log::debug!("Calendar home set URL is {:?}", chs_url.path());

        Ok(chs_url)
    }

    /// Extract the calendar collections out of a `multistatus` answer, in the order the server gave them
    fn parse_calendars(&self, root: &Element) -> Vec<CalendarRef> {
        let mut calendars = Vec::new();
        for rep in find_elems(root, "response") {
            let display_name = find_elem(rep, "displayname")
                .map(|e| e.text().trim().to_string())
                .filter(|name| name.is_empty() == false);
            log::debug!("Considering calendar {:?}", display_name);

            // We filter out non-calendar items
            let resource_types = match find_elem(rep, "resourcetype") {
                None => continue,
                Some(rt) => rt,
            };
            if resource_types.children().any(|rt| rt.name() == "calendar") == false {
                continue;
            }

            // Servers may omit this property, which means "every component"
            let supported_components = match find_elem(rep, "supported-calendar-component-set") {
                None => SupportedComponents::EVENT | SupportedComponents::TODO,
                // We filter out the root calendar collection, that has an empty supported-calendar-component-set
                Some(comps) if comps.children().count() == 0 => continue,
                Some(comps) => match SupportedComponents::try_from(comps) {
                    Err(err) => {
                        log::warn!("Calendar {:?} has invalid supported components ({})! Ignoring it.", display_name, err);
                        continue;
                    },
                    Ok(sc) => sc,
                },
            };

            let calendar_href = match find_elem(rep, "href") {
                None => {
                    log::warn!("Calendar {:?} has no URL! Ignoring it.", display_name);
                    continue;
                },
                Some(h) => h.text(),
            };

            let this_calendar = CalendarRef::new(display_name, self.combine(calendar_href.trim()), supported_components);
            log::info!("Found calendar {}", this_calendar.display_name());
            calendars.push(this_calendar);
        }
        calendars
    }
}

/// Extract the events out of a `calendar-query` answer.
///
/// Resources that cannot be parsed are skipped with a warning.
fn parse_report(root: &Element, calendar: &str, tz: Tz) -> Vec<Event> {
    let mut events = Vec::new();
    for response in find_elems(root, "response") {
        let data = match find_elem(response, "calendar-data") {
            None => {
                log::debug!("A response of calendar {} has no calendar-data, ignoring it", calendar);
                continue;
            },
            Some(data) => data.text(),
        };

        match crate::ical::parse_events(&data, calendar, tz) {
            Err(err) => {
                log::warn!("{}", err);
                continue;
            },
            Ok(parsed) => events.extend(parsed),
        }
    }
    events
}

/// Extract the `calendar-timezone` property out of a `propfind` answer
fn parse_timezone_property(root: &Element) -> Option<String> {
    find_elem(root, "calendar-timezone")
        .map(|elem| elem.text())
        .filter(|text| text.trim().is_empty() == false)
}

#[async_trait]
impl CalDavSource for Client {
    async fn list_calendars(&self) -> Result<Vec<CalendarRef>, AgendaError> {
        let cal_home_set = self.get_cal_home_set().await?;

        let root = self.sub_request(&cal_home_set, "PROPFIND", CAL_BODY.into(), 1).await?;
        Ok(self.parse_calendars(&root))
    }

    async fn calendar_timezone(&self, calendar: &CalendarRef) -> Result<Option<String>, AgendaError> {
        let root = self.sub_request(calendar.url(), "PROPFIND", TIMEZONE_BODY.into(), 0).await?;
        Ok(parse_timezone_property(&root))
    }

    async fn search_events(&self, calendar: &CalendarRef, window: &DayWindow) -> Result<Vec<Event>, AgendaError> {
        let root = self.sub_request(calendar.url(), "REPORT", events_body(window), 1).await?;
        let events = parse_report(&root, calendar.display_name(), window.timezone());
        log::debug!("Calendar {} returned {} event(s)", calendar.display_name(), events.len());
        Ok(events)
    }
}
