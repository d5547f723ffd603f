//! Calendar collections as advertised by a CalDAV server

use std::convert::TryFrom;
use std::error::Error;

use bitflags::bitflags;
use url::Url;

bitflags! {
    pub struct SupportedComponents: u8 {
        /// An event, such as a calendar meeting
        const EVENT = 1;
        /// A to-do item, such as a reminder
        const TODO = 2;
    }
}

impl TryFrom<&minidom::Element> for SupportedComponents {
    type Error = Box<dyn Error>;

    /// Create an instance from an XML <supported-calendar-component-set> element
    fn try_from(element: &minidom::Element) -> Result<Self, Self::Error> {
        if element.name() != "supported-calendar-component-set" {
            return Err("Element must be a <supported-calendar-component-set>".into());
        }

        let mut flags = Self::empty();
        for child in element.children() {
            match child.attr("name") {
                None => continue,
                Some("VEVENT") => flags.insert(Self::EVENT),
                Some("VTODO") => flags.insert(Self::TODO),
                Some(other) => {
                    log::debug!("Unsupported component type: {:?}. Ignoring it", other);
                    continue
                },
            };
        }

        Ok(flags)
    }
}


/// A calendar collection: its name, where it lives, and what it can hold
#[derive(Clone, Debug, PartialEq)]
pub struct CalendarRef {
    name: Option<String>,
    url: Url,
    supported_components: SupportedComponents,
}

impl CalendarRef {
    pub fn new(name: Option<String>, url: Url, supported_components: SupportedComponents) -> Self {
        Self { name, url, supported_components }
    }

    /// The display name, as given by the server (if any)
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The display name, or a placeholder when the server gave none
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unnamed)")
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether this collection can contain VEVENTs
    pub fn holds_events(&self) -> bool {
        self.supported_components.contains(SupportedComponents::EVENT)
    }
}


/// Keep the calendars whose name is in `wanted` (case-insensitive). An empty `wanted` keeps everything.
///
/// `wanted` must already be lower-cased, as provided by [`Config::calendar_names`](crate::config::Config::calendar_names).
pub fn filter_calendars(calendars: Vec<CalendarRef>, wanted: &[String]) -> Vec<CalendarRef> {
    if wanted.is_empty() {
        return calendars;
    }

    calendars.into_iter()
        .filter(|cal| {
            let name = cal.name().unwrap_or("").to_lowercase();
            let keep = wanted.iter().any(|w| *w == name);
            if keep == false {
                log::debug!("Calendar {} is not in the name filter, skipping it", cal.display_name());
            }
            keep
        })
        .collect()
}
