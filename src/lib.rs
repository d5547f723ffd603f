//! This crate builds the agenda of a day from a CalDAV account, and emails it.
//!
//! It provides a CalDAV client in the [`client`] module, that only needs to read calendars and search for events. \
//! Anything that implements [`CalDavSource`](traits::CalDavSource) can be used instead, e.g. the in-memory `MemorySource` that the `mocks` feature provides.
//!
//! A run goes through the following steps:
//! * [`Config`](config::Config) loads the settings from the environment
//! * [`collect_agenda`](runner::collect_agenda) discovers the calendars, detects the timezone of the account and fetches the events of the day
//! * [`build_agenda`](agenda::build_agenda) orders these events into an [`AgendaDocument`](agenda::AgendaDocument)
//! * [`render`](render::render) turns it into an HTML email with a plain-text fallback
//! * [`deliver`](mailer::deliver) sends it (or prints it, in preview mode)

pub mod traits;
pub mod error;
pub use error::AgendaError;
pub mod config;
pub use config::Config;

pub mod calendar;
mod event;
pub use event::{Event, EventTime};
pub mod ical;
pub mod agenda;

pub mod client;
pub mod memory;
pub mod mock_behaviour;

pub mod runner;
pub mod render;
pub mod mailer;

pub mod utils;
