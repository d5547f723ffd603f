//! This module handles conversion from iCal data to internal representations
//!
//! It is a wrapper around the `ical` crate, that only splits iCal files into raw properties

mod parser;
pub use parser::{parse_events, parse_timezone_id, parse_duration, unescape_text};
