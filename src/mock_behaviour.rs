//! This module provides ways to tweak mocked sources, so that they can return errors on some tests
#![cfg(any(test, feature = "mocks"))]

use crate::error::AgendaError;

/// The kind of failure a mocked operation reports
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MockFailure {
    Authentication,
    Connectivity,
}

impl Default for MockFailure {
    fn default() -> Self {
        MockFailure::Connectivity
    }
}

/// This stores some behaviour tweaks, that describe how a mocked instance will behave during a given test
///
/// So that a functions fails _n_ times after _m_ initial successes, set `(m, n)` for the suited parameter
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// What the failures look like
    pub failure: MockFailure,

    // From the CalDavSource trait
    pub list_calendars_behaviour: (u32, u32),
    pub calendar_timezone_behaviour: (u32, u32),
    pub search_events_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// All items will fail at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            failure: MockFailure::default(),
            list_calendars_behaviour: (0, n_fails),
            calendar_timezone_behaviour: (0, n_fails),
            search_events_behaviour: (0, n_fails),
        }
    }

    pub fn can_list_calendars(&mut self) -> Result<(), AgendaError> {
        decrement(&mut self.list_calendars_behaviour, "list_calendars", self.failure)
    }
    pub fn can_get_calendar_timezone(&mut self) -> Result<(), AgendaError> {
        decrement(&mut self.calendar_timezone_behaviour, "calendar_timezone", self.failure)
    }
    pub fn can_search_events(&mut self) -> Result<(), AgendaError> {
        decrement(&mut self.search_events_behaviour, "search_events", self.failure)
    }
}


/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str, failure: MockFailure) -> Result<(), AgendaError> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 = value.0 - 1;
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else {
        if remaining_failures > 0 {
            value.1 = value.1 - 1;
            log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
            let msg = format!("Mocked behaviour requires this {} to fail this time. ({:?})", descr, value);
            Err(match failure {
                MockFailure::Authentication => AgendaError::Authentication(msg),
                MockFailure::Connectivity => AgendaError::Connectivity(msg),
            })
        } else {
            log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mock_behaviour() {
        let mut ok = MockBehaviour::new();
        assert!(ok.can_list_calendars().is_ok());
        assert!(ok.can_list_calendars().is_ok());
        assert!(ok.can_search_events().is_ok());
        assert!(ok.can_get_calendar_timezone().is_ok());

        let mut now = MockBehaviour::fail_now(2);
        assert!(now.can_list_calendars().is_err());
        assert!(now.can_search_events().is_err());
        assert!(now.can_search_events().is_err());
        assert!(now.can_list_calendars().is_err());
        assert!(now.can_list_calendars().is_ok());
        assert!(now.can_list_calendars().is_ok());
        assert!(now.can_search_events().is_ok());

        let mut custom = MockBehaviour{
            failure: MockFailure::Authentication,
            list_calendars_behaviour: (0,1),
            search_events_behaviour: (1,3),
            ..MockBehaviour::default()
        };
        assert!(matches!(custom.can_list_calendars(), Err(AgendaError::Authentication(_))));
        assert!(custom.can_list_calendars().is_ok());
        assert!(custom.can_search_events().is_ok());
        assert!(custom.can_search_events().is_err());
        assert!(custom.can_search_events().is_err());
        assert!(custom.can_search_events().is_err());
        assert!(custom.can_search_events().is_ok());
    }
}
