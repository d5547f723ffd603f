//! Settings of an agenda run, read from the environment

use std::time::Duration;

use url::Url;

use crate::error::AgendaError;

pub const USERNAME_VAR: &str = "FASTMAIL_USERNAME";
pub const PASSWORD_VAR: &str = "FASTMAIL_APP_PASSWORD";
pub const DISPLAY_NAME_VAR: &str = "DISPLAY_NAME";
pub const SEND_TO_VAR: &str = "SEND_TO";
pub const CALENDAR_NAMES_VAR: &str = "CALENDAR_NAMES";
pub const CALDAV_URL_VAR: &str = "CALDAV_URL";
pub const SMTP_HOST_VAR: &str = "SMTP_HOST";
pub const SMTP_PORT_VAR: &str = "SMTP_PORT";
pub const TIMEOUT_VAR: &str = "AGENDA_TIMEOUT_SECS";

pub const DEFAULT_SMTP_HOST: &str = "smtp.fastmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 465;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a run needs to know about the account. Built once, never mutated.
#[derive(Clone, Debug)]
pub struct Config {
    username: String,
    password: String,
    display_name: String,
    send_to: String,
    calendar_names: Vec<String>,
    caldav_url: Url,
    smtp_host: String,
    smtp_port: u16,
    timeout: Duration,
}

impl Config {
    /// Load the settings from the process environment.
    ///
    /// A `.env` file in the current directory is read first, without overriding variables that are already set.
    pub fn from_env() -> Result<Self, AgendaError> {
        if let Err(err) = dotenvy::dotenv() {
            if err.not_found() == false {
                log::warn!("Ignoring unreadable .env file: {}", err);
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the settings from any key/value lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AgendaError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| value.trim().is_empty() == false);

        let username = non_empty(USERNAME_VAR);
        let password = non_empty(PASSWORD_VAR);
        let (username, password) = match (username, password) {
            (Some(u), Some(p)) => (u.trim().to_string(), p),
            (u, p) => {
                let mut missing = Vec::new();
                if u.is_none() { missing.push(USERNAME_VAR); }
                if p.is_none() { missing.push(PASSWORD_VAR); }
                return Err(AgendaError::Configuration(format!("missing required environment variable(s): {}", missing.join(", "))));
            },
        };

        let caldav_url = non_empty(CALDAV_URL_VAR)
            .unwrap_or_else(|| format!("https://caldav.fastmail.com/dav/calendars/user/{}/", username));
        let caldav_url = Url::parse(caldav_url.trim())
            .map_err(|err| AgendaError::Configuration(format!("invalid {} {:?}: {}", CALDAV_URL_VAR, caldav_url, err)))?;

        let smtp_port = match non_empty(SMTP_PORT_VAR) {
            None => DEFAULT_SMTP_PORT,
            Some(port) => port.trim().parse::<u16>()
                .map_err(|err| AgendaError::Configuration(format!("invalid {} {:?}: {}", SMTP_PORT_VAR, port, err)))?,
        };

        let timeout = match non_empty(TIMEOUT_VAR) {
            None => DEFAULT_TIMEOUT,
            Some(secs) => match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(AgendaError::Configuration(format!("invalid {} {:?}: expected a positive number of seconds", TIMEOUT_VAR, secs))),
            },
        };

        Ok(Self {
            display_name: non_empty(DISPLAY_NAME_VAR).map(|n| n.trim().to_string()).unwrap_or_default(),
            send_to: non_empty(SEND_TO_VAR).map(|s| s.trim().to_string()).unwrap_or_else(|| username.clone()),
            calendar_names: non_empty(CALENDAR_NAMES_VAR).map(|names| parse_calendar_names(&names)).unwrap_or_default(),
            smtp_host: non_empty(SMTP_HOST_VAR).map(|h| h.trim().to_string()).unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            username,
            password,
            caldav_url,
            smtp_port,
            timeout,
        })
    }

    pub fn username(&self) -> &str { &self.username }
    pub fn password(&self) -> &str { &self.password }
    /// The name used in the greeting. Empty means "no name"
    pub fn display_name(&self) -> &str { &self.display_name }
    pub fn send_to(&self) -> &str { &self.send_to }
    /// Lower-cased calendar names to keep. An empty slice means "every calendar"
    pub fn calendar_names(&self) -> &[String] { &self.calendar_names }
    pub fn caldav_url(&self) -> &Url { &self.caldav_url }
    pub fn smtp_host(&self) -> &str { &self.smtp_host }
    pub fn smtp_port(&self) -> u16 { self.smtp_port }
    /// Upper bound for every single network call
    pub fn timeout(&self) -> Duration { self.timeout }
}

fn parse_calendar_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|name| name.trim().to_lowercase())
        .filter(|name| name.is_empty() == false)
        .collect()
}
