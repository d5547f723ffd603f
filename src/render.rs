//! Renders an agenda as an HTML email, with a plain-text fallback

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;

use crate::agenda::{AgendaDocument, AgendaEntry, EntryTime};

/// Shown in the HTML agenda of a day without events
pub const NO_EVENTS_HTML: &str = "Nothing scheduled — enjoy your free day! 🎉";
/// Shown in the plain-text agenda of a day without events
pub const NO_EVENTS_TEXT: &str = "Nothing scheduled. Enjoy your free day!";

const HTML_DESCRIPTION_MAX_CHARS: usize = 200;
const TEXT_DESCRIPTION_MAX_CHARS: usize = 150;

/// An agenda, ready to be sent
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedAgenda {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Render `agenda`. An empty `display_name` gives a generic greeting.
pub fn render(agenda: &AgendaDocument, display_name: &str) -> RenderedAgenda {
    RenderedAgenda {
        subject: subject(agenda.date()),
        html: render_html(agenda, display_name),
        text: render_text(agenda),
    }
}

pub fn subject(date: NaiveDate) -> String {
    format!("📅 Agenda for {}", date.format("%A %-d %b %Y"))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// e.g. `9:30 am`
fn format_time(dt: &DateTime<Tz>) -> String {
    dt.format("%-I:%M %p").to_string().to_lowercase()
}

/// e.g. `Sunday 15 March 2026`
fn format_date_long(date: NaiveDate) -> String {
    date.format("%A %-d %B %Y").to_string()
}

/// e.g. `Sun 15 Mar`
fn format_date_short(date: NaiveDate) -> String {
    date.format("%a %-d %b").to_string()
}

/// Take the first `max_chars` characters of `text`
fn take_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        None => text,
        Some((idx, _)) => &text[..idx],
    }
}

/// Trim, collapse runs of blank lines, and cut long descriptions at a word boundary
fn shorten_description(description: &str) -> String {
    let mut collapsed = String::with_capacity(description.len());
    let mut previous_newline = false;
    for c in description.trim().chars() {
        if c == '\n' {
            if previous_newline {
                continue;
            }
            previous_newline = true;
        } else {
            previous_newline = false;
        }
        collapsed.push(c);
    }

    if collapsed.chars().count() <= HTML_DESCRIPTION_MAX_CHARS {
        return collapsed;
    }
    let cut = take_chars(&collapsed, HTML_DESCRIPTION_MAX_CHARS);
    let cut = match cut.rfind(' ') {
        Some(idx) => &cut[..idx],
        None => cut,
    };
    format!("{}…", cut)
}

fn time_range(start: &DateTime<Tz>, end: &Option<DateTime<Tz>>, separator: &str) -> String {
    match end {
        Some(end) => format!("{}{}{}", format_time(start), separator, format_time(end)),
        None => format_time(start),
    }
}


fn render_entry_row(entry: &AgendaEntry, date: NaiveDate) -> String {
    let time_cell = match &entry.time {
        EntryTime::AllDay => format!(r#"
        <td style="padding: 14px 12px 14px 0; vertical-align: top; white-space: nowrap; color: #5f6368; font-size: 14px; width: 110px;">
            All day
        </td>
        <td style="padding: 14px 12px; vertical-align: top; white-space: nowrap; color: #5f6368; font-size: 14px; width: 100px;">
            {}
        </td>"#, escape_html(&format_date_short(date))),
        EntryTime::Timed { start, end } => {
            let time_html = match end {
                Some(end) => format!("{} –<br>{}", escape_html(&format_time(start)), escape_html(&format_time(end))),
                None => escape_html(&format_time(start)),
            };
            format!(r#"
        <td colspan="2" style="padding: 14px 12px 14px 0; vertical-align: top; white-space: nowrap; color: #5f6368; font-size: 14px; width: 210px;">
            {}
        </td>"#, time_html)
        },
    };

    let (bar_color, summary_color) = if entry.is_all_day() { ("#34a853", "#188038") } else { ("#4285f4", "#1a73e8") };
    let bar_cell = format!(r#"
    <td style="padding: 0; width: 4px; vertical-align: top;">
        <div style="width: 4px; background: {}; border-radius: 2px; min-height: 40px; height: 100%;"></div>
    </td>"#, bar_color);

    let mut details = Vec::new();
    details.push(format!(
        r#"<div style="font-size: 14px; color: {}; font-weight: 500;">{}</div>"#,
        summary_color, escape_html(&entry.summary)
    ));
    if let Some(location) = &entry.location {
        let query: String = url::form_urlencoded::byte_serialize(location.as_bytes()).collect();
        details.push(format!(
            r#"<div style="font-size: 13px; color: #5f6368; margin-top: 3px;">📍 <a href="https://maps.google.com/?q={}" style="color: #5f6368; text-decoration: none;">{}</a></div>"#,
            escape_html(&query), escape_html(location)
        ));
    }
    if let Some(description) = &entry.description {
        let description = escape_html(&shorten_description(description)).replace('\n', "<br>");
        details.push(format!(
            r#"<div style="font-size: 12px; color: #80868b; margin-top: 4px; line-height: 1.4;">{}</div>"#,
            description
        ));
    }
    details.push(format!(
        r#"<div style="font-size: 11px; color: #9aa0a6; margin-top: 4px;">{}</div>"#,
        escape_html(&entry.calendar)
    ));

    format!(r#"
    <tr style="border-bottom: 1px solid #e8eaed;">
        {}
        {}
        <td style="padding: 14px 0 14px 12px; vertical-align: top;">
            {}
        </td>
    </tr>"#, time_cell, bar_cell, details.join(""))
}

fn render_html(agenda: &AgendaDocument, display_name: &str) -> String {
    let greeting = if display_name.is_empty() {
        String::from("Here")
    } else {
        format!("{}, here", escape_html(display_name))
    };

    let rows = if agenda.entries().is_empty() {
        format!(r#"
        <tr>
          <td colspan="4" style="padding: 24px 16px; text-align: center; color: #5f6368; font-size: 14px; font-style: italic;">
            {}
          </td>
        </tr>"#, NO_EVENTS_HTML)
    } else {
        agenda.entries().iter()
            .map(|entry| render_entry_row(entry, agenda.date()))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let calendars = agenda.calendars_used().iter()
        .map(|name| escape_html(name))
        .collect::<Vec<_>>()
        .join(", ");

    format!(r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1.0"></head>
<body style="margin: 0; padding: 0; background: #ffffff; font-family: Google Sans, Roboto, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; color: #202124;">
  <table role="presentation" width="100%" cellpadding="0" cellspacing="0" style="max-width: 680px; margin: 0 auto; padding: 0 16px;">
    <tr>
      <td style="padding: 32px 0 0 0;">
        <div style="font-size: 28px; color: #202124; font-weight: 400; letter-spacing: -0.5px;">
          📅 <span style="color: #4285f4;">Daily</span> <span style="color: #202124;">Agenda</span>
        </div>
      </td>
    </tr>
    <tr>
      <td style="padding: 4px 0 0 0;">
        <div style="font-size: 14px; color: #5f6368;">
          {greeting} is your schedule:
        </div>
      </td>
    </tr>
    <tr>
      <td style="padding: 28px 0 16px 0;">
        <div style="font-size: 22px; color: #202124; font-weight: 500;">
          {date}
        </div>
      </td>
    </tr>
    <tr>
      <td>
        <table role="presentation" width="100%" cellpadding="0" cellspacing="0" style="border-top: 1px solid #e8eaed;">
          {rows}
        </table>
      </td>
    </tr>
    <tr>
      <td style="padding: 32px 0 16px 0; border-top: 1px solid #e8eaed;">
        <div style="font-size: 12px; color: #9aa0a6; line-height: 1.6;">
          You are receiving this email at {timezone} time because you are subscribed to daily agendas
          for the following calendars: {calendars}.<br><br>
          Sent by daily-agenda
        </div>
      </td>
    </tr>
  </table>
</body>
</html>"#,
        greeting = greeting,
        date = escape_html(&format_date_long(agenda.date())),
        rows = rows,
        timezone = escape_html(agenda.timezone().name()),
        calendars = calendars,
    )
}

fn render_text(agenda: &AgendaDocument) -> String {
    let indent = " ".repeat(26);
    let mut lines = vec![
        String::from("Daily Agenda"),
        "=".repeat(50),
        String::new(),
        format_date_long(agenda.date()),
        "-".repeat(40),
        String::new(),
    ];

    if agenda.entries().is_empty() {
        lines.push(format!("  {}", NO_EVENTS_TEXT));
    }
    for entry in agenda.entries() {
        match &entry.time {
            EntryTime::AllDay => lines.push(format!("  All day     {}", entry.summary)),
            EntryTime::Timed { start, end } => {
                lines.push(format!("  {:<22} {}", time_range(start, end, " – "), entry.summary));
            },
        }
        if let Some(location) = &entry.location {
            lines.push(format!("{} 📍 {}", indent, location));
        }
        if let Some(description) = &entry.description {
            lines.push(format!("{} {}", indent, take_chars(description.trim(), TEXT_DESCRIPTION_MAX_CHARS)));
        }
        lines.push(format!("{} [{}]", indent, entry.calendar));
        lines.push(String::new());
    }

    lines.push(String::new());
    lines.push(format!("Timezone: {}", agenda.timezone().name()));
    lines.push(String::new());
    lines.join("\n")
}
