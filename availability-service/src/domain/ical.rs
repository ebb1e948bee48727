//! iCalendar (RFC 5545) export of a rendered availability calendar.
//!
//! One VEVENT per contiguous run of equal-status booked/blocked days.
//! All-day events use DATE values, so DTEND is exclusive: it names the day
//! after the last blocked day. Content lines use CRLF endings and are folded
//! at 75 octets.

use chrono::{DateTime, NaiveDate, Utc};
use shared::types::{CalendarDay, DayStatus, ListingRef};

/// Maximum content-line length in octets (not characters).
const MAX_LINE_OCTETS: usize = 75;

const PROD_ID: &str = "-//availability-service//calendar-export//EN";

/// Escapes TEXT property values: backslash, comma, semicolon, and newline.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Folds a content line at 75 octets by inserting CRLF + space, splitting
/// only at UTF-8 character boundaries.
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut current_len = 0;
    let mut first_segment = true;

    for c in line.chars() {
        let char_len = c.len_utf8();
        // Continuation lines lose one octet to the leading space.
        let limit = if first_segment {
            MAX_LINE_OCTETS
        } else {
            MAX_LINE_OCTETS - 1
        };

        if current_len + char_len > limit {
            out.push_str("\r\n ");
            current_len = 1;
            first_segment = false;
        }

        out.push(c);
        current_len += char_len;
    }

    out
}

/// A contiguous same-status run of unavailable days.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UnavailableRun {
    status: DayStatus,
    start: NaiveDate,
    end: NaiveDate,
    detail: Option<String>,
}

/// Groups consecutive booked/blocked days of the same status into runs,
/// keeping the first day's detail for the whole run.
fn unavailable_runs(days: &[CalendarDay]) -> Vec<UnavailableRun> {
    let mut runs: Vec<UnavailableRun> = Vec::new();

    for day in days {
        if day.status == DayStatus::Available {
            continue;
        }
        match runs.last_mut() {
            Some(run)
                if run.status == day.status && run.end.succ_opt() == Some(day.date) =>
            {
                run.end = day.date;
            }
            _ => runs.push(UnavailableRun {
                status: day.status,
                start: day.date,
                end: day.date,
                detail: day.detail.clone(),
            }),
        }
    }

    runs
}

fn date_value(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Serializes the rendered calendar for one listing into an iCalendar
/// document. `generated_at` feeds DTSTAMP so exports are reproducible in
/// tests.
pub fn render_ical(listing: ListingRef, days: &[CalendarDay], generated_at: DateTime<Utc>) -> String {
    let dtstamp = generated_at.format("%Y%m%dT%H%M%SZ").to_string();

    let mut lines: Vec<String> = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{PROD_ID}"),
        "CALSCALE:GREGORIAN".to_string(),
    ];

    for run in unavailable_runs(days) {
        let summary = match (&run.status, run.detail.as_deref()) {
            (DayStatus::Booked, Some(label)) => format!("Booked: {label}"),
            (DayStatus::Booked, None) => "Booked".to_string(),
            (_, Some(label)) => format!("Blocked: {label}"),
            (_, None) => "Blocked".to_string(),
        };
        // DTEND is exclusive for DATE values: the day after the last
        // inclusive unavailable day.
        let dtend = run
            .end
            .succ_opt()
            .map_or_else(|| date_value(run.end), date_value);

        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!(
            "UID:{}-{}-{}@availability",
            listing.id,
            date_value(run.start),
            match run.status {
                DayStatus::Booked => "booked",
                _ => "blocked",
            }
        ));
        lines.push(format!("DTSTAMP:{dtstamp}"));
        lines.push(format!("DTSTART;VALUE=DATE:{}", date_value(run.start)));
        lines.push(format!("DTEND;VALUE=DATE:{dtend}"));
        lines.push(format!("SUMMARY:{}", escape_text(&summary)));
        lines.push("END:VEVENT".to_string());
    }

    lines.push("END:VCALENDAR".to_string());

    let mut out = String::new();
    for line in lines {
        out.push_str(&fold_line(&line));
        out.push_str("\r\n");
    }
    out
}
