use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::resource::{Resource, ResourceKind};

/// An upcoming or past event. Past events are grouped by `series`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub id: String,
    pub title: String,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    /// Start time, either "10:30 AM" or "14:00"
    pub time: String,
    pub location: String,
    pub description: String,
    pub registration_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    pub coming_soon: bool,
}

/// Time remaining until an event starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl Event {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }

    /// Minutes after midnight. Unparseable times count as midnight.
    pub fn start_minutes(&self) -> u32 {
        parse_time_of_day(&self.time).unwrap_or_else(|| {
            tracing::warn!("Failed to parse time string: {}", self.time);
            0
        })
    }

    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        let minutes = self.start_minutes();
        let time = NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)?;
        Some(self.parsed_date()?.and_time(time))
    }

    /// Countdown from `now`; zero once the event has started. `None` when
    /// the date cannot be parsed.
    pub fn countdown(&self, now: NaiveDateTime) -> Option<Countdown> {
        let remaining = self.starts_at()? - now;
        let total = remaining.num_minutes().max(0);
        Some(Countdown {
            days: total / (24 * 60),
            hours: (total % (24 * 60)) / 60,
            minutes: total % 60,
        })
    }
}

impl Resource for Event {
    const KIND: ResourceKind = ResourceKind::Events;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.title
    }
}

/// Parses "10 AM", "2:30 pm", "12:15am" or "14:05" into minutes after
/// midnight.
pub fn parse_time_of_day(input: &str) -> Option<u32> {
    let clean = input.trim().to_lowercase();

    let (clock, meridiem) = if let Some(rest) = clean.strip_suffix("am") {
        (rest.trim(), Some(false))
    } else if let Some(rest) = clean.strip_suffix("pm") {
        (rest.trim(), Some(true))
    } else {
        (clean.as_str(), None)
    };

    let (hours, minutes) = match clock.split_once(':') {
        Some((h, m)) => (h.trim().parse::<u32>().ok()?, m.trim().parse::<u32>().ok()?),
        None => (clock.parse::<u32>().ok()?, 0),
    };
    if minutes >= 60 {
        return None;
    }

    let hours = match meridiem {
        Some(pm) => {
            if !(1..=12).contains(&hours) {
                return None;
            }
            match (pm, hours) {
                (false, 12) => 0,
                (true, 12) => 12,
                (true, h) => h + 12,
                (false, h) => h,
            }
        }
        None if hours < 24 => hours,
        None => return None,
    };

    Some(hours * 60 + minutes)
}

/// Orders events by date, then start time. Events with an unreadable date
/// go last.
pub fn sort_upcoming(events: &[Event]) -> Vec<&Event> {
    let mut sorted: Vec<&Event> = events.iter().collect();
    sorted.sort_by_cached_key(|e| {
        let date = e.parsed_date();
        (date.is_none(), date, e.start_minutes())
    });
    sorted
}

/// Display title for a past-event series id.
pub fn series_title(id: &str) -> &str {
    match id {
        "saturday-sessions" => "Saturday Sessions",
        "networking-events" => "Networking Events",
        "flagship-event" => "Flagship Conclave",
        other => other,
    }
}
