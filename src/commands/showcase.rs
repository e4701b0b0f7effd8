//! Read-only views of the site sections built from the synced resources.

use chrono::{Local, NaiveDateTime};
use std::collections::BTreeMap;
use tfs_core::models::{series_title, sort_upcoming, split_roster};
use tfs_core::{Event, Luminary};
use tfs_site::config::Config;

use super::{open_store, CommandError};

/// Prints upcoming events in date order with countdowns, then past events
/// grouped by series.
pub async fn upcoming(config: &Config) -> Result<(), CommandError> {
    let store = open_store::<Event>(config).await;
    let events = store.items();
    print!("{}", render_events(&events, Local::now().naive_local()));
    Ok(())
}

/// Prints leadership, then faculty.
pub async fn roster(config: &Config) -> Result<(), CommandError> {
    let store = open_store::<Luminary>(config).await;
    let members = store.items();
    let roster = split_roster(&members);

    for (heading, group) in [("Leadership", &roster.leadership), ("Faculty", &roster.faculty)] {
        println!("{}", heading);
        println!("{}", "=".repeat(heading.len()));
        if group.is_empty() {
            println!("  (none)");
        }
        for member in group.iter() {
            println!("  {} - {}", member.name, member.title);
        }
        println!();
    }
    Ok(())
}

fn render_events(events: &[Event], now: NaiveDateTime) -> String {
    let mut out = String::new();

    let (past, upcoming): (Vec<Event>, Vec<Event>) =
        events.iter().cloned().partition(|e| e.series.is_some());

    out.push_str("Upcoming Events\n===============\n");
    if upcoming.is_empty() {
        out.push_str("  (none scheduled)\n");
    }
    for event in sort_upcoming(&upcoming) {
        let countdown = match event.countdown(now) {
            Some(c) => format!("in {}d {}h {}m", c.days, c.hours, c.minutes),
            None => "date TBA".to_string(),
        };
        out.push_str(&format!(
            "  {} {}  {} @ {} ({})\n",
            event.date, event.time, event.title, event.location, countdown
        ));
    }

    let mut by_series: BTreeMap<&str, Vec<&Event>> = BTreeMap::new();
    for event in &past {
        if let Some(series) = event.series.as_deref() {
            by_series.entry(series).or_default().push(event);
        }
    }

    if !by_series.is_empty() {
        out.push_str("\nPast Events\n===========\n");
    }
    for (series, events) in by_series {
        let coming_soon = events.iter().all(|e| e.coming_soon);
        if coming_soon {
            out.push_str(&format!("  {} (coming soon)\n", series_title(series)));
            continue;
        }
        out.push_str(&format!("  {}\n", series_title(series)));
        for event in events.iter().filter(|e| !e.coming_soon) {
            out.push_str(&format!("    - {}\n", event.title));
        }
    }

    out
}
