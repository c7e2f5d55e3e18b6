use chrono::{DateTime, Utc};

/// Text for the bell badge; `None` hides the badge.
pub fn badge_text(unread: usize) -> Option<String> {
    match unread {
        0 => None,
        1..=99 => Some(unread.to_string()),
        _ => Some("99+".to_owned()),
    }
}

/// Relative age of `timestamp`, falling back to the calendar date after a
/// week. Timestamps in the future read as "Just now".
pub fn time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - timestamp).num_seconds();

    match seconds {
        ..60 => "Just now".to_owned(),
        60..3_600 => format!("{} min ago", seconds / 60),
        3_600..86_400 => format!("{}h ago", seconds / 3_600),
        86_400..604_800 => format!("{}d ago", seconds / 86_400),
        _ => timestamp.format("%-d %b %Y").to_string(),
    }
}
