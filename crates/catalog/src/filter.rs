//! Candidate filter: category, time window and location.
//!
//! The filter is applied by the catalog before any scoring happens. Time
//! windows are resolved against a caller-supplied instant so that the catalog
//! never reads the wall clock itself.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::types::{CategoryLabel, Event};

/// Named time windows understood by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeWindow {
    Today,
    Tomorrow,
    ThisWeek,
    ThisWeekend,
    NextWeek,
}

impl TimeWindow {
    /// Half-open `[start, end)` range of this window relative to `now` (UTC).
    ///
    /// Weeks start on Monday; the weekend runs from Saturday 00:00 until the
    /// following Monday 00:00.
    pub fn bounds(self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let week_start =
            today - Duration::days(i64::from(now.weekday().num_days_from_monday()));

        match self {
            TimeWindow::Today => (today, today + Duration::days(1)),
            TimeWindow::Tomorrow => (today + Duration::days(1), today + Duration::days(2)),
            TimeWindow::ThisWeek => (week_start, week_start + Duration::days(7)),
            TimeWindow::ThisWeekend => (
                week_start + Duration::days(5),
                week_start + Duration::days(7),
            ),
            TimeWindow::NextWeek => (
                week_start + Duration::days(7),
                week_start + Duration::days(14),
            ),
        }
    }

    /// Whether `instant` falls inside this window.
    pub fn contains(self, instant: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let (start, end) = self.bounds(now);
        instant >= start && instant < end
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::Today => "Today",
            TimeWindow::Tomorrow => "Tomorrow",
            TimeWindow::ThisWeek => "This Week",
            TimeWindow::ThisWeekend => "This Weekend",
            TimeWindow::NextWeek => "Next Week",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeWindow {
    type Err = CatalogError;

    /// Accepts "This Week", "this-week", "this_week" and "thisweek" alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "today" => Ok(TimeWindow::Today),
            "tomorrow" => Ok(TimeWindow::Tomorrow),
            "thisweek" => Ok(TimeWindow::ThisWeek),
            "thisweekend" => Ok(TimeWindow::ThisWeekend),
            "nextweek" => Ok(TimeWindow::NextWeek),
            _ => Err(CatalogError::InvalidValue {
                field: "time".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Optional restrictions on which events are candidates.
///
/// An empty filter (the `Default`) matches every event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Category label, compared case-insensitively
    pub category: Option<CategoryLabel>,
    pub time: Option<TimeWindow>,
    /// Substring of the event location, compared case-insensitively
    pub near: Option<String>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<CategoryLabel>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_time(mut self, time: TimeWindow) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_near(mut self, near: impl Into<String>) -> Self {
        self.near = Some(near.into());
        self
    }

    /// Check one event against the filter.
    ///
    /// # Arguments
    /// * `event` - The event to test
    /// * `categories` - The event's category labels
    /// * `now` - Instant the time window is resolved against
    pub fn matches(&self, event: &Event, categories: &[CategoryLabel], now: DateTime<Utc>) -> bool {
        if let Some(wanted) = &self.category
            && !categories.iter().any(|c| c.eq_ignore_ascii_case(wanted))
        {
            return false;
        }

        if let Some(window) = self.time
            && !window.contains(event.start_time, now)
        {
            return false;
        }

        if let Some(near) = &self.near
            && !event
                .location
                .to_lowercase()
                .contains(&near.to_lowercase())
        {
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // Wednesday
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 16, 15, 30, 0).unwrap()
    }

    #[test]
    fn test_parse_time_window_labels() {
        assert_eq!("Today".parse::<TimeWindow>().unwrap(), TimeWindow::Today);
        assert_eq!("This Week".parse::<TimeWindow>().unwrap(), TimeWindow::ThisWeek);
        assert_eq!("this-weekend".parse::<TimeWindow>().unwrap(), TimeWindow::ThisWeekend);
        assert_eq!("NEXT_WEEK".parse::<TimeWindow>().unwrap(), TimeWindow::NextWeek);
        assert!("Someday".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn test_week_bounds_start_on_monday() {
        let (start, end) = TimeWindow::ThisWeek.bounds(now());
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 4, 14, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 4, 21, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_weekend_window() {
        let saturday = Utc.with_ymd_and_hms(2025, 4, 19, 20, 0, 0).unwrap();
        let friday = Utc.with_ymd_and_hms(2025, 4, 18, 20, 0, 0).unwrap();
        assert!(TimeWindow::ThisWeekend.contains(saturday, now()));
        assert!(!TimeWindow::ThisWeekend.contains(friday, now()));
    }

    #[test]
    fn test_tomorrow_excludes_today() {
        let later_today = Utc.with_ymd_and_hms(2025, 4, 16, 22, 0, 0).unwrap();
        let tomorrow = Utc.with_ymd_and_hms(2025, 4, 17, 9, 0, 0).unwrap();
        assert!(TimeWindow::Today.contains(later_today, now()));
        assert!(!TimeWindow::Tomorrow.contains(later_today, now()));
        assert!(TimeWindow::Tomorrow.contains(tomorrow, now()));
    }

    #[test]
    fn test_filter_matches_category_and_location() {
        let start = Utc.with_ymd_and_hms(2025, 4, 17, 19, 0, 0).unwrap();
        let event = Event::new(1, "Jazz Night", start).with_location("Main Green");
        let categories = vec!["Music".to_string()];

        assert!(EventFilter::new().matches(&event, &categories, now()));
        assert!(EventFilter::new().with_category("music").matches(&event, &categories, now()));
        assert!(!EventFilter::new().with_category("Art").matches(&event, &categories, now()));
        assert!(EventFilter::new().with_near("main green").matches(&event, &categories, now()));
        assert!(!EventFilter::new().with_near("Thayer").matches(&event, &categories, now()));
        assert!(EventFilter::new()
            .with_time(TimeWindow::Tomorrow)
            .matches(&event, &categories, now()));
        assert!(!EventFilter::new()
            .with_time(TimeWindow::NextWeek)
            .matches(&event, &categories, now()));
    }
}
