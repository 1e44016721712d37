//! Calendar-day arithmetic in the family's local timezone.
//!
//! Every date here is a local calendar date (`NaiveDate`). The only place an
//! instant is turned into a date is [`local_date_at`], which converts through
//! the family timezone, never through UTC.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use shared::{WeekDay, WeekdayName};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// The local calendar date of `instant` in `tz`.
pub fn local_date_at(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Get "today" in the given timezone
pub fn today_in_tz(tz: Tz) -> NaiveDate {
    local_date_at(Utc::now(), tz)
}

/// Monday on or before `date`. A Sunday belongs to the week that started six days earlier.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Date of `name` within the Monday-start week containing `reference`.
pub fn date_for_weekday(name: WeekdayName, reference: NaiveDate) -> NaiveDate {
    start_of_week(reference) + Duration::days(name.days_from_monday() as i64)
}

pub fn weekday_name(date: NaiveDate) -> WeekdayName {
    match date.weekday() {
        Weekday::Mon => WeekdayName::Monday,
        Weekday::Tue => WeekdayName::Tuesday,
        Weekday::Wed => WeekdayName::Wednesday,
        Weekday::Thu => WeekdayName::Thursday,
        Weekday::Fri => WeekdayName::Friday,
        Weekday::Sat => WeekdayName::Saturday,
        Weekday::Sun => WeekdayName::Sunday,
    }
}

/// `YYYY-MM-DD` from the local year, month and day.
pub fn format_local_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_local_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// The seven days, Monday through Sunday, of the week containing `reference`.
pub fn week_of(reference: NaiveDate, today: NaiveDate) -> Vec<WeekDay> {
    WeekdayName::ALL
        .iter()
        .map(|name| {
            let date = date_for_weekday(*name, reference);
            WeekDay {
                name: *name,
                date,
                is_today: date == today,
            }
        })
        .collect()
}
