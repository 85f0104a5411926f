//! Publication date normalization
//!
//! News pages print dates in whatever form the template likes: absolute
//! ("12 марта 2024", "Mar 12, 2024", "12.03.2024, 14:05"), machine readable
//! (RFC 3339 in a `datetime` attribute) or relative ("5 hours ago",
//! "вчера в 10:15"). [`normalize_date`] folds all of them into one
//! [`ArticleDate`], resolving relative forms against a caller-supplied `now`.
//!
//! Timestamps keep the wall-clock time printed by the publisher; offsets are
//! not converted.

use crate::article::record::{ArticleDate, DATE_FORMAT};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound};
use once_cell::sync::Lazy;
use regex::Regex;

/// Layouts tried verbatim before any pattern matching
const NAIVE_FORMATS: &[&str] = &[
    DATE_FORMAT,
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

static DOTTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})\.(\d{1,2})\.(\d{4})(?:,?\s+(?:в\s+)?(\d{1,2}):(\d{2}))?$")
        .expect("valid regex")
});

static DAY_MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})\s+(\p{L}+)\.?,?\s+(\d{4})(?:,?\s+(?:в\s+|at\s+)?(\d{1,2}):(\d{2}))?$")
        .expect("valid regex")
});

static MONTH_DAY_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\p{L}+)\.?\s+(\d{1,2}),?\s+(\d{4})(?:,?\s+(?:at\s+)?(\d{1,2}):(\d{2}))?$")
        .expect("valid regex")
});

static RELATIVE_EN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+|an?|one)\s+(second|sec|minute|min|hour|hr|day|week)s?\s+ago$")
        .expect("valid regex")
});

static RELATIVE_RU: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+)\s+)?(секунд\p{L}*|минут\p{L}*|час\p{L}*|день|дн\p{L}*|недел\p{L}*)\s+назад$")
        .expect("valid regex")
});

static DAY_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(today|yesterday|сегодня|вчера)(?:,?\s+(?:at\s+|в\s+)?(\d{1,2}):(\d{2}))?$")
        .expect("valid regex")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalizes a raw page date
///
/// # Arguments
///
/// * `raw` - The date as printed on the page or in a meta tag
/// * `now` - Reference time for relative forms ("2 hours ago", "yesterday")
///
/// # Returns
///
/// [`ArticleDate::Known`] truncated to whole seconds, or
/// [`ArticleDate::Unknown`] when the string matches no known layout.
/// Normalizing an already canonical string yields the same timestamp.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use newsreap::article::normalize_date;
///
/// let now = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap().and_hms_opt(18, 0, 0).unwrap();
/// assert_eq!(normalize_date("5 hours ago", now).to_string(), "2024-03-12 13:00:00");
/// assert_eq!(normalize_date("banana", now).to_string(), "unknown");
/// ```
pub fn normalize_date(raw: &str, now: NaiveDateTime) -> ArticleDate {
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        return ArticleDate::Unknown;
    }

    match parse_cleaned(&cleaned, now.trunc_subsecs(0)) {
        Some(datetime) => ArticleDate::Known(datetime.trunc_subsecs(0)),
        None => {
            tracing::debug!(raw, "Unrecognized date format");
            ArticleDate::Unknown
        }
    }
}

/// Collapses whitespace and drops the trailing Russian year marker
fn clean(raw: &str) -> String {
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
    let trimmed = collapsed
        .trim_end_matches("года")
        .trim_end_matches("г.")
        .trim_end_matches('г')
        .trim();
    trimmed.replace(" г.,", ",").replace(" г. ", " ")
}

fn parse_cleaned(s: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    for format in NAIVE_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(s, format) {
            return Some(datetime);
        }
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(s) {
        return Some(datetime.naive_local());
    }

    if let Ok(datetime) = DateTime::parse_from_rfc2822(s) {
        return Some(datetime.naive_local());
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }

    let lower = s.to_lowercase();

    if lower == "just now" || lower == "только что" || lower == "now" {
        return Some(now);
    }

    parse_dotted(&lower)
        .or_else(|| parse_day_month_year(&lower))
        .or_else(|| parse_month_day_year(&lower))
        .or_else(|| parse_relative(&lower, now))
        .or_else(|| parse_day_word(&lower, now))
}

fn parse_dotted(s: &str) -> Option<NaiveDateTime> {
    let caps = DOTTED.captures(s)?;
    let date = NaiveDate::from_ymd_opt(
        caps[3].parse().ok()?,
        caps[2].parse().ok()?,
        caps[1].parse().ok()?,
    )?;
    Some(date.and_time(time_of(caps.get(4), caps.get(5))?))
}

fn parse_day_month_year(s: &str) -> Option<NaiveDateTime> {
    let caps = DAY_MONTH_YEAR.captures(s)?;
    let month = month_from_name(&caps[2])?;
    let date = NaiveDate::from_ymd_opt(caps[3].parse().ok()?, month, caps[1].parse().ok()?)?;
    Some(date.and_time(time_of(caps.get(4), caps.get(5))?))
}

fn parse_month_day_year(s: &str) -> Option<NaiveDateTime> {
    let caps = MONTH_DAY_YEAR.captures(s)?;
    let month = month_from_name(&caps[1])?;
    let date = NaiveDate::from_ymd_opt(caps[3].parse().ok()?, month, caps[2].parse().ok()?)?;
    Some(date.and_time(time_of(caps.get(4), caps.get(5))?))
}

fn parse_relative(s: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let (amount, unit): (i64, String) = if let Some(caps) = RELATIVE_EN.captures(s) {
        let amount = match &caps[1] {
            "a" | "an" | "one" => 1,
            digits => digits.parse().ok()?,
        };
        (amount, caps[2].to_string())
    } else if let Some(caps) = RELATIVE_RU.captures(s) {
        let amount = match caps.get(1) {
            Some(digits) => digits.as_str().parse().ok()?,
            None => 1,
        };
        (amount, caps[2].to_string())
    } else {
        return None;
    };

    let unit_secs = unit_seconds(&unit)?;
    let delta = Duration::try_seconds(amount.checked_mul(unit_secs)?)?;
    now.checked_sub_signed(delta)
}

fn parse_day_word(s: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let caps = DAY_WORD.captures(s)?;
    let date = match &caps[1] {
        "today" | "сегодня" => now.date(),
        _ => now.date().pred_opt()?,
    };

    match (caps.get(2), caps.get(3)) {
        (Some(_), Some(_)) => Some(date.and_time(time_of(caps.get(2), caps.get(3))?)),
        // A bare "today" keeps the reference time
        _ if date == now.date() => Some(now),
        _ => Some(date.and_time(now.time())),
    }
}

fn time_of(hour: Option<regex::Match<'_>>, minute: Option<regex::Match<'_>>) -> Option<NaiveTime> {
    match (hour, minute) {
        (Some(hour), Some(minute)) => {
            NaiveTime::from_hms_opt(hour.as_str().parse().ok()?, minute.as_str().parse().ok()?, 0)
        }
        _ => Some(NaiveTime::MIN),
    }
}

fn unit_seconds(unit: &str) -> Option<i64> {
    let secs = if unit.starts_with("sec") || unit.starts_with("сек") {
        1
    } else if unit.starts_with("min") || unit.starts_with("мин") {
        60
    } else if unit.starts_with("h") || unit.starts_with("час") {
        3_600
    } else if unit.starts_with("day") || unit.starts_with("дн") || unit == "день" {
        86_400
    } else if unit.starts_with("week") || unit.starts_with("нед") {
        604_800
    } else {
        return None;
    };
    Some(secs)
}

/// Month number from an English or Russian month name, any grammatical case
fn month_from_name(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect();
    let month = match prefix.as_str() {
        "jan" | "янв" => 1,
        "feb" | "фев" => 2,
        "mar" | "мар" => 3,
        "apr" | "апр" => 4,
        "may" | "май" | "мая" => 5,
        "jun" | "июн" => 6,
        "jul" | "июл" => 7,
        "aug" | "авг" => 8,
        "sep" | "сен" => 9,
        "oct" | "окт" => 10,
        "nov" | "ноя" => 11,
        "dec" | "дек" => 12,
        _ => return None,
    };
    Some(month)
}
