use chrono::{DateTime, Datelike, NaiveDate, Utc};

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp and keeps the calendar date.
/// Years are limited to 0001..=9999 so stored dates stay ten-character strings
/// that order lexicographically.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .filter(|d| (1..=9999).contains(&d.year()))
}

/// `HH:MM`, 24h clock.
pub fn is_clock_time(raw: &str) -> bool {
    let Some((h, m)) = raw.split_once(':') else {
        return false;
    };
    let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(h) || !two_digits(m) {
        return false;
    }
    matches!((h.parse::<u8>(), m.parse::<u8>()), (Ok(h), Ok(m)) if h < 24 && m < 60)
}

/// Deserializers for form payloads, where blank strings mean "not set".
pub mod lenient {
    use std::{fmt::Display, str::FromStr};

    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn date<'de, D>(de: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(de)? {
            Some(s) if !s.trim().is_empty() => super::parse_date(&s)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid date: {s}"))),
            _ => Ok(None),
        }
    }

    pub fn parsed<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: Display,
    {
        match Option::<String>::deserialize(de)? {
            Some(s) if !s.trim().is_empty() => s.parse().map(Some).map_err(D::Error::custom),
            _ => Ok(None),
        }
    }
}
