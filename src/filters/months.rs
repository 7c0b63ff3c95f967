use chrono::{Month, NaiveDate};

use super::FilterError;

/// Inclusive calendar-month range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MonthRange {
    /// Parses a `MMM yyyy` token such as `Jan 2024`. Full month names are
    /// accepted too.
    pub fn parse(token: &str) -> Result<Self, FilterError> {
        let bad = || FilterError::BadMonth(token.to_string());
        let mut parts = token.split_whitespace();
        let (Some(name), Some(year), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(bad());
        };
        let month: Month = name.parse().map_err(|_| bad())?;
        let year: i32 = year.parse().map_err(|_| bad())?;
        Self::of(year, month.number_from_month()).ok_or_else(bad)
    }

    pub fn of(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            start,
            end: next.pred_opt()?,
        })
    }

    pub fn contains(&self, d: NaiveDate) -> bool {
        self.start <= d && d <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_short_month() {
        let r = MonthRange::parse("Jan 2024").unwrap();
        assert_eq!(r.start, ymd(2024, 1, 1));
        assert_eq!(r.end, ymd(2024, 1, 31));
        assert!(r.contains(ymd(2024, 1, 31)));
        assert!(!r.contains(ymd(2024, 2, 1)));
    }

    #[test]
    fn leap_february_and_december() {
        assert_eq!(MonthRange::parse("Feb 2024").unwrap().end, ymd(2024, 2, 29));
        assert_eq!(MonthRange::parse("Feb 2023").unwrap().end, ymd(2023, 2, 28));
        assert_eq!(MonthRange::parse(" Dec 2023 ").unwrap().end, ymd(2023, 12, 31));
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "Jan", "Foo 2024", "Jan twenty", "Jan 2024 extra"] {
            assert!(MonthRange::parse(bad).is_err(), "{bad:?} should fail");
        }
    }
}
