use jiff::{Timestamp, civil::Date, tz::TimeZone};

pub fn now_sec() -> i64 {
    Timestamp::now().as_second()
}

pub fn today() -> Date {
    jiff::Zoned::now().date()
}

pub fn format_timestamp(sec: i64) -> String {
    Timestamp::from_second(sec).map(|t| t.to_string()).unwrap_or_default()
}

/// Accepts a plain `YYYY-MM-DD` date or a full RFC 3339 timestamp (taken in UTC).
pub fn parse_date(value: &str) -> Option<Date> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(date) = value.parse::<Date>() {
        return Some(date);
    }
    value.parse::<Timestamp>().ok().map(|ts| ts.to_zoned(TimeZone::UTC).date())
}

/// Half-open `[start, end)` range covering one calendar month.
pub fn month_range(year: i16, month: i8) -> Option<(Date, Date)> {
    let start = Date::new(year, month, 1).ok()?;
    let end = start.last_of_month().tomorrow().ok()?;
    Some((start, end))
}

/// Half-open `[start, end)` range covering one calendar year.
pub fn year_range(year: i16) -> Option<(Date, Date)> {
    let start = Date::new(year, 1, 1).ok()?;
    let end = Date::new(year.checked_add(1)?, 1, 1).ok()?;
    Some((start, end))
}

pub fn extract_year(date: Option<&str>) -> Option<i32> {
    let head = date?.get(..4)?;
    head.parse().ok()
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn parses_plain_and_timestamp_dates() {
        assert_eq!(parse_date("2024-03-09"), Some(date(2024, 3, 9)));
        assert_eq!(parse_date("2024-03-09T23:30:00Z"), Some(date(2024, 3, 9)));
        assert_eq!(parse_date("  "), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2024-02-30"), None);
    }

    #[test]
    fn month_range_rolls_over_year_end() {
        assert_eq!(month_range(2024, 12), Some((date(2024, 12, 1), date(2025, 1, 1))));
        assert_eq!(month_range(2024, 2), Some((date(2024, 2, 1), date(2024, 3, 1))));
        assert_eq!(month_range(2024, 13), None);
    }

    #[test]
    fn year_range_is_half_open() {
        assert_eq!(year_range(1999), Some((date(1999, 1, 1), date(2000, 1, 1))));
    }

    #[test]
    fn extracts_leading_year() {
        assert_eq!(extract_year(Some("1999-03-31")), Some(1999));
        assert_eq!(extract_year(Some("")), None);
        assert_eq!(extract_year(Some("abcd-01-01")), None);
        assert_eq!(extract_year(None), None);
    }
}
