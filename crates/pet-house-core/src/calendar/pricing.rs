//! Date-range and pricing calculator for boarding stays.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Number of days from check-in to check-out, partial days rounded up.
///
/// Returns 0 when either side is missing. A check-out before check-in yields a
/// negative count; callers validate the range separately.
pub fn days_between(check_in: Option<DateTime<Utc>>, check_out: Option<DateTime<Utc>>) -> i64 {
    let (Some(check_in), Some(check_out)) = (check_in, check_out) else {
        return 0;
    };
    let ms = (check_out - check_in).num_milliseconds();
    // Integer division truncates toward zero, which is already the ceiling
    // for negative spans.
    let days = ms / MS_PER_DAY;
    if ms % MS_PER_DAY > 0 {
        days + 1
    } else {
        days
    }
}

/// [`days_between`] over form strings (`YYYY-MM-DD` or RFC 3339).
pub fn days_between_str(check_in: &str, check_out: &str) -> i64 {
    days_between(parse_date_input(check_in), parse_date_input(check_out))
}

/// Total boarding price. The minimum billable unit is one day.
pub fn total_price(price_per_day: f64, days: i64) -> f64 {
    price_per_day * days.max(1) as f64
}

/// Both dates present and check-out strictly after check-in.
pub fn is_valid_date_range(check_in: Option<DateTime<Utc>>, check_out: Option<DateTime<Utc>>) -> bool {
    match (check_in, check_out) {
        (Some(check_in), Some(check_out)) => check_out > check_in,
        _ => false,
    }
}

/// [`is_valid_date_range`] over form strings.
pub fn is_valid_date_range_str(check_in: &str, check_out: &str) -> bool {
    is_valid_date_range(parse_date_input(check_in), parse_date_input(check_out))
}

/// Whether `date` falls at or after midnight of `now`'s day in `now`'s time zone.
pub fn is_future_or_today<Tz: TimeZone>(date: Option<DateTime<Utc>>, now: &DateTime<Tz>) -> bool {
    match date {
        Some(date) => date.with_timezone(&now.timezone()).date_naive() >= now.date_naive(),
        None => false,
    }
}

/// [`is_future_or_today`] over a form string.
///
/// A bare `YYYY-MM-DD` is a calendar day, compared directly against today's
/// date rather than as UTC midnight.
pub fn is_future_or_today_str<Tz: TimeZone>(date: &str, now: &DateTime<Tz>) -> bool {
    let date = date.trim();
    if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return day >= now.date_naive();
    }
    is_future_or_today(parse_date_input(date), now)
}

/// Parse a date form field. Empty or malformed input is treated as absent.
pub fn parse_date_input(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(day.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    crate::models::parse_timestamp(s)
}

/// Format a price with two decimals.
pub fn format_price(price: f64) -> String {
    format!("{:.2}", price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    #[test]
    fn test_days_between_empty_inputs() {
        assert_eq!(days_between_str("", "2024-01-20"), 0);
        assert_eq!(days_between_str("2024-01-10", ""), 0);
        assert_eq!(days_between_str("", ""), 0);
        assert_eq!(days_between(None, None), 0);
    }

    #[test]
    fn test_days_between_whole_days() {
        assert_eq!(days_between_str("2024-01-10", "2024-01-15"), 5);
        assert_eq!(days_between_str("2024-01-10", "2024-01-17"), 7);
        assert_eq!(days_between_str("2024-01-28", "2024-02-05"), 8);
        assert_eq!(days_between_str("2024-01-10", "2024-01-10"), 0);
    }

    #[test]
    fn test_days_between_negative_is_not_clamped() {
        assert!(days_between_str("2024-01-20", "2024-01-10") < 0);
        assert_eq!(days_between_str("2024-01-20", "2024-01-10"), -10);
    }

    #[test]
    fn test_days_between_rounds_partial_days_up() {
        let check_in = parse_date_input("2024-01-10").unwrap();
        assert_eq!(days_between(Some(check_in), Some(check_in + Duration::hours(1))), 1);
        assert_eq!(days_between(Some(check_in), Some(check_in + Duration::hours(36))), 2);
        // ceil(-1.5) == -1
        assert_eq!(days_between(Some(check_in), Some(check_in - Duration::hours(36))), -1);
    }

    #[test]
    fn test_total_price() {
        assert_eq!(total_price(50.0, 0), 50.0);
        assert_eq!(total_price(50.0, 1), 50.0);
        assert_eq!(total_price(50.0, 5), 250.0);
        assert_eq!(total_price(75.0, 7), 525.0);
        assert_eq!(total_price(100.0, -5), 100.0);
        assert_eq!(total_price(0.0, 5), 0.0);
        assert!((total_price(29.99, 3) - 89.97).abs() < 1e-9);
    }

    #[test]
    fn test_is_valid_date_range() {
        assert!(!is_valid_date_range_str("", "2024-01-15"));
        assert!(!is_valid_date_range_str("2024-01-10", ""));
        assert!(!is_valid_date_range_str("2024-01-20", "2024-01-10"));
        assert!(!is_valid_date_range_str("2024-01-10", "2024-01-10"));
        assert!(is_valid_date_range_str("2024-01-10", "2024-01-15"));
    }

    #[test]
    fn test_is_future_or_today() {
        let tz = FixedOffset::east_opt(7 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 6, 15, 14, 30, 0).unwrap();

        assert!(!is_future_or_today_str("", &now));
        assert!(!is_future_or_today_str("2020-01-01", &now));
        assert!(is_future_or_today_str("2024-06-15", &now));
        assert!(is_future_or_today_str("2024-06-25", &now));

        // 17:30 UTC on the 14th is 00:30 on the 15th in UTC+7: counts as today.
        let just_after_midnight = Utc.with_ymd_and_hms(2024, 6, 14, 17, 30, 0).unwrap();
        assert!(is_future_or_today(Some(just_after_midnight), &now));
        let just_before_midnight = Utc.with_ymd_and_hms(2024, 6, 14, 16, 59, 0).unwrap();
        assert!(!is_future_or_today(Some(just_before_midnight), &now));
    }

    #[test]
    fn test_parse_date_input() {
        assert_eq!(parse_date_input("  "), None);
        assert_eq!(parse_date_input("2024-13-01"), None);
        assert_eq!(
            parse_date_input("2024-01-10"),
            Some(Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date_input("2024-01-10T08:00:00Z"),
            Some(Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(100.0), "100.00");
        assert_eq!(format_price(29.99), "29.99");
        assert_eq!(format_price(0.0), "0.00");
        assert_eq!(format_price(1000.5), "1000.50");
    }
}
