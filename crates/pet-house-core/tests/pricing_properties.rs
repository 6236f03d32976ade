//! Property tests for the stay calculator.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use pet_house_core::calendar::{days_between, is_valid_date_range, total_price};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

fn instant() -> impl Strategy<Value = DateTime<Utc>> {
    // 2000-01-01 .. 2100-01-01
    (946_684_800_000i64..4_102_444_800_000i64)
        .prop_map(|ms| Utc.timestamp_millis_opt(ms).single().unwrap())
}

proptest! {
    #[test]
    fn days_is_ceiling_of_span(check_in in instant(), span_ms in 1i64..(400 * MS_PER_DAY)) {
        let check_out = check_in + Duration::milliseconds(span_ms);
        let days = days_between(Some(check_in), Some(check_out));

        prop_assert!(days >= 1);
        prop_assert!((days - 1) * MS_PER_DAY < span_ms);
        prop_assert!(span_ms <= days * MS_PER_DAY);
    }

    #[test]
    fn whole_days_are_exact(check_in in instant(), n in 0i64..400) {
        let check_out = check_in + Duration::days(n);
        prop_assert_eq!(days_between(Some(check_in), Some(check_out)), n);
    }

    #[test]
    fn missing_side_is_zero(at in instant()) {
        prop_assert_eq!(days_between(Some(at), None), 0);
        prop_assert_eq!(days_between(None, Some(at)), 0);
    }

    #[test]
    fn total_never_below_one_day(price in 0.0f64..1000.0, days in -30i64..400) {
        let total = total_price(price, days);
        prop_assert!(total >= price);
        prop_assert_eq!(total, price * days.max(1) as f64);
    }

    #[test]
    fn valid_range_matches_ordering(a in instant(), b in instant()) {
        prop_assert_eq!(is_valid_date_range(Some(a), Some(b)), b > a);
        if is_valid_date_range(Some(a), Some(b)) {
            prop_assert!(days_between(Some(a), Some(b)) >= 1);
        }
    }
}
