use chrono::{DateTime, NaiveDate, Utc};
use proptest::prelude::*;

/// Strings with surrounding whitespace, unicode and the odd control character
pub fn arb_messy_string() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 _-]{0,24}",
        "\\PC{0,16}",
        "[ \t]{0,3}[a-z]{1,8}[ \t\n]{0,3}",
        Just(String::new()),
    ]
}

/// Generates an arbitrary DateTime<Utc> within 2020-01-01 to 2030-01-01
pub fn arb_datetime_utc() -> impl Strategy<Value = DateTime<Utc>> {
    (1_577_836_800i64..1_893_456_000i64).prop_map(|ts| DateTime::from_timestamp(ts, 0).unwrap())
}

/// A day in the same range as `arb_datetime_utc`
pub fn arb_date() -> impl Strategy<Value = NaiveDate> {
    arb_datetime_utc().prop_map(|dt| dt.date_naive())
}

/// One of a handful of subject names, so aggregations see repeats
pub fn arb_subject() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Math", "Physics", "History", "Biology"]).prop_map(str::to_string)
}

proptest! {
    #[test]
    fn prop_dates_in_range(date in arb_date()) {
        prop_assert!(date >= NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        prop_assert!(date < NaiveDate::from_ymd_opt(2030, 1, 2).unwrap());
    }
}
