use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::error::{EngineError, EngineResult};

/// Expected SPKI digests for a domain, plus an optional expiration date.
/// Digests are opaque base64 strings; adding one twice is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PinSet {
    digests: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiration_date: Option<NaiveDate>,
}

impl PinSet {
    pub fn new<I, S>(digests: I, expiration_date: Option<NaiveDate>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            digests: digests.into_iter().map(Into::into).collect(),
            expiration_date,
        }
    }

    pub fn digests(&self) -> &BTreeSet<String> {
        &self.digests
    }

    pub fn expiration_date(&self) -> Option<NaiveDate> {
        self.expiration_date
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    pub fn contains(&self, digest: &str) -> bool {
        self.digests.contains(digest)
    }

    /// Calendar-day granularity: the set is still valid for the whole of its
    /// expiration day and expires when the next day starts.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiration_date.map_or(false, |expiration| today > expiration)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.is_expired(now.date_naive())
    }
}

/// Strict `YYYY-MM-DD`. Unpadded fields, trailing text and impossible dates
/// are all rejected.
pub fn parse_expiration_date(raw: &str) -> EngineResult<NaiveDate> {
    let invalid = || EngineError::InvalidExpirationDate(raw.to_string());
    let bytes = raw.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return Err(invalid());
    }
    let all_digits = bytes
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 4 && *i != 7)
        .all(|(_, b)| b.is_ascii_digit());
    if !all_digits {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn duplicate_digests_are_idempotent() {
        let set = PinSet::new(["a", "b", "a"], None);
        assert_eq!(set.len(), 2);
        assert!(set.contains("a"));
        assert!(!set.contains("c"));
    }

    #[test]
    fn expires_the_day_after_expiration() {
        let set = PinSet::new(["a"], Some(day(2024, 3, 10)));
        assert!(!set.is_expired(day(2024, 3, 9)));
        assert!(!set.is_expired(day(2024, 3, 10)));
        assert!(set.is_expired(day(2024, 3, 11)));

        let late_on_the_day = day(2024, 3, 10).and_hms_opt(23, 59, 59).unwrap().and_utc();
        assert!(!set.is_expired_at(late_on_the_day));
    }

    #[test]
    fn no_expiration_never_expires() {
        assert!(!PinSet::new(["a"], None).is_expired(day(9999, 12, 31)));
    }

    #[test]
    fn strict_date_parsing() {
        assert_eq!(parse_expiration_date("2018-01-31").unwrap(), day(2018, 1, 31));
        for bad in ["2018-1-31", "2018-02-30", "18-01-31", "2018/01/31", "2018-01-31T00:00", " 2018-01-31", "abcd-ef-gh"] {
            assert!(
                matches!(parse_expiration_date(bad), Err(EngineError::InvalidExpirationDate(_))),
                "{bad} should be rejected"
            );
        }
    }
}
