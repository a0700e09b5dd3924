//! Timetable time handling.
//!
//! Feed times are "HH:MM:SS" offsets from the start of the service day.
//! Hours may exceed 23 for trips running past midnight, and some feeds
//! restart at "00:.." instead, so consecutive stop times on one trip are
//! normalised against each other before taking differences.

use std::fmt;

use chrono::Duration;

const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A time of day on a service day, in seconds since its start.
///
/// # Examples
///
/// ```
/// use subway_tour::domain::ServiceTime;
///
/// let t = ServiceTime::parse("25:10:05").unwrap();
/// assert_eq!(t.seconds(), 25 * 3600 + 10 * 60 + 5);
/// assert_eq!(t.to_string(), "25:10:05");
///
/// assert!(ServiceTime::parse("12:60:00").is_err());
/// assert!(ServiceTime::parse("12:00").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceTime(u32);

impl ServiceTime {
    /// Create a time from hours, minutes and seconds.
    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self(hours * 3600 + minutes * 60 + seconds)
    }

    /// Parse a time from "HH:MM:SS" (or "H:MM:SS") format.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TimeError::new("expected HH:MM:SS format"));
        };

        if h.is_empty() || h.len() > 3 || m.len() != 2 || sec.len() != 2 {
            return Err(TimeError::new("expected HH:MM:SS format"));
        }

        let hours = parse_digits(h).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        let minutes = parse_digits(m).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minutes > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        let seconds = parse_digits(sec).ok_or_else(|| TimeError::new("invalid second digits"))?;
        if seconds > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        Ok(Self::from_hms(hours, minutes, seconds))
    }

    /// Seconds since the start of the service day.
    pub fn seconds(&self) -> u32 {
        self.0
    }

    /// Move this time forward by whole days until it is not before `previous`.
    ///
    /// A stop time that is numerically smaller than the stop before it on the
    /// same trip happened after a midnight rollover.
    pub fn normalized_after(self, previous: ServiceTime) -> ServiceTime {
        let mut seconds = self.0;
        while seconds < previous.0 {
            seconds += SECONDS_PER_DAY;
        }
        ServiceTime(seconds)
    }

    /// Duration from `earlier` to this time, assuming this time is later.
    ///
    /// Rolls over midnight as needed, so the result is never negative.
    pub fn since(self, earlier: ServiceTime) -> Duration {
        let later = self.normalized_after(earlier);
        Duration::seconds(i64::from(later.0) - i64::from(earlier.0))
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.0 / 3600,
            (self.0 / 60) % 60,
            self.0 % 60
        )
    }
}

fn parse_digits(s: &str) -> Option<u32> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ServiceTime {
        ServiceTime::parse(s).unwrap()
    }

    #[test]
    fn parse_valid_times() {
        assert_eq!(t("00:00:00").seconds(), 0);
        assert_eq!(t("23:59:59").seconds(), 86399);
        assert_eq!(t("7:05:00").seconds(), 7 * 3600 + 300);
        assert_eq!(t("26:00:10").seconds(), 26 * 3600 + 10);
    }

    #[test]
    fn reject_malformed_times() {
        assert!(ServiceTime::parse("").is_err());
        assert!(ServiceTime::parse("12:00").is_err());
        assert!(ServiceTime::parse("12:00:00:00").is_err());
        assert!(ServiceTime::parse("12:0:00").is_err());
        assert!(ServiceTime::parse("ab:00:00").is_err());
        assert!(ServiceTime::parse("12:61:00").is_err());
        assert!(ServiceTime::parse("12:00:60").is_err());
        assert!(ServiceTime::parse("-1:00:00").is_err());
    }

    #[test]
    fn midnight_rollover_duration() {
        assert_eq!(t("00:00:10").since(t("23:59:30")), Duration::seconds(40));
    }

    #[test]
    fn plain_duration() {
        assert_eq!(t("10:01:30").since(t("10:00:00")), Duration::seconds(90));
        assert_eq!(t("10:00:00").since(t("10:00:00")), Duration::zero());
    }

    #[test]
    fn normalization_keeps_later_times() {
        assert_eq!(t("24:00:30").normalized_after(t("23:59:30")), t("24:00:30"));
        assert_eq!(t("00:00:30").normalized_after(t("23:59:30")), t("24:00:30"));
    }

    #[test]
    fn display_pads_fields() {
        assert_eq!(t("7:05:09").to_string(), "07:05:09");
        assert_eq!(t("25:00:00").to_string(), "25:00:00");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Display then parse returns the same time.
        #[test]
        fn display_roundtrip(h in 0u32..48, m in 0u32..60, s in 0u32..60) {
            let time = ServiceTime::from_hms(h, m, s);
            prop_assert_eq!(ServiceTime::parse(&time.to_string()).unwrap(), time);
        }

        /// Segment durations are never negative and stay under a day.
        #[test]
        fn since_is_bounded(a in 0u32..86400, b in 0u32..86400) {
            let d = ServiceTime(b).since(ServiceTime(a));
            prop_assert!(d >= Duration::zero());
            prop_assert!(d < Duration::days(1));
        }
    }
}
