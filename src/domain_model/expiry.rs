use chrono::{DateTime, Duration, Utc};

#[derive(Debug, thiserror::Error)]
pub enum ExpiresError {
    #[error("{0:?} is not a valid duration string")]
    InvalidDuration(String),
    #[error("duration is out of range: {0:?}")]
    OutOfRange(String),
}

/// A not-yet-resolved expiry: a relative duration or an absolute instant.
///
/// Duration strings are parsed eagerly, so an invalid value fails at
/// configuration time rather than on the first cookie write. Resolution
/// against a wall clock is pure and infallible.
#[derive(Debug, Clone, PartialEq)]
pub enum Expires {
    In(Duration),
    At(DateTime<Utc>),
}

impl Expires {
    /// Parse a human duration string such as `"2d"`, `"1h"` or `"45m"`.
    pub fn parse(s: &str) -> Result<Self, ExpiresError> {
        let std_duration = humantime::parse_duration(s)
            .map_err(|_| ExpiresError::InvalidDuration(s.to_string()))?;
        let duration = Duration::from_std(std_duration)
            .map_err(|_| ExpiresError::OutOfRange(s.to_string()))?;
        Ok(Expires::In(duration))
    }

    /// A relative offset in milliseconds from the resolution clock.
    pub fn from_millis(millis: i64) -> Self {
        Expires::In(Duration::milliseconds(millis))
    }

    /// An absolute instant, passed through unchanged by resolution.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Expires::At(instant)
    }

    /// Resolve to an absolute instant against the supplied wall clock.
    pub fn resolve_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Expires::In(duration) => now + *duration,
            Expires::At(instant) => *instant,
        }
    }

    pub fn resolve(&self) -> DateTime<Utc> {
        self.resolve_from(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_day_durations() {
        let now = Utc::now();
        let resolved = Expires::parse("2d").unwrap().resolve_from(now);
        assert_eq!(resolved - now, Duration::milliseconds(172_800_000));
    }

    #[test]
    fn parses_hour_and_minute_durations() {
        let now = Utc::now();
        assert_eq!(
            Expires::parse("1h").unwrap().resolve_from(now) - now,
            Duration::hours(1)
        );
        assert_eq!(
            Expires::parse("45m").unwrap().resolve_from(now) - now,
            Duration::minutes(45)
        );
    }

    #[test]
    fn rejects_garbage_at_parse_time() {
        assert!(matches!(
            Expires::parse("not-a-duration"),
            Err(ExpiresError::InvalidDuration(_))
        ));
    }

    #[test]
    fn millis_offset_resolves_relative_to_clock() {
        let now = Utc::now();
        let resolved = Expires::from_millis(3_600_000).resolve_from(now);
        assert_eq!(resolved, now + Duration::hours(1));
    }

    #[test]
    fn absolute_instant_passes_through() {
        let instant = Utc::now() + Duration::days(30);
        assert_eq!(Expires::at(instant).resolve(), instant);
    }
}
