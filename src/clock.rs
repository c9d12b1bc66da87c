use chrono::{Local, NaiveDateTime};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Source of the local wall-clock time used to name resources
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

impl FixedClock {
    /// Parse `YYYY-MM-DD HH:MM`
    pub fn parse(value: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M").map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_formats() {
        let clock = FixedClock::parse("2024-01-15 09:30").unwrap();
        let now = clock.now();
        assert_eq!(now.format(DATE_FORMAT).to_string(), "2024-01-15");
        assert_eq!(now.format(TIME_FORMAT).to_string(), "09:30");
    }
}
