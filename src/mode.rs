use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

/// What SleepLock is currently doing about system sleep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SleepMode {
    /// No assertion held, the system sleeps normally
    #[default]
    Off,
    /// Assertion held with no end time
    KeepAwakeIndefinite,
    /// Assertion held until the given instant
    KeepAwakeUntil(SystemTime),
    /// Assertion held until the given instant, then system sleep is requested
    AllowSleepAfter(SystemTime),
}

impl SleepMode {
    /// End instant of a timed mode
    pub fn end_time(&self) -> Option<SystemTime> {
        match self {
            SleepMode::KeepAwakeUntil(end) | SleepMode::AllowSleepAfter(end) => Some(*end),
            SleepMode::Off | SleepMode::KeepAwakeIndefinite => None,
        }
    }

    pub fn is_timed(&self) -> bool {
        self.end_time().is_some()
    }

    /// Whether the stay-awake assertion should be held in this mode
    pub fn is_active(&self) -> bool {
        !matches!(self, SleepMode::Off)
    }

    pub fn kind(&self) -> ModeKind {
        match self {
            SleepMode::Off => ModeKind::Off,
            SleepMode::KeepAwakeIndefinite => ModeKind::KeepAwakeInfinite,
            SleepMode::KeepAwakeUntil(_) => ModeKind::KeepAwakeUntil,
            SleepMode::AllowSleepAfter(_) => ModeKind::AllowSleepAfter,
        }
    }
}

/// Persisted discriminant of a [`SleepMode`], stored under `mode.kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Off,
    KeepAwakeInfinite,
    KeepAwakeUntil,
    AllowSleepAfter,
}

impl ModeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKind::Off => "off",
            ModeKind::KeepAwakeInfinite => "keepAwakeInfinite",
            ModeKind::KeepAwakeUntil => "keepAwakeUntil",
            ModeKind::AllowSleepAfter => "allowSleepAfter",
        }
    }

    pub fn is_timed(&self) -> bool {
        matches!(self, ModeKind::KeepAwakeUntil | ModeKind::AllowSleepAfter)
    }

    /// Rebuild a timed mode from its end instant. Returns None for untimed kinds.
    pub fn with_end(&self, end: SystemTime) -> Option<SleepMode> {
        match self {
            ModeKind::KeepAwakeUntil => Some(SleepMode::KeepAwakeUntil(end)),
            ModeKind::AllowSleepAfter => Some(SleepMode::AllowSleepAfter(end)),
            ModeKind::Off | ModeKind::KeepAwakeInfinite => None,
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(ModeKind::Off),
            "keepAwakeInfinite" => Ok(ModeKind::KeepAwakeInfinite),
            "keepAwakeUntil" => Ok(ModeKind::KeepAwakeUntil),
            "allowSleepAfter" => Ok(ModeKind::AllowSleepAfter),
            other => Err(anyhow::anyhow!("Unknown sleep mode kind: '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_kind_strings_parse_back() {
        for kind in [
            ModeKind::Off,
            ModeKind::KeepAwakeInfinite,
            ModeKind::KeepAwakeUntil,
            ModeKind::AllowSleepAfter,
        ] {
            assert_eq!(kind.as_str().parse::<ModeKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!("sleepy".parse::<ModeKind>().is_err());
        assert!("".parse::<ModeKind>().is_err());
        // Case matters, the store holds the exact identifiers
        assert!("Off".parse::<ModeKind>().is_err());
    }

    #[test]
    fn test_end_time_only_for_timed_modes() {
        let end = UNIX_EPOCH + Duration::from_secs(1_000);
        assert_eq!(SleepMode::Off.end_time(), None);
        assert_eq!(SleepMode::KeepAwakeIndefinite.end_time(), None);
        assert_eq!(SleepMode::KeepAwakeUntil(end).end_time(), Some(end));
        assert_eq!(SleepMode::AllowSleepAfter(end).end_time(), Some(end));
    }

    #[test]
    fn test_with_end_rejects_untimed_kinds() {
        let end = UNIX_EPOCH + Duration::from_secs(42);
        assert_eq!(ModeKind::Off.with_end(end), None);
        assert_eq!(ModeKind::KeepAwakeInfinite.with_end(end), None);
        assert_eq!(
            ModeKind::AllowSleepAfter.with_end(end),
            Some(SleepMode::AllowSleepAfter(end))
        );
    }
}
