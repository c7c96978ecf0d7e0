use std::fmt;

/// Severity of a single log record.
///
/// Ordering is significant: `Level` derives `Ord` from declaration order, so
/// `Level::trace < Level::critical` holds and range checks (`level_min..=level_max`)
/// can use plain comparison operators. `off` sorts above every real level and
/// is only ever used as a filter sentinel ("reject everything").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Critical = 5,
    Off = 6,
}

impl Level {
    pub const ALL: [Level; 7] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Critical,
        Level::Off,
    ];

    /// Decodes a wire-format level byte. Returns `None` for an out-of-range value,
    /// which the caller should treat as catalog/frame corruption.
    pub fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Long name, e.g. `"info"`, as used by the `%L` formatter directive.
    pub fn long_name(self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Critical => "critical",
            Level::Off => "off",
        }
    }

    /// Short single-letter name, e.g. `"I"`, as used by the `%l` formatter directive.
    pub fn short_name(self) -> &'static str {
        match self {
            Level::Trace => "T",
            Level::Debug => "D",
            Level::Info => "I",
            Level::Warn => "W",
            Level::Error => "E",
            Level::Critical => "C",
            Level::Off => "-",
        }
    }

    /// Parses a level name case-insensitively, accepting either the long or
    /// short form. Used by the reader when resolving filter-rule tokens.
    pub fn parse(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|l| l.long_name() == lower || l.short_name().eq_ignore_ascii_case(&lower))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.long_name())
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_matches_spec() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Critical);
        assert!(Level::Critical < Level::Off);
    }

    #[test]
    fn roundtrip_u8() {
        for l in Level::ALL {
            assert_eq!(Level::from_u8(l.as_u8()), Some(l));
        }
        assert_eq!(Level::from_u8(200), None);
    }

    #[test]
    fn parse_names() {
        assert_eq!(Level::parse("INFO"), Some(Level::Info));
        assert_eq!(Level::parse("i"), Some(Level::Info));
        assert_eq!(Level::parse("bogus"), None);
    }
}
