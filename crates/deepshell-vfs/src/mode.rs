//! Permission strings.
//!
//! A [`Mode`] is the classic 9-character `rwxrwxrwx` string. The execute
//! position of a triad may carry a marker instead of `x`: `s` (setuid /
//! setgid, implies execute), `S` (marker without execute), `t` / `T` (the
//! same for the sticky bit, other triad only).

use std::fmt;
use std::str::FromStr;

use deepshell_types::error::GameError;

/// A capability requested from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Read,
    Write,
    Execute,
}

/// Which triad of the permission string applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Triad {
    Owner,
    Group,
    Other,
}

impl Triad {
    fn offset(self) -> usize {
        match self {
            Self::Owner => 0,
            Self::Group => 3,
            Self::Other => 6,
        }
    }
}

/// A validated 9-character permission string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    chars: [u8; 9],
}

impl Mode {
    /// `rwxr-xr-x`
    pub const DIR_DEFAULT: Mode = Mode {
        chars: *b"rwxr-xr-x",
    };
    /// `rw-r--r--`
    pub const FILE_DEFAULT: Mode = Mode {
        chars: *b"rw-r--r--",
    };

    /// Whether `triad` grants `cap`.
    pub fn allows(&self, triad: Triad, cap: Capability) -> bool {
        let base = triad.offset();
        match cap {
            Capability::Read => self.chars[base] == b'r',
            Capability::Write => self.chars[base + 1] == b'w',
            Capability::Execute => matches!(self.chars[base + 2], b'x' | b's' | b't'),
        }
    }

    /// Whether the sticky marker is set (`t` or `T` in the last position).
    pub fn is_sticky(&self) -> bool {
        matches!(self.chars[8], b't' | b'T')
    }

    /// Set or clear execute on all three triads, keeping markers.
    pub fn with_execute(mut self, on: bool) -> Self {
        for pos in [2, 5, 8] {
            self.chars[pos] = match (self.chars[pos], on) {
                (b'-' | b'x', true) => b'x',
                (b'-' | b'x', false) => b'-',
                (b's' | b'S', true) => b's',
                (b's' | b'S', false) => b'S',
                (b't' | b'T', true) => b't',
                (b't' | b'T', false) => b'T',
                (other, _) => other,
            };
        }
        self
    }

    /// Build from a 3-digit octal string such as `750`.
    ///
    /// Markers are not representable in three digits and are dropped.
    pub fn from_octal(digits: &str) -> Option<Self> {
        const TABLE: [&[u8; 3]; 8] = [b"---", b"--x", b"-w-", b"-wx", b"r--", b"r-x", b"rw-", b"rwx"];
        if digits.len() != 3 {
            return None;
        }
        let mut chars = [b'-'; 9];
        for (i, ch) in digits.chars().enumerate() {
            let d = ch.to_digit(8)? as usize;
            chars[i * 3..i * 3 + 3].copy_from_slice(TABLE[d]);
        }
        Some(Self { chars })
    }

    /// Apply a `chmod` argument: `+x`, `-x`, or 3-digit octal.
    pub fn apply(self, spec: &str) -> Option<Self> {
        match spec {
            "+x" | "a+x" => Some(self.with_execute(true)),
            "-x" | "a-x" => Some(self.with_execute(false)),
            _ => Self::from_octal(spec),
        }
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII letters and '-' are ever stored.
        std::str::from_utf8(&self.chars).unwrap_or("---------")
    }
}

impl FromStr for Mode {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 9 {
            return Err(GameError::Command(format!("invalid mode: '{s}'")));
        }
        for (i, &b) in bytes.iter().enumerate() {
            let ok = match i % 3 {
                0 => matches!(b, b'r' | b'-'),
                1 => matches!(b, b'w' | b'-'),
                _ if i == 8 => matches!(b, b'x' | b'-' | b't' | b'T'),
                _ => matches!(b, b'x' | b'-' | b's' | b'S'),
            };
            if !ok {
                return Err(GameError::Command(format!("invalid mode: '{s}'")));
            }
        }
        let mut chars = [0u8; 9];
        chars.copy_from_slice(bytes);
        Ok(Self { chars })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(s: &str) -> Mode {
        s.parse().unwrap()
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(mode("rwxr-x---").to_string(), "rwxr-x---");
    }

    #[test]
    fn parse_rejects_bad_length() {
        assert!("rwx".parse::<Mode>().is_err());
        assert!("rwxrwxrwxr".parse::<Mode>().is_err());
    }

    #[test]
    fn parse_rejects_misplaced_letters() {
        assert!("wrxrwxrwx".parse::<Mode>().is_err());
        assert!("rwtrwxrwx".parse::<Mode>().is_err());
        assert!("rwxrwxrws".parse::<Mode>().is_err());
    }

    #[test]
    fn allows_by_triad() {
        let m = mode("rw-r-----");
        assert!(m.allows(Triad::Owner, Capability::Read));
        assert!(m.allows(Triad::Owner, Capability::Write));
        assert!(!m.allows(Triad::Owner, Capability::Execute));
        assert!(m.allows(Triad::Group, Capability::Read));
        assert!(!m.allows(Triad::Group, Capability::Write));
        assert!(!m.allows(Triad::Other, Capability::Read));
    }

    #[test]
    fn markers_imply_execute_only_lowercase() {
        let m = mode("rwsr-Sr-t");
        assert!(m.allows(Triad::Owner, Capability::Execute));
        assert!(!m.allows(Triad::Group, Capability::Execute));
        assert!(m.allows(Triad::Other, Capability::Execute));
        assert!(!mode("rwxrwxrwT").allows(Triad::Other, Capability::Execute));
    }

    #[test]
    fn sticky_detection() {
        assert!(mode("rwxrwxrwt").is_sticky());
        assert!(mode("rwxrwxrwT").is_sticky());
        assert!(!mode("rwxrwxrwx").is_sticky());
    }

    #[test]
    fn plus_x_sets_all_triads() {
        assert_eq!(mode("rw-r--r--").apply("+x").unwrap().to_string(), "rwxr-xr-x");
    }

    #[test]
    fn minus_x_clears_all_triads() {
        assert_eq!(mode("rwxr-xr-x").apply("-x").unwrap().to_string(), "rw-r--r--");
    }

    #[test]
    fn minus_x_keeps_markers_uppercase() {
        assert_eq!(mode("rwsrwxrwt").apply("-x").unwrap().to_string(), "rwSrw-rwT");
        assert_eq!(mode("rwSrw-rwT").apply("+x").unwrap().to_string(), "rwsrwxrwt");
    }

    #[test]
    fn octal_table() {
        assert_eq!(Mode::from_octal("755").unwrap().to_string(), "rwxr-xr-x");
        assert_eq!(Mode::from_octal("640").unwrap().to_string(), "rw-r-----");
        assert_eq!(Mode::from_octal("000").unwrap().to_string(), "---------");
        assert_eq!(Mode::from_octal("777").unwrap().to_string(), "rwxrwxrwx");
        assert_eq!(Mode::from_octal("123").unwrap().to_string(), "--x-w--wx");
    }

    #[test]
    fn octal_drops_sticky() {
        assert!(!mode("rwxrwxrwt").apply("777").unwrap().is_sticky());
    }

    #[test]
    fn octal_rejects_bad_input() {
        assert!(Mode::from_octal("78").is_none());
        assert!(Mode::from_octal("800").is_none());
        assert!(Mode::from_octal("7555").is_none());
        assert!(Mode::from_octal("rwx").is_none());
    }

    #[test]
    fn apply_rejects_unknown_spec() {
        assert!(Mode::FILE_DEFAULT.apply("u+w").is_none());
        assert!(Mode::FILE_DEFAULT.apply("").is_none());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn octal_round_trips_through_display(d in "[0-7]{3}") {
                let m = Mode::from_octal(&d).unwrap();
                let reparsed: Mode = m.to_string().parse().unwrap();
                prop_assert_eq!(m, reparsed);
            }

            #[test]
            fn toggle_execute_is_reversible(d in "[0-7]{3}") {
                let m = Mode::from_octal(&d).unwrap();
                let on = m.with_execute(true);
                prop_assert_eq!(on.with_execute(false).with_execute(true), on);
            }
        }
    }
}
