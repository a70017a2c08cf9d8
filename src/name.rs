use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::Error;

/// Every utun interface name starts with this literal, case-sensitive.
pub const IFACE_PREFIX: &str = "utun";

static UNIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());

/// A validated `utun<N>` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceRequest {
    unit: u32,
}

impl InterfaceRequest {
    /// Parses `utun<N>` where `N` is one or more ASCII digits.
    ///
    /// `N` must be below `u32::MAX`: the kernel receives `N + 1` as a 32-bit control
    /// unit, so `utun4294967295` and anything larger fail with [`Error::InvalidUnit`].
    /// Smaller units are passed through unchecked and left to the kernel.
    pub fn parse(name: &str) -> Result<Self, Error> {
        let suffix = name.strip_prefix(IFACE_PREFIX).ok_or(Error::InvalidName)?;
        if !UNIT_RE.is_match(suffix) {
            return Err(Error::InvalidUnit);
        }
        let unit: u32 = suffix.parse().map_err(|_| Error::InvalidUnit)?;
        // The control unit is unit + 1, so the largest unit has no wire encoding.
        if unit == u32::MAX {
            return Err(Error::InvalidUnit);
        }
        Ok(Self { unit })
    }

    /// Unit number as requested by the caller.
    #[inline]
    pub fn unit(&self) -> u32 {
        self.unit
    }

    /// Unit number as sent to the kernel control. Zero there means "any unit".
    #[inline]
    pub fn control_unit(&self) -> u32 {
        self.unit + 1
    }
}

impl FromStr for InterfaceRequest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for InterfaceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", IFACE_PREFIX, self.unit)
    }
}
