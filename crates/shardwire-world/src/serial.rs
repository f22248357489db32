use std::fmt;

use serde::Serialize;

/// 32-bit entity identifier.
///
/// Ranges follow the wire convention: mobiles below `0x40000000`, items
/// from there on. The high bit marks a corpse alias of a mobile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Serial(pub u32);

impl Serial {
    pub const ZERO: Serial = Serial(0);
    pub const CORPSE_BIT: u32 = 0x8000_0000;

    const ITEM_START: u32 = 0x4000_0000;
    const ITEM_END: u32 = 0xF000_0000;

    pub const fn value(self) -> u32 {
        self.0
    }

    pub const fn is_mobile(self) -> bool {
        self.0 > 0 && self.0 < Self::ITEM_START
    }

    pub const fn is_item(self) -> bool {
        self.0 >= Self::ITEM_START && self.0 < Self::ITEM_END
    }

    pub const fn is_valid(self) -> bool {
        self.0 > 0 && self.0 < Self::CORPSE_BIT
    }

    /// The serial a dead mobile is re-keyed to.
    pub const fn corpse_alias(self) -> Serial {
        Serial(self.0 | Self::CORPSE_BIT)
    }

    pub const fn is_corpse_alias(self) -> bool {
        self.0 & Self::CORPSE_BIT != 0
    }

    /// Parse decimal or `0x`-prefixed hexadecimal text.
    pub fn parse(text: &str) -> Option<Serial> {
        let text = text.trim();
        let value = match text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
        {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => text.parse::<u32>().ok()?,
        };
        Some(Serial(value))
    }
}

impl From<u32> for Serial {
    fn from(value: u32) -> Self {
        Serial(value)
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges() {
        assert!(Serial(1).is_mobile());
        assert!(!Serial(0).is_mobile());
        assert!(Serial(0x4000_0001).is_item());
        assert!(!Serial(0x3FFF_FFFF).is_item());
        assert!(Serial(0x7FFF_FFFF).is_valid());
        assert!(!Serial(0x8000_0001).is_valid());
    }

    #[test]
    fn corpse_alias_sets_high_bit() {
        let mobile = Serial(0x0000_1234);
        let alias = mobile.corpse_alias();
        assert_eq!(alias, Serial(0x8000_1234));
        assert!(alias.is_corpse_alias());
        assert!(!alias.is_valid());
    }

    #[test]
    fn parse_decimal_and_hex() {
        assert_eq!(Serial::parse("1073741825"), Some(Serial(0x4000_0001)));
        assert_eq!(Serial::parse("0x40000001"), Some(Serial(0x4000_0001)));
        assert_eq!(Serial::parse("nope"), None);
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(Serial(0x4000_0001).to_string(), "0x40000001");
    }
}
