use std::fmt;
use std::str::FromStr;

use crate::error::FrameError;

/// Client protocol version, packed as `major.minor.build.revision`.
///
/// Versions compare numerically component by component. Decoders gate
/// optional fields with explicit comparisons such as
/// `version >= CV_6017`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientVersion(u32);

impl ClientVersion {
    /// Build a version from its four components.
    pub const fn new(major: u8, minor: u8, build: u8, revision: u8) -> Self {
        Self(
            (major as u32) << 24 | (minor as u32) << 16 | (build as u32) << 8 | revision as u32,
        )
    }

    pub const fn major(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn minor(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn build(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn revision(self) -> u8 {
        self.0 as u8
    }

    /// The packed representation.
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

pub const CV_500A: ClientVersion = ClientVersion::new(5, 0, 0, b'a');
pub const CV_5090: ClientVersion = ClientVersion::new(5, 0, 9, 0);
pub const CV_6013: ClientVersion = ClientVersion::new(6, 0, 1, 3);
pub const CV_6017: ClientVersion = ClientVersion::new(6, 0, 1, 7);
pub const CV_60142: ClientVersion = ClientVersion::new(6, 0, 14, 2);
pub const CV_60143: ClientVersion = ClientVersion::new(6, 0, 14, 3);
pub const CV_7000: ClientVersion = ClientVersion::new(7, 0, 0, 0);
pub const CV_7090: ClientVersion = ClientVersion::new(7, 0, 9, 0);
pub const CV_70180: ClientVersion = ClientVersion::new(7, 0, 18, 0);
pub const CV_70331: ClientVersion = ClientVersion::new(7, 0, 33, 1);

impl Default for ClientVersion {
    fn default() -> Self {
        CV_7090
    }
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major(),
            self.minor(),
            self.build(),
            self.revision()
        )
    }
}

impl FromStr for ClientVersion {
    type Err = FrameError;

    /// Accepts `a.b.c.d` and the legacy `a.b.c` + letter form (`5.0.0a`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FrameError::InvalidVersion(s.to_string());
        let parts: Vec<&str> = s.trim().split('.').collect();

        let component = |text: &str| text.parse::<u8>().map_err(|_| invalid());

        match parts.as_slice() {
            [major, minor, build, revision] => Ok(Self::new(
                component(major)?,
                component(minor)?,
                component(build)?,
                component(revision)?,
            )),
            [major, minor, build] => {
                let (digits, letter) = match build.char_indices().last() {
                    Some((idx, c)) if c.is_ascii_alphabetic() => (&build[..idx], c as u8),
                    _ => (*build, 0),
                };
                Ok(Self::new(
                    component(major)?,
                    component(minor)?,
                    component(digits)?,
                    letter.to_ascii_lowercase(),
                ))
            }
            _ => Err(invalid()),
        }
    }
}
