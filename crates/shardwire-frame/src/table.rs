use crate::version::{ClientVersion, CV_500A, CV_6013, CV_60142, CV_6017, CV_7000, CV_70180, CV_7090};

/// Table sentinel for opcodes carrying a 16-bit self-declared length.
const VAR: i16 = -1;

/// How long a frame starting with a given opcode is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketLength {
    /// The whole frame, opcode included, is exactly this many bytes.
    Fixed(u16),
    /// Bytes 1..3 hold the big-endian total length.
    Variable,
    /// The opcode is absent from the table.
    Unknown,
}

impl PacketLength {
    fn from_raw(raw: i16) -> Self {
        match raw {
            VAR => Self::Variable,
            n if n > 0 => Self::Fixed(n as u16),
            _ => Self::Unknown,
        }
    }

    fn to_raw(self) -> i16 {
        match self {
            Self::Fixed(0) | Self::Unknown => 0,
            Self::Fixed(n) => n.min(i16::MAX as u16) as i16,
            Self::Variable => VAR,
        }
    }
}

#[rustfmt::skip]
const LEGACY_LENGTHS: [i16; 256] = [
    0x0068, 0x0005, 0x0007, VAR,    0x0002, 0x0005, 0x0005, 0x0007, // 0x00
    0x000E, 0x0005, 0x000B, 0x010A, VAR,    0x0003, VAR,    0x003D, // 0x08
    0x00D7, VAR,    VAR,    0x000A, 0x0006, 0x0009, 0x0001, VAR,    // 0x10
    VAR,    VAR,    VAR,    0x0025, VAR,    0x0005, 0x0004, 0x0008, // 0x18
    0x0013, 0x0008, 0x0003, 0x001A, 0x0007, 0x0014, 0x0005, 0x0002, // 0x20
    0x0005, 0x0001, 0x0005, 0x0002, 0x0002, 0x0011, 0x000F, 0x000A, // 0x28
    0x0005, VAR,    0x0002, 0x0002, 0x000A, 0x028D, VAR,    0x0008, // 0x30
    0x0007, 0x0009, VAR,    VAR,    VAR,    0x0002, 0x0025, VAR,    // 0x38
    0x00C9, VAR,    VAR,    0x0229, 0x02C9, 0x0005, VAR,    0x000B, // 0x40
    0x0049, 0x005D, 0x0005, 0x0009, VAR,    VAR,    0x0006, 0x0002, // 0x48
    VAR,    VAR,    VAR,    0x0002, 0x000C, 0x0001, 0x000B, 0x006E, // 0x50
    0x006A, VAR,    VAR,    0x0004, 0x0002, 0x0049, VAR,    0x0031, // 0x58
    0x0005, 0x0009, 0x000F, 0x000D, 0x0001, 0x0004, VAR,    0x0015, // 0x60
    VAR,    VAR,    0x0003, 0x0009, 0x0013, 0x0003, 0x000E, VAR,    // 0x68
    0x001C, VAR,    0x0005, 0x0002, VAR,    0x0023, 0x0010, 0x0011, // 0x70
    VAR,    0x0009, VAR,    0x0002, VAR,    0x000D, 0x0002, VAR,    // 0x78
    0x003E, VAR,    0x0002, 0x0027, 0x0045, 0x0002, VAR,    VAR,    // 0x80
    0x0042, VAR,    VAR,    VAR,    0x000B, VAR,    VAR,    VAR,    // 0x88
    0x0013, 0x0041, VAR,    0x0063, VAR,    0x0009, VAR,    0x0002, // 0x90
    VAR,    0x001A, VAR,    0x0102, 0x0135, 0x0033, VAR,    VAR,    // 0x98
    0x0003, 0x0009, 0x0009, 0x0009, 0x0095, VAR,    VAR,    0x0004, // 0xA0
    VAR,    VAR,    0x0005, VAR,    VAR,    VAR,    VAR,    0x000D, // 0xA8
    VAR,    VAR,    VAR,    VAR,    VAR,    0x0040, 0x0009, VAR,    // 0xB0
    VAR,    0x0003, 0x0006, 0x0009, 0x0003, VAR,    VAR,    VAR,    // 0xB8
    0x0024, VAR,    VAR,    VAR,    0x0006, 0x00CB, 0x0001, 0x0031, // 0xC0
    0x0002, 0x0006, 0x0006, 0x0007, VAR,    0x0001, VAR,    0x004E, // 0xC8
    VAR,    0x0002, 0x0019, VAR,    VAR,    VAR,    VAR,    VAR,    // 0xD0
    VAR,    0x010C, VAR,    VAR,    0x0009, VAR,    VAR,    VAR,    // 0xD8
    VAR,    VAR,    0x000A, VAR,    VAR,    VAR,    VAR,    VAR,    // 0xE0
    0x000D, VAR,    VAR,    VAR,    VAR,    VAR,    0x2000, 0x0015, // 0xE8
    VAR,    0x0009, 0x0019, 0x0018, VAR,    0x0015, VAR,    VAR,    // 0xF0
    0x006A, 0,      0,      0,      0,      0,      0,      0,      // 0xF8
];

/// Per-opcode frame lengths for one client version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketTable {
    lengths: [i16; 256],
}

impl PacketTable {
    /// The unadjusted legacy table.
    pub fn legacy() -> Self {
        Self {
            lengths: LEGACY_LENGTHS,
        }
    }

    /// The legacy table with the adjustments later clients introduced.
    pub fn for_version(version: ClientVersion) -> Self {
        let mut table = Self::legacy();
        let l = &mut table.lengths;

        if version >= CV_500A {
            l[0x0B] = 0x07;
            l[0x16] = VAR;
            l[0x31] = VAR;
        }
        if version >= CV_6013 {
            l[0xE3] = VAR;
            l[0xE6] = 0x05;
            l[0xE7] = 0x0C;
            l[0xE8] = 0x0D;
            l[0xE9] = 0x4B;
            l[0xEA] = 0x03;
        }
        if version >= CV_6017 {
            l[0x08] = 0x0F;
            l[0x25] = 0x15;
        }
        if version >= CV_60142 {
            l[0xB9] = 0x05;
        }
        if version >= CV_7000 {
            l[0xEE] = 0x2000;
            l[0xEF] = 0x15;
        }
        if version >= CV_7090 {
            l[0x24] = 0x09;
            l[0x99] = 0x1E;
            l[0xBA] = 0x0A;
            l[0xF1] = 0x09;
            l[0xF2] = 0x19;
            l[0xF3] = 0x1A;
        }
        if version >= CV_70180 {
            l[0x00] = 0x6A;
        }

        table
    }

    /// Length rule for `opcode`.
    pub fn length(&self, opcode: u8) -> PacketLength {
        PacketLength::from_raw(self.lengths[opcode as usize])
    }

    /// Override one entry, e.g. for a shard with custom packets.
    pub fn set(&mut self, opcode: u8, length: PacketLength) {
        self.lengths[opcode as usize] = length.to_raw();
    }

    /// All 256 entries in opcode order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, PacketLength)> + '_ {
        self.lengths
            .iter()
            .enumerate()
            .map(|(op, raw)| (op as u8, PacketLength::from_raw(*raw)))
    }
}

impl Default for PacketTable {
    fn default() -> Self {
        Self::for_version(ClientVersion::default())
    }
}
