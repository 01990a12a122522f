/// Number of most recent non-blank lines kept for header lookback.
pub const HISTORY_CAPACITY: usize = 500;

/// Width of the ASCII rendering column; longer trailing tokens get split.
pub const ASCII_COLUMN_WIDTH: usize = 16;

pub const OFFSET_PREFIX: &str = "0x";
pub const STRICT_OFFSET_DIGITS: usize = 4;

pub const OFFSET_SEPARATORS: &[char] = &[' ', '\t', ':'];

pub const MICROS_DIGITS: usize = 6;

pub const UNKNOWN_INTERFACE: &str = "unknown";

pub const FILTER_SUMMARY_SUFFIX: &str = "packets received by filter";

/// Largest packet the reassembler will allocate for (maximum snap length).
pub const MAX_PACKET_LEN: usize = 262_144;
