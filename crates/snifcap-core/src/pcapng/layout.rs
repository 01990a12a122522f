pub const SECTION_HEADER_BLOCK: u32 = 0x0A0D_0D0A;
pub const INTERFACE_DESCRIPTION_BLOCK: u32 = 0x0000_0001;
pub const ENHANCED_PACKET_BLOCK: u32 = 0x0000_0006;

pub const BYTE_ORDER_MAGIC: u32 = 0x1A2B_3C4D;
pub const VERSION_MAJOR: u16 = 1;
pub const VERSION_MINOR: u16 = 0;
pub const SECTION_LENGTH_UNSPECIFIED: i64 = -1;
pub const SNAP_LENGTH_UNLIMITED: i32 = -1;

pub const OPT_END_OF_OPTIONS: u16 = 0;
pub const OPT_COMMENT: u16 = 1;
pub const OPT_IF_NAME: u16 = 2;
pub const OPT_SHB_USERAPPL: u16 = 4;
pub const OPT_IF_TSRESOL: u16 = 9;

/// `if_tsresol` value for microsecond timestamps (10^-6).
pub const TSRESOL_MICROSECONDS: u8 = 6;

pub const BLOCK_ALIGNMENT: usize = 4;
/// Block type + leading length + trailing length.
pub const BLOCK_FRAME_LEN: usize = 12;

pub const LINKTYPE_NULL: u16 = 0;
pub const LINKTYPE_ETHERNET: u16 = 1;
pub const LINKTYPE_PPP: u16 = 9;
pub const LINKTYPE_RAW: u16 = 101;

pub const PCAPNG_SUFFIX: &str = ".pcapng";

pub const DEFAULT_APPLICATION: &str = concat!("snifcap ", env!("CARGO_PKG_VERSION"));
