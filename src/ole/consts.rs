/// Magic bytes that should be at the beginning of every OLE file
pub const MAGIC: &[u8; 8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Size of the on-disk header record in bytes
pub const HEADER_SIZE: usize = 512;

/// Offset of the embedded depot-sector list inside the header
pub const HEADER_DEPOT_LIST_OFFSET: usize = 0x4C;

/// Number of depot-sector slots that fit in the header
pub const HEADER_DEPOT_SLOTS: usize = (HEADER_SIZE - HEADER_DEPOT_LIST_OFFSET) / 4;

/// Size of a directory entry in bytes
pub const DIRENTRY_SIZE: usize = 128;

/// Standard big block size (shift 9)
pub const BIG_BLOCK_SIZE: usize = 512;

/// Standard small block size (shift 6)
pub const SMALL_BLOCK_SIZE: usize = 64;

/// Standard mini-stream cutoff
pub const DEFAULT_THRESHOLD: u32 = 4096;

/// Byte order marker for little-endian files
pub const BYTE_ORDER_LE: u16 = 0xFFFE;

/// Smallest big-block shift accepted (128-byte blocks)
pub const MIN_BIG_BLOCK_SHIFT: u16 = 7;

/// Largest big-block shift accepted (64 KiB blocks)
pub const MAX_BIG_BLOCK_SHIFT: u16 = 16;

// Sector IDs, signed as stored on disk
/// Denotes a DIFAT sector in a depot
pub const DIFSECT: i32 = -4;
/// Denotes a depot sector in a depot
pub const FATSECT: i32 = -3;
/// End of a sector chain
pub const ENDOFCHAIN: i32 = -2;
/// Unallocated sector
pub const FREESECT: i32 = -1;

/// Unallocated directory entry
pub const NOSTREAM: i32 = -1;

// Object types in storage
/// Element is a storage object
pub const STGTY_STORAGE: u8 = 1;
/// Element is a stream object
pub const STGTY_STREAM: u8 = 2;
/// Element is a root storage
pub const STGTY_ROOT: u8 = 5;
