//! Compound file header decoding.
//!
//! The header is the first 512 bytes of the file. Its fixed fields are read
//! through a `zerocopy` record; the depot-sector list that follows them is
//! variable length and ends at the first negative entry.

use super::consts::*;
use super::error::{OleError, Result};
use crate::common::binary::{format_guid, read_i32_le};
use zerocopy::{FromBytes, I32, LE, U16, U32};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Fixed part of the on-disk header (76 bytes, little-endian)
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawHeader {
    magic: [u8; 8],
    clsid: [u8; 16],
    minor_version: U16<LE>,
    major_version: U16<LE>,
    byte_order: U16<LE>,
    big_block_shift: U16<LE>,
    small_block_shift: U16<LE>,
    _reserved: [u8; 10],
    num_depot_sectors: U32<LE>,
    dir_start: I32<LE>,
    _transaction_signature: U32<LE>,
    threshold: U32<LE>,
    mini_depot_start: I32<LE>,
    num_mini_depot_sectors: U32<LE>,
    difat_start: I32<LE>,
    num_difat_sectors: U32<LE>,
}

/// Decoded compound file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Class identifier of the file (usually all zero)
    pub clsid: [u8; 16],
    pub minor_version: u16,
    pub major_version: u16,
    /// Byte order marker, `0xFFFE` for little-endian files
    pub byte_order: u16,
    /// Big block size is `1 << big_block_shift`
    pub big_block_shift: u16,
    /// Small block size is `1 << small_block_shift`
    pub small_block_shift: u16,
    /// Number of sectors holding the depot
    pub num_depot_sectors: u32,
    /// First sector of the directory stream
    pub dir_start: i32,
    /// Streams smaller than this live in the mini-stream
    pub threshold: u32,
    /// First sector of the mini-stream allocation table
    pub mini_depot_start: i32,
    pub num_mini_depot_sectors: u32,
    /// First depot extension (DIFAT) sector
    pub difat_start: i32,
    pub num_difat_sectors: u32,
    /// Depot-sector indices embedded in the header, including the
    /// terminating negative entry when one was found
    pub depot_list: Vec<i32>,
}

impl Header {
    /// Parse and validate the header at the start of `data`.
    ///
    /// Fails with `MalformedContainer` when the buffer is shorter than a
    /// header, the magic does not match, or the block shifts are unusable.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(OleError::MalformedContainer(format!(
                "buffer holds {} bytes, header needs {}",
                data.len(),
                HEADER_SIZE
            )));
        }

        let raw = RawHeader::read_from_bytes(&data[..HEADER_DEPOT_LIST_OFFSET])
            .map_err(|_| OleError::MalformedContainer("failed to read header".to_string()))?;

        if &raw.magic != MAGIC {
            return Err(OleError::MalformedContainer(format!(
                "bad magic {:02X?}",
                raw.magic
            )));
        }

        let big_block_shift = raw.big_block_shift.get();
        let small_block_shift = raw.small_block_shift.get();
        if !(MIN_BIG_BLOCK_SHIFT..=MAX_BIG_BLOCK_SHIFT).contains(&big_block_shift) {
            return Err(OleError::MalformedContainer(format!(
                "big block shift {} out of range",
                big_block_shift
            )));
        }
        if small_block_shift > big_block_shift {
            return Err(OleError::MalformedContainer(format!(
                "small block shift {} exceeds big block shift {}",
                small_block_shift, big_block_shift
            )));
        }

        let byte_order = raw.byte_order.get();
        if byte_order != BYTE_ORDER_LE {
            tracing::warn!(byte_order, "unexpected byte order marker, decoding as little-endian");
        }

        let depot_list = read_depot_list(&data[..HEADER_SIZE])?;

        let header = Header {
            clsid: raw.clsid,
            minor_version: raw.minor_version.get(),
            major_version: raw.major_version.get(),
            byte_order,
            big_block_shift,
            small_block_shift,
            num_depot_sectors: raw.num_depot_sectors.get(),
            dir_start: raw.dir_start.get(),
            threshold: raw.threshold.get(),
            mini_depot_start: raw.mini_depot_start.get(),
            num_mini_depot_sectors: raw.num_mini_depot_sectors.get(),
            difat_start: raw.difat_start.get(),
            num_difat_sectors: raw.num_difat_sectors.get(),
            depot_list,
        };

        tracing::debug!(
            major = header.major_version,
            big_block = header.big_block_size(),
            small_block = header.small_block_size(),
            threshold = header.threshold,
            depot_sectors = header.depot_list.len(),
            "decoded header"
        );

        Ok(header)
    }

    /// Big block (sector) size in bytes.
    #[inline]
    pub fn big_block_size(&self) -> usize {
        1usize << self.big_block_shift
    }

    /// Small (mini-stream) block size in bytes.
    #[inline]
    pub fn small_block_size(&self) -> usize {
        1usize << self.small_block_shift
    }

    /// The header's class identifier, formatted. Empty when all zero.
    pub fn clsid(&self) -> String {
        format_guid(&self.clsid)
    }

    /// Whether every header depot slot holds a sector index, meaning the
    /// list may continue in extension sectors.
    pub fn depot_list_is_full(&self) -> bool {
        self.depot_list.len() == HEADER_DEPOT_SLOTS && self.depot_list.iter().all(|&v| v >= 0)
    }
}

/// Read the header's depot-sector list up to and including the first
/// negative value, bounded by the slots available in the header.
fn read_depot_list(header: &[u8]) -> Result<Vec<i32>> {
    let mut list = Vec::new();
    for slot in 0..HEADER_DEPOT_SLOTS {
        let value = read_i32_le(header, HEADER_DEPOT_LIST_OFFSET + slot * 4)?;
        list.push(value);
        if value < 0 {
            break;
        }
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_header() -> Vec<u8> {
        let mut data = vec![0u8; HEADER_SIZE];
        data[0..8].copy_from_slice(MAGIC);
        data[0x18..0x1A].copy_from_slice(&0x3Eu16.to_le_bytes());
        data[0x1A..0x1C].copy_from_slice(&3u16.to_le_bytes());
        data[0x1C..0x1E].copy_from_slice(&BYTE_ORDER_LE.to_le_bytes());
        data[0x1E..0x20].copy_from_slice(&9u16.to_le_bytes());
        data[0x20..0x22].copy_from_slice(&6u16.to_le_bytes());
        data[0x2C..0x30].copy_from_slice(&1u32.to_le_bytes());
        data[0x30..0x34].copy_from_slice(&1i32.to_le_bytes());
        data[0x38..0x3C].copy_from_slice(&DEFAULT_THRESHOLD.to_le_bytes());
        data[0x3C..0x40].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
        data[0x44..0x48].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
        for slot in 0..HEADER_DEPOT_SLOTS {
            let offset = HEADER_DEPOT_LIST_OFFSET + slot * 4;
            data[offset..offset + 4].copy_from_slice(&FREESECT.to_le_bytes());
        }
        data[0x4C..0x50].copy_from_slice(&0i32.to_le_bytes());
        data
    }

    #[test]
    fn test_parse_standard_header() {
        let header = Header::parse(&standard_header()).unwrap();
        assert_eq!(header.major_version, 3);
        assert_eq!(header.minor_version, 0x3E);
        assert_eq!(header.big_block_size(), BIG_BLOCK_SIZE);
        assert_eq!(header.small_block_size(), SMALL_BLOCK_SIZE);
        assert_eq!(header.threshold, DEFAULT_THRESHOLD);
        assert_eq!(header.dir_start, 1);
        assert_eq!(header.num_depot_sectors, 1);
        assert_eq!(header.mini_depot_start, ENDOFCHAIN);
        assert_eq!(header.clsid(), "");
        // Stops at and keeps the first negative entry
        assert_eq!(header.depot_list, vec![0, FREESECT]);
        assert!(!header.depot_list_is_full());
    }

    #[test]
    fn test_short_buffer_is_malformed() {
        let data = standard_header();
        let err = Header::parse(&data[..511]).unwrap_err();
        assert!(matches!(err, OleError::MalformedContainer(_)));
    }

    #[test]
    fn test_bad_magic_is_malformed() {
        let mut data = standard_header();
        data[7] = 0xE0;
        assert!(matches!(
            Header::parse(&data),
            Err(OleError::MalformedContainer(_))
        ));
    }

    #[test]
    fn test_unusable_shifts_are_malformed() {
        let mut data = standard_header();
        data[0x1E..0x20].copy_from_slice(&40u16.to_le_bytes());
        assert!(matches!(
            Header::parse(&data),
            Err(OleError::MalformedContainer(_))
        ));

        let mut data = standard_header();
        data[0x20..0x22].copy_from_slice(&10u16.to_le_bytes());
        assert!(matches!(
            Header::parse(&data),
            Err(OleError::MalformedContainer(_))
        ));
    }

    #[test]
    fn test_full_depot_list_has_no_terminator() {
        let mut data = standard_header();
        for slot in 0..HEADER_DEPOT_SLOTS {
            let offset = HEADER_DEPOT_LIST_OFFSET + slot * 4;
            data[offset..offset + 4].copy_from_slice(&(slot as i32).to_le_bytes());
        }
        let header = Header::parse(&data).unwrap();
        assert_eq!(header.depot_list.len(), HEADER_DEPOT_SLOTS);
        assert_eq!(header.depot_list[108], 108);
        assert!(header.depot_list_is_full());
    }

    #[test]
    fn test_v4_geometry() {
        let mut data = standard_header();
        data[0x1A..0x1C].copy_from_slice(&4u16.to_le_bytes());
        data[0x1E..0x20].copy_from_slice(&12u16.to_le_bytes());
        let header = Header::parse(&data).unwrap();
        assert_eq!(header.big_block_size(), 4096);
        assert_eq!(header.small_block_size(), 64);
    }
}
