//! Directory entry ("property set") decoding.
//!
//! The directory stream is a flat array of 128-byte records. Records are
//! decoded positionally; whether a slot is actually part of the storage tree
//! is only known by following `dir`/`prev`/`next` pointers into it.

use super::consts::*;
use super::error::{OleError, Result};
use crate::common::binary::{
    BinaryError, filetime_to_datetime, format_guid, parse_utf16le_string_len,
};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use zerocopy::{FromBytes, I32, LE, U16, U32, U64};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw OLE directory entry structure (128 bytes)
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawDirectoryEntry {
    /// Entry name in UTF-16LE (64 bytes, null-padded)
    name: [u8; 64],
    /// Length of name in bytes (including null terminator)
    name_len: U16<LE>,
    entry_type: u8,
    /// Node color (0 = red, 1 = black)
    color: u8,
    prev: I32<LE>,
    next: I32<LE>,
    dir: I32<LE>,
    clsid: [u8; 16],
    flags: U32<LE>,
    created: U64<LE>,
    modified: U64<LE>,
    start: I32<LE>,
    size: U32<LE>,
    _padding: U32<LE>,
}

/// Kind of node a directory entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryType {
    /// A storage (folder)
    Storage,
    /// A stream (file)
    Stream,
    /// The root storage; its content is the mini-stream
    Root,
    /// Unused slot (0) or a type this reader does not know
    Unknown(u8),
}

impl From<u8> for EntryType {
    fn from(value: u8) -> Self {
        match value {
            STGTY_STORAGE => EntryType::Storage,
            STGTY_STREAM => EntryType::Stream,
            STGTY_ROOT => EntryType::Root,
            other => EntryType::Unknown(other),
        }
    }
}

impl EntryType {
    /// Whether entries of this type carry byte content of their own.
    #[inline]
    pub fn has_content(self) -> bool {
        matches!(self, EntryType::Stream | EntryType::Root)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Storage => "dir",
            EntryType::Stream => "file",
            EntryType::Root => "root",
            EntryType::Unknown(_) => "unknown",
        }
    }
}

/// A decoded directory entry (stream, storage or root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    /// Position in the directory array
    pub index: usize,
    /// Entry name (UTF-16 decoded to UTF-8)
    pub name: String,
    /// Recorded name length in bytes, terminator included
    pub name_len: u16,
    pub entry_type: EntryType,
    pub color: u8,
    /// Left sibling index
    pub prev: i32,
    /// Right sibling index
    pub next: i32,
    /// First child index (storages)
    pub dir: i32,
    pub clsid: [u8; 16],
    pub flags: u32,
    /// Creation time as a raw FILETIME, serialized as a UTC timestamp
    #[serde(rename = "created", serialize_with = "serialize_filetime")]
    pub created_filetime: u64,
    /// Modification time as a raw FILETIME, serialized as a UTC timestamp
    #[serde(rename = "modified", serialize_with = "serialize_filetime")]
    pub modified_filetime: u64,
    /// Starting big-block sector, or small-block index for mini-stream entries
    pub start: i32,
    /// Stream size in bytes
    pub size: u32,
}

fn serialize_filetime<S: Serializer>(
    filetime: &u64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    filetime_to_datetime(*filetime).serialize(serializer)
}

impl DirectoryEntry {
    /// Decode one 128-byte record found at position `index`.
    pub fn parse(data: &[u8], index: usize) -> Result<Self> {
        let raw = RawDirectoryEntry::read_from_bytes(data).map_err(|_| {
            OleError::Binary(BinaryError::InsufficientData {
                expected: DIRENTRY_SIZE,
                available: data.len(),
            })
        })?;

        let name_len = raw.name_len.get();
        let name_chars = (name_len as usize).min(raw.name.len()) / 2;
        let name = parse_utf16le_string_len(&raw.name, 0, name_chars);

        Ok(DirectoryEntry {
            index,
            name,
            name_len,
            entry_type: EntryType::from(raw.entry_type),
            color: raw.color,
            prev: raw.prev.get(),
            next: raw.next.get(),
            dir: raw.dir.get(),
            clsid: raw.clsid,
            flags: raw.flags.get(),
            created_filetime: raw.created.get(),
            modified_filetime: raw.modified.get(),
            start: raw.start.get(),
            size: raw.size.get(),
        })
    }

    /// The entry's class identifier, formatted. Empty when all zero.
    pub fn clsid_string(&self) -> String {
        format_guid(&self.clsid)
    }

    /// Creation time, if recorded.
    pub fn created(&self) -> Option<DateTime<Utc>> {
        filetime_to_datetime(self.created_filetime)
    }

    /// Last modification time, if recorded.
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        filetime_to_datetime(self.modified_filetime)
    }

    #[inline]
    pub fn is_stream(&self) -> bool {
        self.entry_type == EntryType::Stream
    }

    #[inline]
    pub fn is_storage(&self) -> bool {
        matches!(self.entry_type, EntryType::Storage | EntryType::Root)
    }
}

/// Decode the directory stream into `len / 128` entries.
///
/// Trailing bytes that do not fill a whole record are ignored. Sibling and
/// child pointers are not validated here.
pub fn decode_directory(data: &[u8]) -> Result<Vec<DirectoryEntry>> {
    data.chunks_exact(DIRENTRY_SIZE)
        .enumerate()
        .map(|(index, record)| DirectoryEntry::parse(record, index))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Encode a directory record the way a writer lays it out on disk.
    pub(crate) fn encode_entry(
        name: &str,
        entry_type: u8,
        (prev, next, dir): (i32, i32, i32),
        start: i32,
        size: u32,
    ) -> Vec<u8> {
        let mut record = vec![0u8; DIRENTRY_SIZE];
        let units: Vec<u16> = name.encode_utf16().collect();
        for (i, unit) in units.iter().enumerate() {
            record[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        let name_len = if name.is_empty() { 0 } else { (units.len() as u16 + 1) * 2 };
        record[64..66].copy_from_slice(&name_len.to_le_bytes());
        record[66] = entry_type;
        record[67] = 1;
        record[68..72].copy_from_slice(&prev.to_le_bytes());
        record[72..76].copy_from_slice(&next.to_le_bytes());
        record[76..80].copy_from_slice(&dir.to_le_bytes());
        record[116..120].copy_from_slice(&start.to_le_bytes());
        record[120..124].copy_from_slice(&size.to_le_bytes());
        record
    }

    #[test]
    fn test_parse_entry_fields() {
        let mut record = encode_entry("WordDocument", STGTY_STREAM, (3, NOSTREAM, NOSTREAM), 7, 4142);
        record[80..96].copy_from_slice(&[
            0x06, 0x09, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x46,
        ]);
        record[96..100].copy_from_slice(&0x10u32.to_le_bytes());
        record[108..116].copy_from_slice(&116_444_736_000_000_000u64.to_le_bytes());

        let entry = DirectoryEntry::parse(&record, 4).unwrap();
        assert_eq!(entry.index, 4);
        assert_eq!(entry.name, "WordDocument");
        assert_eq!(entry.name_len, 26);
        assert_eq!(entry.entry_type, EntryType::Stream);
        assert_eq!(entry.color, 1);
        assert_eq!((entry.prev, entry.next, entry.dir), (3, NOSTREAM, NOSTREAM));
        assert_eq!(entry.start, 7);
        assert_eq!(entry.size, 4142);
        assert_eq!(entry.flags, 0x10);
        assert_eq!(entry.clsid_string(), "00020906-0000-0000-C000-000000000046");
        assert!(entry.created().is_none());
        assert_eq!(entry.modified().map(|t| t.timestamp()), Some(0));
        assert!(entry.is_stream());
        assert!(!entry.is_storage());
    }

    #[test]
    fn test_name_length_is_capped() {
        let mut record = encode_entry("A", STGTY_STORAGE, (NOSTREAM, NOSTREAM, NOSTREAM), 0, 0);
        record[64..66].copy_from_slice(&500u16.to_le_bytes());
        let entry = DirectoryEntry::parse(&record, 0).unwrap();
        assert_eq!(entry.name, "A");
        assert_eq!(entry.entry_type, EntryType::Storage);
    }

    #[test]
    fn test_name_uses_recorded_length() {
        let mut record = encode_entry("Summary", STGTY_STREAM, (NOSTREAM, NOSTREAM, NOSTREAM), 0, 0);
        // Only the first three characters are declared
        record[64..66].copy_from_slice(&6u16.to_le_bytes());
        assert_eq!(DirectoryEntry::parse(&record, 0).unwrap().name, "Sum");
    }

    #[test]
    fn test_decode_directory_counts_whole_records() {
        let mut data = encode_entry("Root Entry", STGTY_ROOT, (NOSTREAM, NOSTREAM, 1), ENDOFCHAIN, 0);
        data.extend(encode_entry("", 0, (NOSTREAM, NOSTREAM, NOSTREAM), 0, 0));
        data.extend([0u8; 40]);

        let entries = decode_directory(&data).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].entry_type, EntryType::Root);
        assert_eq!(entries[0].name, "Root Entry");
        assert_eq!(entries[1].entry_type, EntryType::Unknown(0));
        assert_eq!(entries[1].index, 1);
    }

    #[test]
    fn test_entry_serializes_timestamps() {
        let mut record = encode_entry("Data", STGTY_STREAM, (NOSTREAM, NOSTREAM, NOSTREAM), 2, 100);
        // 2020-01-01T00:00:00Z
        record[100..108].copy_from_slice(&132_223_104_000_000_000u64.to_le_bytes());
        let entry = DirectoryEntry::parse(&record, 5).unwrap();

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["index"], 5);
        assert_eq!(value["name"], "Data");
        assert_eq!(value["entry_type"], "Stream");
        assert_eq!(value["size"], 100);
        assert!(
            value["created"]
                .as_str()
                .unwrap()
                .starts_with("2020-01-01T00:00:00")
        );
        assert!(value["modified"].is_null());
        assert!(value.get("created_filetime").is_none());

        let unknown = serde_json::to_value(EntryType::Unknown(7)).unwrap();
        assert_eq!(unknown["Unknown"], 7);
    }

    #[test]
    fn test_entry_type_content() {
        assert!(EntryType::Stream.has_content());
        assert!(EntryType::Root.has_content());
        assert!(!EntryType::Storage.has_content());
        assert!(!EntryType::Unknown(3).has_content());
        assert_eq!(EntryType::from(2).as_str(), "file");
    }
}
