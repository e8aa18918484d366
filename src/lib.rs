//! Read-only decoder for OLE2 compound files.
//!
//! Compound files (the container behind legacy `.doc`, `.xls` and `.ppt`
//! files, MSI packages and many forensic artifacts) are a small filesystem
//! inside one file: a sector allocation table, linked sector chains, a flat
//! directory array emulating a tree, and a mini-stream for small streams.
//! This crate decodes them from a byte buffer the caller has already read.
//!
//! # Features
//!
//! - **Header validation**: magic, block geometry and depot location
//! - **Chain following**: bounded, cycle-checked walks of the sector depot
//! - **Directory enumeration**: every 128-byte entry with its raw fields
//! - **Stream extraction**: big-block and mini-stream content, truncated to
//!   the declared size
//!
//! The directory is listed the way the classic forensic readers do it: the
//! children of a storage are `entries[dir]` followed by its `next` chain.
//! [`ole::OleFile::tree_children`] walks the full sibling tree instead.
//!
//! # Example
//!
//! ```no_run
//! use ole2_reader::ole::OleFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("document.doc")?;
//! let ole = OleFile::open(&data)?;
//!
//! for entry in ole.entries() {
//!     let content = ole.content(entry, false)?;
//!     println!("{:<32} {:>6} {:>10}", entry.name, entry.entry_type.as_str(), content.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Diagnostics are emitted through `tracing`; install a subscriber to see
//! them.

/// Shared binary field decoding
pub mod common;

/// OLE2 compound file decoder
///
/// This module provides functionality to parse OLE2 structured storage
/// files held in memory.
pub mod ole;

// Re-export commonly used types for convenience
pub use ole::{DirectoryEntry, EntryType, OleError, OleFile, OleOptions};
