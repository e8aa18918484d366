/// Constants for OLE file format
pub mod consts;

/// Header decoding
mod header;

/// Sector depot construction
mod depot;

/// Chain walking and run reading
mod chain;

/// Directory entry decoding
mod directory;

/// Big-block and mini-stream content reconstruction
mod stream;

/// Decoding options
mod options;

/// Error types for compound file decoding
mod error;

/// Main OLE file parsing implementation
mod file;


// Re-export public types for convenient access
pub use chain::{follow_chain, read_run};
pub use depot::{build_depot, collect_depot_list};
pub use directory::{DirectoryEntry, EntryType, decode_directory};
pub use error::{OleError, Result};
pub use file::{OleFile, is_ole_file};
pub use header::Header;
pub use options::{MiniStreamAddressing, OleOptions};
pub use stream::{BlockSource, StreamLocation, read_mini_linear, select_location};
