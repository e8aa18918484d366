//! Stream reconstruction.
//!
//! Stream content lives either in big blocks addressed through the depot or,
//! below the size threshold, in small blocks carved out of the mini-stream.
//! The root entry is always read from big blocks: its content *is* the
//! mini-stream.

use super::chain::{follow_chain, read_run};
use super::directory::EntryType;
use super::error::{OleError, Result};

/// Where an entry's bytes are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamLocation {
    /// Big-block chain starting at a depot sector
    BigBlocks,
    /// Small blocks inside the mini-stream
    MiniStream,
}

/// Decide where an entry of `entry_type` and `size` is stored.
///
/// The root is always big-block; everything else goes big-block once its
/// size reaches `threshold`.
///
/// # Examples
///
/// ```
/// use ole2_reader::ole::{select_location, EntryType, StreamLocation};
/// assert_eq!(select_location(EntryType::Stream, 4096, 4096), StreamLocation::BigBlocks);
/// assert_eq!(select_location(EntryType::Stream, 4095, 4096), StreamLocation::MiniStream);
/// assert_eq!(select_location(EntryType::Root, 64, 4096), StreamLocation::BigBlocks);
/// ```
pub fn select_location(entry_type: EntryType, size: u32, threshold: u32) -> StreamLocation {
    if entry_type == EntryType::Root {
        return StreamLocation::BigBlocks;
    }
    if size >= threshold {
        StreamLocation::BigBlocks
    } else {
        StreamLocation::MiniStream
    }
}

/// Sector region and depot used for big-block reads.
#[derive(Debug, Clone, Copy)]
pub struct BlockSource<'a> {
    /// Bytes following the header; sector `n` starts at `n * block_size`
    pub region: &'a [u8],
    /// Allocation table for `region`
    pub depot: &'a [i32],
    pub block_size: usize,
    pub max_chain_len: Option<usize>,
}

impl BlockSource<'_> {
    /// Read the chain starting at `start`, truncated to `size` bytes.
    pub fn read_stream(&self, start: i32, size: u32) -> Result<Vec<u8>> {
        let chain = follow_chain(start, self.depot, self.max_chain_len)?;
        let mut data = read_run(&chain, self.region, self.block_size)?;

        let size = size as usize;
        if data.len() < size {
            tracing::warn!(
                start,
                declared = size,
                available = data.len(),
                "chain shorter than declared stream size"
            );
        }
        data.truncate(size);
        Ok(data)
    }
}

/// Slice a small stream out of the mini-stream by linear small-block index.
///
/// Empty streams read as empty whatever their start value.
pub fn read_mini_linear(arena: &[u8], start: i32, size: u32, block_size: usize) -> Result<Vec<u8>> {
    if size == 0 {
        return Ok(Vec::new());
    }

    let out_of_range = |index: usize| OleError::OutOfRange {
        what: "mini stream",
        index,
        len: arena.len(),
    };

    let start = usize::try_from(start).map_err(|_| out_of_range(0))?;
    let begin = start.checked_mul(block_size).ok_or_else(|| out_of_range(usize::MAX))?;
    let end = begin
        .checked_add(size as usize)
        .ok_or_else(|| out_of_range(usize::MAX))?;

    arena
        .get(begin..end)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| out_of_range(end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::consts::ENDOFCHAIN;

    #[test]
    fn test_threshold_boundary_is_big_block() {
        assert_eq!(
            select_location(EntryType::Stream, 4096, 4096),
            StreamLocation::BigBlocks
        );
        assert_eq!(
            select_location(EntryType::Stream, 0, 4096),
            StreamLocation::MiniStream
        );
    }

    #[test]
    fn test_root_is_big_block_whatever_its_size() {
        assert_eq!(select_location(EntryType::Root, 0, 4096), StreamLocation::BigBlocks);
        assert_eq!(
            select_location(EntryType::Root, u32::MAX, 4096),
            StreamLocation::BigBlocks
        );
    }

    #[test]
    fn test_forced_storage_follows_size_rule() {
        assert_eq!(
            select_location(EntryType::Storage, 10, 4096),
            StreamLocation::MiniStream
        );
    }

    #[test]
    fn test_block_source_truncates_to_size() {
        let region: Vec<u8> = (0..32).collect();
        let depot = [1, ENDOFCHAIN, ENDOFCHAIN, ENDOFCHAIN];
        let source = BlockSource {
            region: &region,
            depot: &depot,
            block_size: 8,
            max_chain_len: None,
        };

        let data = source.read_stream(0, 11).unwrap();
        assert_eq!(data, (0..11).collect::<Vec<u8>>());

        // A chain shorter than the declared size is returned as is
        assert_eq!(source.read_stream(2, 100).unwrap().len(), 8);
    }

    #[test]
    fn test_read_mini_linear() {
        let arena: Vec<u8> = (0..=255).collect();
        assert_eq!(read_mini_linear(&arena, 2, 3, 64).unwrap(), vec![128, 129, 130]);
        assert!(read_mini_linear(&arena, ENDOFCHAIN, 0, 64).unwrap().is_empty());
        assert!(matches!(
            read_mini_linear(&arena, 3, 65, 64),
            Err(OleError::OutOfRange { what: "mini stream", .. })
        ));
        assert!(matches!(
            read_mini_linear(&arena, -1, 1, 64),
            Err(OleError::OutOfRange { .. })
        ));
    }
}
