//! Sector depot (allocation table) construction.
//!
//! The depot maps every sector index to the next sector of its chain. It is
//! stored as a sequence of big blocks whose locations are listed in the
//! header and, for large files, in depot extension (DIFAT) sectors.

use super::consts::FREESECT;
use super::error::{OleError, Result};
use super::header::Header;
use crate::common::binary::read_i32_array_le;
use fixedbitset::FixedBitSet;

/// Borrow the big block at `sector` from the region following the header.
#[inline]
pub(crate) fn sector_slice(sectors: &[u8], sector: usize, block_size: usize) -> Option<&[u8]> {
    let start = sector.checked_mul(block_size)?;
    let end = start.checked_add(block_size)?;
    sectors.get(start..end)
}

/// Build the flat depot from a list of depot-sector indices.
///
/// Each non-negative index names a big block that is decoded as
/// `block_size / 4` signed entries and appended in list order, so entry `n`
/// always describes sector `n`. Negative indices are placeholders and are
/// skipped. A page cut short by the end of the buffer, or lying wholly past
/// it, keeps its slot: the missing entries read as `FREESECT`, and chains
/// that reach them fail with `CorruptChain`.
pub fn build_depot(list: &[i32], sectors: &[u8], block_size: usize) -> Result<Vec<i32>> {
    let entries_per_sector = block_size / 4;
    let mut depot = Vec::with_capacity(list.len() * entries_per_sector);

    for &sector in list {
        if sector < 0 {
            continue;
        }

        let start = (sector as usize).saturating_mul(block_size);
        let available = sectors.len().saturating_sub(start).min(block_size);
        let count = available / 4;
        if count > 0 {
            depot.extend(read_i32_array_le(sectors, start, count)?);
        }

        if count < entries_per_sector {
            tracing::warn!(
                sector,
                available,
                "depot sector truncated by end of buffer, padding with free entries"
            );
            depot.resize(depot.len() + entries_per_sector - count, FREESECT);
        }
    }

    Ok(depot)
}

/// Return the complete depot-sector list for `header`.
///
/// When all header slots are in use and the header names extension
/// sectors, the list continues through them. Each extension sector holds
/// `block_size / 4 - 1` depot-sector indices followed by the index of the
/// next extension sector. The list ends at the first negative entry.
pub fn collect_depot_list(header: &Header, sectors: &[u8], follow_difat: bool) -> Result<Vec<i32>> {
    let mut list = header.depot_list.clone();
    if !follow_difat
        || !header.depot_list_is_full()
        || header.num_difat_sectors == 0
        || header.difat_start < 0
    {
        return Ok(list);
    }

    let block_size = header.big_block_size();
    let entries_per_sector = block_size / 4 - 1;
    let total_sectors = sectors.len() / block_size;
    let mut visited = FixedBitSet::with_capacity(total_sectors);
    let mut current = header.difat_start;

    for _ in 0..header.num_difat_sectors {
        if current < 0 {
            break;
        }
        let index = current as usize;
        if index >= total_sectors {
            return Err(OleError::CorruptChain(format!(
                "extension sector {} lies beyond the buffer",
                current
            )));
        }
        if visited.put(index) {
            return Err(OleError::CorruptChain(format!(
                "extension sector {} revisited",
                current
            )));
        }

        let page = sector_slice(sectors, index, block_size).ok_or_else(|| {
            OleError::CorruptChain(format!("extension sector {} lies beyond the buffer", current))
        })?;
        let values = read_i32_array_le(page, 0, entries_per_sector + 1)?;

        for &value in &values[..entries_per_sector] {
            list.push(value);
            if value < 0 {
                tracing::debug!(entries = list.len(), "depot list ends in extension sector");
                return Ok(list);
            }
        }
        current = values[entries_per_sector];
    }

    tracing::debug!(entries = list.len(), "collected extended depot list");
    Ok(list)
}
