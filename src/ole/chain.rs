//! Chain walking and run reading.
//!
//! A chain is the ordered list of sectors obtained by following depot
//! next-pointers from a start sector to the end-of-chain sentinel. A run read
//! turns such a list into one contiguous byte sequence.

use super::consts::ENDOFCHAIN;
use super::error::{OleError, Result};
use fixedbitset::FixedBitSet;

/// Follow a chain through `depot` starting at `start`.
///
/// The returned list begins with `start` and ends with the `ENDOFCHAIN`
/// sentinel. A chain that starts at `ENDOFCHAIN` is just `[ENDOFCHAIN]`.
///
/// Fails with `CorruptChain` when the walk revisits a sector, reaches a
/// sentinel other than `ENDOFCHAIN`, indexes past the depot, or visits more
/// than `max_len` sectors (the depot length when `None`).
///
/// # Examples
///
/// ```
/// use ole2_reader::ole::follow_chain;
/// let depot = [2, -2, 1];
/// assert_eq!(follow_chain(0, &depot, None).unwrap(), vec![0, 2, 1, -2]);
/// ```
pub fn follow_chain(start: i32, depot: &[i32], max_len: Option<usize>) -> Result<Vec<i32>> {
    let limit = max_len.map_or(depot.len(), |len| len.min(depot.len()));
    let mut visited = FixedBitSet::with_capacity(depot.len());
    let mut chain = vec![start];
    let mut current = start;

    while current != ENDOFCHAIN {
        if current < 0 {
            return Err(OleError::CorruptChain(format!(
                "chain from sector {} reaches sentinel {}",
                start, current
            )));
        }

        let index = current as usize;
        if index >= depot.len() {
            return Err(OleError::CorruptChain(format!(
                "chain from sector {} references sector {} beyond depot of {}",
                start,
                current,
                depot.len()
            )));
        }
        if visited.put(index) {
            return Err(OleError::CorruptChain(format!(
                "chain from sector {} revisits sector {}",
                start, current
            )));
        }
        if chain.len() > limit {
            return Err(OleError::CorruptChain(format!(
                "chain from sector {} exceeds {} sectors",
                start, limit
            )));
        }

        current = depot[index];
        chain.push(current);
    }

    tracing::trace!(start, sectors = chain.len() - 1, "followed chain");
    Ok(chain)
}

/// Concatenate the `block_size` blocks of `region` named by `run`.
///
/// Negative entries (the trailing sentinel) are skipped. A block that does
/// not lie wholly inside `region` fails with `CorruptChain`.
///
/// # Examples
///
/// ```
/// use ole2_reader::ole::read_run;
/// let region = b"aabbcc";
/// assert_eq!(read_run(&[2, 0, -2], region, 2).unwrap(), b"ccaa");
/// ```
pub fn read_run(run: &[i32], region: &[u8], block_size: usize) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(run.len().saturating_mul(block_size));

    for &block in run {
        if block < 0 {
            continue;
        }

        let start = (block as usize).checked_mul(block_size);
        let slice = start
            .and_then(|start| region.get(start..start.checked_add(block_size)?))
            .ok_or_else(|| {
                OleError::CorruptChain(format!(
                    "block {} lies beyond the {}-byte region",
                    block,
                    region.len()
                ))
            })?;
        data.extend_from_slice(slice);
    }

    Ok(data)
}
