use super::chain::{follow_chain, read_run};
use super::consts::*;
use super::depot::{build_depot, collect_depot_list};
use super::directory::{DirectoryEntry, decode_directory};
use super::error::{OleError, Result};
use super::header::Header;
use super::options::{MiniStreamAddressing, OleOptions};
use super::stream::{BlockSource, StreamLocation, read_mini_linear, select_location};
use crate::common::binary::read_i32_array_le;
use fixedbitset::FixedBitSet;

/// A decoded OLE2 compound file over a borrowed byte buffer.
///
/// Everything is derived once in [`OleFile::open`]: header, sector depot,
/// directory entries and the mini-stream. After that the container is
/// read-only, so shared references may be used from several threads.
#[derive(Debug)]
pub struct OleFile<'a> {
    /// The complete file contents
    data: &'a [u8],
    header: Header,
    options: OleOptions,
    /// Sector depot - maps sector to next sector in chain
    depot: Vec<i32>,
    /// Small-block depot, loaded only for `MiniStreamAddressing::MiniFat`
    mini_depot: Option<Vec<i32>>,
    /// All directory entries indexed by position
    entries: Vec<DirectoryEntry>,
    /// Root entry content, the arena small streams are sliced from
    ministream: Vec<u8>,
}

impl<'a> OleFile<'a> {
    /// Decode a compound file with default options.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ole2_reader::ole::OleFile;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let data = std::fs::read("document.doc")?;
    /// let ole = OleFile::open(&data)?;
    /// for entry in ole.children(ole.root()) {
    ///     println!("{} ({} bytes)", entry.name, entry.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(data: &'a [u8]) -> Result<Self> {
        Self::open_with_options(data, OleOptions::default())
    }

    /// Decode a compound file.
    ///
    /// Construction runs strictly in order: header, depot, directory chain,
    /// directory entries, then the root entry's content as the mini-stream.
    /// Any failure aborts construction.
    pub fn open_with_options(data: &'a [u8], options: OleOptions) -> Result<Self> {
        let header = Header::parse(data)?;
        let block_size = header.big_block_size();
        let sectors = data.get(block_size..).unwrap_or(&[]);

        let depot_list = collect_depot_list(&header, sectors, options.follow_difat)?;
        let depot = build_depot(&depot_list, sectors, block_size)?;
        tracing::debug!(
            depot_sectors = depot_list.iter().filter(|&&v| v >= 0).count(),
            depot_entries = depot.len(),
            "built sector depot"
        );

        let dir_chain = follow_chain(header.dir_start, &depot, options.max_chain_len)?;
        let dir_data = read_run(&dir_chain, sectors, block_size)?;
        let entries = decode_directory(&dir_data)?;
        if entries.is_empty() {
            return Err(OleError::MalformedContainer(
                "directory stream holds no entries".to_string(),
            ));
        }
        tracing::debug!(entries = entries.len(), "decoded directory");

        let mut ole = OleFile {
            data,
            header,
            options,
            depot,
            mini_depot: None,
            entries,
            ministream: Vec::new(),
        };

        let (root_start, root_size) = (ole.entries[0].start, ole.entries[0].size);
        ole.ministream = ole.big_blocks().read_stream(root_start, root_size)?;
        tracing::debug!(bytes = ole.ministream.len(), "loaded mini stream");

        if ole.options.mini_stream_addressing == MiniStreamAddressing::MiniFat {
            ole.mini_depot = ole.load_mini_depot()?;
        }

        Ok(ole)
    }

    /// Load the small-block depot named by the header, if there is one.
    fn load_mini_depot(&self) -> Result<Option<Vec<i32>>> {
        if self.header.mini_depot_start < 0 {
            tracing::debug!("no mini depot in header, small streams addressed linearly");
            return Ok(None);
        }

        let chain = follow_chain(
            self.header.mini_depot_start,
            &self.depot,
            self.options.max_chain_len,
        )?;
        let bytes = read_run(&chain, self.sectors(), self.header.big_block_size())?;
        let mini_depot = read_i32_array_le(&bytes, 0, bytes.len() / 4)?;
        tracing::debug!(entries = mini_depot.len(), "loaded mini depot");
        Ok(Some(mini_depot))
    }

    /// Region following the header, where sector 0 begins.
    #[inline]
    fn sectors(&self) -> &'a [u8] {
        self.data.get(self.header.big_block_size()..).unwrap_or(&[])
    }

    fn big_blocks(&self) -> BlockSource<'_> {
        BlockSource {
            region: self.sectors(),
            depot: &self.depot,
            block_size: self.header.big_block_size(),
            max_chain_len: self.options.max_chain_len,
        }
    }

    /// The decoded header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The options this container was opened with.
    pub fn options(&self) -> &OleOptions {
        &self.options
    }

    /// The flat sector depot.
    pub fn depot(&self) -> &[i32] {
        &self.depot
    }

    /// The mini-stream arena (the root entry's content).
    pub fn ministream(&self) -> &[u8] {
        &self.ministream
    }

    /// All directory entries, in on-disk order.
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// The root entry (directory entry 0).
    pub fn root(&self) -> &DirectoryEntry {
        &self.entries[0]
    }

    /// Directory entry at `index`.
    pub fn entry(&self, index: usize) -> Result<&DirectoryEntry> {
        self.entries.get(index).ok_or(OleError::OutOfRange {
            what: "directory entry",
            index,
            len: self.entries.len(),
        })
    }

    /// Reconstruct the byte content of `entry`.
    ///
    /// Storages and unknown entry types have no content and read as empty
    /// unless `force` is set, in which case they are read with the same
    /// rules as streams. The root entry and entries of at least
    /// `threshold` bytes come from big blocks; smaller entries are sliced
    /// out of the mini-stream. The result is never longer than `entry.size`.
    pub fn content(&self, entry: &DirectoryEntry, force: bool) -> Result<Vec<u8>> {
        if !entry.entry_type.has_content() && !force {
            tracing::debug!(
                index = entry.index,
                entry_type = entry.entry_type.as_str(),
                "entry has no content"
            );
            return Ok(Vec::new());
        }

        match select_location(entry.entry_type, entry.size, self.header.threshold) {
            StreamLocation::BigBlocks => self.big_blocks().read_stream(entry.start, entry.size),
            StreamLocation::MiniStream => match &self.mini_depot {
                Some(mini_depot) => BlockSource {
                    region: &self.ministream,
                    depot: mini_depot,
                    block_size: self.header.small_block_size(),
                    max_chain_len: self.options.max_chain_len,
                }
                .read_stream(entry.start, entry.size),
                None => read_mini_linear(
                    &self.ministream,
                    entry.start,
                    entry.size,
                    self.header.small_block_size(),
                ),
            },
        }
    }

    /// Entries listed under `entry`, following `next` pointers only.
    ///
    /// Starts at `entries[entry.dir]` and follows `next` while it is positive
    /// and inside the directory. This is a forward list, not a walk of the
    /// left/right sibling tree; see [`OleFile::tree_children`] for that. A
    /// `dir` outside the directory yields an empty list, and the list stops
    /// before any entry it has already visited.
    pub fn children(&self, entry: &DirectoryEntry) -> Vec<&DirectoryEntry> {
        let count = self.entries.len();
        let Some(first) = self.valid_index(entry.dir) else {
            return Vec::new();
        };

        let mut visited = FixedBitSet::with_capacity(count);
        visited.insert(first);
        let mut result = vec![&self.entries[first]];
        let mut next = self.entries[first].next;

        while next > 0 && (next as usize) < count {
            let index = next as usize;
            if visited.put(index) {
                tracing::warn!(index, "sibling list loops, stopping");
                break;
            }
            result.push(&self.entries[index]);
            next = self.entries[index].next;
        }

        result
    }

    /// Entries under `entry` in sibling-tree order.
    ///
    /// Walks the left (`prev`) / right (`next`) tree rooted at `entry.dir`
    /// in order. Out-of-range pointers end a branch; revisited entries are
    /// skipped.
    pub fn tree_children(&self, entry: &DirectoryEntry) -> Vec<&DirectoryEntry> {
        let mut result = Vec::new();
        let mut stack = Vec::new();
        let mut visited = FixedBitSet::with_capacity(self.entries.len());
        let mut current = self.valid_index(entry.dir);

        loop {
            while let Some(index) = current {
                if visited.put(index) {
                    tracing::warn!(index, "sibling tree revisits entry, pruning");
                    break;
                }
                stack.push(index);
                current = self.valid_index(self.entries[index].prev);
            }

            let Some(index) = stack.pop() else {
                break;
            };
            result.push(&self.entries[index]);
            current = self.valid_index(self.entries[index].next);
        }

        result
    }

    #[inline]
    fn valid_index(&self, pointer: i32) -> Option<usize> {
        usize::try_from(pointer)
            .ok()
            .filter(|&index| index < self.entries.len())
    }
}

/// Check if data looks like a compound file by its magic bytes
pub fn is_ole_file(data: &[u8]) -> bool {
    data.len() >= HEADER_SIZE && data.starts_with(MAGIC)
}
