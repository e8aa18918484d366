/// Options controlling how a compound file is decoded.
///
/// The defaults reproduce the classic reader behaviour: the mini-stream is
/// addressed linearly by small-block index, chains are capped at the depot
/// length, and depot lists spilling out of the header are followed through
/// their extension sectors.
///
/// # Examples
///
/// ```rust
/// use ole2_reader::ole::{MiniStreamAddressing, OleOptions};
///
/// let options = OleOptions::new()
///     .with_mini_stream_addressing(MiniStreamAddressing::MiniFat)
///     .with_max_chain_len(4096);
/// assert_eq!(options.max_chain_len, Some(4096));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OleOptions {
    /// Upper bound on sectors per chain; `None` uses the depot length
    pub max_chain_len: Option<usize>,
    /// How small streams are located inside the mini-stream
    pub mini_stream_addressing: MiniStreamAddressing,
    /// Whether to continue the depot-sector list through extension sectors
    pub follow_difat: bool,
}

impl Default for OleOptions {
    fn default() -> Self {
        Self {
            max_chain_len: None,
            mini_stream_addressing: MiniStreamAddressing::Linear,
            follow_difat: true,
        }
    }
}

impl OleOptions {
    /// Create a new `OleOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of sectors any single chain may visit.
    ///
    /// A walk that would exceed the cap fails with `CorruptChain`. The cap
    /// never loosens the built-in bound of one visit per depot slot.
    #[inline]
    pub fn with_max_chain_len(mut self, len: usize) -> Self {
        self.max_chain_len = Some(len);
        self
    }

    /// Select how small streams are addressed inside the mini-stream.
    #[inline]
    pub fn with_mini_stream_addressing(mut self, addressing: MiniStreamAddressing) -> Self {
        self.mini_stream_addressing = addressing;
        self
    }

    /// Enable or disable following depot extension (DIFAT) sectors.
    #[inline]
    pub fn with_follow_difat(mut self, follow: bool) -> Self {
        self.follow_difat = follow;
        self
    }
}

/// Addressing scheme for streams stored below the size threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MiniStreamAddressing {
    /// Slice the mini-stream at `start * small_block_size` for `size` bytes.
    ///
    /// Correct whenever each small stream occupies consecutive small blocks.
    #[default]
    Linear,
    /// Follow the small-block allocation table named in the header.
    ///
    /// Handles fragmented mini-streams. Falls back to `Linear` when the
    /// header names no such table.
    MiniFat,
}
