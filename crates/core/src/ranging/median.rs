//! Fixed-window median over the most recent accepted readings

/// Window length used by the ranging filter
pub const MEDIAN_WINDOW: usize = 5;

/// Circular buffer of the last `N` values with a median read-out.
///
/// Starts zero-filled, so the first `N / 2` medians after a reset are
/// pulled toward zero.
#[derive(Debug, Clone)]
pub struct MedianWindow<const N: usize> {
    buffer: [u16; N],
    cursor: usize,
}

impl<const N: usize> MedianWindow<N> {
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            cursor: 0,
        }
    }

    /// Overwrite the oldest slot with `value` and return the new median.
    pub fn push(&mut self, value: u16) -> u16 {
        self.buffer[self.cursor] = value;
        self.cursor = (self.cursor + 1) % N;
        self.median()
    }

    /// Middle element of a sorted copy of the window
    pub fn median(&self) -> u16 {
        let mut sorted = self.buffer;
        sorted.sort_unstable();
        sorted[N / 2]
    }

    /// Zero every slot and rewind the cursor
    pub fn reset(&mut self) {
        self.buffer = [0; N];
        self.cursor = 0;
    }

    /// Raw slot contents in storage order
    pub fn contents(&self) -> &[u16; N] {
        &self.buffer
    }

    /// Index of the slot the next value will overwrite
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl<const N: usize> Default for MedianWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}
