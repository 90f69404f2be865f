//! Fixed-capacity receive buffer
//!
//! Bytes are written at the current position and only become part of the
//! frame once the validator accepts them and the owner calls [`FrameBuffer::advance`].
//! The buffer never grows; reaching capacity is reported to the caller, who
//! is expected to reset.

/// Default capacity, comfortably above the longest supported frame
pub const FRAME_BUFFER_CAPACITY: usize = 64;

/// Fixed-size frame accumulator
#[derive(Debug, Clone)]
pub struct FrameBuffer<const N: usize = FRAME_BUFFER_CAPACITY> {
    data: [u8; N],
    position: usize,
}

impl<const N: usize> FrameBuffer<N> {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            data: [0; N],
            position: 0,
        }
    }

    /// Buffer capacity
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Current write position
    pub fn position(&self) -> usize {
        self.position
    }

    /// No room left for another byte
    pub fn is_full(&self) -> bool {
        self.position >= N
    }

    /// Store `byte` at the current position without advancing
    ///
    /// Returns `false` (and stores nothing) when the buffer is full.
    #[must_use]
    pub fn write(&mut self, byte: u8) -> bool {
        match self.data.get_mut(self.position) {
            Some(slot) => {
                *slot = byte;
                true
            }
            None => false,
        }
    }

    /// Accept the byte at the current position
    pub fn advance(&mut self) {
        if self.position < N {
            self.position += 1;
        }
    }

    /// Drop everything and restart at position 0
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Bytes up to and including the current position
    pub fn frame(&self) -> &[u8] {
        &self.data[..(self.position + 1).min(N)]
    }
}

impl<const N: usize> Default for FrameBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
