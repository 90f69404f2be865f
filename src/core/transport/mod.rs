//! Byte sources feeding the decoder
//!
//! The decoder only needs a non-blocking view of the receive side of a UART:
//! how many bytes are waiting, and the next one. Opening and configuring the
//! port is left to the host.

mod memory;

pub use memory::MemorySource;

/// Non-blocking byte source
pub trait ByteSource {
    /// Number of bytes that can be read right now without blocking
    fn available(&self) -> usize;

    /// Read one byte; `None` when nothing is available
    fn read_byte(&mut self) -> Option<u8>;

    /// Read and drop every byte available right now
    ///
    /// Returns the number of bytes discarded.
    fn discard_available(&mut self) -> usize {
        let mut dropped = 0;
        for _ in 0..self.available() {
            if self.read_byte().is_none() {
                break;
            }
            dropped += 1;
        }
        dropped
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn available(&self) -> usize {
        (**self).available()
    }

    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }
}
