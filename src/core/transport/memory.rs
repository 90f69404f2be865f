//! In-memory byte source

use bytes::{Buf, BytesMut};

use super::ByteSource;

/// Byte source backed by an in-memory buffer
///
/// Used for capture replay, the simulator and tests. Data pushed in becomes
/// available immediately.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    buffer: BytesMut,
    total_pushed: u64,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source pre-filled with `data`
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut source = Self::new();
        source.push(data);
        source
    }

    /// Make more bytes available
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
        self.total_pushed += data.len() as u64;
    }

    /// Bytes pushed over the lifetime of the source
    pub fn total_pushed(&self) -> u64 {
        self.total_pushed
    }

    /// Nothing left to read?
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop all pending bytes
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl ByteSource for MemorySource {
    fn available(&self) -> usize {
        self.buffer.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.buffer.has_remaining() {
            Some(self.buffer.get_u8())
        } else {
            None
        }
    }
}
