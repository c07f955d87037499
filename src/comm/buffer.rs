use crate::error::*;

const SCALAR_BYTES: usize = std::mem::size_of::<f64>();

/// Outgoing message payload, a flat sequence of native `f64` scalars.
#[derive(Clone, Debug, Default)]
pub struct SendBuffer {
    bytes: Vec<u8>,
}

impl SendBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(scalars: usize) -> Self {
        SendBuffer {
            bytes: Vec::with_capacity(scalars * SCALAR_BYTES),
        }
    }

    #[inline]
    pub fn put(&mut self, value: f64) {
        self.bytes.extend_from_slice(bytemuck::bytes_of(&value));
    }

    pub fn put_slice(&mut self, values: &[f64]) {
        self.bytes.extend_from_slice(bytemuck::cast_slice(values));
    }

    /// Number of scalars written so far.
    pub fn len(&self) -> usize {
        self.bytes.len() / SCALAR_BYTES
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

/// Incoming message payload read front to back.
#[derive(Clone, Debug, Default)]
pub struct RecvBuffer {
    bytes: Vec<u8>,
    cursor: usize,
}

impl From<SendBuffer> for RecvBuffer {
    fn from(buffer: SendBuffer) -> Self {
        RecvBuffer::from_bytes(buffer.bytes)
    }
}

impl RecvBuffer {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        RecvBuffer { bytes, cursor: 0 }
    }

    /// Scalars not yet consumed.
    pub fn remaining(&self) -> usize {
        (self.bytes.len() - self.cursor) / SCALAR_BYTES
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Consume exactly `n` scalars and return their bytes.
    /// Nothing is consumed if fewer than `n` remain.
    pub fn skip(&mut self, n: usize) -> Result<&[u8]> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(HaloError::BufferUnderflow {
                needed: n,
                remaining,
            });
        }
        let start = self.cursor;
        self.cursor += n * SCALAR_BYTES;
        Ok(&self.bytes[start..self.cursor])
    }

    /// Consume exactly `n` scalars.
    pub fn take(&mut self, n: usize) -> Result<impl Iterator<Item = f64> + '_> {
        Ok(self
            .skip(n)?
            .chunks_exact(SCALAR_BYTES)
            .map(bytemuck::pod_read_unaligned::<f64>))
    }

    pub fn get(&mut self) -> Result<f64> {
        Ok(bytemuck::pod_read_unaligned(self.skip(1)?))
    }
}
