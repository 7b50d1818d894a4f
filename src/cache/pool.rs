//! Buffer Pool Module
//!
//! Reusable scratch buffers for encode and decode. A buffer is borrowed
//! through a guard and goes back to the pool when the guard drops, on every
//! exit path.

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

/// Buffers that grew beyond this many bytes are released instead of pooled.
pub const DEFAULT_MAX_BUFFER_CAPACITY: usize = 64 * 1024;

/// Maximum number of idle buffers kept by default.
pub const DEFAULT_MAX_POOLED: usize = 64;

// == Buffer Pool ==
/// Bounded pool of byte buffers.
#[derive(Debug)]
pub struct BufferPool {
    idle: Mutex<Vec<Vec<u8>>>,
    max_pooled: usize,
    max_capacity: usize,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_POOLED, DEFAULT_MAX_BUFFER_CAPACITY)
    }

    pub fn with_limits(max_pooled: usize, max_capacity: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            max_pooled,
            max_capacity,
        }
    }

    // == Acquire ==
    /// Takes an empty buffer from the pool, allocating when none is idle.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = self.idle.lock().pop().unwrap_or_default();
        PooledBuffer { pool: self, buf }
    }

    /// Number of idle buffers.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    fn release(&self, mut buf: Vec<u8>) {
        if buf.capacity() > self.max_capacity {
            return;
        }
        buf.clear();

        let mut idle = self.idle.lock();
        if idle.len() < self.max_pooled {
            idle.push(buf);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

// == Pooled Buffer ==
/// Scoped loan of a buffer; dereferences to `Vec<u8>`.
#[derive(Debug)]
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Vec<u8>,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}
