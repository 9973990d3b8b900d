//! Optional reusable-buffer provider.
//!
//! The writer's binary-value path borrows scratch buffers through a
//! [`BufferPool`] when one is supplied. Every borrow is wrapped in a
//! [`Lease`] guard so the buffer goes back to the pool on every exit path,
//! including early returns from I/O errors.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// External provider of reusable byte buffers.
///
/// Implementations must tolerate `give_back` being called with buffers of any
/// capacity, in any order.
pub trait BufferPool: fmt::Debug + Send + Sync {
    /// Borrow a buffer with at least `min_capacity` spare capacity. The
    /// returned buffer is empty.
    fn rent(&self, min_capacity: usize) -> Vec<u8>;

    /// Return a previously rented buffer.
    fn give_back(&self, buf: Vec<u8>);
}

/// RAII guard around a rented buffer. Dropping the guard returns the buffer
/// to its pool.
pub(crate) struct Lease<'p> {
    pool: &'p dyn BufferPool,
    buf: Option<Vec<u8>>,
}

impl<'p> Lease<'p> {
    pub(crate) fn rent(pool: &'p dyn BufferPool, min_capacity: usize) -> Self {
        Self {
            pool,
            buf: Some(pool.rent(min_capacity)),
        }
    }
}

impl Deref for Lease<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        self.buf.as_ref().expect("lease already released")
    }
}

impl DerefMut for Lease<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        self.buf.as_mut().expect("lease already released")
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        if let Some(mut buf) = self.buf.take() {
            buf.clear();
            self.pool.give_back(buf);
        }
    }
}

/// Shared handle to a pool.
pub type SharedBufferPool = Arc<dyn BufferPool>;
