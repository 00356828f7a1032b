//! Maps live descriptors to their in-flight handlers.
//!
//! Disposing a handler means dropping it; for connection handlers that also
//! closes the socket they own.

use std::collections::HashMap;
use std::os::fd::RawFd;

pub struct Registry<H> {
    entries: HashMap<RawFd, H>,
    capacity: usize,
}

impl<H> Registry<H> {
    /// Creates a registry sized for `capacity` concurrent connections. The
    /// capacity never grows.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    /// Stores `handler` under `fd`. A handler already registered for `fd` is
    /// disposed before the new one takes its place, which covers the OS
    /// recycling a descriptor number.
    pub fn insert(&mut self, fd: RawFd, handler: H) {
        if let Some(old) = self.entries.remove(&fd) {
            tracing::debug!(fd, "replacing stale handler for reused descriptor");
            drop(old);
        }
        self.entries.insert(fd, handler);
    }

    pub fn get(&self, fd: RawFd) -> Option<&H> {
        self.entries.get(&fd)
    }

    pub fn get_mut(&mut self, fd: RawFd) -> Option<&mut H> {
        self.entries.get_mut(&fd)
    }

    /// Disposes the handler for `fd`. Returns whether one was present.
    pub fn remove(&mut self, fd: RawFd) -> bool {
        self.entries.remove(&fd).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }
}
