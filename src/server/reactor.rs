//! One-shot readiness notification on top of `mio`.
//!
//! Every registration fires at most once. When a descriptor shows up in a
//! ready batch the reactor disarms it, and whoever wants to hear about it again
//! must call [`Reactor::register`] before control returns to the wait. A
//! descriptor that hits would-block without being re-armed goes silent.

use std::collections::HashMap;
use std::io;
use std::os::fd::RawFd;

use mio::unix::SourceFd;
use mio::{Events, Poll, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    Read,
    Write,
    Both,
}

impl Interest {
    fn to_mio(self) -> mio::Interest {
        match self {
            Interest::Read => mio::Interest::READABLE,
            Interest::Write => mio::Interest::WRITABLE,
            Interest::Both => mio::Interest::READABLE | mio::Interest::WRITABLE,
        }
    }

    fn union(self, other: Interest) -> Interest {
        if self == other { self } else { Interest::Both }
    }
}

/// Re-arming seam between a connection handler and whatever drives it.
///
/// Handlers call this right before yielding `Pending`.
pub trait Rearm {
    fn rearm(&mut self, fd: RawFd, interest: Interest) -> io::Result<()>;
}

/// A descriptor reported ready by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyEvent {
    pub fd: RawFd,
    pub readable: bool,
    pub writable: bool,
}

/// The events captured by one [`Reactor::block_until_ready`] call, in the
/// order the OS reported them.
#[derive(Debug, Default)]
pub struct ReadyBatch {
    events: Vec<ReadyEvent>,
}

impl ReadyBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReadyEvent> {
        self.events.iter()
    }
}

impl<'a> IntoIterator for &'a ReadyBatch {
    type Item = &'a ReadyEvent;
    type IntoIter = std::slice::Iter<'a, ReadyEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

pub struct Reactor {
    poll: Poll,
    events: Events,
    armed: HashMap<RawFd, Interest>,
}

impl Reactor {
    /// Creates the readiness queue. `max_events` bounds how many descriptors
    /// one wait can report.
    pub fn new(max_events: usize) -> io::Result<Self> {
        Ok(Self {
            poll: Poll::new()?,
            events: Events::with_capacity(max_events),
            armed: HashMap::new(),
        })
    }

    /// Arms a one-shot notification for `fd`. Arming a descriptor that is
    /// already armed widens its interest.
    pub fn register(&mut self, fd: RawFd, interest: Interest) -> io::Result<()> {
        let token = Token(fd as usize);
        let registry = self.poll.registry();

        match self.armed.get(&fd).copied() {
            Some(current) => {
                let merged = current.union(interest);
                registry.reregister(&mut SourceFd(&fd), token, merged.to_mio())?;
                self.armed.insert(fd, merged);
            }
            None => {
                registry.register(&mut SourceFd(&fd), token, interest.to_mio())?;
                self.armed.insert(fd, interest);
            }
        }

        tracing::trace!(fd, ?interest, "armed");
        Ok(())
    }

    /// Drops any armed interest for `fd`. A no-op for unarmed descriptors.
    pub fn deregister(&mut self, fd: RawFd) -> io::Result<()> {
        if self.armed.remove(&fd).is_some() {
            self.poll.registry().deregister(&mut SourceFd(&fd))?;
        }
        Ok(())
    }

    /// Blocks until at least one armed interest fires, fills `batch` and
    /// disarms every descriptor in it. Returns the number of events.
    ///
    /// A signal arriving mid-wait surfaces as `ErrorKind::Interrupted`.
    pub fn block_until_ready(&mut self, batch: &mut ReadyBatch) -> io::Result<usize> {
        batch.events.clear();
        self.poll.poll(&mut self.events, None)?;

        for event in self.events.iter() {
            let fd = event.token().0 as RawFd;
            batch.events.push(ReadyEvent {
                fd,
                readable: event.is_readable() || event.is_read_closed() || event.is_error(),
                writable: event.is_writable() || event.is_write_closed(),
            });
        }

        for event in &batch.events {
            self.deregister(event.fd)?;
        }

        Ok(batch.events.len())
    }
}

impl Rearm for Reactor {
    fn rearm(&mut self, fd: RawFd, interest: Interest) -> io::Result<()> {
        self.register(fd, interest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interest_union_widens_to_both() {
        assert_eq!(Interest::Read.union(Interest::Read), Interest::Read);
        assert_eq!(Interest::Read.union(Interest::Write), Interest::Both);
        assert_eq!(Interest::Both.union(Interest::Write), Interest::Both);
    }
}
