//! Cursor-tracked buffers between a connection and its socket.

use std::io::{self, Read, Write};
use std::os::fd::RawFd;
use std::task::Poll;

use bytes::Bytes;

use crate::http::error::HandlerError;
use crate::server::reactor::{Interest, Rearm};

/// Growable buffer filled from the socket.
///
/// `read_cursor <= write_cursor <= capacity` always holds. Bytes in
/// `[0, write_cursor)` are the request data received so far.
#[derive(Debug)]
pub struct ReadStream {
    data: Vec<u8>,
    write_cursor: usize,
    read_cursor: usize,
    body_start: Option<usize>,
    chunk_size: usize,
}

impl ReadStream {
    pub fn new(capacity: usize, chunk_size: usize) -> Self {
        Self {
            data: vec![0u8; capacity.max(1)],
            write_cursor: 0,
            read_cursor: 0,
            body_start: None,
            chunk_size: chunk_size.max(1),
        }
    }

    /// A fresh stream pre-filled with bytes left over from the previous
    /// request on the same connection.
    pub fn with_carried(capacity: usize, chunk_size: usize, carried: &[u8]) -> Self {
        let mut stream = Self::new(capacity, chunk_size);
        stream.grow_to(carried.len());
        stream.data[..carried.len()].copy_from_slice(carried);
        stream.write_cursor = carried.len();
        stream
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    pub fn read_cursor(&self) -> usize {
        self.read_cursor
    }

    pub(crate) fn set_read_cursor(&mut self, cursor: usize) {
        debug_assert!(cursor <= self.write_cursor);
        self.read_cursor = cursor;
    }

    /// Offset just past the header terminator, once it has been found.
    pub fn body_start(&self) -> Option<usize> {
        self.body_start
    }

    pub(crate) fn set_body_start(&mut self, idx: usize) {
        self.body_start = Some(idx);
    }

    /// Every byte received so far.
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.write_cursor]
    }

    /// Doubles the buffer until it can hold `needed` bytes.
    fn grow_to(&mut self, needed: usize) {
        let mut len = self.data.len();
        while needed > len {
            len *= 2;
        }
        if len != self.data.len() {
            self.data.resize(len, 0);
        }
    }

    /// Performs one non-blocking read of up to one chunk.
    ///
    /// On would-block, read interest is re-armed before `Pending` is returned.
    /// A zero-byte read means the peer closed the connection.
    pub fn poll_fill<R: Read + ?Sized>(
        &mut self,
        fd: RawFd,
        io: &mut R,
        rearm: &mut dyn Rearm,
    ) -> Poll<Result<usize, HandlerError>> {
        self.grow_to(self.write_cursor + self.chunk_size);

        loop {
            let end = self.write_cursor + self.chunk_size;
            match io.read(&mut self.data[self.write_cursor..end]) {
                Ok(0) => return Poll::Ready(Err(HandlerError::PeerClosed)),
                Ok(n) => {
                    self.write_cursor += n;
                    return Poll::Ready(Ok(n));
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if let Err(e) = rearm.rearm(fd, Interest::Read) {
                        return Poll::Ready(Err(HandlerError::Io(e)));
                    }
                    return Poll::Pending;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Poll::Ready(Err(HandlerError::Io(e))),
            }
        }
    }
}

/// Outbound bytes plus how many of them the socket has taken.
#[derive(Debug)]
pub struct WriteStream {
    data: Bytes,
    cursor: usize,
}

impl WriteStream {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_flushed(&self) -> bool {
        self.cursor == self.data.len()
    }

    /// Writes until every byte is flushed, re-arming write interest and
    /// yielding whenever the socket would block.
    pub fn poll_flush<W: Write + ?Sized>(
        &mut self,
        fd: RawFd,
        io: &mut W,
        rearm: &mut dyn Rearm,
    ) -> Poll<Result<(), HandlerError>> {
        while self.cursor < self.data.len() {
            match io.write(&self.data[self.cursor..]) {
                Ok(0) => return Poll::Ready(Err(HandlerError::WriteZero)),
                Ok(n) => {
                    self.cursor += n;
                    tracing::trace!(fd, written = n, remaining = self.data.len() - self.cursor, "write");
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if let Err(e) = rearm.rearm(fd, Interest::Write) {
                        return Poll::Ready(Err(HandlerError::Io(e)));
                    }
                    return Poll::Pending;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Poll::Ready(Err(HandlerError::Io(e))),
            }
        }

        Poll::Ready(Ok(()))
    }
}
