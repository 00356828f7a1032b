use std::io::Write;
use std::os::fd::RawFd;
use std::task::{Poll, ready};

use bytes::{BufMut, BytesMut};

use crate::http::error::HandlerError;
use crate::http::response::Response;
use crate::http::stream::WriteStream;
use crate::server::reactor::Rearm;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Renders status line, header block, blank line and body into one buffer.
pub fn serialize_response(resp: &Response) -> BytesMut {
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );

    let header_block = resp.header_block();
    let mut buf =
        BytesMut::with_capacity(status_line.len() + header_block.len() + 2 + resp.body.len());

    buf.put_slice(status_line.as_bytes());
    buf.put_slice(header_block);
    buf.put_slice(b"\r\n");
    buf.put_slice(&resp.body);

    buf
}

#[derive(Debug)]
enum WriterState {
    Prepare(Response),
    Flushing(WriteStream),
    Done,
}

/// Drives one response onto a non-blocking socket.
///
/// `Prepare` renders the response once, `Flushing` writes it out across as
/// many write-readiness rounds as the socket needs, `Done` reports completion.
#[derive(Debug)]
pub struct ResponseWriter {
    state: WriterState,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: Response) -> Self {
        Self {
            state: WriterState::Prepare(response),
            written: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, WriterState::Done)
    }

    /// Bytes flushed to the socket so far.
    pub fn bytes_written(&self) -> usize {
        match &self.state {
            WriterState::Flushing(stream) => stream.cursor(),
            _ => self.written,
        }
    }

    pub fn poll_write<W: Write + ?Sized>(
        &mut self,
        fd: RawFd,
        io: &mut W,
        rearm: &mut dyn Rearm,
    ) -> Poll<Result<(), HandlerError>> {
        loop {
            match &mut self.state {
                WriterState::Prepare(response) => {
                    let buf = serialize_response(response);
                    self.state = WriterState::Flushing(WriteStream::new(buf.freeze()));
                }
                WriterState::Flushing(stream) => {
                    ready!(stream.poll_flush(fd, io, rearm))?;
                    self.written = stream.len();
                    self.state = WriterState::Done;
                }
                WriterState::Done => return Poll::Ready(Ok(())),
            }
        }
    }
}
