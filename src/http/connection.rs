use std::io::{Read, Write};
use std::os::fd::RawFd;
use std::rc::Rc;
use std::task::{Poll, ready};

use crate::config::{Config, HttpConfig};
use crate::http::error::HandlerError;
use crate::http::parser::{self, HEADER_TERMINATOR, ParseError};
use crate::http::request::Request;
use crate::http::service::{HelloWorld, Responder, StaticFiles};
use crate::http::stream::ReadStream;
use crate::http::writer::ResponseWriter;
use crate::server::reactor::Rearm;

/// Everything connections share: buffer sizing and the responder.
pub struct ConnectionContext {
    pub http: HttpConfig,
    pub responder: Box<dyn Responder>,
}

impl ConnectionContext {
    pub fn new(http: HttpConfig, responder: Box<dyn Responder>) -> Self {
        Self { http, responder }
    }

    /// Serves `static_files.root` when configured, the fixed greeting otherwise.
    pub fn from_config(cfg: &Config) -> Self {
        let responder: Box<dyn Responder> = match &cfg.static_files {
            Some(files) => Box::new(StaticFiles::new(&files.root, &files.index)),
            None => Box::new(HelloWorld),
        };
        Self::new(cfg.http.clone(), responder)
    }
}

/// What a connection wants once a request/response cycle has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Re-arm read interest and wait for the next request.
    KeepAlive,
    /// The response is flushed; the connection should be closed.
    Close,
}

/// Where a connection is in its request/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ReadingHeaders,
    ReadingBody,
    Writing,
    Done,
}

enum ConnectionState {
    ReadingHeaders,
    ReadingBody { body_start: usize },
    Writing { writer: ResponseWriter, request_end: usize },
    Done { request_end: usize },
}

/// Per-connection resumable HTTP handler.
///
/// ```text
///        ┌─────────────────┐
///        │ ReadingHeaders  │ ← read until CRLFCRLF, then tokenize
///        └────────┬────────┘
///                 ▼
///        ┌─────────────────┐
///        │  ReadingBody    │ ← read until Content-Length bytes are buffered
///        └────────┬────────┘
///                 ▼
///        ┌─────────────────┐
///        │    Writing      │ ← flush the response
///        └────────┬────────┘
///                 ▼
///        ┌─────────────────┐
///        │      Done       │ ← reset in place
///        └────────┬────────┘
///                 ├─ Keep-Alive → ReadingHeaders (same connection)
///                 └─ Close → driver drops the connection
/// ```
///
/// Every socket operation is non-blocking. When one would block, the
/// connection re-arms the matching interest through [`Rearm`] and returns
/// `Poll::Pending`; all progress lives in `self`, so the next [`poll`]
/// resumes exactly where this one stopped. The connection never closes its
/// own socket.
///
/// [`poll`]: Connection::poll
pub struct Connection<S> {
    fd: RawFd,
    stream: S,
    ctx: Rc<ConnectionContext>,
    state: ConnectionState,
    read_stream: ReadStream,
    request: Request,
    keep_alive: bool,
    requests_served: u64,
}

impl<S: Read + Write> Connection<S> {
    pub fn new(fd: RawFd, stream: S, ctx: Rc<ConnectionContext>) -> Self {
        let read_stream = ReadStream::new(ctx.http.initial_buffer_size, ctx.http.read_chunk_size);
        let request = Request::new(ctx.http.arena_region_size);

        Self {
            fd,
            stream,
            ctx,
            state: ConnectionState::ReadingHeaders,
            read_stream,
            request,
            keep_alive: true,
            requests_served: 0,
        }
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            ConnectionState::ReadingHeaders => Phase::ReadingHeaders,
            ConnectionState::ReadingBody { .. } => Phase::ReadingBody,
            ConnectionState::Writing { .. } => Phase::Writing,
            ConnectionState::Done { .. } => Phase::Done,
        }
    }

    /// The request currently in flight. Empty between requests.
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn read_stream(&self) -> &ReadStream {
        &self.read_stream
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Advances the connection as far as the socket allows.
    pub fn poll(&mut self, rearm: &mut dyn Rearm) -> Poll<Result<Outcome, HandlerError>> {
        loop {
            match self.state {
                ConnectionState::ReadingHeaders => {
                    let body_start = ready!(self.poll_read_headers(rearm))?;
                    parser::parse_head(&self.read_stream.filled()[..body_start], &mut self.request)?;
                    self.state = ConnectionState::ReadingBody { body_start };
                }
                ConnectionState::ReadingBody { body_start } => {
                    let request_end = ready!(self.poll_read_body(body_start, rearm))?;
                    self.request.body = self.read_stream.filled()[body_start..request_end].to_vec();

                    tracing::debug!(
                        fd = self.fd,
                        method = %self.request.method,
                        path = %self.request.path,
                        version = %self.request.version,
                        headers = self.request.headers.len(),
                        body = self.request.body.len(),
                        "request"
                    );

                    self.keep_alive = self.request.keep_alive();
                    let response = self.ctx.responder.respond(&self.request);
                    self.state = ConnectionState::Writing {
                        writer: ResponseWriter::new(response),
                        request_end,
                    };
                }
                ConnectionState::Writing {
                    ref mut writer,
                    request_end,
                } => {
                    ready!(writer.poll_write(self.fd, &mut self.stream, rearm))?;
                    self.state = ConnectionState::Done { request_end };
                }
                ConnectionState::Done { request_end } => {
                    let carried = self.read_stream.filled()[request_end..].to_vec();
                    self.requests_served += 1;
                    self.reset(&carried);

                    if !self.keep_alive {
                        return Poll::Ready(Ok(Outcome::Close));
                    }
                    if carried.is_empty() {
                        return Poll::Ready(Ok(Outcome::KeepAlive));
                    }
                    tracing::trace!(fd = self.fd, carried = carried.len(), "pipelined request");
                }
            }
        }
    }

    /// Reads until the header terminator is buffered and returns the offset
    /// just past it.
    fn poll_read_headers(&mut self, rearm: &mut dyn Rearm) -> Poll<Result<usize, HandlerError>> {
        let limit = self.ctx.http.max_header_bytes;

        loop {
            let rs = &mut self.read_stream;

            // Back up far enough to catch a terminator split across reads.
            let from = rs.read_cursor().saturating_sub(HEADER_TERMINATOR.len() - 1);
            if let Some(pos) = parser::find_headers_end(&rs.filled()[from..]) {
                let body_start = from + pos + HEADER_TERMINATOR.len();
                if body_start > limit {
                    return Poll::Ready(Err(HandlerError::HeadersTooLarge { limit }));
                }
                rs.set_body_start(body_start);
                rs.set_read_cursor(0);
                return Poll::Ready(Ok(body_start));
            }

            rs.set_read_cursor(rs.write_cursor());
            if rs.write_cursor() >= limit {
                return Poll::Ready(Err(HandlerError::HeadersTooLarge { limit }));
            }

            let n = ready!(rs.poll_fill(self.fd, &mut self.stream, rearm))?;
            tracing::trace!(fd = self.fd, bytes = n, "read");
        }
    }

    /// Reads until the whole body is buffered and returns the offset just
    /// past it.
    fn poll_read_body(
        &mut self,
        body_start: usize,
        rearm: &mut dyn Rearm,
    ) -> Poll<Result<usize, HandlerError>> {
        let request_end = body_start
            .checked_add(self.request.content_length()?)
            .ok_or(ParseError::InvalidContentLength)?;

        while self.read_stream.write_cursor() < request_end {
            let n = ready!(self.read_stream.poll_fill(self.fd, &mut self.stream, rearm))?;
            tracing::trace!(fd = self.fd, bytes = n, "read body");
        }

        Poll::Ready(Ok(request_end))
    }

    /// Drops the finished request and starts over with fresh buffers.
    fn reset(&mut self, carried: &[u8]) {
        let http = &self.ctx.http;
        self.read_stream =
            ReadStream::with_carried(http.initial_buffer_size, http.read_chunk_size, carried);
        self.request = Request::new(http.arena_region_size);
        self.state = ConnectionState::ReadingHeaders;
    }
}
