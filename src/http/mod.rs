//! HTTP protocol implementation.
//!
//! A subset of HTTP/1.1 served over non-blocking sockets: request line,
//! headers, and a `Content-Length` body in; status line, headers and body out,
//! with keep-alive and pipelining on the same connection.
//!
//! # Architecture
//!
//! - **`connection`**: the per-connection request/response state machine
//! - **`parser`**: header terminator search and request tokenizer
//! - **`request`**: request representation and arena-backed headers
//! - **`response`**: status codes and the response builder
//! - **`writer`**: serializes a response and flushes it with partial-write retry
//! - **`stream`**: cursor-tracked read and write buffers
//! - **`service`**: responders that turn a request into a response
//! - **`files`**, **`mime`**: static file lookup and content types
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use ferrule::config::Config;
//! use ferrule::http::connection::{Connection, ConnectionContext};
//!
//! let ctx = Rc::new(ConnectionContext::from_config(&Config::default()));
//! let mut conn = Connection::new(fd, stream, ctx);
//! match conn.poll(&mut reactor) {
//!     Poll::Pending => {} // already re-armed
//!     Poll::Ready(Ok(outcome)) => { /* keep-alive or close */ }
//!     Poll::Ready(Err(e)) => { /* drop the connection */ }
//! }
//! ```

pub mod connection;
pub mod error;
pub mod files;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod service;
pub mod stream;
pub mod writer;
