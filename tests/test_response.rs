use std::io::{self, Write};
use std::os::fd::RawFd;
use std::task::Poll;

use ferrule::http::response::{Response, ResponseBuilder, StatusCode};
use ferrule::http::writer::{ResponseWriter, serialize_response};
use ferrule::server::reactor::{Interest, Rearm};

fn header_lines(response: &Response) -> usize {
    response
        .header_block()
        .windows(2)
        .filter(|w| *w == b"\r\n")
        .count()
}

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    assert_eq!(
        StatusCode::MethodNotAllowed.reason_phrase(),
        "Method Not Allowed"
    );
    assert_eq!(
        StatusCode::InternalServerError.reason_phrase(),
        "Internal Server Error"
    );
}

#[test]
fn test_response_builder_basic() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(b"Hello, World!".to_vec())
        .build();

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(&response.body[..], b"Hello, World!");
}

#[test]
fn test_response_builder_with_headers() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/plain")
        .header("X-Custom", "value")
        .body(b"test".to_vec())
        .build();

    assert_eq!(response.header("Content-Type"), Some("text/plain"));
    assert_eq!(response.header("X-Custom"), Some("value"));
    assert_eq!(response.header("Missing"), None);
}

#[test]
fn test_headers_render_in_insertion_order() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("B", "2")
        .header("A", "1")
        .header_int("N", -7)
        .build();

    assert_eq!(
        response.header_block(),
        b"B: 2\r\nA: 1\r\nN: -7\r\nContent-Length: 0\r\n"
    );
}

#[test]
fn test_response_builder_auto_content_length() {
    let body = b"This is the body".to_vec();
    let response = ResponseBuilder::new(StatusCode::Ok).body(body.clone()).build();

    assert_eq!(
        response.header("Content-Length"),
        Some(body.len().to_string().as_str())
    );
}

#[test]
fn test_response_builder_preserves_custom_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", "999")
        .body(b"test".to_vec())
        .build();

    assert_eq!(response.header("Content-Length"), Some("999"));
    assert_eq!(header_lines(&response), 1);
}

#[test]
fn test_response_builder_multiple_headers() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "application/json")
        .header("Cache-Control", "no-cache")
        .header("X-Frame-Options", "DENY")
        .body(b"{}".to_vec())
        .build();

    assert_eq!(header_lines(&response), 4); // 3 custom + 1 auto (Content-Length)
    assert_eq!(response.header("Content-Type"), Some("application/json"));
    assert_eq!(response.header("Cache-Control"), Some("no-cache"));
    assert_eq!(response.header("X-Frame-Options"), Some("DENY"));
}

#[test]
fn test_header_buffer_grows_past_initial_capacity() {
    let big = "x".repeat(4000);
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("X-One", &big)
        .header("X-Two", &big)
        .build();

    assert_eq!(response.header("X-Two"), Some(big.as_str()));
    assert_eq!(header_lines(&response), 3);
}

#[test]
fn test_response_builder_empty_body() {
    let response = ResponseBuilder::new(StatusCode::Ok).build();

    assert!(response.body.is_empty());
    assert_eq!(response.header("Content-Length"), Some("0"));
}

#[test]
fn test_response_ok_helper() {
    let response = Response::ok("test content");

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(&response.body[..], b"test content");
}

#[test]
fn test_response_not_found_helper() {
    let response = Response::not_found();

    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(&response.body[..], b"404 Not Found");
}

#[test]
fn test_response_method_not_allowed_helper() {
    let response = Response::method_not_allowed();

    assert_eq!(response.status, StatusCode::MethodNotAllowed);
    assert_eq!(response.header("Allow"), Some("GET, HEAD"));
}

#[test]
fn test_response_internal_error_helper() {
    let response = Response::internal_error();

    assert_eq!(response.status, StatusCode::InternalServerError);
    assert_eq!(&response.body[..], b"500 Internal Server Error");
}

#[test]
fn test_serialize_hello_world() {
    let bytes = serialize_response(&Response::ok("Hello World!"));
    assert_eq!(
        &bytes[..],
        b"HTTP/1.1 200 OK\r\nContent-Length: 12\r\n\r\nHello World!"
    );
}

#[test]
fn test_serialize_without_body() {
    let response = ResponseBuilder::new(StatusCode::NotFound)
        .header("Content-Length", "0")
        .build();
    let bytes = serialize_response(&response);
    assert_eq!(
        &bytes[..],
        b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n"
    );
}

struct Trickle {
    out: Vec<u8>,
    per_write: usize,
    block_every_other: bool,
    blocked_last: bool,
}

impl Write for Trickle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.block_every_other && !self.blocked_last {
            self.blocked_last = true;
            return Err(io::ErrorKind::WouldBlock.into());
        }
        self.blocked_last = false;
        let n = self.per_write.min(buf.len());
        self.out.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct CountingRearm {
    writes: usize,
}

impl Rearm for CountingRearm {
    fn rearm(&mut self, _fd: RawFd, interest: Interest) -> io::Result<()> {
        assert_eq!(interest, Interest::Write);
        self.writes += 1;
        Ok(())
    }
}

#[test]
fn test_writer_completes_across_would_block() {
    let expected = serialize_response(&Response::ok("Hello World!"));
    let mut writer = ResponseWriter::new(Response::ok("Hello World!"));
    let mut io = Trickle {
        out: Vec::new(),
        per_write: 10,
        block_every_other: true,
        blocked_last: false,
    };
    let mut rearm = CountingRearm::default();

    let mut rounds = 0;
    while writer.poll_write(3, &mut io, &mut rearm).is_pending() {
        rounds += 1;
        assert!(rounds < 100);
    }

    assert!(writer.is_done());
    assert_eq!(writer.bytes_written(), expected.len());
    assert_eq!(io.out, &expected[..]);
    assert_eq!(rearm.writes, rounds);
}

#[test]
fn test_writer_reports_zero_length_write() {
    let mut writer = ResponseWriter::new(Response::ok("x"));
    let mut io = Trickle {
        out: Vec::new(),
        per_write: 0,
        block_every_other: false,
        blocked_last: false,
    };
    let mut rearm = CountingRearm::default();

    assert!(matches!(
        writer.poll_write(3, &mut io, &mut rearm),
        Poll::Ready(Err(ferrule::http::error::HandlerError::WriteZero))
    ));
}
