use bytes::{BufMut, Bytes, BytesMut};

const INITIAL_HEADER_CAPACITY: usize = 1024;

/// Status codes the server can emit. The reason phrase is fixed per code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use ferrule::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// A complete HTTP response ready to be serialized.
///
/// Headers are kept pre-rendered as `key: value\r\n` fragments in arrival
/// order. The body is a shared handle supplied by the caller.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    headers: BytesMut,
    /// Response body as bytes
    pub body: Bytes,
}

impl Response {
    /// The rendered header block, without the trailing blank line.
    pub fn header_block(&self) -> &[u8] {
        &self.headers
    }

    /// Looks up the first header named `key` in the rendered block.
    pub fn header(&self, key: &str) -> Option<&str> {
        let block = std::str::from_utf8(&self.headers).ok()?;
        block
            .split("\r\n")
            .filter_map(|line| line.split_once(": "))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Creates a simple 200 OK response with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        ResponseBuilder::new(StatusCode::Ok).body(body).build()
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        ResponseBuilder::new(StatusCode::NotFound)
            .header("Content-Type", "text/plain")
            .body(Bytes::from_static(b"404 Not Found"))
            .build()
    }

    /// Creates a 405 Method Not Allowed response.
    pub fn method_not_allowed() -> Self {
        ResponseBuilder::new(StatusCode::MethodNotAllowed)
            .header("Allow", "GET, HEAD")
            .body(Bytes::from_static(b"405 Method Not Allowed"))
            .build()
    }

    /// Creates a 500 Internal Server Error response.
    pub fn internal_error() -> Self {
        ResponseBuilder::new(StatusCode::InternalServerError)
            .body(Bytes::from_static(b"500 Internal Server Error"))
            .build()
    }
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```
/// # use ferrule::http::response::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "application/json")
///     .body("{}")
///     .build();
/// assert_eq!(response.header("Content-Length"), Some("2"));
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: BytesMut,
    has_content_length: bool,
    body: Bytes,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: BytesMut::with_capacity(INITIAL_HEADER_CAPACITY),
            has_content_length: false,
            body: Bytes::new(),
        }
    }

    /// Appends a `key: value` header line.
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.push_header(key, value.as_bytes());
        self
    }

    /// Appends a header whose value is rendered from an integer.
    pub fn header_int(mut self, key: &str, value: i64) -> Self {
        self.push_header(key, value.to_string().as_bytes());
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the final Response.
    ///
    /// Adds `Content-Length` from the body size unless one was set explicitly.
    pub fn build(mut self) -> Response {
        if !self.has_content_length {
            let len = self.body.len() as i64;
            self = self.header_int("Content-Length", len);
        }

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }

    fn push_header(&mut self, key: &str, value: &[u8]) {
        if key.eq_ignore_ascii_case("Content-Length") {
            self.has_content_length = true;
        }

        let needed = key.len() + value.len() + 4;
        if self.headers.capacity() - self.headers.len() < needed {
            let target = (self.headers.capacity() * 2).max(self.headers.len() + needed);
            self.headers.reserve(target - self.headers.len());
        }

        self.headers.put_slice(key.as_bytes());
        self.headers.put_slice(b": ");
        self.headers.put_slice(value);
        self.headers.put_slice(b"\r\n");
    }
}
