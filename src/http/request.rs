use crate::arena::{Arena, ArenaError, Slot};
use crate::http::parser::{self, ParseError};

/// HTTP request methods.
///
/// The wire parser keeps whatever token the client sent; this enum is the
/// typed view over the methods the server knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// # Example
    ///
    /// ```
    /// # use ferrule::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "HEAD" => Some(Method::HEAD),
            "OPTIONS" => Some(Method::OPTIONS),
            "PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct HeaderEntry {
    key: Slot,
    values: Vec<Slot>,
}

/// Request headers in first-arrival order.
///
/// Key and value bytes are copied into a per-request [`Arena`]. A repeated
/// key appends to the values of the existing entry instead of adding a new one.
/// Keys compare case-sensitively.
#[derive(Debug)]
pub struct Headers {
    arena: Arena,
    entries: Vec<HeaderEntry>,
}

impl Headers {
    pub fn new(region_size: usize) -> Self {
        Self {
            arena: Arena::new(region_size),
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), ArenaError> {
        let value = self.arena.alloc_bytes(value)?;

        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| self.arena.get(e.key) == key)
        {
            entry.values.push(value);
            return Ok(());
        }

        let key = self.arena.alloc_bytes(key)?;
        self.entries.push(HeaderEntry {
            key,
            values: vec![value],
        });
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<Header<'_>> {
        self.entries
            .iter()
            .find(|e| self.arena.get(e.key) == key.as_bytes())
            .map(|entry| Header {
                arena: &self.arena,
                entry,
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = Header<'_>> {
        self.entries.iter().map(|entry| Header {
            arena: &self.arena,
            entry,
        })
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }
}

/// One header key with every value it was sent with.
#[derive(Clone, Copy)]
pub struct Header<'a> {
    arena: &'a Arena,
    entry: &'a HeaderEntry,
}

impl<'a> Header<'a> {
    pub fn key(&self) -> &'a [u8] {
        self.arena.get(self.entry.key)
    }

    /// The first value received for this key.
    pub fn value(&self) -> &'a [u8] {
        self.arena.get(self.entry.values[0])
    }

    pub fn values(self) -> impl ExactSizeIterator<Item = &'a [u8]> + 'a {
        let arena = self.arena;
        self.entry.values.iter().map(move |slot| arena.get(*slot))
    }

    pub fn value_count(&self) -> usize {
        self.entry.values.len()
    }
}

impl std::fmt::Debug for Header<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values: Vec<_> = self.values().map(String::from_utf8_lossy).collect();
        f.debug_struct("Header")
            .field("key", &String::from_utf8_lossy(self.key()))
            .field("values", &values)
            .finish()
    }
}

/// Represents a parsed HTTP request from a client.
///
/// The request line is copied out of the read buffer at parse time, so a
/// request stays valid however the buffer grows afterwards.
#[derive(Debug)]
pub struct Request {
    /// The method token exactly as sent (e.g. "GET")
    pub method: String,
    /// The request target (e.g. "/index.html")
    pub path: String,
    /// HTTP version (typically "HTTP/1.1")
    pub version: String,
    pub headers: Headers,
    /// Request body, sized by Content-Length
    pub body: Vec<u8>,
    content_length: Option<usize>,
}

impl Request {
    /// An empty request whose headers will live in regions of `region_size`.
    pub fn new(region_size: usize) -> Self {
        Self {
            method: String::new(),
            path: String::new(),
            version: String::new(),
            headers: Headers::new(region_size),
            body: Vec::new(),
            content_length: None,
        }
    }

    pub fn method(&self) -> Option<Method> {
        Method::from_str(&self.method)
    }

    /// First value of a header, if present and valid UTF-8.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(key)
            .and_then(|h| std::str::from_utf8(h.value()).ok())
    }

    /// Body length announced by `Content-Length`, parsed once and cached.
    ///
    /// A missing header means no body. A value that does not parse to a
    /// positive integer, or more than one value, is a protocol error.
    pub fn content_length(&mut self) -> Result<usize, ParseError> {
        if let Some(len) = self.content_length {
            return Ok(len);
        }

        let len = match self.headers.get("Content-Length") {
            None => 0,
            Some(h) if h.value_count() > 1 => return Err(ParseError::InvalidContentLength),
            Some(h) => parser::parse_content_length(h.value())?,
        };

        self.content_length = Some(len);
        Ok(len)
    }

    /// Determines whether the connection should remain open after the response.
    ///
    /// HTTP/1.1 defaults to keep-alive unless `Connection: close` is sent;
    /// HTTP/1.0 needs an explicit `Connection: keep-alive`.
    pub fn keep_alive(&self) -> bool {
        match self.header("Connection") {
            Some(v) if v.eq_ignore_ascii_case("close") => false,
            Some(v) if v.eq_ignore_ascii_case("keep-alive") => true,
            _ => self.version != "HTTP/1.0",
        }
    }
}
