use thiserror::Error;

use crate::arena::ArenaError;
use crate::http::request::Request;

/// Marks the end of the request line and header block.
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed request line")]
    InvalidRequest,
    #[error("malformed header line")]
    InvalidHeader,
    #[error("malformed Content-Length")]
    InvalidContentLength,
    #[error("header storage exhausted: {0}")]
    HeaderStorage(#[from] ArenaError),
}

/// Finds the first occurrence of `needle` in `haystack` using the
/// bad-character rule of Boyer-Moore.
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let m = needle.len();
    let n = haystack.len();
    if m == 0 {
        return Some(0);
    }
    if m > n {
        return None;
    }

    let mut bad_char = [-1isize; 256];
    for (i, &b) in needle.iter().enumerate() {
        bad_char[b as usize] = i as isize;
    }

    let mut s = 0;
    while s <= n - m {
        let mut j = m as isize - 1;
        while j >= 0 && needle[j as usize] == haystack[s + j as usize] {
            j -= 1;
        }

        if j < 0 {
            return Some(s);
        }

        let shift = j - bad_char[haystack[s + j as usize] as usize];
        s += shift.max(1) as usize;
    }

    None
}

/// Position of the CRLFCRLF terminator in `buf`.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    find(buf, HEADER_TERMINATOR)
}

/// The three positional tokens of the request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub path: String,
    pub version: String,
}

/// Tokenizes the request line and headers of `head`, which must run up to and
/// including the header terminator. Headers are inserted into `request`.
pub fn parse_head(head: &[u8], request: &mut Request) -> Result<(), ParseError> {
    let line_end = memchr(b'\r', head, 0).ok_or(ParseError::InvalidRequest)?;
    let line = parse_request_line(&head[..line_end])?;

    request.method = line.method;
    request.path = line.path;
    request.version = line.version;

    // Skip the CRLF closing the request line.
    let mut cursor = line_end + 2;

    while cursor < head.len() {
        if head[cursor] == b'\r' {
            break;
        }

        let end = memchr(b'\r', head, cursor).ok_or(ParseError::InvalidHeader)?;
        let (key, value) = split_header(&head[cursor..end])?;

        request.headers.insert(key, value)?;

        cursor = end + 2;
    }

    Ok(())
}

/// Splits `METHOD SP TARGET SP VERSION`. The version runs to the end of the line.
pub fn parse_request_line(line: &[u8]) -> Result<RequestLine, ParseError> {
    let first = memchr(b' ', line, 0).ok_or(ParseError::InvalidRequest)?;
    let second = memchr(b' ', line, first + 1).ok_or(ParseError::InvalidRequest)?;

    let method = &line[..first];
    let path = &line[first + 1..second];
    let version = &line[second + 1..];

    if method.is_empty() || path.is_empty() || version.is_empty() {
        return Err(ParseError::InvalidRequest);
    }

    let token = |bytes: &[u8]| {
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| ParseError::InvalidRequest)
    };

    Ok(RequestLine {
        method: token(method)?,
        path: token(path)?,
        version: token(version)?,
    })
}

/// Splits `key: value` on the first colon, skipping at most one space before
/// the value.
pub fn split_header(line: &[u8]) -> Result<(&[u8], &[u8]), ParseError> {
    let colon = memchr(b':', line, 0).ok_or(ParseError::InvalidHeader)?;
    let key = &line[..colon];
    if key.is_empty() {
        return Err(ParseError::InvalidHeader);
    }

    let mut value = &line[colon + 1..];
    if value.first() == Some(&b' ') {
        value = &value[1..];
    }

    Ok((key, value))
}

/// Parses a `Content-Length` value the way `strtol` would: optional leading
/// whitespace, optional sign, then the leading run of digits.
///
/// A result of zero is indistinguishable from a parse failure and is
/// rejected, so an explicit `Content-Length: 0` is a protocol error.
pub fn parse_content_length(raw: &[u8]) -> Result<usize, ParseError> {
    let mut rest = raw;
    while let [b' ' | b'\t', tail @ ..] = rest {
        rest = tail;
    }

    let mut negative = false;
    if let [sign @ (b'+' | b'-'), tail @ ..] = rest {
        negative = *sign == b'-';
        rest = tail;
    }

    let mut value: usize = 0;
    for &b in rest.iter().take_while(|b| b.is_ascii_digit()) {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((b - b'0') as usize))
            .ok_or(ParseError::InvalidContentLength)?;
    }

    if value == 0 || negative {
        return Err(ParseError::InvalidContentLength);
    }

    Ok(value)
}

fn memchr(needle: u8, haystack: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .iter()
        .position(|&b| b == needle)
        .map(|pos| from + pos)
}
