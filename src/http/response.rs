//! HTTP response value, wire serialization and the framework's canned replies.

use crate::{
    errors::{Error, Result},
    http::types::{ascii_quote, HeaderText, Status, WebDict},
};
use memchr::memmem;
use std::{borrow::Cow, rc::Rc, sync::Arc};

/// HTTP response returned by a [`View`](crate::View).
///
/// Built with a consuming builder, then serialized once by the transport.
/// The status line always carries `HTTP/1.1`; no `Content-Length` or
/// `Transfer-Encoding` is added, the connection is closed after the write.
///
/// # Examples
/// ```
/// use webrail::{Response, Status};
///
/// let resp = Response::new(Status::OK)
///     .header("Content-Type", "text/html")
///     .body("<h1>Hello World</h1>");
///
/// assert_eq!(
///     resp.as_http(),
///     b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<h1>Hello World</h1>"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: Status,
    headers: WebDict,
    body: Vec<u8>,
    http_version: String,
}

impl Response {
    pub const HTTP_VERSION: &'static str = "HTTP/1.1";

    #[inline]
    pub fn new(status: Status) -> Self {
        Self {
            status,
            headers: WebDict::new(),
            body: Vec::new(),
            http_version: String::from(Self::HTTP_VERSION),
        }
    }

    /// Sets a header, replacing any previous value under the same
    /// case-insensitive name.
    #[inline]
    pub fn header<K: HeaderText, V: HeaderText>(mut self, name: K, value: V) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[inline]
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: HeaderText,
        V: HeaderText,
    {
        for (name, value) in headers {
            self.headers.insert(name, value);
        }
        self
    }

    /// Replaces the body.
    #[inline]
    pub fn body<T: WriteBuffer>(mut self, data: T) -> Self {
        self.body.clear();
        data.write_to(&mut self.body);
        self
    }
}

// Canned responses
impl Response {
    /// `404 Not Found` with the reason phrase as a plain-text body.
    ///
    /// Served for unmatched paths and for views that did not produce a response.
    #[inline]
    pub fn not_found() -> Self {
        Self::new(Status::NOT_FOUND)
            .header("Content-Type", "text/plain")
            .body(Status::NOT_FOUND.reason())
    }

    /// `301 Moved Permanently` to `location`, closing the connection.
    #[inline]
    pub fn redirect<L: HeaderText>(location: L) -> Self {
        Self::new(Status::MOVED_PERMANENTLY)
            .header("Location", location)
            .header("Connection", "close")
    }

    /// Opaque `500` used when a view fails outside debug mode.
    #[inline]
    pub fn internal_error() -> Self {
        Self::new(Status::INTERNAL_SERVER_ERROR)
            .header("Content-Type", "text/plain")
            .body(Status::INTERNAL_SERVER_ERROR.reason())
    }

    /// Failure trace sent to the client in debug mode.
    #[inline]
    pub fn trace<T: WriteBuffer>(trace: T) -> Self {
        Self::new(Status::NOT_FOUND)
            .header("Content-Type", "text/plain")
            .body(trace)
    }
}

// Wire format
impl Response {
    const CRLF: &'static [u8] = b"\r\n";

    /// Serializes the response: status line, headers in insertion order,
    /// blank line, raw body.
    ///
    /// Header names and values containing non-ASCII characters are
    /// percent-escaped.
    pub fn as_http(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(64 + self.body.len());

        buffer.extend_from_slice(self.http_version.as_bytes());
        buffer.push(b' ');
        buffer.extend_from_slice(self.status.to_string().as_bytes());
        buffer.extend_from_slice(Self::CRLF);

        for (name, value) in self.headers.iter() {
            buffer.extend_from_slice(ascii_quote(name).as_bytes());
            buffer.extend_from_slice(b": ");
            buffer.extend_from_slice(ascii_quote(value).as_bytes());
            buffer.extend_from_slice(Self::CRLF);
        }

        buffer.extend_from_slice(Self::CRLF);
        buffer.extend_from_slice(&self.body);
        buffer
    }

    /// Decodes a serialized response.
    ///
    /// Everything after the first blank line is the body. A reason phrase
    /// may be empty; the status code must be numeric.
    ///
    /// # Errors
    /// - [`Error::EmptyInput`]: `http` is empty
    /// - [`Error::Syntax`]: no blank line, non-UTF-8 head or bad status line
    pub fn from_http(http: &[u8]) -> Result<Self> {
        if http.is_empty() {
            return Err(Error::EmptyInput);
        }

        let index = memmem::find(http, b"\r\n\r\n")
            .ok_or(Error::Syntax("missing blank line after headers"))?;
        let head = simdutf8::basic::from_utf8(&http[..index])
            .map_err(|_| Error::Syntax("header block is not valid UTF-8"))?;

        let mut lines = head.split("\r\n");

        let mut status_line = lines.next().unwrap_or_default().splitn(3, ' ');
        let (Some(version), Some(code)) = (status_line.next(), status_line.next()) else {
            return Err(Error::Syntax("status line must be `VERSION CODE REASON`"));
        };
        let code = code
            .parse::<u16>()
            .map_err(|_| Error::Syntax("status code is not a number"))?;
        let reason = status_line.next().unwrap_or_default();

        let mut response = Self::new(Status::new(code, reason.to_owned()));
        response.http_version = version.to_owned();

        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                let value = value.strip_prefix(' ').unwrap_or(value);
                response.headers.insert(name, value);
            }
        }

        response.body = http[index + 4..].to_vec();
        Ok(response)
    }
}

// Public API
impl Response {
    #[inline(always)]
    pub fn status(&self) -> &Status {
        &self.status
    }

    #[inline(always)]
    pub fn status_code(&self) -> u16 {
        self.status.code()
    }

    #[inline(always)]
    pub fn get_headers(&self) -> &WebDict {
        &self.headers
    }

    #[inline(always)]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    #[inline(always)]
    pub fn get_body(&self) -> &[u8] {
        &self.body
    }

    #[inline(always)]
    pub fn http_version(&self) -> &str {
        &self.http_version
    }

    /// Consumes the response, returning its status, headers and body.
    #[inline]
    pub fn into_parts(self) -> (Status, WebDict, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

/// Trait for writing data into a [`Response`] body.
///
/// Implemented for strings, bytes, booleans, chars and integers
/// (floating-point numbers are left out on purpose: format them yourself
/// with the precision you need).
///
/// # Example
/// ```
/// use webrail::WriteBuffer;
///
/// struct MyString(String);
///
/// impl WriteBuffer for MyString {
///     fn write_to(&self, buffer: &mut Vec<u8>) {
///         buffer.extend_from_slice(self.0.as_bytes())
///     }
/// }
/// ```
pub trait WriteBuffer {
    fn write_to(&self, buffer: &mut Vec<u8>);
}

macro_rules! impl_write_buffer {
    (bytes, $conn:expr => $($t:ty),*) => {
        $(impl WriteBuffer for $t {
            #[inline] fn write_to(&self, buffer: &mut Vec<u8>) {
                let closure = $conn;
                closure(self, buffer);
            }
        })*
    };
    (display => $($t:ty),*) => {
        $(impl WriteBuffer for $t {
            #[inline] fn write_to(&self, buffer: &mut Vec<u8>) {
                buffer.extend_from_slice(self.to_string().as_bytes());
            }
        })*
    };
}

impl<T: WriteBuffer + ?Sized> WriteBuffer for &T {
    #[inline]
    fn write_to(&self, buffer: &mut Vec<u8>) {
        T::write_to(*self, buffer);
    }
}
impl WriteBuffer for str {
    #[inline]
    fn write_to(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(self.as_bytes());
    }
}
impl WriteBuffer for [u8] {
    #[inline]
    fn write_to(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(self);
    }
}
impl<const N: usize> WriteBuffer for [u8; N] {
    #[inline]
    fn write_to(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(self);
    }
}
impl_write_buffer! {
    bytes, |value: &str, buffer: &mut Vec<u8>| {
        buffer.extend_from_slice(value.as_bytes());
    } => String, Box<str>, Cow<'_, str>, Arc<str>, Rc<str>
}
impl_write_buffer! {
    bytes, |value: &[u8], buffer: &mut Vec<u8>| {
        buffer.extend_from_slice(value);
    } => Vec<u8>, Box<[u8]>, Cow<'_, [u8]>, Arc<[u8]>, Rc<[u8]>
}
impl_write_buffer! {
    display => u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char
}


#[cfg(test)]
mod canned_tests {
    use super::*;

    #[test]
    fn not_found() {
        let resp = Response::not_found();

        assert_eq!(resp.status_code(), 404);
        assert_eq!(resp.get_body(), b"Not Found");
        assert_eq!(resp.get_header("content-type"), Some("text/plain"));
    }

    #[test]
    fn redirect() {
        let resp = Response::redirect("/foo/");

        assert_eq!(resp.status_code(), 301);
        assert_eq!(resp.get_header("Location"), Some("/foo/"));
        assert_eq!(resp.get_header("Connection"), Some("close"));
        assert!(resp.get_body().is_empty());
    }

    #[test]
    fn internal_error_and_trace() {
        let error = Response::internal_error();
        assert_eq!(error.status_code(), 500);
        assert_eq!(error.get_body(), b"Internal Server Error");

        let trace = Response::trace("view 'index' failed: boom");
        assert_eq!(trace.status_code(), 404);
        assert_eq!(trace.get_body(), b"view 'index' failed: boom");
        assert_eq!(trace.get_header("Content-Type"), Some("text/plain"));
    }
}
