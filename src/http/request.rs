use crate::{
    errors::{Error, Result},
    http::{query::Query, types::WebDict},
};
use memchr::memmem;
use std::{collections::HashMap, net::SocketAddr};

/// HTTP request representation.
///
/// Built once per incoming message, either from raw bytes read off a socket
/// ([`Request::set_http`]) or from a gateway scope, and read-only afterwards.
///
/// # Input data requirements
///
/// The raw-socket parser only accepts whole, already-buffered messages: no
/// streaming, no `Content-Length` driven reads, no chunked bodies.
///
/// #### Character encoding
///
/// The request line and headers must be `UTF-8`. The body is kept as raw
/// bytes and never decoded.
///
/// #### Framing
/// ```text
/// [METHOD] SP [PATH] SP "HTTP/" [VERSION] CRLF
/// [NAME] ":" [SP] [VALUE] CRLF
/// ...
/// CRLF
/// [BODY]
/// ```
///
/// The message must contain exactly one empty line (`CRLF CRLF`): zero or
/// several make the message a [syntax error](Error::Syntax).
///
/// Header lines without `:` are skipped. A `Cookie` header never reaches
/// [`headers`](Request::headers); its pairs go to [`cookies`](Request::cookies).
/// A `?` in the path splits off the query string, which is parsed into
/// [`payload`](Request::payload) (on duplicate keys the last value wins).
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) raw_path: String,
    pub(crate) root_path: String,
    pub(crate) http_version: String,
    pub(crate) scheme: String,

    pub(crate) headers: WebDict,
    pub(crate) cookies: WebDict,

    pub(crate) query_string: String,
    pub(crate) payload: HashMap<String, String>,

    pub(crate) body: Vec<u8>,
    pub(crate) raw_http: Vec<u8>,

    pub(crate) client: Option<SocketAddr>,
}

impl Request {
    const BLANK_LINE: &'static [u8] = b"\r\n\r\n";

    /// An empty request, as seen before any message is parsed into it.
    #[inline]
    pub fn new(client: Option<SocketAddr>) -> Self {
        Request {
            method: String::new(),
            path: String::new(),
            raw_path: String::new(),
            root_path: String::new(),
            http_version: String::new(),
            scheme: String::from("http"),

            headers: WebDict::new(),
            cookies: WebDict::new(),

            query_string: String::new(),
            payload: HashMap::new(),

            body: Vec::new(),
            raw_http: Vec::new(),

            client,
        }
    }

    /// Parses a raw HTTP message into this request.
    ///
    /// # Errors
    /// - [`Error::EmptyInput`]: `http` is empty
    /// - [`Error::Syntax`]: not exactly one blank line, non-UTF-8 header block,
    ///   or a request line that is not `METHOD PATH HTTP/x.y`
    pub fn set_http(mut self, http: &[u8]) -> Result<Self> {
        if http.is_empty() {
            return Err(Error::EmptyInput);
        }

        let (head, body) = Self::split_message(http)?;
        let head = simdutf8::basic::from_utf8(head)
            .map_err(|_| Error::Syntax("header block is not valid UTF-8"))?;

        let mut lines = head
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line));

        self.parse_first_line(lines.next().unwrap_or_default())?;
        for line in lines {
            self.parse_header(line);
        }

        self.body = body.to_vec();
        self.raw_http = http.to_vec();
        self.set_payload();

        Ok(self)
    }

    #[inline]
    fn split_message(http: &[u8]) -> Result<(&[u8], &[u8])> {
        let mut iter = memmem::find_iter(http, Self::BLANK_LINE);

        let index = iter
            .next()
            .ok_or(Error::Syntax("missing blank line after headers"))?;
        if iter.next().is_some() {
            return Err(Error::Syntax("more than one blank line in message"));
        }

        Ok((&http[..index], &http[index + Self::BLANK_LINE.len()..]))
    }

    #[inline]
    fn parse_first_line(&mut self, line: &str) -> Result<()> {
        let mut parts = line.split_whitespace();

        let (Some(method), Some(path), Some(version), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::Syntax("request line must be `METHOD PATH VERSION`"));
        };

        self.http_version = version
            .split('/')
            .nth(1)
            .ok_or(Error::Syntax("version must look like `HTTP/x.y`"))?
            .to_owned();
        self.method = method.to_owned();
        self.raw_path = path.to_owned();

        match path.split_once('?') {
            Some((path, query)) => {
                self.path = path.to_owned();
                self.query_string = query.to_owned();
            }
            None => self.path = path.to_owned(),
        }

        Ok(())
    }

    #[inline]
    fn parse_header(&mut self, line: &str) {
        let Some((name, value)) = line.split_once(':') else {
            return;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);

        match name.eq_ignore_ascii_case("cookie") {
            true => Query::cookies_into(&mut self.cookies, value),
            false => self.headers.insert(name, value),
        }
    }

    #[inline]
    pub(crate) fn set_payload(&mut self) {
        if !self.query_string.is_empty() {
            Query::parse_into(&mut self.payload, &self.query_string);
        }
    }
}

// Public API
impl Request {
    #[inline(always)]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request path without the query string.
    #[inline(always)]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Request target exactly as received, query string included.
    #[inline(always)]
    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    /// Mount point reported by a gateway host; empty on the raw-socket path.
    #[inline(always)]
    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Version number only, e.g. `1.1`.
    #[inline(always)]
    pub fn http_version(&self) -> &str {
        &self.http_version
    }

    #[inline(always)]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[inline(always)]
    pub fn headers(&self) -> &WebDict {
        &self.headers
    }

    /// Case-insensitive header lookup.
    #[inline(always)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    #[inline(always)]
    pub fn cookies(&self) -> &WebDict {
        &self.cookies
    }

    #[inline(always)]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name)
    }

    #[inline(always)]
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Parsed query string.
    #[inline(always)]
    pub fn payload(&self) -> &HashMap<String, String> {
        &self.payload
    }

    #[inline(always)]
    pub fn query(&self, key: &str) -> Option<&str> {
        self.payload.get(key).map(String::as_str)
    }

    #[inline(always)]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The bytes this request was parsed from (raw-socket path only).
    #[inline(always)]
    pub fn raw_http(&self) -> &[u8] {
        &self.raw_http
    }

    #[inline(always)]
    pub fn client(&self) -> Option<SocketAddr> {
        self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<V: AsRef<[u8]>>(value: V) -> Result<Request> {
        Request::new(None).set_http(value.as_ref())
    }

    #[test]
    fn parse_valid_request() {
        let req = parse(concat!(
            "POST /api/users/?sort=name&page=2 HTTP/1.1\r\n",
            "Host: localhost:8000\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "hello",
        ))
        .unwrap();

        assert_eq!(req.method(), "POST");
        assert_eq!(req.path(), "/api/users/");
        assert_eq!(req.raw_path(), "/api/users/?sort=name&page=2");
        assert_eq!(req.http_version(), "1.1");
        assert_eq!(req.scheme(), "http");
        assert_eq!(req.query_string(), "sort=name&page=2");
        assert_eq!(req.query("sort"), Some("name"));
        assert_eq!(req.query("page"), Some("2"));
        assert_eq!(req.header("host"), Some("localhost:8000"));
        assert_eq!(req.header("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(req.body(), b"hello");
    }

    #[test]
    fn parse_invalid_request() {
        #[rustfmt::skip]
        let cases: [(&[u8], Error); 6] = [
            (b"",                                            Error::EmptyInput),
            (b"GET / HTTP/1.1\r\nHost: a\r\n",               Error::Syntax("missing blank line after headers")),
            (b"GET / HTTP/1.1\r\n\r\nbody\r\n\r\nmore",      Error::Syntax("more than one blank line in message")),
            (b"GET /\r\n\r\n",                               Error::Syntax("request line must be `METHOD PATH VERSION`")),
            (b"GET / HTTP/1.1 extra\r\n\r\n",                Error::Syntax("request line must be `METHOD PATH VERSION`")),
            (b"GET / HTTP1.1\r\n\r\n",                       Error::Syntax("version must look like `HTTP/x.y`")),
        ];

        for (input, expected) in cases {
            assert_eq!(parse(input), Err(expected));
        }
    }

    #[test]
    fn invalid_utf8_headers() {
        let input = b"GET / HTTP/1.1\r\nX-Bad: \xff\xfe\r\n\r\n";

        assert_eq!(
            parse(input),
            Err(Error::Syntax("header block is not valid UTF-8"))
        );
    }

    #[test]
    fn body_is_raw_bytes() {
        let req = parse(b"PUT /file/ HTTP/1.0\r\n\r\n\x00\xff\xfe").unwrap();

        assert_eq!(req.body(), b"\x00\xff\xfe");
        assert_eq!(req.http_version(), "1.0");
    }

    #[test]
    fn parse_headers() {
        #[rustfmt::skip]
        let cases = [
            ("Name: value",          Some(("Name", "value"))),
            ("Name:value",           Some(("Name", "value"))),
            ("Name:  two spaces",    Some(("Name", " two spaces"))),
            ("Host: 127.0.0.1:80",   Some(("Host", "127.0.0.1:80"))),
            ("X-Empty: ",            Some(("X-Empty", ""))),
            ("no delimiter here",    None),
        ];

        for (line, expected) in cases {
            let req = parse(format!("GET / HTTP/1.1\r\n{line}\r\n\r\n")).unwrap();
            assert_eq!(req.headers().iter().next(), expected, "{line}");
        }
    }

    #[test]
    fn cookies_are_diverted() {
        let req = parse(concat!(
            "GET / HTTP/1.1\r\n",
            "Cookie: a=1; b=2; broken; c=1=2\r\n",
            "Accept: */*\r\n",
            "\r\n",
        ))
        .unwrap();

        assert_eq!(req.cookie("a"), Some("1"));
        assert_eq!(req.cookie("b"), Some("2"));
        assert_eq!(req.cookies().len(), 2);
        assert_eq!(req.header("cookie"), None);
        assert_eq!(req.headers().len(), 1);
    }

    #[test]
    fn query_duplicate_keys_last_wins() {
        let req = parse("GET /search/?a=1&a=2&flag HTTP/1.1\r\n\r\n").unwrap();

        assert_eq!(req.query("a"), Some("2"));
        assert_eq!(req.query("flag"), None);
        assert_eq!(req.payload().len(), 1);
    }

    #[test]
    fn bare_lf_lines() {
        let req = parse("GET / HTTP/1.1\nHost: a\r\n\r\n").unwrap();

        assert_eq!(req.header("host"), Some("a"));
    }

    #[test]
    fn keeps_raw_http() {
        let raw = b"GET / HTTP/1.1\r\n\r\n";
        let req = parse(raw).unwrap();

        assert_eq!(req.raw_http(), raw);
        assert_eq!(req.client(), None);
    }
}
