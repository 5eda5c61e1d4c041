#![allow(rustdoc::bare_urls)]

//! Core HTTP protocol types and utilities

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS, NON_ALPHANUMERIC};
use std::{borrow::Cow, fmt};

// PERCENT ESCAPES

// Everything except unreserved characters and `/` is escaped.
const QUOTE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Makes `value` safe to put on a header line.
///
/// Text with non-ASCII characters is percent-escaped as a whole. ASCII text
/// only has its control characters (`\r`, `\n`, ...) escaped, so a header
/// can never end early. Plain printable ASCII is returned untouched.
#[inline]
pub fn ascii_quote(value: &str) -> Cow<'_, str> {
    if !value.is_ascii() {
        return Cow::Owned(utf8_percent_encode(value, QUOTE_SET).to_string());
    }

    match value.bytes().any(|b| b.is_ascii_control()) {
        true => Cow::Owned(utf8_percent_encode(value, CONTROLS).to_string()),
        false => Cow::Borrowed(value),
    }
}

/// Decodes `%XX` escapes; invalid UTF-8 is replaced lossily.
#[inline]
pub fn unquote(value: &str) -> Cow<'_, str> {
    percent_decode_str(value).decode_utf8_lossy()
}

// STATUS

/// An HTTP status: numeric code plus reason phrase.
///
/// Well-known statuses are available as associated constants
/// ([`Status::OK`], [`Status::NOT_FOUND`], ...). Custom pairs can be built
/// with [`Status::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Status {
    code: u16,
    reason: Cow<'static, str>,
}

impl Status {
    /// Creates a status with an arbitrary reason phrase.
    #[inline]
    pub fn new<R: Into<Cow<'static, str>>>(code: u16, reason: R) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    #[inline(always)]
    const fn from_static(code: u16, reason: &'static str) -> Self {
        Self {
            code,
            reason: Cow::Borrowed(reason),
        }
    }

    #[inline(always)]
    pub const fn code(&self) -> u16 {
        self.code
    }

    #[inline(always)]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Looks up the registered status for `code`.
    #[inline]
    pub fn from_code(code: u16) -> Option<Self> {
        Self::registered_reason(code).map(|reason| Self::from_static(code, reason))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.reason)
    }
}

macro_rules! set_status_codes {
    ($( $name:ident = ($num:expr, $str:expr); )+) => {
        impl Status { $(
            #[doc = concat!(stringify!($num), " ", $str)]
            pub const $name: Status = Status::from_static($num, $str);
        )+ }

        impl Status {
            #[inline]
            fn registered_reason(code: u16) -> Option<&'static str> {
                match code { $(
                    $num => Some($str),
                )+ _ => None }
            }
        }
    };
}

set_status_codes! {
    CONTINUE = (100, "Continue");
    SWITCHING_PROTOCOLS = (101, "Switching Protocols");
    PROCESSING = (102, "Processing");
    EARLY_HINTS = (103, "Early Hints");

    OK = (200, "OK");
    CREATED = (201, "Created");
    ACCEPTED = (202, "Accepted");
    NON_AUTHORITATIVE_INFORMATION = (203, "Non-Authoritative Information");
    NO_CONTENT = (204, "No Content");
    RESET_CONTENT = (205, "Reset Content");
    PARTIAL_CONTENT = (206, "Partial Content");
    MULTI_STATUS = (207, "Multi-Status");
    ALREADY_REPORTED = (208, "Already Reported");
    IM_USED = (226, "IM Used");

    MULTIPLE_CHOICES = (300, "Multiple Choices");
    MOVED_PERMANENTLY = (301, "Moved Permanently");
    FOUND = (302, "Found");
    SEE_OTHER = (303, "See Other");
    NOT_MODIFIED = (304, "Not Modified");
    TEMPORARY_REDIRECT = (307, "Temporary Redirect");
    PERMANENT_REDIRECT = (308, "Permanent Redirect");

    BAD_REQUEST = (400, "Bad Request");
    UNAUTHORIZED = (401, "Unauthorized");
    PAYMENT_REQUIRED = (402, "Payment Required");
    FORBIDDEN = (403, "Forbidden");
    NOT_FOUND = (404, "Not Found");
    METHOD_NOT_ALLOWED = (405, "Method Not Allowed");
    NOT_ACCEPTABLE = (406, "Not Acceptable");
    PROXY_AUTHENTICATION_REQUIRED = (407, "Proxy Authentication Required");
    REQUEST_TIMEOUT = (408, "Request Timeout");
    CONFLICT = (409, "Conflict");
    GONE = (410, "Gone");
    LENGTH_REQUIRED = (411, "Length Required");
    PRECONDITION_FAILED = (412, "Precondition Failed");
    CONTENT_TOO_LARGE = (413, "Content Too Large");
    URI_TOO_LONG = (414, "URI Too Long");
    UNSUPPORTED_MEDIA_TYPE = (415, "Unsupported Media Type");
    RANGE_NOT_SATISFIABLE = (416, "Range Not Satisfiable");
    EXPECTATION_FAILED = (417, "Expectation Failed");
    IM_A_TEAPOT = (418, "I'm a teapot");
    MISDIRECTED_REQUEST = (421, "Misdirected Request");
    UNPROCESSABLE_CONTENT = (422, "Unprocessable Content");
    LOCKED = (423, "Locked");
    FAILED_DEPENDENCY = (424, "Failed Dependency");
    TOO_EARLY = (425, "Too Early");
    UPGRADE_REQUIRED = (426, "Upgrade Required");
    PRECONDITION_REQUIRED = (428, "Precondition Required");
    TOO_MANY_REQUESTS = (429, "Too Many Requests");
    REQUEST_HEADER_FIELDS_TOO_LARGE = (431, "Request Header Fields Too Large");
    UNAVAILABLE_FOR_LEGAL_REASONS = (451, "Unavailable For Legal Reasons");

    INTERNAL_SERVER_ERROR = (500, "Internal Server Error");
    NOT_IMPLEMENTED = (501, "Not Implemented");
    BAD_GATEWAY = (502, "Bad Gateway");
    SERVICE_UNAVAILABLE = (503, "Service Unavailable");
    GATEWAY_TIMEOUT = (504, "Gateway Timeout");
    HTTP_VERSION_NOT_SUPPORTED = (505, "HTTP Version Not Supported");
    VARIANT_ALSO_NEGOTIATES = (506, "Variant Also Negotiates");
    INSUFFICIENT_STORAGE = (507, "Insufficient Storage");
    LOOP_DETECTED = (508, "Loop Detected");
    NOT_EXTENDED = (510, "Not Extended");
    NETWORK_AUTHENTICATION_REQUIRED = (511, "Network Authentication Required");
}

// HEADER TEXT

/// Values accepted as [`WebDict`] keys and values: text or raw bytes.
///
/// Bytes are decoded as UTF-8 (lossily), so every stored pair is text.
pub trait HeaderText {
    fn to_text(&self) -> Cow<'_, str>;
}

impl HeaderText for str {
    #[inline]
    fn to_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}
impl HeaderText for String {
    #[inline]
    fn to_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}
impl HeaderText for Cow<'_, str> {
    #[inline]
    fn to_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_ref())
    }
}
impl HeaderText for [u8] {
    #[inline]
    fn to_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self)
    }
}
impl HeaderText for Vec<u8> {
    #[inline]
    fn to_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self)
    }
}
impl<const N: usize> HeaderText for [u8; N] {
    #[inline]
    fn to_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self)
    }
}
impl<T: HeaderText + ?Sized> HeaderText for &T {
    #[inline]
    fn to_text(&self) -> Cow<'_, str> {
        T::to_text(*self)
    }
}

// WEB DICT

/// Ordered header map with case-insensitive lookup.
///
/// Each entry keeps the original-case key next to its value; iteration
/// yields those original pairs in insertion order. At most one value is
/// stored per normalized key: a later insert replaces the pair in place.
///
/// Keys and values are percent-decoded on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebDict {
    entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    lower: String,
    key: String,
    value: String,
}

impl WebDict {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pair, replacing any entry whose key matches case-insensitively.
    pub fn insert<K: HeaderText, V: HeaderText>(&mut self, key: K, value: V) {
        let key = unquote(&key.to_text()).into_owned();
        let value = unquote(&value.to_text()).into_owned();
        let lower = key.to_ascii_lowercase();

        match self.entries.iter_mut().find(|e| e.lower == lower) {
            Some(entry) => {
                entry.key = key;
                entry.value = value;
            }
            None => self.entries.push(Entry { lower, key, value }),
        }
    }

    /// Returns the value stored under `key`, ignoring ASCII case.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.lower.eq_ignore_ascii_case(key))
            .map(|e| e.value.as_str())
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self
            .entries
            .iter()
            .position(|e| e.lower.eq_ignore_ascii_case(key))?;

        Some(self.entries.remove(index).value)
    }

    /// Original-case `(key, value)` pairs in insertion order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.key.as_str(), e.value.as_str()))
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: HeaderText, V: HeaderText> FromIterator<(K, V)> for WebDict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = WebDict::new();
        for (key, value) in iter {
            dict.insert(key, value);
        }
        dict
    }
}

impl<K: HeaderText, V: HeaderText, const N: usize> From<[(K, V); N]> for WebDict {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod status_tests {
    use super::*;

    #[test]
    fn registered() {
        #[rustfmt::skip]
        let cases = [
            (200, Some("OK")),
            (301, Some("Moved Permanently")),
            (404, Some("Not Found")),
            (418, Some("I'm a teapot")),
            (500, Some("Internal Server Error")),
            (299, None),
            (600, None),
        ];

        for (code, expected) in cases {
            assert_eq!(Status::from_code(code).as_ref().map(Status::reason), expected);
        }
    }

    #[test]
    fn custom() {
        let status = Status::new(299, String::from("Custom Thing"));

        assert_eq!(status.code(), 299);
        assert_eq!(status.reason(), "Custom Thing");
        assert_eq!(status.to_string(), "299 Custom Thing");
        assert_eq!(Status::NOT_FOUND, Status::new(404, "Not Found"));
    }
}
