//! Strict `key=value` pair splitting for query strings and cookies.

use crate::http::types::WebDict;
use memchr::{memchr, memchr_iter};
use std::collections::HashMap;

/// Splitter for `key=value` lists such as `a=1&b=2` or `sid=abc; theme=dark`.
///
/// Only pieces containing **exactly one** `=` are kept. Everything else
/// (`flag`, `a=b=c`, empty pieces) is dropped silently, never reported as
/// an error. Values are not percent-decoded.
///
/// # Examples
/// ```rust
/// use webrail::query::Query;
/// use std::collections::HashMap;
///
/// // Ordered pairs
/// let pairs: Vec<(&str, &str)> = Query::parse("name=john&flag&age=25");
/// assert_eq!(pairs, [("name", "john"), ("age", "25")]);
///
/// // Map: on duplicate keys the last value wins
/// let map: HashMap<String, String> = Query::parse("key=1&key=2");
/// assert_eq!(map["key"], "2");
/// ```
pub struct Query;

impl Query {
    /// Parses a query string (without the leading `?`) into a new collection.
    #[inline]
    pub fn parse<'a, C: QueryCollector<'a>>(query: &'a str) -> C {
        let mut result = C::default();
        Self::parse_into(&mut result, query);
        result
    }

    /// Parses a query string, appending to an existing collection.
    #[inline]
    pub fn parse_into<'a, C: QueryCollector<'a>>(result: &mut C, query: &'a str) {
        for (key, value) in Pairs::new(query, b'&') {
            result.add_param(key, value);
        }
    }

    /// Parses the value of a `Cookie` header (`a=1; b=2`).
    ///
    /// Spaces around each piece are stripped before the `=` check.
    #[inline]
    pub fn cookies(header: &str) -> WebDict {
        let mut result = WebDict::new();
        Self::cookies_into(&mut result, header);
        result
    }

    #[inline]
    pub fn cookies_into<'a, C: QueryCollector<'a>>(result: &mut C, header: &'a str) {
        for (key, value) in Pairs::new(header, b';') {
            result.add_param(key, value);
        }
    }
}

/// Iterator over well-formed pairs of a `separator`-delimited list.
struct Pairs<'a> {
    data: &'a str,
    separator: u8,
    start: usize,
}

impl<'a> Pairs<'a> {
    #[inline]
    fn new(data: &'a str, separator: u8) -> Self {
        Self {
            data,
            separator,
            start: 0,
        }
    }

    // Only cookie pieces are trimmed; query keys keep their spaces.
    #[inline]
    fn split_pair(&self, piece: &'a str) -> Option<(&'a str, &'a str)> {
        let piece = match self.separator {
            b';' => piece.trim_matches(' '),
            _ => piece,
        };
        let bytes = piece.as_bytes();

        if memchr_iter(b'=', bytes).count() != 1 {
            return None;
        }

        let index = memchr(b'=', bytes)?;
        Some((&piece[..index], &piece[index + 1..]))
    }
}

impl<'a> Iterator for Pairs<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.data.as_bytes();

        while self.start <= bytes.len() {
            let end = memchr(self.separator, &bytes[self.start..])
                .map(|pos| self.start + pos)
                .unwrap_or(bytes.len());

            let piece = &self.data[self.start..end];
            self.start = end + 1;

            if let Some(pair) = self.split_pair(piece) {
                return Some(pair);
            }
        }

        None
    }
}

/// A trait for types that can collect parsed pairs.
///
/// # Lifetime
/// - `'a`: The lifetime of the input text
pub trait QueryCollector<'a>: Default {
    /// Adds a parsed pair to the collection.
    fn add_param(&mut self, key: &'a str, value: &'a str);
}

// Preserves order and duplicates
impl<'a> QueryCollector<'a> for Vec<(&'a str, &'a str)> {
    #[inline(always)]
    fn add_param(&mut self, key: &'a str, value: &'a str) {
        self.push((key, value));
    }
}

// Deduplicates (last wins)
impl<'a> QueryCollector<'a> for HashMap<String, String> {
    #[inline(always)]
    fn add_param(&mut self, key: &'a str, value: &'a str) {
        self.insert(key.to_owned(), value.to_owned());
    }
}

// Deduplicates case-insensitively (last wins)
impl<'a> QueryCollector<'a> for WebDict {
    #[inline(always)]
    fn add_param(&mut self, key: &'a str, value: &'a str) {
        self.insert(key, value);
    }
}
