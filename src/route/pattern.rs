//! Segment-wise URL template matching.
//!
//! A template is a `/`-separated list of literal segments and `<name>`
//! capture segments. Matching is a single left-to-right pass without
//! backtracking: no wildcards, no optional segments, and the segment counts
//! of path and template must be equal.

use std::collections::HashMap;

/// Variables captured from the path, passed to the view.
pub type Vars = HashMap<String, String>;

pub const SEPARATOR: char = '/';

/// Matches `path` against `template`, returning the captured variables.
///
/// Both sides are trimmed of one leading and one trailing `separator`, then
/// compared segment by segment:
/// - equal segments count as a coincidence;
/// - a `<name>` segment binds `name` only when every earlier segment has
///   already coincided;
/// - an unnamed `<>` segment in that position fails the whole match;
/// - any other mismatch is skipped without binding.
///
/// An empty result is ambiguous: it means either "no match" or "matched a
/// template without variables". Use [`resolve`] to tell them apart.
///
/// # Examples
/// ```
/// use webrail::route::pattern_matching;
///
/// let vars = pattern_matching("/users/42/", "/users/<id>/", '/');
/// assert_eq!(vars["id"], "42");
///
/// assert!(pattern_matching("/a/b/", "/a/", '/').is_empty());
/// ```
pub fn pattern_matching(path: &str, template: &str, separator: char) -> Vars {
    let path = catalogs(path, separator);
    let template = catalogs(template, separator);
    let mut vars = Vars::new();

    if path.len() != template.len() {
        return vars;
    }

    let mut coincidences = 0;
    for (index, (segment, pattern)) in path.iter().zip(&template).enumerate() {
        if segment == pattern {
            coincidences += 1;
            continue;
        }

        match var_name(pattern) {
            Some("") if coincidences == index => return Vars::new(),
            Some(name) if coincidences == index => {
                vars.insert(name.to_owned(), (*segment).to_owned());
                coincidences += 1;
            }
            _ => {}
        }
    }

    vars
}

/// Decides whether `path` is served by `template`.
///
/// A template matches when it captured at least one variable, or when the
/// path is literally equal to it.
#[inline]
pub fn resolve(path: &str, template: &str) -> Option<Vars> {
    let vars = pattern_matching(path, template, SEPARATOR);

    match !vars.is_empty() || path == template {
        true => Some(vars),
        false => None,
    }
}

/// Joins a root-table prefix and an application template into one absolute
/// template, collapsing repeated separators.
///
/// ```
/// use webrail::route::merge_url;
///
/// assert_eq!(merge_url("blog", "/<id>/"), "/blog/<id>/");
/// assert_eq!(merge_url("/", "/"), "/");
/// ```
pub fn merge_url(prefix: &str, template: &str) -> String {
    let mut merged = String::with_capacity(prefix.len() + template.len() + 1);

    let chars = std::iter::once(SEPARATOR)
        .chain(prefix.chars())
        .chain(template.chars());
    for c in chars {
        if c == SEPARATOR && merged.ends_with(SEPARATOR) {
            continue;
        }
        merged.push(c);
    }

    merged
}

#[inline]
fn correct_url(url: &str, separator: char) -> &str {
    let url = url.strip_prefix(separator).unwrap_or(url);
    url.strip_suffix(separator).unwrap_or(url)
}

#[inline]
fn catalogs(url: &str, separator: char) -> Vec<&str> {
    correct_url(url, separator).split(separator).collect()
}

#[inline]
fn var_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('<')?.strip_suffix('>')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::vars;

    #[test]
    fn capture() {
        #[rustfmt::skip]
        let cases = [
            ("/users/42/",         "/users/<id>/",             vars(&[("id", "42")])),
            ("/a/b/c/",            "/<x>/<y>/<z>/",            vars(&[("x", "a"), ("y", "b"), ("z", "c")])),
            ("/blog/7/edit/",      "/blog/<post>/edit/",       vars(&[("post", "7")])),
            ("users/42",           "/users/<id>/",             vars(&[("id", "42")])),
            ("/a/b/",              "/a/<x>/",                  vars(&[("x", "b")])),
        ];

        for (path, template, expected) in cases {
            assert_eq!(pattern_matching(path, template, '/'), expected, "{path} ~ {template}");
        }
    }

    #[test]
    fn no_capture() {
        #[rustfmt::skip]
        let cases = [
            ("/a/b/",              "/a/"),            // segment count
            ("/a/",                "/a/b/"),
            ("/users/42/",         "/users/42/"),     // literal, no vars
            ("/x/42/",             "/users/<id>/"),   // var after a mismatch
            ("/users/42/",         "/users/<>/"),     // unnamed var
            ("/",                  "/"),
        ];

        for (path, template) in cases {
            assert_eq!(pattern_matching(path, template, '/'), Vars::new(), "{path} ~ {template}");
        }
    }

    #[test]
    fn literal_mismatch_after_var_still_binds() {
        assert_eq!(
            pattern_matching("/users/42/view/", "/users/<id>/edit/", '/'),
            vars(&[("id", "42")])
        );
    }

    #[test]
    fn custom_separator() {
        assert_eq!(pattern_matching(".a.1.", ".a.<n>.", '.'), vars(&[("n", "1")]));
    }

    #[test]
    fn literal_templates_match_only_themselves() {
        #[rustfmt::skip]
        let cases = [
            ("/about/",      "/about/",     true),
            ("/about/",      "/contact/",   false),
            ("/a/b/",        "/a/c/",       false),
            ("/",            "/",           true),
            ("/About/",      "/about/",     false),
        ];

        for (path, template, expected) in cases {
            assert_eq!(resolve(path, template).is_some(), expected, "{path} ~ {template}");
        }
    }

    #[test]
    fn resolve_with_vars() {
        assert_eq!(resolve("/users/1/", "/users/<id>/"), Some(vars(&[("id", "1")])));
        assert_eq!(resolve("/users/1/2/", "/users/<id>/"), None);
    }

    #[test]
    fn merge() {
        #[rustfmt::skip]
        let cases = [
            ("",         "/",            "/"),
            ("/",        "/",            "/"),
            ("blog",     "/<id>/",       "/blog/<id>/"),
            ("/blog/",   "/<id>/",       "/blog/<id>/"),
            ("api/v1",   "users/",       "/api/v1users/"),
            ("api//",    "//users/",     "/api/users/"),
        ];

        for (prefix, template, expected) in cases {
            assert_eq!(merge_url(prefix, template), expected);
        }
    }
}
