//! Static assets: URL → file records served before any application route.

use crate::{
    errors::{Error, Result},
    http::{response::Response, types::Status},
};
use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Ensures `url` starts and ends with `/`.
///
/// ```
/// use webrail::statics::to_correct;
///
/// assert_eq!(to_correct("css/app.css"), "/css/app.css/");
/// assert_eq!(to_correct("/"), "/");
/// ```
pub fn to_correct(url: &str) -> String {
    let mut corrected = String::with_capacity(url.len() + 2);

    if !url.starts_with('/') {
        corrected.push('/');
    }
    corrected.push_str(url);
    if !corrected.ends_with('/') {
        corrected.push('/');
    }

    corrected
}

/// A file served as-is under a fixed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAsset {
    url: String,
    path: PathBuf,
    content_type: Option<String>,
}

impl StaticAsset {
    /// Creates a record, resolving the content type from the file extension.
    pub fn new<P: Into<PathBuf>>(url: &str, path: P) -> Self {
        let path = path.into();
        let content_type = content_type(&path).map(str::to_owned);

        Self {
            url: to_correct(url),
            path,
            content_type,
        }
    }

    #[inline(always)]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[inline(always)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline(always)]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Reads the file into a `200 OK` response.
    ///
    /// An unknown content type is sent as an empty `Content-Type`.
    pub async fn load(&self) -> Result<Response> {
        let body = tokio::fs::read(&self.path).await?;

        Ok(Response::new(Status::OK)
            .header("Content-Type", self.content_type().unwrap_or_default())
            .body(body))
    }
}

/// Lookup table of [`StaticAsset`]s keyed by normalized URL.
#[derive(Debug, Clone, Default)]
pub struct Statics {
    assets: HashMap<String, StaticAsset>,
}

impl Statics {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks `dir` recursively, mapping every file to `url` + its relative path.
    ///
    /// `Statics::scan("/static/", "assets")` maps `assets/css/app.css` to
    /// `/static/css/app.css/`.
    ///
    /// # Errors
    /// [`Error::Io`] if `dir` or one of its subdirectories cannot be read.
    pub fn scan<P: AsRef<Path>>(url: &str, dir: P) -> Result<Self> {
        let root = dir.as_ref().canonicalize()?;
        let url = to_correct(url);
        let mut statics = Self::new();

        for entry in WalkDir::new(&root).follow_links(true).min_depth(1) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&root) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|part| part.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            statics.insert(StaticAsset::new(&format!("{url}{relative}"), entry.into_path()));
        }

        Ok(statics)
    }

    /// Adds a record, replacing any previous one with the same URL.
    #[inline]
    pub fn insert(&mut self, asset: StaticAsset) {
        self.assets.insert(asset.url.clone(), asset);
    }

    #[inline]
    pub fn extend(&mut self, other: Statics) {
        self.assets.extend(other.assets);
    }

    /// Finds the record for `url` after normalizing it.
    #[inline]
    pub fn lookup(&self, url: &str) -> Option<&StaticAsset> {
        self.assets.get(&to_correct(url))
    }

    /// Reads the file registered under `url`.
    ///
    /// # Errors
    /// - [`Error::StaticNotFound`]: no record for `url`
    /// - [`Error::Io`]: the record exists but the file cannot be read
    pub async fn read(&self, url: &str) -> Result<Vec<u8>> {
        let asset = self
            .lookup(url)
            .ok_or_else(|| Error::StaticNotFound(to_correct(url)))?;

        Ok(tokio::fs::read(&asset.path).await?)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &StaticAsset> {
        self.assets.values()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

fn content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();

    let mime = match ext.as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "json" | "map" => "application/json",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        "zip" => "application/zip",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => return None,
    };

    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("css/vendor")).unwrap();
        fs::write(dir.path().join("index.html"), "<h1>hi</h1>").unwrap();
        fs::write(dir.path().join("css/app.css"), "body{}").unwrap();
        fs::write(dir.path().join("css/vendor/reset.css"), "*{}").unwrap();
        fs::write(dir.path().join("data.bin"), [0u8, 1, 2]).unwrap();
        dir
    }

    #[test]
    fn correct() {
        #[rustfmt::skip]
        let cases = [
            ("",              "/"),
            ("/",             "/"),
            ("a",             "/a/"),
            ("/a",            "/a/"),
            ("a/",            "/a/"),
            ("/static/x.js",  "/static/x.js/"),
        ];

        for (url, expected) in cases {
            assert_eq!(to_correct(url), expected);
        }
    }

    #[test]
    fn content_types() {
        #[rustfmt::skip]
        let cases = [
            ("index.html",    Some("text/html")),
            ("APP.CSS",       Some("text/css")),
            ("logo.svg",      Some("image/svg+xml")),
            ("font.woff2",    Some("font/woff2")),
            ("data.bin",      None),
            ("README",        None),
        ];

        for (name, expected) in cases {
            assert_eq!(content_type(Path::new(name)), expected, "{name}");
        }
    }

    #[test]
    fn scan_nested() {
        let dir = fixture();
        let statics = Statics::scan("static", dir.path()).unwrap();

        assert_eq!(statics.len(), 4);

        #[rustfmt::skip]
        let cases = [
            ("/static/index.html/",            Some("text/html")),
            ("/static/css/app.css/",           Some("text/css")),
            ("static/css/vendor/reset.css",    Some("text/css")),
            ("/static/data.bin/",              None),
        ];

        for (url, expected) in cases {
            let asset = statics.lookup(url).unwrap();
            assert_eq!(asset.content_type(), expected, "{url}");
            assert!(asset.path().is_absolute());
        }

        assert!(statics.lookup("/static/css/").is_none());
        assert!(statics.lookup("/static/missing.css/").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn scan_follows_links() {
        let dir = fixture();
        let shared = tempfile::tempdir().unwrap();
        fs::write(shared.path().join("lib.js"), "0").unwrap();
        std::os::unix::fs::symlink(shared.path(), dir.path().join("shared")).unwrap();

        let statics = Statics::scan("/static/", dir.path()).unwrap();

        assert_eq!(statics.len(), 5);
        let asset = statics.lookup("/static/shared/lib.js/").unwrap();
        assert_eq!(asset.content_type(), Some("text/javascript"));
    }

    #[test]
    fn scan_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = Statics::scan("/", dir.path().join("nope"));

        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn read() {
        let dir = fixture();
        let statics = Statics::scan("/static/", dir.path()).unwrap();

        assert_eq!(statics.read("/static/css/app.css/").await.unwrap(), b"body{}");
        assert_eq!(
            statics.read("/static/nope.css").await,
            Err(Error::StaticNotFound("/static/nope.css/".into()))
        );
    }

    #[tokio::test]
    async fn load_response() {
        let dir = fixture();
        let mut statics = Statics::new();
        statics.extend(Statics::scan("/s/", dir.path()).unwrap());

        let html = statics.lookup("/s/index.html/").unwrap().load().await.unwrap();
        assert_eq!(html.status_code(), 200);
        assert_eq!(html.get_header("content-type"), Some("text/html"));
        assert_eq!(html.get_body(), b"<h1>hi</h1>");

        let bin = statics.lookup("/s/data.bin/").unwrap().load().await.unwrap();
        assert_eq!(bin.get_header("content-type"), Some(""));
        assert_eq!(bin.get_body(), [0, 1, 2]);
    }
}
