//! Framework settings.
//!
//! The serializable part is read from TOML; applications and static assets
//! are installed at runtime before the [`App`](crate::App) is built and are
//! read-only afterwards.

use crate::{
    errors::{Error, Result},
    route::application::Application,
    statics::Statics,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, fs, path::Path};

/// Root configuration.
///
/// # Examples
/// ```
/// use webrail::Settings;
///
/// let settings = Settings::from_toml_str(r#"
///     app_name = "blog"
///     debug = false
///     server_port = 8080
///     install_apps = ["posts"]
///     root_urlpatterns = [["", "posts"]]
/// "#).unwrap();
///
/// assert_eq!(settings.server_port, 8080);
/// assert_eq!(settings.root_urlpatterns[0], ("".to_owned(), "posts".to_owned()));
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Name shown in the launch summary.
    pub app_name: String,

    /// Leak failure traces to the client (404 with the trace as body).
    pub debug: bool,

    /// Log a launch summary and one line per raw-socket request.
    pub tracing: bool,

    /// Outside debug mode, stop serving on the first view failure
    /// instead of answering 500.
    pub stop_on_exception: bool,

    pub server_host: String,
    pub server_port: u16,

    /// Names of the applications this project uses.
    pub install_apps: Vec<String>,

    /// Ordered `(prefix, application name)` pairs.
    pub root_urlpatterns: Vec<(String, String)>,

    pub static_file_dirs: Vec<StaticDir>,

    /// Try the next root-table entry when the first registered application
    /// has no matching pattern.
    pub root_fallthrough: bool,

    /// Report views that do not return a response as
    /// [`Error::InvalidReturnType`] on the raw-socket path.
    pub strict_returns: bool,

    /// Bytes read from a raw socket per request.
    pub read_buffer_size: usize,

    #[serde(skip)]
    pub applications: HashMap<String, Application>,

    #[serde(skip)]
    pub statics: Statics,
}

/// A directory served under a URL prefix.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StaticDir {
    pub url: String,
    pub dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: String::from("webrail"),
            debug: true,
            tracing: true,
            stop_on_exception: false,
            server_host: String::from("localhost"),
            server_port: 8000,
            install_apps: Vec::new(),
            root_urlpatterns: Vec::new(),
            static_file_dirs: Vec::new(),
            root_fallthrough: false,
            strict_returns: false,
            read_buffer_size: 1024,
            applications: HashMap::new(),
            statics: Statics::new(),
        }
    }
}

impl Settings {
    /// Parses settings from TOML text; missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses a TOML settings file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Registers an application under its name, listing it in
    /// `install_apps` if needed.
    pub fn install_app(&mut self, app: Application) -> &mut Self {
        let name = app.name().to_owned();

        if !self.install_apps.contains(&name) {
            self.install_apps.push(name.clone());
        }
        self.applications.insert(name, app);
        self
    }

    /// Appends a root-table entry.
    pub fn add_root<P: Into<String>, N: Into<String>>(&mut self, prefix: P, app_name: N) -> &mut Self {
        self.root_urlpatterns.push((prefix.into(), app_name.into()));
        self
    }

    /// Scans every `static_file_dirs` entry into the statics table.
    ///
    /// # Errors
    /// [`Error::Io`] if a directory cannot be read.
    pub fn install_statics(&mut self) -> Result<&mut Self> {
        for StaticDir { url, dir } in &self.static_file_dirs {
            self.statics.extend(Statics::scan(url, dir)?);
        }
        Ok(self)
    }

    /// Setup-time validation.
    ///
    /// # Errors
    /// [`Error::ApplicationNotFound`] when a listed application was never
    /// installed, or the root table names an application not listed in
    /// `install_apps`.
    pub fn check(&self) -> Result<()> {
        if let Some(name) = self
            .install_apps
            .iter()
            .find(|name| !self.applications.contains_key(*name))
        {
            return Err(Error::ApplicationNotFound(name.clone()));
        }

        if let Some((_, name)) = self
            .root_urlpatterns
            .iter()
            .find(|(_, name)| !self.install_apps.contains(name))
        {
            return Err(Error::ApplicationNotFound(name.clone()));
        }

        Ok(())
    }

    #[inline]
    pub fn application(&self, name: &str) -> Option<&Application> {
        self.applications.get(name)
    }

    /// `host:port` to bind the raw-socket transport to.
    #[inline]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Settings for {} {{", self.app_name)?;
        writeln!(f, "\tdebug={}", self.debug)?;
        writeln!(f, "\ttracing={}", self.tracing)?;
        writeln!(f, "\tserver_host={}", self.server_host)?;
        writeln!(f, "\tserver_port={}", self.server_port)?;
        writeln!(f, "\tinstall_apps={:?}", self.install_apps)?;
        writeln!(f, "\tstatic_file_dirs={:?}", self.static_file_dirs)?;
        write!(f, "}}")
    }
}
