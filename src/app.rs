use crate::{
    errors::{Error, Result},
    route::{application::Application, dispatcher::Dispatcher},
    server::{gateway::Gateway, socket::Server},
    settings::Settings,
};
use std::{fmt, net::SocketAddr, str::FromStr, sync::Arc};
use tokio::sync::watch;
use tracing::info;

/// The application context shared by every transport task.
///
/// Built once at startup from validated [`Settings`]; cloning is cheap and
/// every clone sees the same settings and the same halt signal.
///
/// # Examples
/// ```no_run
/// use webrail::{App, Application, Request, Response, Settings, Status, Vars, ViewError};
///
/// async fn index(_: Request, _: Vars) -> Result<Response, ViewError> {
///     Ok(Response::new(Status::OK).body("Hello World!"))
/// }
///
/// #[tokio::main]
/// async fn main() -> webrail::Result<()> {
///     App::builder()
///         .settings(Settings::default())
///         .install_app(Application::new("home").route("/", index))
///         .root("", "home")
///         .build()?
///         .run()
///         .await
/// }
/// ```
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

struct AppInner {
    settings: Settings,
    halt: watch::Sender<Option<String>>,
}

impl App {
    #[inline]
    pub fn builder() -> AppBuilder {
        AppBuilder {
            settings: None,
            apps: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Wraps already prepared settings.
    ///
    /// # Errors
    /// [`Error::ApplicationNotFound`] from [`Settings::check`].
    pub fn new(settings: Settings) -> Result<Self> {
        settings.check()?;
        let (halt, _) = watch::channel(None);

        Ok(Self {
            inner: Arc::new(AppInner { settings, halt }),
        })
    }

    #[inline(always)]
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    #[inline]
    pub fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher::new(self.settings())
    }

    /// Adapter for external gateway hosts.
    #[inline]
    pub fn gateway(&self) -> Gateway {
        Gateway::new(self.clone())
    }

    /// Binds `server_host:server_port` and serves until halted.
    pub async fn run(self) -> Result<()> {
        Server::bind(self).await?.launch().await
    }

    /// Trace of the failure that stopped the app, if any.
    #[inline]
    pub fn halted(&self) -> Option<String> {
        self.inner.halt.borrow().clone()
    }

    #[inline]
    pub(crate) fn halt(&self, trace: String) {
        self.inner.halt.send_replace(Some(trace));
    }

    #[inline]
    pub(crate) fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.inner.halt.subscribe()
    }

    pub(crate) fn launch_trace(&self, addr: SocketAddr) {
        let settings = self.settings();

        info!(
            app = %settings.app_name,
            "Launched {} application, running on http://{addr}",
            settings.app_name,
        );
        if settings.install_apps.is_empty() {
            info!("Installed applications: -");
        }
        for name in &settings.install_apps {
            info!(application = %name, "Installed application");
        }
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("app_name", &self.settings().app_name)
            .field("halted", &self.halted().is_some())
            .finish()
    }
}

/// Builder for [`App`].
pub struct AppBuilder {
    settings: Option<Settings>,
    apps: Vec<Application>,
    roots: Vec<(String, String)>,
}

impl AppBuilder {
    /// **This is a required component.**
    #[inline(always)]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    #[inline(always)]
    pub fn install_app(mut self, app: Application) -> Self {
        self.apps.push(app);
        self
    }

    /// Appends a root-table entry after those already in the settings.
    #[inline(always)]
    pub fn root<P: Into<String>, N: Into<String>>(mut self, prefix: P, app_name: N) -> Self {
        self.roots.push((prefix.into(), app_name.into()));
        self
    }

    /// Finalizes the builder.
    ///
    /// # Errors
    /// - [`Error::ApplicationNotInitialized`]: `settings` was not called
    /// - [`Error::ApplicationNotFound`]: see [`Settings::check`]
    pub fn build(self) -> Result<App> {
        let mut settings = self.settings.ok_or(Error::ApplicationNotInitialized)?;

        for app in self.apps {
            settings.install_app(app);
        }
        for (prefix, name) in self.roots {
            settings.add_root(prefix, name);
        }

        App::new(settings)
    }
}

/// Which transport a request arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// The built-in raw-socket server.
    Socket,
    /// An external host speaking the scope/receive/send gateway protocol.
    Gateway,
}

impl FromStr for Transport {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "std" | "socket" => Ok(Transport::Socket),
            "uvicorn" | "gateway" => Ok(Transport::Gateway),
            other => Err(Error::ServerType(other.to_owned())),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Transport::Socket => "std",
            Transport::Gateway => "gateway",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_settings() {
        assert!(matches!(App::builder().build(), Err(Error::ApplicationNotInitialized)));
    }

    #[test]
    fn builder_installs_and_checks() {
        let app = App::builder()
            .settings(Settings::default())
            .install_app(Application::new("blog"))
            .root("blog", "blog")
            .build()
            .unwrap();

        assert!(app.settings().application("blog").is_some());
        assert_eq!(app.settings().root_urlpatterns, [("blog".to_owned(), "blog".to_owned())]);

        let missing = App::builder()
            .settings(Settings::default())
            .root("", "shop")
            .build();
        assert!(matches!(missing, Err(Error::ApplicationNotFound(name)) if name == "shop"));
    }

    #[test]
    fn halt_is_shared_between_clones() {
        let app = App::new(Settings::default()).unwrap();
        let clone = app.clone();
        let rx = app.subscribe();

        assert_eq!(clone.halted(), None);
        clone.halt("boom".into());

        assert_eq!(app.halted().as_deref(), Some("boom"));
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn transport_from_str() {
        #[rustfmt::skip]
        let cases = [
            ("std",       Ok(Transport::Socket)),
            ("socket",    Ok(Transport::Socket)),
            ("uvicorn",   Ok(Transport::Gateway)),
            ("gateway",   Ok(Transport::Gateway)),
            ("fcgi",      Err(Error::ServerType("fcgi".into()))),
            ("",          Err(Error::ServerType("".into()))),
        ];

        for (value, expected) in cases {
            assert_eq!(value.parse::<Transport>(), expected);
        }
    }
}
