use crate::{
    app::{App, Transport},
    errors::{Error, Result, ViewError},
    http::request::Request,
    server::guard::Guard,
};
use std::{io, net::SocketAddr};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};
use tracing::{debug, info};

/// The built-in raw-socket HTTP server.
///
/// Every accepted connection gets its own task that reads once (at most
/// [`read_buffer_size`](crate::Settings::read_buffer_size) bytes), routes
/// the request, writes the whole response and closes the connection. There
/// is no keep-alive and no limit on concurrent tasks.
///
/// # Examples
///
/// ```no_run
/// use webrail::{App, Server, Settings};
/// use tokio::net::TcpListener;
///
/// #[tokio::main]
/// async fn main() -> webrail::Result<()> {
///     let app = App::new(Settings::default())?;
///
///     Server::builder()
///         .listener(TcpListener::bind("127.0.0.1:8080").await?)
///         .app(app)
///         .build()?
///         .launch()
///         .await
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    app: App,
}

impl Server {
    #[inline]
    pub fn builder() -> ServerBuilder {
        ServerBuilder {
            listener: None,
            app: None,
        }
    }

    /// Binds `server_host:server_port` from the app settings.
    pub async fn bind(app: App) -> Result<Self> {
        let listener = TcpListener::bind(app.settings().bind_address()).await?;
        Ok(Self { listener, app })
    }

    #[inline]
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the app is halted.
    ///
    /// # Errors
    /// [`Error::Halted`] with the trace of the failure that stopped the app.
    /// Tasks already in flight are not awaited.
    pub async fn launch(self) -> Result<()> {
        if self.app.settings().tracing {
            self.app.launch_trace(self.local_addr()?);
        }

        let mut halted = self.app.subscribe();
        if let Some(trace) = self.app.halted() {
            return Err(Error::Halted(trace));
        }

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let Ok((stream, addr)) = accepted else {
                        continue;
                    };

                    let app = self.app.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::serve(app, stream, addr).await {
                            debug!(client = %addr, error = %e, "connection closed with error");
                        }
                    });
                }
                Ok(()) = halted.changed() => {
                    let trace = halted.borrow().clone();
                    if let Some(trace) = trace {
                        return Err(Error::Halted(trace));
                    }
                }
            }
        }
    }

    async fn serve(app: App, mut stream: TcpStream, client: SocketAddr) -> Result<()> {
        let mut buffer = vec![0; app.settings().read_buffer_size];
        let len = stream.read(&mut buffer).await?;
        buffer.truncate(len);

        let task_app = app.clone();
        let response = Guard::new(&app, Transport::Socket)
            .run(async move {
                let request = Request::new(Some(client)).set_http(&buffer)?;
                let settings = task_app.settings();

                if settings.tracing {
                    info!(
                        "{client} -> \"{} {} {}\"",
                        request.method(),
                        request.path(),
                        request.http_version()
                    );
                }

                let dispatcher = task_app.dispatcher();
                let (_, response) = match settings.strict_returns {
                    true => dispatcher.dispatch_strict(request).await?,
                    false => dispatcher.dispatch(request).await?,
                };
                Ok::<_, ViewError>(response)
            })
            .await?;

        stream.write_all(&response.as_http()).await?;
        stream.shutdown().await?;
        Ok(())
    }
}

/// Builder for configuring and creating [`Server`] instances.
pub struct ServerBuilder {
    listener: Option<TcpListener>,
    app: Option<App>,
}

impl ServerBuilder {
    /// Sets the TCP listener that the server will use to accept connections.
    ///
    /// **This is a required component.**
    #[inline(always)]
    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Sets the application context requests are routed through.
    ///
    /// **This is a required component.**
    #[inline(always)]
    pub fn app(mut self, app: App) -> Self {
        self.app = Some(app);
        self
    }

    /// Finalizes the builder and constructs a [`Server`] instance.
    ///
    /// # Errors
    /// - [`Error::ApplicationNotInitialized`]: `app` was not called
    /// - [`Error::Io`]: `listener` was not called
    pub fn build(self) -> Result<Server> {
        let app = self.app.ok_or(Error::ApplicationNotInitialized)?;
        let listener = self.listener.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "The `listener` method must be called to create",
            )
        })?;

        Ok(Server { listener, app })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[tokio::test]
    async fn build_requires_parts() {
        let app = App::new(Settings::default()).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        assert!(matches!(
            Server::builder().listener(listener).build(),
            Err(Error::ApplicationNotInitialized)
        ));
        assert!(matches!(
            Server::builder().app(app).build(),
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::InvalidInput
        ));
    }

    #[tokio::test]
    async fn bind_from_settings() {
        let app = App::new(Settings {
            server_host: "127.0.0.1".into(),
            server_port: 0,
            ..Settings::default()
        })
        .unwrap();

        let server = Server::bind(app).await.unwrap();
        assert!(server.local_addr().unwrap().port() != 0);
    }

    #[tokio::test]
    async fn launch_returns_when_already_halted() {
        let app = App::new(Settings {
            tracing: false,
            ..Settings::default()
        })
        .unwrap();
        app.halt("earlier failure".into());

        let server = Server::builder()
            .listener(TcpListener::bind("127.0.0.1:0").await.unwrap())
            .app(app)
            .build()
            .unwrap();

        assert_eq!(server.launch().await, Err(Error::Halted("earlier failure".into())));
    }
}
