//! Adapter for external host servers speaking the scope/receive/send
//! gateway protocol.
//!
//! A host hands over one connection per [`Gateway::call`]: the connection
//! [`Scope`], a [`Receive`] source of body events and an [`Emit`] sink for
//! the response. The full body is collected before routing, and the response
//! always goes out as exactly one [`SendEvent::ResponseStart`] followed by one
//! [`SendEvent::ResponseBody`].

use crate::{
    app::{App, Transport},
    errors::{Error, Result, ViewError},
    http::{query::Query, request::Request, types::ascii_quote},
    server::guard::Guard,
};
use std::{future::Future, net::SocketAddr};
use tokio::sync::mpsc;

/// Connection description passed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Connection type; only `http` is served.
    pub kind: String,
    pub method: String,
    pub path: String,
    pub raw_path: Option<Vec<u8>>,
    pub root_path: String,
    pub headers: Vec<(Vec<u8>, Vec<u8>)>,
    pub query_string: Vec<u8>,
    pub client: Option<SocketAddr>,
    pub scheme: String,
    pub http_version: String,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            kind: String::from("http"),
            method: String::from("GET"),
            path: String::from("/"),
            raw_path: None,
            root_path: String::new(),
            headers: Vec::new(),
            query_string: Vec::new(),
            client: None,
            scheme: String::from("http"),
            http_version: String::from("1.1"),
        }
    }
}

/// Event pulled from the host while collecting the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveEvent {
    Request { body: Vec<u8>, more_body: bool },
    Disconnect,
}

/// Event pushed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendEvent {
    ResponseStart {
        status: u16,
        headers: Vec<(Vec<u8>, Vec<u8>)>,
    },
    ResponseBody {
        body: Vec<u8>,
    },
}

/// Source of [`ReceiveEvent`]s. `None` means the host has nothing more to
/// give and is treated like a disconnect.
pub trait Receive: Send {
    fn receive(&mut self) -> impl Future<Output = Option<ReceiveEvent>> + Send;
}

/// Sink for [`SendEvent`]s.
pub trait Emit: Send {
    fn emit(&mut self, event: SendEvent) -> impl Future<Output = Result<()>> + Send;
}

impl Receive for mpsc::Receiver<ReceiveEvent> {
    #[inline]
    fn receive(&mut self) -> impl Future<Output = Option<ReceiveEvent>> + Send {
        self.recv()
    }
}

impl Receive for mpsc::UnboundedReceiver<ReceiveEvent> {
    #[inline]
    fn receive(&mut self) -> impl Future<Output = Option<ReceiveEvent>> + Send {
        self.recv()
    }
}

impl Emit for mpsc::Sender<SendEvent> {
    async fn emit(&mut self, event: SendEvent) -> Result<()> {
        self.send(event).await.map_err(|_| closed_channel())
    }
}

impl Emit for mpsc::UnboundedSender<SendEvent> {
    async fn emit(&mut self, event: SendEvent) -> Result<()> {
        self.send(event).map_err(|_| closed_channel())
    }
}

fn closed_channel() -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::BrokenPipe,
        "gateway host stopped listening",
    ))
}

/// Gateway entry point bound to one [`App`].
///
/// # Examples
/// ```
/// use webrail::{App, Gateway, ReceiveEvent, Scope, SendEvent, Settings};
/// use tokio::sync::mpsc;
///
/// #[tokio::main]
/// async fn main() -> webrail::Result<()> {
///     let gateway = App::new(Settings::default())?.gateway();
///
///     let (body_tx, mut body_rx) = mpsc::channel(1);
///     let (mut send_tx, mut send_rx) = mpsc::channel(2);
///     body_tx.send(ReceiveEvent::Request { body: Vec::new(), more_body: false }).await.ok();
///
///     gateway.call(Scope::default(), &mut body_rx, &mut send_tx).await?;
///
///     let Some(SendEvent::ResponseStart { status, .. }) = send_rx.recv().await else {
///         unreachable!()
///     };
///     assert_eq!(status, 404);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Gateway {
    app: App,
}

impl Gateway {
    #[inline]
    pub fn new(app: App) -> Self {
        Self { app }
    }

    #[inline(always)]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Serves one connection.
    ///
    /// # Errors
    /// - [`Error::UnsupportedScope`]: `scope.kind` is not `http`
    /// - [`Error::Halted`]: a view failure stopped the app
    /// - [`Error::Io`]: the host stopped accepting events
    pub async fn call<R, E>(&self, scope: Scope, receive: &mut R, send: &mut E) -> Result<()>
    where
        R: Receive,
        E: Emit,
    {
        if scope.kind != "http" {
            return Err(Error::UnsupportedScope(scope.kind));
        }

        let body = Self::collect_body(receive).await;
        let request = Request::from_scope(scope, body);

        let app = self.app.clone();
        let response = Guard::new(&self.app, Transport::Gateway)
            .run(async move {
                let (_, response) = app.dispatcher().dispatch(request).await?;
                Ok::<_, ViewError>(response)
            })
            .await?;

        let (status, headers, body) = response.into_parts();
        let headers = headers
            .iter()
            .map(|(name, value)| {
                (
                    ascii_quote(name).as_bytes().to_vec(),
                    ascii_quote(value).as_bytes().to_vec(),
                )
            })
            .collect();

        send.emit(SendEvent::ResponseStart {
            status: status.code(),
            headers,
        })
        .await?;
        send.emit(SendEvent::ResponseBody { body }).await
    }

    async fn collect_body<R: Receive>(receive: &mut R) -> Vec<u8> {
        let mut body = Vec::new();

        while let Some(ReceiveEvent::Request {
            body: chunk,
            more_body,
        }) = receive.receive().await
        {
            body.extend_from_slice(&chunk);
            if !more_body {
                break;
            }
        }

        body
    }
}

impl Request {
    /// Builds a request from a gateway scope and its already collected body.
    ///
    /// Header bytes are decoded lossily; a `Cookie` header goes to the
    /// cookie jar as on the raw-socket path.
    pub fn from_scope(scope: Scope, body: Vec<u8>) -> Self {
        let mut request = Request::new(scope.client);

        for (name, value) in &scope.headers {
            let name = String::from_utf8_lossy(name);
            let value = String::from_utf8_lossy(value);

            match name.eq_ignore_ascii_case("cookie") {
                true => Query::cookies_into(&mut request.cookies, &value),
                false => request.headers.insert(name, value),
            }
        }

        request.raw_path = match &scope.raw_path {
            Some(raw) => String::from_utf8_lossy(raw).into_owned(),
            None => String::new(),
        };
        request.query_string = String::from_utf8_lossy(&scope.query_string).into_owned();
        request.method = scope.method;
        request.path = scope.path;
        request.root_path = scope.root_path;
        request.scheme = scope.scheme;
        request.http_version = scope.http_version;
        request.body = body;

        request.set_payload();
        request
    }
}
