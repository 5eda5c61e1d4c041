//! webrail - minimal HTTP application framework
//!
//! A small framework that turns raw HTTP bytes (or a gateway scope handed over
//! by an external host server) into a [`Request`], routes it through ordered
//! URL pattern tables to an async view, and writes the view's [`Response`]
//! back out.
//!
//! # Building blocks
//!
//! - **HTTP codec** - [`Request::set_http`], [`Response::as_http`] and
//!   [`Response::from_http`]
//! - **URL patterns** - `/posts/<year>/<slug>/` style templates, see
//!   [`route::pattern_matching`]
//! - **Dispatcher** - redirect, static assets, root table walk, 404
//! - **Failure policy** - a failing or panicking view becomes a trace (debug),
//!   a halt (`stop_on_exception`) or an opaque `500`
//! - **Transports** - the built-in raw-socket [`Server`] and the [`Gateway`]
//!   adapter for external hosts
//!
//! # Examples
//!
//! ```no_run
//! use webrail::{App, Application, Request, Response, Settings, Status, Vars, ViewError};
//!
//! async fn index(_: Request, _: Vars) -> Result<Response, ViewError> {
//!     Ok(Response::new(Status::OK).body("Hello World!"))
//! }
//!
//! async fn post(_: Request, vars: Vars) -> Result<Response, ViewError> {
//!     let body = format!("{} / {}", vars["year"], vars["slug"]);
//!     Ok(Response::new(Status::OK).header("Content-Type", "text/plain").body(body))
//! }
//!
//! #[tokio::main]
//! async fn main() -> webrail::Result<()> {
//!     let blog = Application::new("blog")
//!         .route("/", index)
//!         .named_route("/posts/<year>/<slug>/", "post", post);
//!
//!     App::builder()
//!         .settings(Settings::load("webrail.toml")?)
//!         .install_app(blog)
//!         .root("blog", "blog")
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```
//!
//! Every path is served with a trailing `/`: `GET /blog` is answered with a
//! `301` to `/blog/`.

pub(crate) mod http {
    pub mod query;
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod types;
}
pub mod route {
    pub(crate) mod application;
    pub(crate) mod dispatcher;
    pub(crate) mod pattern;

    pub use self::{
        application::{Application, Reply, Route, View, ViewFuture},
        dispatcher::{Dispatcher, ViewName},
        pattern::{merge_url, pattern_matching, resolve, Vars, SEPARATOR},
    };
}
pub mod server {
    pub(crate) mod gateway;
    pub(crate) mod guard;
    pub(crate) mod socket;

    pub use self::{
        gateway::{Emit, Gateway, Receive, ReceiveEvent, Scope, SendEvent},
        guard::Guard,
        socket::{Server, ServerBuilder},
    };
}
pub(crate) mod app;
pub(crate) mod errors;
pub mod settings;
pub mod statics;

pub use crate::{
    app::{App, AppBuilder, Transport},
    errors::{Error, Result, ViewError},
    http::{
        query,
        request::Request,
        response::{Response, WriteBuffer},
        types::{ascii_quote, unquote, HeaderText, Status, WebDict},
    },
    route::{Application, Dispatcher, Reply, Route, Vars, View, ViewFuture},
    server::{Emit, Gateway, Guard, Receive, ReceiveEvent, Scope, SendEvent, Server, ServerBuilder},
    settings::{Settings, StaticDir},
    statics::{StaticAsset, Statics},
};

#[cfg(test)]
pub mod tools {
    use crate::{http::request::Request, route::pattern::Vars};

    #[inline]
    pub fn vars(pairs: &[(&str, &str)]) -> Vars {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    /// A parsed `GET` for `path`.
    #[inline]
    pub fn get(path: &str) -> Request {
        Request::new(None)
            .set_http(format!("GET {path} HTTP/1.1\r\n\r\n").as_bytes())
            .unwrap()
    }
}
