use crate::{
    errors::{Error, Result, ViewError},
    http::{request::Request, response::Response},
    route::pattern::Vars,
};
use std::{fmt, future::Future, pin::Pin, sync::Arc};

/// Boxed future produced by a [`View`].
pub type ViewFuture = Pin<Box<dyn Future<Output = Result<Reply, ViewError>> + Send + 'static>>;

/// Request handler bound to a URL template.
///
/// Implemented for every `async` function or closure taking the request and
/// the captured variables, returning `Result<R, E>` where `R` converts into
/// a [`Reply`] (a [`Response`] does) and `E` into a boxed error.
///
/// # Examples
/// ```
/// use webrail::{Application, Request, Response, Status, Vars, ViewError};
///
/// async fn user(_: Request, vars: Vars) -> Result<Response, ViewError> {
///     Ok(Response::new(Status::OK).body(format!("user {}", vars["id"])))
/// }
///
/// let app = Application::new("accounts").route("/users/<id>/", user);
/// assert_eq!(app.len(), 1);
/// ```
pub trait View: Send + Sync + 'static {
    fn call(&self, request: Request, vars: Vars) -> ViewFuture;
}

impl<F, Fut, R> View for F
where
    F: Fn(Request, Vars) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ViewError>> + Send + 'static,
    R: Into<Reply>,
{
    #[inline]
    fn call(&self, request: Request, vars: Vars) -> ViewFuture {
        let fut = (self)(request, vars);
        Box::pin(async move { fut.await.map(Into::into) })
    }
}

/// What a view produced: a well-formed response or an explicit marker that
/// it did not.
///
/// The dispatcher turns [`Reply::Invalid`] into the generic 404 instead of
/// inspecting the value's shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Response(Response),
    Invalid(String),
}

impl Reply {
    #[inline]
    pub fn invalid<R: Into<String>>(reason: R) -> Self {
        Reply::Invalid(reason.into())
    }

    /// Substitutes [`Response::not_found`] for an invalid reply.
    #[inline]
    pub fn normalize(self) -> Response {
        match self {
            Reply::Response(response) => response,
            Reply::Invalid(_) => Response::not_found(),
        }
    }

    /// Like [`normalize`](Reply::normalize), but reports an invalid reply.
    ///
    /// # Errors
    /// [`Error::InvalidReturnType`] naming `view`.
    #[inline]
    pub fn strict(self, view: &str) -> Result<Response> {
        match self {
            Reply::Response(response) => Ok(response),
            Reply::Invalid(_) => Err(Error::InvalidReturnType {
                view: view.to_owned(),
            }),
        }
    }
}

impl From<Response> for Reply {
    #[inline]
    fn from(response: Response) -> Self {
        Reply::Response(response)
    }
}

/// One `(template, view)` pair of an [`Application`].
#[derive(Clone)]
pub struct Route {
    template: String,
    name: Arc<str>,
    view: Arc<dyn View>,
}

impl Route {
    #[inline(always)]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// View name used in logs and in [`Error::InvalidReturnType`].
    #[inline(always)]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    #[inline]
    pub fn call(&self, request: Request, vars: Vars) -> ViewFuture {
        self.view.call(request, vars)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("template", &self.template)
            .field("name", &self.name)
            .finish()
    }
}

/// A named, ordered table of URL templates and their views.
///
/// Order matters: the first template that matches a request wins.
#[derive(Clone)]
pub struct Application {
    name: String,
    urlpatterns: Vec<Route>,
}

impl Application {
    #[inline]
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            urlpatterns: Vec::new(),
        }
    }

    /// Appends a route named after the view's type.
    #[inline]
    pub fn route<T: Into<String>, V: View>(self, template: T, view: V) -> Self {
        let name = std::any::type_name::<V>();
        self.named_route(template, name, view)
    }

    /// Appends a route with an explicit view name.
    pub fn named_route<T, N, V>(mut self, template: T, name: N, view: V) -> Self
    where
        T: Into<String>,
        N: Into<Arc<str>>,
        V: View,
    {
        self.urlpatterns.push(Route {
            template: template.into(),
            name: name.into(),
            view: Arc::new(view),
        });
        self
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.urlpatterns.iter()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.urlpatterns.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.urlpatterns.is_empty()
    }
}

impl<'a> IntoIterator for &'a Application {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Application {}>", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{http::types::Status, tools::vars};

    async fn echo(req: Request, vars: Vars) -> Result<Response, ViewError> {
        let id = vars.get("id").cloned().unwrap_or_default();
        Ok(Response::new(Status::OK).body(format!("{} {id}", req.method())))
    }

    async fn nothing(_: Request, _: Vars) -> Result<Reply, ViewError> {
        Ok(Reply::invalid("no response"))
    }

    #[test]
    fn keeps_order_and_names() {
        let app = Application::new("blog")
            .route("/<id>/", echo)
            .named_route("/list/", "list", nothing);

        let routes: Vec<_> = app.iter().map(|r| (r.template(), r.name().as_ref())).collect();

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].0, "/<id>/");
        assert!(routes[0].1.ends_with("echo"));
        assert_eq!(routes[1], ("/list/", "list"));
        assert_eq!(format!("{app:?}"), "<Application blog>");
    }

    #[tokio::test]
    async fn call_view() {
        let app = Application::new("blog").route("/<id>/", echo);
        let route = app.iter().next().unwrap();

        let mut req = Request::new(None);
        req.method = "GET".into();

        let reply = route.call(req, vars(&[("id", "7")])).await.unwrap();
        assert_eq!(reply.normalize().get_body(), b"GET 7");
    }

    #[tokio::test]
    async fn closure_view() {
        let greeting = String::from("hi");
        let view = move |_: Request, _: Vars| {
            let greeting = greeting.clone();
            async move { Ok::<_, ViewError>(Response::new(Status::OK).body(greeting)) }
        };

        let reply = View::call(&view, Request::new(None), Vars::new()).await.unwrap();
        assert_eq!(reply, Reply::Response(Response::new(Status::OK).body("hi")));
    }

    #[tokio::test]
    async fn failing_view() {
        let view = |_: Request, _: Vars| async { Err::<Response, ViewError>("boom".into()) };

        let error = View::call(&view, Request::new(None), Vars::new()).await.unwrap_err();
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn reply_normalization() {
        let ok = Response::new(Status::OK).body("ok");

        assert_eq!(Reply::from(ok.clone()).normalize(), ok);
        assert_eq!(Reply::invalid("x").normalize(), Response::not_found());

        assert_eq!(Reply::from(ok.clone()).strict("index"), Ok(ok));
        assert_eq!(
            Reply::invalid("x").strict("index"),
            Err(Error::InvalidReturnType { view: "index".into() })
        );
    }
}
