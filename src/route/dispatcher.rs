//! Request routing.
//!
//! Per request, in strict order:
//! 1. a path without a trailing `/` is redirected to `path/`;
//! 2. a registered static asset is served as-is;
//! 3. the root table is walked in order, each registered application's
//!    templates tried in order under the entry's prefix;
//! 4. nothing matched: `404 Not Found`.
//!
//! The first registered application in the root table decides the request,
//! even when none of its templates match, unless
//! [`Settings::root_fallthrough`] is set.

use crate::{
    errors::ViewError,
    http::{request::Request, response::Response},
    route::{
        application::{Reply, Route},
        pattern::{merge_url, resolve, Vars, SEPARATOR},
    },
    settings::Settings,
};
use std::sync::Arc;
use tracing::debug;

/// Name of the view that handled a request, `None` when the dispatcher
/// answered by itself (redirect, static asset, 404).
pub type ViewName = Option<Arc<str>>;

/// Routes requests through the tables of one [`Settings`].
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a> {
    settings: &'a Settings,
}

impl<'a> Dispatcher<'a> {
    #[inline]
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Routes `request` and returns the raw [`Reply`] of the matched view.
    ///
    /// # Errors
    /// Whatever the view fails with, or an I/O error while reading a static
    /// asset.
    pub async fn route(&self, request: Request) -> Result<(ViewName, Reply), ViewError> {
        let path = request.path();

        if !path.ends_with(SEPARATOR) {
            let location = format!("{path}{SEPARATOR}");
            return Ok((None, Reply::Response(Response::redirect(location))));
        }

        if let Some(asset) = self.settings.statics.lookup(path) {
            debug!(url = asset.url(), "serving static asset");
            return Ok((None, Reply::Response(asset.load().await?)));
        }

        match self.find(path) {
            Some((route, vars)) => {
                debug!(view = %route.name(), template = route.template(), "route matched");
                let reply = route.call(request, vars).await?;
                Ok((Some(route.name().clone()), reply))
            }
            None => Ok((None, Reply::Response(Response::not_found()))),
        }
    }

    /// Routes `request`, substituting the generic 404 for a view that did not
    /// produce a response.
    #[inline]
    pub async fn dispatch(&self, request: Request) -> Result<(ViewName, Response), ViewError> {
        let (view, reply) = self.route(request).await?;
        Ok((view, reply.normalize()))
    }

    /// Routes `request`, failing with
    /// [`InvalidReturnType`](crate::Error::InvalidReturnType) when the view
    /// did not produce a response.
    pub async fn dispatch_strict(&self, request: Request) -> Result<(ViewName, Response), ViewError> {
        let (view, reply) = self.route(request).await?;

        let response = match &view {
            Some(name) => reply.strict(name)?,
            None => reply.normalize(),
        };
        Ok((view, response))
    }

    fn find(&self, path: &str) -> Option<(&'a Route, Vars)> {
        let settings = self.settings;

        for (prefix, name) in &settings.root_urlpatterns {
            let Some(app) = settings.application(name) else {
                continue;
            };

            let hit = app.iter().find_map(|route| {
                resolve(path, &merge_url(prefix, route.template())).map(|vars| (route, vars))
            });

            if hit.is_some() || !settings.root_fallthrough {
                return hit;
            }
        }

        None
    }
}
