//! Failure policy around request handling.
//!
//! A guarded future runs in its own task so that a panicking view is caught
//! like a returned error. On failure the trace is logged, then:
//! - debug mode: the trace goes back to the client as a `404` text body;
//! - `stop_on_exception`: the app is halted and [`Error::Halted`] returned;
//! - otherwise: a generic `500`.

use crate::{
    app::{App, Transport},
    errors::{Error, Result, ViewError},
    http::response::Response,
};
use std::{any::Any, error::Error as StdError, future::Future};
use tracing::error;

pub struct Guard<'a> {
    app: &'a App,
    transport: Transport,
}

impl<'a> Guard<'a> {
    #[inline]
    pub fn new(app: &'a App, transport: Transport) -> Self {
        Self { app, transport }
    }

    /// Runs `fut`, turning any failure into a response per the app settings.
    ///
    /// # Errors
    /// Only [`Error::Halted`], when a failure stops the app.
    pub async fn run<F>(&self, fut: F) -> Result<Response>
    where
        F: Future<Output = Result<Response, ViewError>> + Send + 'static,
    {
        let trace = match tokio::spawn(fut).await {
            Ok(Ok(response)) => return Ok(response),
            Ok(Err(error)) => error_trace(error.as_ref()),
            Err(join) if join.is_panic() => panic_trace(join.into_panic()),
            Err(join) => join.to_string(),
        };

        self.recover(trace)
    }

    fn recover(&self, trace: String) -> Result<Response> {
        let settings = self.app.settings();
        error!(transport = %self.transport, "request failed\n{trace}");

        if settings.debug {
            return Ok(Response::trace(trace));
        }

        match settings.stop_on_exception {
            true => {
                self.app.halt(trace.clone());
                Err(Error::Halted(trace))
            }
            false => Ok(Response::internal_error()),
        }
    }
}

fn error_trace(error: &(dyn StdError + 'static)) -> String {
    let mut trace = format!("Error: {error}");

    let mut source = error.source();
    while let Some(cause) = source {
        trace.push_str("\n  caused by: ");
        trace.push_str(&cause.to_string());
        source = cause.source();
    }

    trace
}

fn panic_trace(payload: Box<dyn Any + Send>) -> String {
    let message = match payload.downcast_ref::<&str>() {
        Some(message) => (*message).to_owned(),
        None => match payload.downcast_ref::<String>() {
            Some(message) => message.clone(),
            None => String::from("Box<dyn Any>"),
        },
    };

    format!("Panic: {message}")
}
