//! Tracing middleware attaching a request-scoped trace identifier.
//!
//! Each incoming request receives a UUID trace id stored in task-local
//! storage (see [`TraceId`]) and echoed in the `trace-id` response header.
//! Requests run inside a `request` span that is a child of the span the
//! middleware was built with. Server errors are logged here with the method,
//! URI, and the unredacted error the handler produced.

use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{Instrument, Span, error, info_span};

use crate::domain::{TRACE_ID_HEADER, TraceId};

/// Tracing middleware attaching a request-scoped UUID and adding a `trace-id`
/// header to every response.
///
/// Handlers can read the trace ID via [`TraceId::current`].
///
/// # Examples
/// ```
/// use actix_web::App;
/// use tracing::Span;
/// use whenworks::Trace;
///
/// let app = App::new().wrap(Trace::new(Span::current()));
/// ```
#[derive(Clone)]
pub struct Trace {
    span: Span,
}

impl Trace {
    /// Record request spans as children of `span`.
    pub fn new(span: Span) -> Self {
        Self { span }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware {
            service,
            span: self.span.clone(),
        }))
    }
}

/// Service wrapper produced by [`Trace`].
///
/// Applications should not use this type directly.
pub struct TraceMiddleware<S> {
    service: S,
    span: Span,
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = TraceId::generate();
        let method = req.method().clone();
        let uri = req.uri().clone();
        let request_span = info_span!(
            parent: &self.span,
            "request",
            %trace_id,
            %method,
            %uri
        );
        let fut =
            request_span.in_scope(|| TraceId::sync_scope(trace_id, || self.service.call(req)));
        Box::pin(
            TraceId::scope(trace_id, async move {
                let mut res = fut.await?;
                if res.status().is_server_error() {
                    let cause = res
                        .response()
                        .error()
                        .map_or_else(|| "no error attached".to_owned(), ToString::to_string);
                    error!(
                        %method,
                        %uri,
                        status = res.status().as_u16(),
                        error = %cause,
                        "request failed"
                    );
                }
                match HeaderValue::from_str(&trace_id.to_string()) {
                    Ok(value) => {
                        res.response_mut()
                            .headers_mut()
                            .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
                    }
                    Err(error) => {
                        error!(%error, %trace_id, "failed to encode trace identifier header");
                    }
                }
                Ok(res)
            })
            .instrument(request_span),
        )
    }
}
