use crate::error::BoxError;
use crate::future::ResponseFuture;
use crate::layer::SkipPredicate;
use crate::pipeline::Minifier;
use bytes::Buf;
use http::Request;
use http_body::Body;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;

/// A Tower service that minifies HTTP response bodies.
#[derive(Clone)]
pub struct MinifyService<S> {
    inner: S,
    minifier: Arc<Minifier>,
    skip: Option<SkipPredicate>,
}

impl<S> MinifyService<S> {
    /// Creates a new minify service wrapping the given inner service.
    pub fn new(inner: S, minifier: Arc<Minifier>, skip: Option<SkipPredicate>) -> Self {
        Self {
            inner,
            minifier,
            skip,
        }
    }

    /// Returns a reference to the inner service.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns a mutable reference to the inner service.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consumes this service, returning the inner service.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: fmt::Debug> fmt::Debug for MinifyService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinifyService")
            .field("inner", &self.inner)
            .field("minifier", &self.minifier)
            .field("skip", &self.skip.is_some())
            .finish()
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for MinifyService<S>
where
    S: Service<Request<ReqBody>, Response = http::Response<ResBody>>,
    ResBody: Body,
    ResBody::Data: Buf,
    ResBody::Error: Into<BoxError>,
{
    type Response = http::Response<crate::body::MinifyBody<ResBody>>;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future, ResBody>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // Evaluate the skip predicate against the request head
        let (req, bypass) = match &self.skip {
            Some(skip) => {
                let (parts, body) = req.into_parts();
                let bypass = skip(&parts);
                (Request::from_parts(parts, body), bypass)
            }
            None => (req, false),
        };

        let inner = self.inner.call(req);

        if bypass {
            ResponseFuture::bypass(inner)
        } else {
            ResponseFuture::new(inner, self.minifier.clone())
        }
    }
}
