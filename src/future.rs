use crate::body::MinifyBody;
use crate::pipeline::{Minifier, Skip, Target};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use http::response::Parts;
use http::{HeaderMap, HeaderValue, Response, header};
use http_body::Body;
use pin_project_lite::pin_project;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};
use tracing::{debug, trace};

pin_project! {
    /// Future for minify service responses.
    ///
    /// Resolves once the inner response is available and, for eligible
    /// responses, once the whole body has been buffered and minified.
    pub struct ResponseFuture<F, B> {
        #[pin]
        state: State<F, B>,
        minifier: Option<Arc<Minifier>>,
    }
}

pin_project! {
    #[project = StateProj]
    enum State<F, B> {
        // Waiting for the inner service to produce a response.
        Waiting {
            #[pin]
            future: F,
        },
        // Buffering the body of an eligible response.
        Collecting {
            #[pin]
            body: B,
            parts: Option<Parts>,
            target: Target,
            buf: BytesMut,
            trailers: Option<HeaderMap>,
        },
    }
}

impl<F, B> ResponseFuture<F, B> {
    pub(crate) fn new(inner: F, minifier: Arc<Minifier>) -> Self {
        Self {
            state: State::Waiting { future: inner },
            minifier: Some(minifier),
        }
    }

    /// Creates a future whose response is passed through untouched.
    pub(crate) fn bypass(inner: F) -> Self {
        Self {
            state: State::Waiting { future: inner },
            minifier: None,
        }
    }
}

impl<F, B, E> Future for ResponseFuture<F, B>
where
    F: Future<Output = Result<Response<B>, E>>,
    B: Body,
    B::Data: Buf,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Output = Result<Response<MinifyBody<B>>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();

        loop {
            match this.state.as_mut().project() {
                StateProj::Waiting { future } => {
                    let response = match ready!(future.poll(cx)) {
                        Ok(response) => response,
                        Err(e) => return Poll::Ready(Err(e)),
                    };

                    let Some(minifier) = this.minifier.as_deref() else {
                        trace!(reason = ?Skip::Bypassed, "response left unmodified");
                        return Poll::Ready(Ok(response.map(MinifyBody::passthrough)));
                    };

                    let (parts, body) = response.into_parts();
                    match minifier.target(parts.status, &parts.headers) {
                        Ok(target) => this.state.set(State::Collecting {
                            body,
                            parts: Some(parts),
                            target,
                            buf: BytesMut::new(),
                            trailers: None,
                        }),
                        Err(skip) => {
                            minifier.skipped(skip);
                            let response = Response::from_parts(parts, MinifyBody::passthrough(body));
                            return Poll::Ready(Ok(response));
                        }
                    }
                }

                StateProj::Collecting {
                    body,
                    parts,
                    target,
                    buf,
                    trailers,
                } => {
                    let frame = ready!(body.poll_frame(cx));
                    match frame {
                        Some(Ok(frame)) => match frame.into_data() {
                            Ok(data) => buf.put(data),
                            Err(frame) => {
                                if let Ok(more) = frame.into_trailers() {
                                    match trailers {
                                        Some(existing) => existing.extend(more),
                                        None => *trailers = Some(more),
                                    }
                                }
                            }
                        },
                        Some(Err(e)) => {
                            let Some(parts) = parts.take() else {
                                // Polled after completion
                                return Poll::Pending;
                            };
                            let error = io::Error::other(e.into());
                            debug!(%error, "response body failed while buffering");
                            if let Some(minifier) = this.minifier.as_deref() {
                                minifier.skipped(Skip::BodyError);
                            }
                            let body = MinifyBody::failed(buf.split().freeze(), error);
                            return Poll::Ready(Ok(Response::from_parts(parts, body)));
                        }
                        None => {
                            let Some(mut parts) = parts.take() else {
                                // Polled after completion
                                return Poll::Pending;
                            };
                            let original = buf.split().freeze();
                            let data = match this.minifier.as_deref() {
                                Some(minifier) => {
                                    finish(minifier, target, &mut parts.headers, original)
                                }
                                None => original,
                            };
                            let body = MinifyBody::buffered(data, trailers.take());
                            return Poll::Ready(Ok(Response::from_parts(parts, body)));
                        }
                    }
                }
            }
        }
    }
}

/// Minifies a fully buffered body. When the minified body is used,
/// `Content-Length` is updated and `Accept-Ranges` removed.
fn finish(minifier: &Minifier, target: &Target, headers: &mut HeaderMap, original: Bytes) -> Bytes {
    match minifier.rewrite(target, &original) {
        Ok(minified) => {
            minifier.minified(target, original.len(), minified.len());
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(minified.len()));
            headers.remove(header::ACCEPT_RANGES);
            Bytes::from(minified)
        }
        Err(skip) => {
            minifier.skipped(skip);
            original
        }
    }
}
